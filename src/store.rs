//! Process-wide application state.
//!
//! All mutation goes through [`Store::dispatch`], one [`Action`] at a time,
//! from the UI loop. Network tasks never touch the store directly; they report
//! back with messages that the loop turns into actions.

use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<User>,
    /// `None` when no toast is visible.
    pub toast: Option<Toast>,
    pub error: Option<String>,
    /// Set once the identity provider has reported its first state.
    pub auth_checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetLoading(bool),
    SetAuthUser(Option<User>),
    /// Identity provider notification: mirrors the user and completes the initial check.
    AuthStateChanged(Option<User>),
    ShowToast { message: String, kind: ToastKind },
    HideToast,
    SetError(Option<String>),
    Logout,
}

impl Action {
    pub fn success(message: impl Into<String>) -> Self {
        Action::ShowToast {
            message: message.into(),
            kind: ToastKind::Success,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Action::ShowToast {
            message: message.into(),
            kind: ToastKind::Error,
        }
    }
}

#[derive(Debug)]
pub struct Store {
    state: AppState,
    toast_duration: Duration,
    toast_deadline: Option<Instant>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl Store {
    pub fn new(toast_duration: Duration) -> Self {
        Self {
            state: AppState::default(),
            toast_duration,
            toast_deadline: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn toast_deadline(&self) -> Option<Instant> {
        self.toast_deadline
    }

    pub fn dispatch(&mut self, action: Action) {
        self.dispatch_at(action, Instant::now());
    }

    pub fn dispatch_at(&mut self, action: Action, now: Instant) {
        debug!(?action, "dispatch");
        let was_visible = self.state.toast.is_some();
        reduce(&mut self.state, action);
        let is_visible = self.state.toast.is_some();

        // One auto-dismiss timer: reset only when visibility flips.
        if was_visible != is_visible {
            self.toast_deadline = is_visible.then(|| now + self.toast_duration);
        }
    }

    /// Hides the toast once its timer has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if matches!(self.toast_deadline, Some(deadline) if now >= deadline) {
            self.dispatch_at(Action::HideToast, now);
        }
    }
}

fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::SetLoading(loading) => state.is_loading = loading,
        Action::SetAuthUser(user) => {
            state.is_authenticated = user.is_some();
            state.user = user;
        }
        Action::AuthStateChanged(user) => {
            state.is_authenticated = user.is_some();
            state.user = user;
            state.auth_checked = true;
        }
        Action::ShowToast { message, kind } => state.toast = Some(Toast { message, kind }),
        Action::HideToast => state.toast = None,
        Action::SetError(error) => state.error = error,
        Action::Logout => {
            state.is_authenticated = false;
            state.user = None;
            state.error = None;
        }
    }
}
