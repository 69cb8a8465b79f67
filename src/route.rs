//! Screens, navigation history and the authentication guard.

use std::fmt;

use tracing::info;
use url::form_urlencoded;

use crate::store::AppState;
use crate::task::TaskId;

pub const LOGIN: &str = "/Login";
pub const REGISTER: &str = "/Register";
pub const DASHBOARD: &str = "/Dashboard";
pub const TASK_MANAGEMENT: &str = "/TaskManagement";
pub const ADD_EDIT_FORM: &str = "/AddEditForm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    TaskManagement,
    /// Create when `edit` is `None`, otherwise edit that task.
    AddEditForm { edit: Option<TaskId> },
    NotFound(String),
}

impl Route {
    /// Paths match case-insensitively; unknown paths become [`Route::NotFound`].
    pub fn parse(location: &str) -> Route {
        let (path, query) = match location.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (location, None),
        };
        let path = path.trim_end_matches('/');
        let is = |name: &str| path.eq_ignore_ascii_case(name);

        if is(LOGIN) {
            Route::Login
        } else if is(REGISTER) {
            Route::Register
        } else if is(DASHBOARD) {
            Route::Dashboard
        } else if is(TASK_MANAGEMENT) {
            Route::TaskManagement
        } else if is(ADD_EDIT_FORM) {
            Route::AddEditForm {
                edit: query.and_then(edit_target),
            }
        } else {
            Route::NotFound(location.to_string())
        }
    }

    pub fn edit(id: impl Into<TaskId>) -> Route {
        Route::AddEditForm {
            edit: Some(id.into()),
        }
    }

    pub fn create() -> Route {
        Route::AddEditForm { edit: None }
    }

    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::TaskManagement | Route::AddEditForm { .. }
        )
    }
}

/// Reads `param=edit&id=<id>`; values are percent-decoded.
fn edit_target(query: &str) -> Option<TaskId> {
    let mut is_edit = false;
    let mut id = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match (key.as_ref(), value.as_ref()) {
            ("param", "edit") => is_edit = true,
            ("id", value) if !value.is_empty() => id = Some(value.to_string()),
            _ => {}
        }
    }
    if is_edit {
        id
    } else {
        None
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => f.write_str(LOGIN),
            Route::Register => f.write_str(REGISTER),
            Route::Dashboard => f.write_str(DASHBOARD),
            Route::TaskManagement => f.write_str(TASK_MANAGEMENT),
            Route::AddEditForm { edit: None } => f.write_str(ADD_EDIT_FORM),
            Route::AddEditForm { edit: Some(id) } => {
                let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
                write!(f, "{ADD_EDIT_FORM}?param=edit&id={id}")
            }
            Route::NotFound(path) => f.write_str(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// The initial auth check has not finished; render nothing.
    Pending,
    Allow,
    /// Replace the current entry with this route.
    Redirect(Route),
}

pub fn guard(route: &Route, state: &AppState) -> Guard {
    if !route.is_protected() {
        return Guard::Allow;
    }
    if !state.auth_checked {
        return Guard::Pending;
    }
    if state.is_authenticated {
        Guard::Allow
    } else {
        Guard::Redirect(Route::Login)
    }
}

/// In-process history stack.
#[derive(Debug, Clone)]
pub struct Navigator {
    entries: Vec<Route>,
    index: usize,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            entries: vec![start],
            index: 0,
        }
    }

    pub fn current(&self) -> &Route {
        &self.entries[self.index]
    }

    pub fn push(&mut self, route: Route) {
        info!(from = %self.current(), to = %route, "navigate");
        self.entries.truncate(self.index + 1);
        self.entries.push(route);
        self.index += 1;
    }

    pub fn replace(&mut self, route: Route) {
        info!(from = %self.current(), to = %route, "navigate (replace)");
        self.entries[self.index] = route;
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies the guard to the current entry, redirecting if needed.
    pub fn resolve(&mut self, state: &AppState) -> Guard {
        let outcome = guard(self.current(), state);
        if let Guard::Redirect(target) = &outcome {
            self.replace(target.clone());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::User;

    fn checked(authenticated: bool) -> AppState {
        AppState {
            auth_checked: true,
            is_authenticated: authenticated,
            user: authenticated.then(|| User {
                id: "u1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
            }),
            ..AppState::default()
        }
    }

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/Login"), Route::Login);
        assert_eq!(Route::parse("/dashboard"), Route::Dashboard);
        assert_eq!(Route::parse("/TaskManagement/"), Route::TaskManagement);
        assert_eq!(Route::parse("/AddEditForm"), Route::create());
        assert_eq!(
            Route::parse("/AddEditForm?param=edit&id=42"),
            Route::edit("42")
        );
        assert_eq!(Route::parse("/AddEditForm?id=42"), Route::create());
        assert_eq!(
            Route::parse("/nowhere"),
            Route::NotFound("/nowhere".into())
        );
    }

    #[test]
    fn edit_route_round_trips_through_path() {
        let route = Route::edit("abc");
        assert_eq!(route.to_string(), "/AddEditForm?param=edit&id=abc");
        assert_eq!(Route::parse(&route.to_string()), route);
    }

    #[test]
    fn edit_ids_are_percent_decoded() {
        assert_eq!(
            Route::parse("/AddEditForm?param=edit&id=a%2Fb%20c"),
            Route::edit("a/b c")
        );

        let route = Route::edit("50% & more");
        assert_eq!(
            route.to_string(),
            "/AddEditForm?param=edit&id=50%25+%26+more"
        );
        assert_eq!(Route::parse(&route.to_string()), route);
    }

    #[test]
    fn guard_waits_for_auth_check() {
        let state = AppState::default();
        assert_eq!(guard(&Route::Dashboard, &state), Guard::Pending);
        assert_eq!(guard(&Route::Login, &state), Guard::Allow);
    }

    #[test]
    fn guard_redirects_anonymous_users() {
        let state = checked(false);
        for route in [Route::Dashboard, Route::TaskManagement, Route::create()] {
            assert_eq!(guard(&route, &state), Guard::Redirect(Route::Login));
        }
        assert_eq!(guard(&Route::Register, &state), Guard::Allow);
    }

    #[test]
    fn guard_allows_authenticated_users() {
        let state = checked(true);
        assert_eq!(guard(&Route::TaskManagement, &state), Guard::Allow);
    }

    #[test]
    fn redirect_replaces_history_entry() {
        let mut nav = Navigator::new(Route::Register);
        nav.push(Route::Dashboard);
        assert_eq!(nav.resolve(&checked(false)), Guard::Redirect(Route::Login));
        assert_eq!(nav.current(), &Route::Login);
        assert_eq!(nav.len(), 2);

        assert!(nav.back());
        assert_eq!(nav.current(), &Route::Register);
    }

    #[test]
    fn pending_guard_leaves_history_alone() {
        let mut nav = Navigator::new(Route::Dashboard);
        assert_eq!(nav.resolve(&AppState::default()), Guard::Pending);
        assert_eq!(nav.current(), &Route::Dashboard);
    }

    #[test]
    fn push_discards_forward_entries() {
        let mut nav = Navigator::new(Route::Login);
        nav.push(Route::Register);
        nav.back();
        nav.push(Route::Dashboard);
        assert_eq!(nav.len(), 2);
        assert_eq!(nav.current(), &Route::Dashboard);
        assert!(nav.back());
        assert_eq!(nav.current(), &Route::Login);
        assert!(!nav.back());
    }
}
