//! The controller tying the store, the board and the forms to the network.
//!
//! Every network call runs as its own tokio task and reports back with a
//! [`Message`]. The UI loop feeds those messages to [`App::handle`] one at a
//! time, which is the only place results touch state.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::{ApiError, TaskApi};
use crate::auth::{mirror_auth_state, AuthError, AuthUser, IdentityProvider};
use crate::dashboard::DashboardStats;
use crate::forms::{FormInput, LoginForm, RegisterForm, TaskForm};
use crate::kanban_board::{KanbanBoard, StageChange, Step};
use crate::route::{Guard, Navigator, Route};
use crate::store::{Action, Store};
use crate::task::{Stage, StagePatch, Task, TaskId};

#[derive(Debug)]
pub enum Message {
    Store(Action),
    TasksLoaded {
        owner: String,
        result: Result<Vec<Task>, ApiError>,
    },
    StageSettled {
        change: StageChange,
        result: Result<(), ApiError>,
    },
    DeleteSettled {
        id: TaskId,
        result: Result<(), ApiError>,
    },
    TaskLoaded(Result<Task, ApiError>),
    TaskSaved {
        editing: bool,
        result: Result<(), ApiError>,
    },
    SignedIn(Result<AuthUser, AuthError>),
    Registered(Result<(), AuthError>),
    SignedOut(Result<(), AuthError>),
}

impl From<Action> for Message {
    fn from(action: Action) -> Self {
        Message::Store(action)
    }
}

pub struct App {
    pub store: Store,
    pub nav: Navigator,
    pub board: KanbanBoard,
    pub stats: DashboardStats,
    pub login: LoginForm,
    pub register: RegisterForm,
    pub task_form: TaskForm,
    /// Task awaiting delete confirmation.
    pub confirm_delete: Option<TaskId>,
    pub should_quit: bool,
    entered: Option<Route>,
    api: Arc<dyn TaskApi>,
    identity: Arc<dyn IdentityProvider>,
    tx: mpsc::UnboundedSender<Message>,
}

impl App {
    pub fn new(
        api: Arc<dyn TaskApi>,
        identity: Arc<dyn IdentityProvider>,
        store: Store,
        start: Route,
    ) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Self {
            store,
            nav: Navigator::new(start),
            board: KanbanBoard::new(),
            stats: DashboardStats::default(),
            login: LoginForm::default(),
            register: RegisterForm::default(),
            task_form: TaskForm::default(),
            confirm_delete: None,
            should_quit: false,
            entered: None,
            api,
            identity,
            tx,
        };
        (app, rx)
    }

    /// Starts mirroring identity provider state into the store.
    pub fn spawn_auth_bridge(&self) {
        tokio::spawn(mirror_auth_state(self.identity.subscribe(), self.tx.clone()));
    }

    pub fn route(&self) -> &Route {
        self.nav.current()
    }

    pub fn guard(&self) -> Guard {
        crate::route::guard(self.nav.current(), self.store.state())
    }

    pub fn navigate(&mut self, route: Route) {
        self.nav.push(route);
        self.sync_route();
    }

    pub fn back(&mut self) {
        if self.nav.back() {
            self.sync_route();
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.store.tick(now);
    }

    /// Applies the guard and runs the entry effects of a newly shown screen.
    pub fn sync_route(&mut self) {
        // A redirect lands on a new screen, so settle until the route stops moving.
        for _ in 0..4 {
            if self.nav.resolve(self.store.state()) == Guard::Pending {
                return;
            }
            if *self.nav.current() == Route::Login && self.store.state().is_authenticated {
                self.nav.replace(Route::Dashboard);
                continue;
            }
            if self.entered.as_ref() == Some(self.nav.current()) {
                return;
            }
            let route = self.nav.current().clone();
            self.entered = Some(route.clone());
            self.enter(&route);
        }
    }

    fn enter(&mut self, route: &Route) {
        self.confirm_delete = None;
        self.board.cancel_drag();
        match route {
            Route::Login => self.login = LoginForm::default(),
            Route::Register => self.register = RegisterForm::default(),
            Route::Dashboard | Route::TaskManagement => self.fetch_tasks(),
            Route::AddEditForm { edit } => {
                self.task_form = TaskForm::default();
                if let Some(id) = edit {
                    self.load_task(id.clone());
                }
            }
            Route::NotFound(path) => warn!(%path, "unknown route"),
        }
    }

    pub fn handle(&mut self, message: Message) {
        match message {
            Message::Store(action) => self.store.dispatch(action),
            Message::TasksLoaded { owner, result } => {
                self.store.dispatch(Action::SetLoading(false));
                match result {
                    Ok(tasks) => self.board.load(tasks, &owner),
                    Err(e) => {
                        error!("fetching tasks: {e}");
                        self.board.clear();
                    }
                }
                self.stats = DashboardStats::from_tasks(self.board.tasks());
            }
            Message::StageSettled { change, result } => match result {
                Ok(()) => self.store.dispatch(Action::success("Task updated successfully")),
                Err(e) => {
                    error!(task = %change.task_id, "updating stage: {e}");
                    self.board.rollback(&change);
                    self.store.dispatch(Action::failure("Failed to update task"));
                }
            },
            Message::DeleteSettled { id, result } => match result {
                Ok(()) => self.store.dispatch(Action::success("Task deleted successfully")),
                Err(e) => {
                    error!(task = %id, "deleting task: {e}");
                    self.store.dispatch(Action::failure("Error deleting task"));
                    self.fetch_tasks();
                }
            },
            Message::TaskLoaded(result) => {
                self.store.dispatch(Action::SetLoading(false));
                match result {
                    Ok(task) => self.task_form = TaskForm::from_task(&task),
                    Err(e) => {
                        error!("loading task: {e}");
                        self.store.dispatch(Action::failure("Error fetching task details."));
                    }
                }
            }
            Message::TaskSaved { editing, result } => {
                self.store.dispatch(Action::SetLoading(false));
                match result {
                    Ok(()) => {
                        self.store.dispatch(Action::success(if editing {
                            "Task updated successfully!"
                        } else {
                            "Task created successfully!"
                        }));
                        self.navigate(Route::TaskManagement);
                    }
                    Err(e) => {
                        let verb = if editing { "updating" } else { "creating" };
                        self.store
                            .dispatch(Action::failure(format!("Error {verb} task. {}", e.detail())));
                    }
                }
            }
            Message::SignedIn(result) => {
                self.store.dispatch(Action::SetLoading(false));
                match result {
                    Ok(user) => {
                        self.store.dispatch(Action::SetAuthUser(Some(user.into())));
                        self.store.dispatch(Action::success("Successfully logged in"));
                        self.navigate(Route::Dashboard);
                    }
                    Err(e) => {
                        info!("sign-in rejected: {e}");
                        self.login.error = Some(e.login_message());
                    }
                }
            }
            Message::Registered(result) => {
                self.store.dispatch(Action::SetLoading(false));
                match result {
                    Ok(()) => {
                        self.store.dispatch(Action::success("Successfully registered"));
                        self.navigate(Route::Login);
                    }
                    Err(e) => {
                        error!("registration failed: {e}");
                        self.register.error = Some(e.to_string());
                    }
                }
            }
            Message::SignedOut(result) => {
                self.store.dispatch(Action::SetLoading(false));
                match result {
                    Ok(()) => {
                        self.store.dispatch(Action::Logout);
                        self.board.clear();
                        self.store.dispatch(Action::success("Successfully logged out"));
                        self.navigate(Route::Login);
                    }
                    Err(e) => self.store.dispatch(Action::failure(e.to_string())),
                }
            }
        }
        self.sync_route();
    }

    fn spawn<F>(&self, work: F)
    where
        F: std::future::Future<Output = Message> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The loop is gone when this fails; nothing is left to update.
            let _ = tx.send(work.await);
        });
    }

    /// Refetches the current user's tasks. Without a user there is nothing to show.
    pub fn fetch_tasks(&mut self) {
        let Some(owner) = self.store.state().user.as_ref().map(|u| u.id.clone()) else {
            return;
        };
        self.store.dispatch(Action::SetLoading(true));
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.list().await;
            Message::TasksLoaded { owner, result }
        });
    }

    /// Applies `change` locally and sends it to the server.
    pub fn change_stage(&mut self, change: StageChange) {
        self.board.apply(&change);
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api
                .update_stage(&change.task_id, StagePatch { stage: change.to })
                .await;
            Message::StageSettled { change, result }
        });
    }

    /// Column navigation for the selected task; no-op at either end.
    pub fn step_selected(&mut self, step: Step) {
        let Some(id) = self.board.selected().map(|t| t.id.clone()) else {
            return;
        };
        if let Some(change) = self.board.step(&id, step) {
            self.change_stage(change);
            self.board.focus(&id);
        }
    }

    pub fn start_drag_selected(&mut self) {
        if let Some(id) = self.board.selected().map(|t| t.id.clone()) {
            self.board.start_drag(&id);
        }
    }

    pub fn start_drag(&mut self, id: &str) {
        self.board.start_drag(id);
    }

    /// Drops the dragged task on a column; dropping on its own column does nothing.
    pub fn drop_dragged(&mut self, target: Stage) {
        let dragged = self.board.dragging().map(|t| t.id.clone());
        if let Some(change) = self.board.finish_drag(target) {
            self.change_stage(change);
        }
        if let Some(id) = dragged {
            self.board.focus(&id);
        }
    }

    pub fn drop_on_trash(&mut self) {
        if let Some(id) = self.board.take_drag() {
            self.request_delete(id);
        }
    }

    pub fn request_delete(&mut self, id: TaskId) {
        self.confirm_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = None;
    }

    /// Removes the confirmed task locally and deletes it on the server.
    pub fn confirm_delete(&mut self) {
        let Some(id) = self.confirm_delete.take() else {
            return;
        };
        self.board.remove(&id);
        self.stats = DashboardStats::from_tasks(self.board.tasks());
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.delete(&id).await;
            Message::DeleteSettled { id, result }
        });
    }

    fn load_task(&mut self, id: TaskId) {
        self.store.dispatch(Action::SetLoading(true));
        let api = Arc::clone(&self.api);
        self.spawn(async move { Message::TaskLoaded(api.get(&id).await) });
    }

    pub fn submit_task_form(&mut self) {
        let editing = match self.nav.current() {
            Route::AddEditForm { edit } => edit.clone(),
            _ => return,
        };
        let user_id = self
            .store
            .state()
            .user
            .as_ref()
            .map(|u| u.id.clone())
            .unwrap_or_default();
        let Some(payload) = self.task_form.payload(&user_id) else {
            return;
        };
        self.store.dispatch(Action::SetLoading(true));
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = match &editing {
                Some(id) => api.replace(id, &payload).await,
                None => api.create(&payload).await,
            };
            Message::TaskSaved {
                editing: editing.is_some(),
                result,
            }
        });
    }

    pub fn check_captcha(&mut self) {
        if self.login.captcha.check() {
            self.login.set_focus(LoginForm::EMAIL);
        }
    }

    pub fn submit_login(&mut self) {
        if !self.login.can_submit() {
            return;
        }
        self.store.dispatch(Action::SetLoading(true));
        self.login.error = None;
        let identity = Arc::clone(&self.identity);
        let email = self.login.email.trim().to_string();
        let password = self.login.password.clone();
        self.spawn(async move { Message::SignedIn(identity.sign_in(&email, &password).await) });
    }

    pub fn submit_register(&mut self) {
        if !self.register.validate() {
            return;
        }
        self.store.dispatch(Action::SetLoading(true));
        let identity = Arc::clone(&self.identity);
        let name = self.register.name.trim().to_string();
        let email = self.register.email.trim().to_string();
        let password = self.register.password.clone();
        self.spawn(async move {
            let result = async {
                identity.create_account(&email, &password).await?;
                identity.update_profile(&name).await
            }
            .await;
            Message::Registered(result)
        });
    }

    pub fn logout(&mut self) {
        self.store.dispatch(Action::SetLoading(true));
        let identity = Arc::clone(&self.identity);
        self.spawn(async move { Message::SignedOut(identity.sign_out().await) });
    }

    pub fn dismiss_toast(&mut self) {
        self.store.dispatch(Action::HideToast);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::kanban_board::tests::task;
    use crate::store::{ToastKind, User};
    use crate::task::TaskPayload;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::watch;

    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub tasks: Mutex<Vec<Task>>,
        pub fail_writes: AtomicBool,
        pub fail_reads: AtomicBool,
        pub writes: AtomicUsize,
        pub saved: Mutex<Vec<(Option<String>, TaskPayload)>>,
    }

    impl FakeApi {
        pub(crate) fn with_tasks(tasks: Vec<Task>) -> Self {
            Self {
                tasks: Mutex::new(tasks),
                ..Self::default()
            }
        }

        fn write(&self) -> Result<(), ApiError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(ApiError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: Some("boom".into()),
                })
            } else {
                Ok(())
            }
        }

        fn read(&self) -> Result<(), ApiError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                Err(ApiError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: None,
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TaskApi for FakeApi {
        async fn list(&self) -> Result<Vec<Task>, ApiError> {
            self.read()?;
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn get(&self, id: &str) -> Result<Task, ApiError> {
            self.read()?;
            self.tasks
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or(ApiError::Status {
                    status: StatusCode::NOT_FOUND,
                    message: None,
                })
        }

        async fn create(&self, payload: &TaskPayload) -> Result<(), ApiError> {
            self.write()?;
            self.saved.lock().unwrap().push((None, payload.clone()));
            Ok(())
        }

        async fn replace(&self, id: &str, payload: &TaskPayload) -> Result<(), ApiError> {
            self.write()?;
            self.saved
                .lock()
                .unwrap()
                .push((Some(id.to_string()), payload.clone()));
            Ok(())
        }

        async fn update_stage(&self, id: &str, patch: StagePatch) -> Result<(), ApiError> {
            self.write()?;
            if let Some(t) = self.tasks.lock().unwrap().iter_mut().find(|t| t.id == id) {
                t.stage = patch.stage;
            }
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<(), ApiError> {
            self.write()?;
            self.tasks.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }
    }

    pub(crate) struct FakeIdentity {
        state: watch::Sender<Option<AuthUser>>,
        pub reject_with: Mutex<Option<AuthError>>,
        pub accounts: Mutex<Vec<String>>,
        pub display_names: Mutex<Vec<String>>,
    }

    impl Default for FakeIdentity {
        fn default() -> Self {
            let (state, _) = watch::channel(None);
            Self {
                state,
                reject_with: Mutex::new(None),
                accounts: Mutex::new(Vec::new()),
                display_names: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthUser, AuthError> {
            if let Some(err) = self.reject_with.lock().unwrap().take() {
                return Err(err);
            }
            let user = AuthUser {
                uid: "me".into(),
                display_name: Some("Ada".into()),
                email: Some(email.to_string()),
            };
            self.state.send_replace(Some(user.clone()));
            Ok(user)
        }

        async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
            self.accounts.lock().unwrap().push(email.to_string());
            self.sign_in(email, password).await
        }

        async fn update_profile(&self, display_name: &str) -> Result<(), AuthError> {
            self.display_names.lock().unwrap().push(display_name.to_string());
            Ok(())
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            self.state.send_replace(None);
            Ok(())
        }

        fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
            self.state.subscribe()
        }
    }

    fn me() -> User {
        User {
            id: "me".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }
    }

    fn signed_in_app(api: Arc<FakeApi>, start: Route) -> (App, mpsc::UnboundedReceiver<Message>) {
        let mut store = Store::default();
        store.dispatch(Action::AuthStateChanged(Some(me())));
        let (mut app, rx) = App::new(api, Arc::new(FakeIdentity::default()), store, start);
        app.sync_route();
        (app, rx)
    }

    async fn settle(app: &mut App, rx: &mut mpsc::UnboundedReceiver<Message>) {
        let message = rx.recv().await.expect("message");
        app.handle(message);
    }

    fn board_tasks() -> Vec<Task> {
        vec![task("a", 0, "me"), task("b", 1, "me"), task("z", 2, "other")]
    }

    async fn board_app(api: Arc<FakeApi>) -> (App, mpsc::UnboundedReceiver<Message>) {
        let (mut app, mut rx) = signed_in_app(api, Route::TaskManagement);
        assert!(app.store.state().is_loading);
        settle(&mut app, &mut rx).await;
        assert!(!app.store.state().is_loading);
        (app, rx)
    }

    fn toast(app: &App) -> (String, ToastKind) {
        let toast = app.store.state().toast.clone().expect("toast");
        (toast.message, toast.kind)
    }

    #[tokio::test]
    async fn board_fetch_filters_by_owner() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (app, _rx) = board_app(api).await;
        assert_eq!(app.board.tasks().len(), 2);
        assert!(app.board.task("z").is_none());
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_empty_board() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        api.fail_reads.store(true, Ordering::SeqCst);
        let (app, _rx) = board_app(api).await;
        assert!(app.board.tasks().is_empty());
        assert!(app.store.state().toast.is_none());
    }

    #[tokio::test]
    async fn stage_update_success_confirms_with_toast() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (mut app, mut rx) = board_app(Arc::clone(&api)).await;

        app.board.focus("a");
        app.step_selected(Step::Forward);
        assert_eq!(app.board.task("a").unwrap().stage, Stage::TODO);
        assert_eq!(app.board.selected().unwrap().id, "a");

        settle(&mut app, &mut rx).await;
        assert_eq!(app.board.task("a").unwrap().stage, Stage::TODO);
        assert_eq!(
            toast(&app),
            ("Task updated successfully".to_string(), ToastKind::Success)
        );
        assert_eq!(api.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stage_update_failure_rolls_back() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (mut app, mut rx) = board_app(Arc::clone(&api)).await;
        api.fail_writes.store(true, Ordering::SeqCst);

        app.start_drag("b");
        app.drop_dragged(Stage::DONE);
        assert_eq!(app.board.task("b").unwrap().stage, Stage::DONE);

        settle(&mut app, &mut rx).await;
        assert_eq!(app.board.task("b").unwrap().stage, Stage::TODO);
        assert_eq!(
            toast(&app),
            ("Failed to update task".to_string(), ToastKind::Error)
        );
    }

    #[tokio::test]
    async fn drop_on_same_column_sends_nothing() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (mut app, mut rx) = board_app(Arc::clone(&api)).await;

        app.start_drag("b");
        app.drop_dragged(Stage::TODO);
        tokio::task::yield_now().await;

        assert!(rx.try_recv().is_err());
        assert_eq!(api.writes.load(Ordering::SeqCst), 0);
        assert_eq!(app.board.task("b").unwrap().stage, Stage::TODO);
        assert!(!app.board.is_dragging());
    }

    #[tokio::test]
    async fn step_at_boundary_sends_nothing() {
        let api = Arc::new(FakeApi::with_tasks(vec![task("a", 0, "me"), task("d", 3, "me")]));
        let (mut app, mut rx) = board_app(Arc::clone(&api)).await;

        app.board.focus("a");
        app.step_selected(Step::Backward);
        app.board.focus("d");
        app.step_selected(Step::Forward);
        tokio::task::yield_now().await;

        assert!(rx.try_recv().is_err());
        assert_eq!(api.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delete_success_keeps_task_removed() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (mut app, mut rx) = board_app(Arc::clone(&api)).await;

        app.request_delete("a".into());
        app.confirm_delete();
        assert!(app.board.task("a").is_none());
        settle(&mut app, &mut rx).await;
        assert!(app.board.task("a").is_none());
        assert_eq!(
            toast(&app),
            ("Task deleted successfully".to_string(), ToastKind::Success)
        );
    }

    #[tokio::test]
    async fn delete_failure_refetches_and_task_reappears() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (mut app, mut rx) = board_app(Arc::clone(&api)).await;
        api.fail_writes.store(true, Ordering::SeqCst);

        app.start_drag("a");
        app.drop_on_trash();
        assert_eq!(app.confirm_delete.as_deref(), Some("a"));
        app.confirm_delete();
        assert!(app.board.task("a").is_none());

        settle(&mut app, &mut rx).await;
        assert_eq!(
            toast(&app),
            ("Error deleting task".to_string(), ToastKind::Error)
        );
        assert!(app.store.state().is_loading);

        settle(&mut app, &mut rx).await;
        assert!(app.board.task("a").is_some());
    }

    #[tokio::test]
    async fn cancelled_delete_keeps_task() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (mut app, _rx) = board_app(Arc::clone(&api)).await;
        app.request_delete("a".into());
        app.cancel_delete();
        app.confirm_delete();
        assert!(app.board.task("a").is_some());
        assert_eq!(api.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dashboard_stats_follow_fetch() {
        let api = Arc::new(FakeApi::with_tasks(vec![
            task("a", 3, "me"),
            task("b", 1, "me"),
            task("c", 3, "other"),
        ]));
        let (mut app, mut rx) = signed_in_app(api, Route::Dashboard);
        settle(&mut app, &mut rx).await;
        assert_eq!(app.stats.total, 2);
        assert_eq!(app.stats.done, 1);
        assert_eq!(app.stats.pending, 1);
        assert_eq!(app.stats.progress, 50.0);
    }

    #[tokio::test]
    async fn guard_holds_then_redirects_anonymous_user() {
        let api = Arc::new(FakeApi::default());
        let identity = Arc::new(FakeIdentity::default());
        let (mut app, mut rx) = App::new(api, identity, Store::default(), Route::Dashboard);
        app.sync_route();
        assert_eq!(app.guard(), Guard::Pending);
        assert_eq!(app.route(), &Route::Dashboard);

        app.spawn_auth_bridge();
        settle(&mut app, &mut rx).await;
        assert_eq!(app.route(), &Route::Login);
        assert!(!app.nav.back());
    }

    #[tokio::test]
    async fn login_flow_lands_on_dashboard() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let identity = Arc::new(FakeIdentity::default());
        let (mut app, mut rx) = App::new(api, identity, Store::default(), Route::Login);
        app.spawn_auth_bridge();
        settle(&mut app, &mut rx).await;
        assert_eq!(app.route(), &Route::Login);

        app.submit_login();
        assert!(!app.store.state().is_loading, "captcha must be solved first");

        app.login.captcha = crate::forms::Captcha::new(2, 3);
        app.login.captcha.answer = "5".into();
        app.check_captcha();
        app.login.email = "ada@example.com".into();
        app.login.password = "secret".into();
        app.submit_login();
        assert!(app.store.state().is_loading);

        // Sign-in result and the bridge notification may arrive in either order.
        while app.route() != &Route::Dashboard || app.store.state().toast.is_none() {
            settle(&mut app, &mut rx).await;
        }
        assert!(app.store.state().is_authenticated);
        assert_eq!(
            toast(&app),
            ("Successfully logged in".to_string(), ToastKind::Success)
        );
    }

    #[tokio::test]
    async fn signed_in_user_on_login_is_sent_to_dashboard() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (mut app, _rx) = signed_in_app(api, Route::Login);
        assert_eq!(app.route(), &Route::Dashboard);
        assert!(!app.nav.back(), "login must not stay in history");
        assert_eq!(app.route(), &Route::Dashboard);
    }

    #[tokio::test]
    async fn register_creates_account_and_returns_to_login() {
        let identity = Arc::new(FakeIdentity::default());
        let (mut app, mut rx) = App::new(
            Arc::new(FakeApi::default()),
            Arc::clone(&identity) as Arc<dyn IdentityProvider>,
            Store::default(),
            Route::Register,
        );
        app.sync_route();
        app.register.name = "Grace Hopper".into();
        app.register.username = "grace".into();
        app.register.email = "grace@example.com".into();
        app.register.password = "hopper1".into();

        app.submit_register();
        assert!(app.store.state().is_loading);
        settle(&mut app, &mut rx).await;

        assert!(!app.store.state().is_loading);
        assert_eq!(app.register.error, None);
        assert_eq!(*identity.accounts.lock().unwrap(), ["grace@example.com"]);
        assert_eq!(*identity.display_names.lock().unwrap(), ["Grace Hopper"]);
        assert_eq!(
            toast(&app),
            ("Successfully registered".to_string(), ToastKind::Success)
        );
        assert_eq!(app.route(), &Route::Login);
    }

    #[tokio::test]
    async fn login_error_is_mapped_for_display() {
        let identity = Arc::new(FakeIdentity::default());
        *identity.reject_with.lock().unwrap() = Some(AuthError::WrongPassword);
        let (mut app, mut rx) = App::new(
            Arc::new(FakeApi::default()),
            identity,
            Store::default(),
            Route::Login,
        );
        app.login.captcha.validated = true;
        app.submit_login();
        settle(&mut app, &mut rx).await;
        assert_eq!(app.login.error.as_deref(), Some("Wrong password"));
        assert!(!app.store.state().is_loading);
    }

    #[tokio::test]
    async fn logout_clears_state_and_returns_to_login() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (mut app, mut rx) = board_app(api).await;
        app.logout();
        settle(&mut app, &mut rx).await;
        assert_eq!(app.route(), &Route::Login);
        assert!(!app.store.state().is_authenticated);
        assert!(app.board.tasks().is_empty());
        assert_eq!(
            toast(&app),
            ("Successfully logged out".to_string(), ToastKind::Success)
        );
    }

    #[tokio::test]
    async fn edit_form_loads_and_saves_task() {
        let api = Arc::new(FakeApi::with_tasks(board_tasks()));
        let (mut app, mut rx) = signed_in_app(Arc::clone(&api), Route::edit("b"));
        settle(&mut app, &mut rx).await;
        assert_eq!(app.task_form.title, "task b");
        assert_eq!(app.task_form.stage, Stage::TODO);

        app.task_form.title = "renamed".into();
        app.submit_task_form();
        settle(&mut app, &mut rx).await;

        let saved = api.saved.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0.as_deref(), Some("b"));
        assert_eq!(saved[0].1.title, "renamed");
        assert_eq!(saved[0].1.user_id, "me");
        assert_eq!(
            toast(&app),
            ("Task updated successfully!".to_string(), ToastKind::Success)
        );
        assert_eq!(app.route(), &Route::TaskManagement);
    }

    #[tokio::test]
    async fn create_failure_reports_server_message() {
        let api = Arc::new(FakeApi::default());
        api.fail_writes.store(true, Ordering::SeqCst);
        let (mut app, mut rx) = signed_in_app(Arc::clone(&api), Route::create());
        app.task_form.title = "new".into();
        app.task_form.deadline = "2025-06-01".into();
        app.task_form.priority = Some(crate::task::Priority::Low);
        app.submit_task_form();
        settle(&mut app, &mut rx).await;
        assert_eq!(
            toast(&app),
            ("Error creating task. boom".to_string(), ToastKind::Error)
        );
        assert_eq!(app.route(), &Route::create());
    }

    #[tokio::test]
    async fn invalid_register_form_sends_nothing() {
        let (mut app, _rx) = App::new(
            Arc::new(FakeApi::default()),
            Arc::new(FakeIdentity::default()),
            Store::default(),
            Route::Register,
        );
        app.sync_route();
        app.submit_register();
        assert!(!app.store.state().is_loading);
        assert_eq!(
            app.register.error.as_deref(),
            Some("Please correct the errors above.")
        );
    }
}
