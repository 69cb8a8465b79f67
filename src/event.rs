use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::app::App;
use crate::forms::{FormInput, LoginForm};
use crate::kanban_board::Step;
use crate::route::{Guard, Route};
use crate::ui;

/// Routes one terminal event into the app. `area` is the full terminal size,
/// needed to hit-test mouse events against the board layout.
pub fn handle_event(app: &mut App, event: Event, area: Rect) {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Mouse(mouse) => handle_mouse(app, mouse, area),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.confirm_delete.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Esc => app.cancel_delete(),
            _ => {}
        }
        return;
    }

    if app.store.state().is_authenticated {
        match key.code {
            KeyCode::F(1) => return app.navigate(Route::Dashboard),
            KeyCode::F(2) => return app.navigate(Route::TaskManagement),
            KeyCode::F(3) => return app.logout(),
            _ => {}
        }
    }

    if screen_hidden(app) {
        return;
    }

    match app.route().clone() {
        Route::Login => login_key(app, key, ctrl),
        Route::Register => register_key(app, key, ctrl),
        Route::Dashboard => match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Esc => app.dismiss_toast(),
            _ => {}
        },
        Route::TaskManagement => board_key(app, key),
        Route::AddEditForm { .. } => task_form_key(app, key),
        Route::NotFound(_) => match key.code {
            KeyCode::Enter => app.navigate(Route::Login),
            KeyCode::Char('q') => app.should_quit = true,
            _ => {}
        },
    }
}

/// Shared text editing; returns false when the key was not an edit.
fn edit_key<F: FormInput>(form: &mut F, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Left => form.cycle_focused(-1),
        KeyCode::Right => form.cycle_focused(1),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.type_char(c),
        _ => return false,
    }
    true
}

fn login_key(app: &mut App, key: KeyEvent, ctrl: bool) {
    if ctrl && key.code == KeyCode::Char('r') {
        return app.navigate(Route::Register);
    }
    if key.code == KeyCode::Enter {
        if app.login.focus == LoginForm::CAPTCHA && !app.login.captcha.validated {
            app.check_captcha();
        } else {
            app.submit_login();
        }
        return;
    }
    edit_key(&mut app.login, key);
}

fn register_key(app: &mut App, key: KeyEvent, ctrl: bool) {
    if ctrl && key.code == KeyCode::Char('l') {
        return app.navigate(Route::Login);
    }
    if key.code == KeyCode::Enter {
        return app.submit_register();
    }
    edit_key(&mut app.register, key);
}

fn task_form_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_task_form(),
        KeyCode::Esc => app.navigate(Route::TaskManagement),
        _ => {
            edit_key(&mut app.task_form, key);
        }
    }
}

fn board_key(app: &mut App, key: KeyEvent) {
    if app.board.is_dragging() {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.board.select_column(-1),
            KeyCode::Right | KeyCode::Char('l') => app.board.select_column(1),
            KeyCode::Char(' ') | KeyCode::Enter => {
                let target = app.board.selected_stage;
                app.drop_dragged(target);
            }
            KeyCode::Char('t') | KeyCode::Delete => app.drop_on_trash(),
            KeyCode::Esc => app.board.cancel_drag(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.dismiss_toast(),
        KeyCode::Left | KeyCode::Char('h') => app.board.select_column(-1),
        KeyCode::Right | KeyCode::Char('l') => app.board.select_column(1),
        KeyCode::Up | KeyCode::Char('k') => app.board.select_task(-1),
        KeyCode::Down | KeyCode::Char('j') => app.board.select_task(1),
        KeyCode::Char('[') | KeyCode::Char('<') => app.step_selected(Step::Backward),
        KeyCode::Char(']') | KeyCode::Char('>') => app.step_selected(Step::Forward),
        KeyCode::Char(' ') => app.start_drag_selected(),
        KeyCode::Char('n') => app.navigate(Route::create()),
        KeyCode::Char('e') => {
            if let Some(id) = app.board.selected().map(|t| t.id.clone()) {
                app.navigate(Route::edit(id));
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(id) = app.board.selected().map(|t| t.id.clone()) {
                app.request_delete(id);
            }
        }
        _ => {}
    }
}

/// Nothing but the toast is on screen until the guard settles or a fetch ends.
fn screen_hidden(app: &App) -> bool {
    app.guard() == Guard::Pending || app.store.state().is_loading
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, area: Rect) {
    let (x, y) = (mouse.column, mouse.row);
    let hidden = screen_hidden(app);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if ui::over_toast(app, area, x, y) {
                return app.dismiss_toast();
            }
            if hidden || app.confirm_delete.is_some() || *app.route() != Route::TaskManagement {
                return;
            }
            if let Some(id) = ui::task_at(app, area, x, y) {
                app.board.focus(&id);
                app.start_drag(&id);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if hidden {
                return;
            }
            if let Some(stage) = ui::column_at(app, area, x, y) {
                if app.board.is_dragging() {
                    app.board.selected_stage = stage;
                }
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if !app.board.is_dragging() {
                return;
            }
            if hidden {
                return app.board.cancel_drag();
            }
            if ui::over_trash(app, area, x, y) {
                app.drop_on_trash();
            } else if let Some(stage) = ui::column_at(app, area, x, y) {
                app.drop_dragged(stage);
            } else {
                app.board.cancel_drag();
            }
        }
        _ => {}
    }
}
