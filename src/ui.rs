use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::forms::{LoginForm, RegisterForm, TaskForm};
use crate::route::{Guard, Route};
use crate::store::ToastKind;
use crate::task::{Priority, Stage, Task, TaskId};

/// Rows taken by one task card inside a column.
pub const CARD_HEIGHT: u16 = 3;

const TOAST_WIDTH: u16 = 40;

const INDIGO: Color = Color::Rgb(79, 70, 229);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub nav: Option<Rect>,
    pub body: Rect,
    pub footer: Rect,
}

pub fn screen(area: Rect, show_nav: bool) -> Screen {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(if show_nav { 1 } else { 0 }),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);
    Screen {
        nav: show_nav.then_some(chunks[0]),
        body: chunks[1],
        footer: chunks[2],
    }
}

fn app_screen(app: &App, area: Rect) -> Screen {
    screen(area, app.store.state().is_authenticated)
}

pub fn board_columns(body: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(body)
        .to_vec()
}

pub fn trash_area(body: Rect) -> Rect {
    let width = 12.min(body.width);
    let height = 3.min(body.height);
    Rect {
        x: body.x + body.width - width,
        y: body.y + body.height - height,
        width,
        height,
    }
}

fn contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn inner(rect: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(rect)
}

/// Index of the first card drawn in a column, keeping the cursor visible.
fn first_visible(selected: Option<usize>, count: usize, height: u16) -> usize {
    let visible = (height / CARD_HEIGHT).max(1) as usize;
    match selected {
        Some(selected) if selected >= visible => (selected + 1 - visible).min(count),
        _ => 0,
    }
}

fn card_rects(column: Rect, first: usize, count: usize) -> Vec<(usize, Rect)> {
    let area = inner(column);
    (first..count)
        .enumerate()
        .map(|(row, index)| {
            let y = area.y + row as u16 * CARD_HEIGHT;
            (index, Rect { x: area.x, y, width: area.width, height: CARD_HEIGHT })
        })
        .take_while(|(_, rect)| rect.y + CARD_HEIGHT <= area.y + area.height)
        .collect()
}

fn column_cursor(app: &App, stage: Stage) -> Option<usize> {
    (app.board.selected_stage == stage).then_some(app.board.selected_task)
}

/// Column under a terminal cell on the task board.
pub fn column_at(app: &App, area: Rect, x: u16, y: u16) -> Option<Stage> {
    let body = app_screen(app, area).body;
    board_columns(body)
        .into_iter()
        .zip(Stage::ALL)
        .find(|(rect, _)| contains(*rect, x, y))
        .map(|(_, stage)| stage)
}

/// Task card under a terminal cell on the task board.
pub fn task_at(app: &App, area: Rect, x: u16, y: u16) -> Option<TaskId> {
    let body = app_screen(app, area).body;
    let columns = board_columns(body);
    let stage = column_at(app, area, x, y)?;
    let column = columns[stage.index()];
    let tasks = app.board.tasks_in(stage);
    let first = first_visible(column_cursor(app, stage), tasks.len(), inner(column).height);
    card_rects(column, first, tasks.len())
        .into_iter()
        .find(|(_, rect)| contains(*rect, x, y))
        .map(|(index, _)| tasks[index].id.clone())
}

pub fn over_trash(app: &App, area: Rect, x: u16, y: u16) -> bool {
    app.board.is_dragging() && contains(trash_area(app_screen(app, area).body), x, y)
}

pub fn toast_area(area: Rect) -> Rect {
    let width = TOAST_WIDTH.min(area.width);
    let height = 3.min(area.height);
    Rect {
        x: area.x + area.width - width,
        y: area.y + area.height.saturating_sub(height + 1),
        width,
        height,
    }
}

pub fn over_toast(app: &App, area: Rect, x: u16, y: u16) -> bool {
    app.store.state().toast.is_some() && contains(toast_area(area), x, y)
}

fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let layout = app_screen(app, area);
    let state = app.store.state();

    if let Some(nav) = layout.nav {
        draw_nav(f, app, nav);
    }

    // Screens render nothing while a gating fetch is running.
    let blocked = app.guard() == Guard::Pending || state.is_loading;
    if !blocked {
        match app.route() {
            Route::Login => draw_login(f, &app.login, layout.body),
            Route::Register => draw_register(f, &app.register, layout.body),
            Route::Dashboard => draw_dashboard(f, app, layout.body),
            Route::TaskManagement => draw_board(f, app, layout.body),
            Route::AddEditForm { edit } => draw_task_form(f, &app.task_form, edit.is_some(), layout.body),
            Route::NotFound(_) => draw_not_found(f, layout.body),
        }
    }

    draw_footer(f, app, layout.footer);

    if state.is_loading {
        let spinner = centered(14, 3, layout.body);
        f.render_widget(Clear, spinner);
        f.render_widget(
            Paragraph::new("Loading...")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            spinner,
        );
    }

    if app.confirm_delete.is_some() {
        draw_confirm(f, layout.body);
    }

    if let Some(toast) = &state.toast {
        let rect = toast_area(area);
        let (icon, color) = match toast.kind {
            ToastKind::Success => ("✔", Color::Green),
            ToastKind::Error => ("✘", Color::Red),
        };
        f.render_widget(Clear, rect);
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!("{icon} "), Style::default().fg(color)),
                Span::raw(toast.message.as_str()),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            ),
            rect,
        );
    }
}

fn draw_nav(f: &mut Frame, app: &App, area: Rect) {
    let link = |label: &'static str, route: Route| {
        let style = if *app.route() == route {
            Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Span::styled(label, style)
    };
    let user = app
        .store
        .state()
        .user
        .as_ref()
        .map(|u| if u.name.is_empty() { u.email.clone() } else { u.name.clone() })
        .unwrap_or_default();
    let line = Line::from(vec![
        Span::styled(" Task Manager ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        link("[F1] Dashboard", Route::Dashboard),
        Span::raw("  "),
        link("[F2] Task Management", Route::TaskManagement),
        Span::raw("  [F3] Logout  "),
        Span::styled(user, Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(INDIGO)),
        area,
    );
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let help = match app.route() {
        Route::Login => "Tab: next field · Enter: check answer / log in · Ctrl+R: register · Ctrl+C: quit",
        Route::Register => "Tab: next field · Enter: register · Ctrl+L: log in · Ctrl+C: quit",
        Route::Dashboard => "F2: tasks · F3: logout · q: quit",
        Route::TaskManagement if app.board.is_dragging() => {
            "←/→: pick column · Space: drop · t: drop on trash · Esc: cancel"
        }
        Route::TaskManagement => {
            "←/→ ↑/↓: move · [ ]: change stage · Space: drag · n: new · e: edit · d: delete · q: quit"
        }
        Route::AddEditForm { .. } => "Tab: next field · ←/→: change choice · Enter: save · Esc: cancel",
        Route::NotFound(_) => "Enter: back to login · q: quit",
    };
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn field<'a>(label: &'a str, value: String, focused: bool, error: Option<&'a str>) -> Vec<Line<'a>> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let cursor = if focused { "▏" } else { "" };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{label}: "), style.add_modifier(Modifier::BOLD)),
        Span::raw(value),
        Span::styled(cursor, style),
    ])];
    if let Some(error) = error {
        lines.push(Line::from(Span::styled(error, Style::default().fg(Color::Red))));
    }
    lines
}

fn masked(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

fn form_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn draw_login(f: &mut Frame, form: &LoginForm, area: Rect) {
    let mut lines = Vec::new();
    lines.extend(field("Email", form.email.clone(), form.focus == LoginForm::EMAIL, None));
    lines.extend(field(
        "Password",
        masked(&form.password),
        form.focus == LoginForm::PASSWORD,
        None,
    ));
    lines.push(Line::raw(""));
    lines.push(Line::raw(form.captcha.question()));
    if form.captcha.validated {
        lines.push(Line::from(Span::styled(
            "✔ Verified Human",
            Style::default().fg(Color::Green),
        )));
    } else {
        lines.extend(field(
            "Answer",
            form.captcha.answer.clone(),
            form.focus == LoginForm::CAPTCHA,
            form.captcha
                .failed
                .then_some("Incorrect answer, please try again!"),
        ));
    }
    lines.push(Line::raw(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))));
    }
    let button = if form.can_submit() {
        Style::default().fg(Color::Black).bg(INDIGO)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(Span::styled(" Log In ", button)));
    lines.push(Line::raw("Don't have an account? Register (Ctrl+R)"));

    f.render_widget(
        Paragraph::new(lines).block(form_block(" LogIn ")).wrap(Wrap { trim: false }),
        centered(60, 16, area),
    );
}

fn draw_register(f: &mut Frame, form: &RegisterForm, area: Rect) {
    let errors = form.errors;
    let mut lines = Vec::new();
    lines.extend(field(
        "Name",
        form.name.clone(),
        form.focus == RegisterForm::NAME,
        errors.name.then_some("Name must be at least 3 characters"),
    ));
    lines.extend(field(
        "Username",
        form.username.clone(),
        form.focus == RegisterForm::USERNAME,
        errors.username.then_some("Username must be at least 3 characters"),
    ));
    lines.extend(field(
        "Email",
        form.email.clone(),
        form.focus == RegisterForm::EMAIL,
        errors.email.then_some("Invalid email format"),
    ));
    lines.extend(field(
        "Contact number",
        form.contact_number.clone(),
        form.focus == RegisterForm::CONTACT,
        None,
    ));
    lines.extend(field(
        "Password",
        masked(&form.password),
        form.focus == RegisterForm::PASSWORD,
        errors.password.then_some("Password must be at least 6 characters"),
    ));
    lines.push(Line::raw(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))));
    }
    lines.push(Line::raw("Already have an account? Log in (Ctrl+L)"));

    f.render_widget(
        Paragraph::new(lines).block(form_block(" Register ")).wrap(Wrap { trim: false }),
        centered(64, 18, area),
    );
}

fn draw_dashboard(f: &mut Frame, app: &App, area: Rect) {
    if app.store.state().user.is_none() {
        return;
    }
    let stats = app.stats;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);
    f.render_widget(
        Paragraph::new("Dashboard")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD)),
        rows[0],
    );

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(rows[1]);
    let counts = [
        ("Total Tasks", stats.total, Color::Blue),
        ("Pending Tasks", stats.pending, Color::Yellow),
        ("Completed Tasks", stats.done, Color::Green),
    ];
    for ((title, count, color), rect) in counts.into_iter().zip(cards.iter()) {
        f.render_widget(
            Paragraph::new(count.to_string())
                .alignment(Alignment::Center)
                .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .block(Block::default().title(title).borders(Borders::ALL)),
            *rect,
        );
    }

    f.render_widget(
        Gauge::default()
            .block(Block::default().title("Task Progress").borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Green))
            .percent(stats.rounded_progress().min(100))
            .label(format!("{}% Done", stats.rounded_progress())),
        rows[2],
    );
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::Low => Style::default().fg(Color::Green),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::High => Style::default().fg(Color::Red),
    }
}

fn card(task: &Task, selected: bool, dragged: bool) -> Paragraph<'_> {
    let mut title_style = Style::default().add_modifier(Modifier::BOLD);
    if selected {
        title_style = title_style.fg(Color::Cyan);
    }
    if dragged {
        title_style = title_style.add_modifier(Modifier::DIM | Modifier::ITALIC);
    }
    let marker = if selected { "▶ " } else { "  " };
    let back = if task.stage.backward().is_some() { "<" } else { " " };
    let forward = if task.stage.forward().is_some() { ">" } else { " " };
    Paragraph::new(vec![
        Line::from(vec![
            Span::raw(marker),
            Span::styled(task.title.as_str(), title_style),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(task.priority.label(), priority_style(task.priority)),
            Span::raw(format!("  Due: {}", task.formatted_deadline())),
        ]),
        Line::from(Span::styled(
            format!("  {back} Stage: {} {forward}", task.stage),
            Style::default().fg(Color::DarkGray),
        )),
    ])
}

fn draw_board(f: &mut Frame, app: &App, area: Rect) {
    let dragged = app.board.dragging().map(|t| t.id.as_str());
    for (stage, column) in Stage::ALL.into_iter().zip(board_columns(area)) {
        let tasks = app.board.tasks_in(stage);
        let focused = app.board.selected_stage == stage;
        let border = match (focused, dragged.is_some()) {
            (true, true) => Style::default().fg(Color::Magenta),
            (true, false) => Style::default().fg(Color::Cyan),
            _ => Style::default(),
        };
        f.render_widget(
            Block::default()
                .title(format!("{} ({})", stage.title(), tasks.len()))
                .borders(Borders::ALL)
                .border_style(border),
            column,
        );

        let cursor = column_cursor(app, stage);
        let first = first_visible(cursor, tasks.len(), inner(column).height);
        for (index, rect) in card_rects(column, first, tasks.len()) {
            let task = tasks[index];
            f.render_widget(
                card(task, cursor == Some(index), dragged == Some(task.id.as_str())),
                rect,
            );
        }
    }

    if dragged.is_some() {
        let trash = trash_area(area);
        f.render_widget(Clear, trash);
        f.render_widget(
            Paragraph::new("🗑 Trash")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::White).bg(Color::Red))
                .block(Block::default().borders(Borders::ALL)),
            trash,
        );
    }
}

fn draw_task_form(f: &mut Frame, form: &TaskForm, editing: bool, area: Rect) {
    let errors = form.errors;
    let mut lines = Vec::new();
    lines.extend(field(
        "Title",
        form.title.clone(),
        form.focus == TaskForm::TITLE,
        errors.title.then_some("Title is required"),
    ));
    lines.extend(field(
        "Description",
        form.description.clone(),
        form.focus == TaskForm::DESCRIPTION,
        None,
    ));
    lines.extend(field(
        "Deadline (YYYY-MM-DD)",
        form.deadline.clone(),
        form.focus == TaskForm::DEADLINE,
        errors.deadline.then_some("Deadline is required"),
    ));
    lines.extend(field(
        "Priority",
        form.priority
            .map(|p| format!("< {} >", p.label()))
            .unwrap_or_else(|| "< Select Priority >".to_string()),
        form.focus == TaskForm::PRIORITY,
        errors.priority.then_some("Priority is required"),
    ));
    lines.extend(field(
        "Stage",
        format!("< {} ({}) >", form.stage.title(), form.stage),
        form.focus == TaskForm::STAGE,
        None,
    ));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        if editing { " Update Task " } else { " Create Task " },
        Style::default().fg(Color::Black).bg(INDIGO),
    )));

    let title = if editing { " Edit Task " } else { " Create Task " };
    f.render_widget(
        Paragraph::new(lines).block(form_block(title)).wrap(Wrap { trim: false }),
        centered(70, 18, area),
    );
}

fn draw_not_found(f: &mut Frame, area: Rect) {
    f.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled("404", Style::default().fg(INDIGO))),
            Line::from(Span::styled(
                "Page not found",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::raw("Sorry, we couldn't find the page you're looking for."),
            Line::raw(""),
            Line::raw("Back to home → (Enter)"),
        ])
        .alignment(Alignment::Center),
        centered(60, 6, area),
    );
}

fn draw_confirm(f: &mut Frame, area: Rect) {
    let rect = centered(50, 6, area);
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(vec![
            Line::raw("Are you sure you want to delete this task?"),
            Line::raw(""),
            Line::from(vec![
                Span::styled(" Delete (y) ", Style::default().fg(Color::White).bg(Color::Red)),
                Span::raw("  "),
                Span::raw(" Cancel (n) "),
            ]),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(" ⚠ Delete Task ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        ),
        rect,
    );
}
