//! Local state and validation for the login, register and task forms.

use std::sync::LazyLock;

use chrono::NaiveDate;
use rand::Rng;
use regex::Regex;

use crate::task::{Priority, Stage, Task, TaskPayload};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());

pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Keyboard editing shared by every form: a focused field that takes text,
/// or a choice field that cycles.
pub trait FormInput {
    fn field_count(&self) -> usize;

    fn focus(&self) -> usize;

    fn set_focus(&mut self, index: usize);

    /// The text behind a field, `None` for choice fields.
    fn text_mut(&mut self, index: usize) -> Option<&mut String>;

    fn cycle(&mut self, _index: usize, _delta: isize) {}

    fn focus_next(&mut self) {
        let next = (self.focus() + 1) % self.field_count();
        self.set_focus(next);
    }

    fn focus_prev(&mut self) {
        let count = self.field_count();
        let prev = (self.focus() + count - 1) % count;
        self.set_focus(prev);
    }

    fn type_char(&mut self, c: char) {
        let focus = self.focus();
        if let Some(text) = self.text_mut(focus) {
            text.push(c);
        }
    }

    fn backspace(&mut self) {
        let focus = self.focus();
        if let Some(text) = self.text_mut(focus) {
            text.pop();
        }
    }

    fn cycle_focused(&mut self, delta: isize) {
        let focus = self.focus();
        self.cycle(focus, delta);
    }
}

/// "What is a + b?" check guarding the login button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captcha {
    pub a: u32,
    pub b: u32,
    pub answer: String,
    pub validated: bool,
    pub failed: bool,
}

impl Captcha {
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            a,
            b,
            answer: String::new(),
            validated: false,
            failed: false,
        }
    }

    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self::new(rng.gen_range(1..=20), rng.gen_range(1..=20))
    }

    pub fn question(&self) -> String {
        format!("What is {} + {}?", self.a, self.b)
    }

    pub fn check(&mut self) -> bool {
        let correct = self.answer.trim().parse::<u32>().ok() == Some(self.a + self.b);
        self.failed = !correct;
        if correct {
            self.validated = true;
        }
        correct
    }
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub captcha: Captcha,
    pub focus: usize,
    pub error: Option<String>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::with_captcha(Captcha::random())
    }
}

impl LoginForm {
    pub const EMAIL: usize = 0;
    pub const PASSWORD: usize = 1;
    pub const CAPTCHA: usize = 2;

    pub fn with_captcha(captcha: Captcha) -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            captcha,
            focus: Self::EMAIL,
            error: None,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.captcha.validated
    }
}

impl FormInput for LoginForm {
    fn field_count(&self) -> usize {
        if self.captcha.validated {
            2
        } else {
            3
        }
    }

    fn focus(&self) -> usize {
        self.focus
    }

    fn set_focus(&mut self, index: usize) {
        self.focus = index;
    }

    fn text_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            Self::EMAIL => Some(&mut self.email),
            Self::PASSWORD => Some(&mut self.password),
            Self::CAPTCHA if !self.captcha.validated => Some(&mut self.captcha.answer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterErrors {
    pub name: bool,
    pub username: bool,
    pub email: bool,
    pub password: bool,
}

impl RegisterErrors {
    pub fn any(&self) -> bool {
        self.name || self.username || self.email || self.password
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub contact_number: String,
    pub password: String,
    pub focus: usize,
    pub errors: RegisterErrors,
    pub error: Option<String>,
}

impl RegisterForm {
    pub const NAME: usize = 0;
    pub const USERNAME: usize = 1;
    pub const EMAIL: usize = 2;
    pub const CONTACT: usize = 3;
    pub const PASSWORD: usize = 4;

    /// Recomputes the per-field errors and reports whether the form may be submitted.
    pub fn validate(&mut self) -> bool {
        self.errors = RegisterErrors {
            name: self.name.chars().count() < 3,
            username: self.username.chars().count() < 3,
            email: !is_valid_email(&self.email),
            password: self.password.chars().count() < 6,
        };
        if self.errors.any() {
            self.error = Some("Please correct the errors above.".to_string());
            false
        } else {
            self.error = None;
            true
        }
    }
}

impl FormInput for RegisterForm {
    fn field_count(&self) -> usize {
        5
    }

    fn focus(&self) -> usize {
        self.focus
    }

    fn set_focus(&mut self, index: usize) {
        self.focus = index;
    }

    fn text_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            Self::NAME => Some(&mut self.name),
            Self::USERNAME => Some(&mut self.username),
            Self::EMAIL => Some(&mut self.email),
            Self::CONTACT => Some(&mut self.contact_number),
            Self::PASSWORD => Some(&mut self.password),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskErrors {
    pub title: bool,
    pub deadline: bool,
    pub priority: bool,
}

impl TaskErrors {
    pub fn any(&self) -> bool {
        self.title || self.deadline || self.priority
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub deadline: String,
    pub priority: Option<Priority>,
    pub stage: Stage,
    pub focus: usize,
    pub errors: TaskErrors,
}

impl TaskForm {
    pub const TITLE: usize = 0;
    pub const DESCRIPTION: usize = 1;
    pub const DEADLINE: usize = 2;
    pub const PRIORITY: usize = 3;
    pub const STAGE: usize = 4;

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            deadline: task.deadline.format(DEADLINE_FORMAT).to_string(),
            priority: Some(task.priority),
            stage: task.stage,
            focus: Self::TITLE,
            errors: TaskErrors::default(),
        }
    }

    fn parsed_deadline(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.deadline.trim(), DEADLINE_FORMAT).ok()
    }

    pub fn validate(&mut self) -> bool {
        self.errors = TaskErrors {
            title: self.title.trim().is_empty(),
            deadline: self.parsed_deadline().is_none(),
            priority: self.priority.is_none(),
        };
        !self.errors.any()
    }

    /// Request body for create or update; `None` while the form is invalid.
    pub fn payload(&mut self, user_id: &str) -> Option<TaskPayload> {
        if !self.validate() {
            return None;
        }
        let description = self.description.trim();
        Some(TaskPayload {
            user_id: user_id.to_string(),
            title: self.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            deadline: self.parsed_deadline()?,
            priority: self.priority?,
            stage: self.stage,
        })
    }
}

impl FormInput for TaskForm {
    fn field_count(&self) -> usize {
        5
    }

    fn focus(&self) -> usize {
        self.focus
    }

    fn set_focus(&mut self, index: usize) {
        self.focus = index;
    }

    fn text_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            Self::TITLE => Some(&mut self.title),
            Self::DESCRIPTION => Some(&mut self.description),
            Self::DEADLINE => Some(&mut self.deadline),
            _ => None,
        }
    }

    fn cycle(&mut self, index: usize, delta: isize) {
        match index {
            Self::PRIORITY => {
                let current = self
                    .priority
                    .and_then(|p| Priority::ALL.iter().position(|&q| q == p));
                let next = match current {
                    Some(i) => (i as isize + delta).rem_euclid(Priority::ALL.len() as isize),
                    None if delta < 0 => Priority::ALL.len() as isize - 1,
                    None => 0,
                };
                self.priority = Some(Priority::ALL[next as usize]);
            }
            Self::STAGE => {
                let next = (self.stage.value() as isize + delta).clamp(0, 3);
                if let Some(stage) = Stage::new(next as u8) {
                    self.stage = stage;
                }
            }
            _ => {}
        }
    }

    fn type_char(&mut self, c: char) {
        match self.focus {
            Self::PRIORITY => {
                self.priority = match c.to_ascii_lowercase() {
                    'l' => Some(Priority::Low),
                    'm' => Some(Priority::Medium),
                    'h' => Some(Priority::High),
                    _ => self.priority,
                }
            }
            Self::STAGE => {
                if let Some(stage) = c.to_digit(10).and_then(|d| Stage::new(d as u8)) {
                    self.stage = stage;
                }
            }
            focus => {
                if let Some(text) = self.text_mut(focus) {
                    text.push(c);
                }
            }
        }
    }
}
