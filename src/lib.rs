pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod event;
pub mod forms;
pub mod kanban_board;
pub mod logging;
pub mod route;
pub mod store;
pub mod task;
pub mod ui;
