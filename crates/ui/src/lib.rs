mod app;
mod ui;

pub use app::{App, Screen, StatusType};
pub use ui::run_app;
