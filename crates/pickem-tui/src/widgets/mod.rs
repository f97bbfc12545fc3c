// TUI widget modules for each screen zone.

pub mod games;
pub mod login;
pub mod notice_bar;
pub mod quit_confirm;
pub mod selectors;
pub mod status_bar;
