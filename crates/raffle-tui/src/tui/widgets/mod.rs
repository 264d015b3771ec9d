// TUI widget modules for each screen panel.

pub mod confirm;
pub mod setup_form;
pub mod status_bar;
pub mod ticket;
pub mod winners;
