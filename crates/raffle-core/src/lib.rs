// Library root: re-exports all modules so integration tests and the TUI crate
// can access the public API.

pub mod app;
pub mod config;
pub mod db;
pub mod draw;
pub mod protocol;
pub mod store;
