pub mod config;
pub mod handlers;
pub mod server;
pub mod session_registry;
pub mod state;

pub use config::Cli;
pub use server::{configure, run};
pub use state::AppState;
