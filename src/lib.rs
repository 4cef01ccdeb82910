pub mod config;
pub mod error;
pub mod fetch;
pub mod poll;
pub mod server;
pub mod session;
pub mod watch;

pub use error::{AppError, Result};
