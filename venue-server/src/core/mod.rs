//! Configuration, state and server lifecycle

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::{Config, Environment};
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
