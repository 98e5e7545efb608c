pub mod config;
pub mod handlers;
pub mod health;
pub mod range;
pub mod server;

pub use config::Config;
pub use health::HealthState;
pub use server::{AppState, Server};
