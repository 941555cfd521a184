pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod uploads;
pub mod user_models;
pub mod user_storage;

pub use config::Config;
pub use state::AppState;
