pub mod args;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod logger;
pub mod models;
pub mod server;
pub mod service;
pub mod workdir;

pub use args::{AllowList, ArgumentValidator, SanitizedArgs};
pub use config::ConfigManager;
pub use error::{AppError, Result};
pub use executor::Executor;
pub use logger::Logger;
pub use service::AudioService;
pub use workdir::WorkDir;
