pub mod manager;

pub use manager::{AppSettings, Config, ConfigManager, ConfigOverrides, ServerSettings};
