/// Database configuration and connection management
pub mod database;

/// Application settings loading from config.toml
pub mod settings;

/// Auth provider endpoint configuration from environment variables
pub mod auth;
