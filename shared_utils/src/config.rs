use thiserror::Error;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A configuration value was present but could not be used.
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue {
        /// Name of the setting (environment variable or config key).
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}
