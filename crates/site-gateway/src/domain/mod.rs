//! Domain layer: configuration, environment resolution, input validation
//! and error types.

pub mod config;
pub mod env;
pub mod error;
pub mod sanitize;
pub mod secret;

pub use config::{ConfigError, GatewayConfig};
pub use env::{sanitize_url, ConfigurationError, EnvResolver, EnvSource, MapEnv, SiteEnvironment};
pub use error::{GatewayError, PageError, RevalidateError};
pub use sanitize::{sanitize_path, sanitize_tag, ValidationError};
pub use secret::{constant_time_compare, Secret};
