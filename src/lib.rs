//! Focus-session engine: keeps only allow-listed windows visible and
//! silences notifications while a session runs.

pub mod config;
pub mod error;
pub mod mappings;
pub mod model;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{FocusError, Result};
pub use model::{AllowList, DependencyReport, EnvironmentInfo, WindowRecord};
pub use services::SessionEngine;
