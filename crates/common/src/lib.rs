pub mod config;
pub mod errors;
pub mod logging;
pub mod tz;

pub use crate::config::AppConfig;
pub use crate::errors::{EtlError, Result};
pub use crate::tz::TimezoneNormalizer;
