pub mod config;
pub mod error;
pub mod types;

pub use config::OverlayConfig;
pub use error::OverlayError;
pub use types::*;
