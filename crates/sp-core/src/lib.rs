//! Shared primitives used across Stylepad crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

pub use config::EditorConfig;
pub use error::EditorError;
pub use error::EditorResult;
pub use error::ErrorKind;
