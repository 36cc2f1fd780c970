//! # Folio Common
//!
//! Shared error types, logging setup and small pure utilities used by
//! every crate in the folio-plot workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod macros;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

// Re-export commonly used types
pub use error::{FolioError, Result};
pub use logging::{init_default_logging, init_logging, LoggingConfig};
pub use utils::{layout, slugify, DEFAULT_SLUG};
