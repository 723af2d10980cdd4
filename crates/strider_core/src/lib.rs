//! Foundational types shared by the Strider crates.

pub mod errors;
pub mod path;

pub use errors::{CorrectionError, Result};
pub use path::{BonePath, PATH_SEPARATOR};
