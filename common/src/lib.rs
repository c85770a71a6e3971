//! Dash Rates Common Types
//!
//! Currency codes, the supported reference set and the parser for the
//! currency selection carried in conversion request paths.

pub mod currency;
pub mod error;
pub mod selection;

pub use currency::*;
pub use error::*;
pub use selection::*;
