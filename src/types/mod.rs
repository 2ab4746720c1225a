//! Type definitions for runstat

mod error;
mod observation;
mod selection;

pub use error::*;
pub use observation::*;
pub use selection::*;
