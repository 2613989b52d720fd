//! The numeric backend: a narrow capability the driver trains through.
//!
//! [`Native`] builds [`Sequential`] models out of [`crate::layers::Dense`]
//! layers. Anything else implementing [`Backend`] can stand in for it.

mod sequential;
pub mod types;

pub use sequential::{Native, Sequential};
pub use types::*;
