//! Terminal output helpers.

mod accounts;
mod output;

pub use accounts::*;
pub use output::*;
