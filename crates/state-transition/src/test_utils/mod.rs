//! Test utilities for the state transition.

mod inspector;
mod interpreter;
mod logging;

pub use inspector::*;
pub use interpreter::*;
pub use logging::*;
