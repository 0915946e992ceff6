//! API request handlers

mod cycles;
mod health;
mod tracking;

pub use cycles::*;
pub use health::*;
pub use tracking::*;
