//! Foundation utilities: logging, timing, and math helpers

pub mod logging;
pub mod math;
pub mod time;
