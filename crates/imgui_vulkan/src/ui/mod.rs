//! Contract types shared with the UI widget library
//!
//! The widget library itself is an external collaborator. These modules
//! define the two structures the backend exchanges with it: the draw
//! data snapshot produced each frame and the I/O state object the
//! backend writes timing and input into.

pub mod draw;
pub mod io;
