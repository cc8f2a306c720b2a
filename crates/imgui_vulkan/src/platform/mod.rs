//! Platform layer: GLFW window and input capability surface

pub mod window;
