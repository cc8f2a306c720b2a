//! Vulkan rendering backend for an immediate-mode GUI library
//!
//! Bridges a UI library's per-frame draw output (vertex/index buffers,
//! clip rectangles, texture bindings) to Vulkan command submission, and
//! manages the window surface and swapchain lifecycle needed to present
//! frames. Windowing goes through GLFW; the graphics API is Vulkan via
//! `ash`.
//!
//! The application owns the window and the message loop. Per frame it
//! calls [`new_frame`] (timing, input, resize check), lets the UI library
//! build its draw data, then invokes the render callback registered in
//! [`ui::UiIo`], which drives [`render`].

pub mod config;
pub mod foundation;
pub mod platform;
pub mod render;
pub mod ui;

pub use config::{ConfigError, PrecompiledShaders, RendererOptions};
pub use platform::window::{Window, WindowError};
pub use render::backend::{initialize, new_frame, render, shutdown};
pub use render::vulkan::{VulkanError, VulkanResult};
pub use ui::draw::{DrawCmd, DrawData, DrawList, DrawVert};
pub use ui::io::{FontAtlas, UiIo, UiKey};
