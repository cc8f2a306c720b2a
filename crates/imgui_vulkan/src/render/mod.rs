//! Rendering: Vulkan object wrappers, draw-call planning, and the
//! frame-driving backend

pub mod backend;
pub mod draw_plan;
pub mod vulkan;
