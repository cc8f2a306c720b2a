//! Vulkan abstraction layer
//!
//! RAII wrappers over the `ash` bindings. Every wrapper owns its handle
//! and a cloned `ash::Device`, and releases the handle in `Drop`, so the
//! declaration order of an owning aggregate fixes the teardown order.

use ash::vk;
use thiserror::Error;

pub mod buffer;
pub mod commands;
pub mod descriptor;
pub mod device;
pub mod framebuffer;
pub mod instance;
pub mod pipeline;
pub mod render_pass;
pub mod surface;
pub mod swapchain;
pub mod sync;
pub mod texture;

pub use buffer::TransientListBuffer;
pub use commands::CommandPool;
pub use descriptor::Descriptors;
pub use device::{DeviceContext, PhysicalDeviceSelection};
pub use framebuffer::Framebuffer;
pub use instance::VulkanInstance;
pub use pipeline::{PipelineBundle, ShaderModule, ShaderSource};
pub use render_pass::RenderPass;
pub use surface::SurfaceHandle;
pub use swapchain::{Swapchain, SWAPCHAIN_IMAGE_COUNT};
pub use sync::Semaphore;
pub use texture::FontTexture;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// No queue family supports both graphics and presentation
    #[error("No queue family supports both graphics and presentation")]
    NoSuitableQueueFamily,

    /// The configured physical device index is out of range
    #[error("Physical device index {index} out of range, {available} device(s) enumerated")]
    InvalidDeviceIndex {
        /// Index requested by the configuration
        index: u32,
        /// Number of devices the driver enumerated
        available: u32,
    },

    /// The swapchain returned an unsupported number of images
    #[error("Swapchain returned {count} images, expected exactly {SWAPCHAIN_IMAGE_COUNT}")]
    SwapchainImageCount {
        /// Number of images the driver returned
        count: usize,
    },

    /// A frame entry point was called before `initialize` succeeded
    #[error("Renderer backend is not initialized")]
    NotInitialized,

    /// `initialize` was called while a backend is already installed
    #[error("Renderer backend is already initialized")]
    AlreadyInitialized,
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;
