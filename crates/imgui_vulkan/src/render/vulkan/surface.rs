//! Window surface wrapper

use ash::extensions::khr::Surface;
use ash::vk;

use crate::platform::window::Window;
use crate::render::vulkan::instance::VulkanInstance;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Surface handle with RAII cleanup
pub struct SurfaceHandle {
    loader: Surface,
    surface: vk::SurfaceKHR,
}

impl SurfaceHandle {
    /// Create a surface for the window via GLFW
    pub fn new(instance: &VulkanInstance, window: &mut Window) -> VulkanResult<Self> {
        let loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window
            .create_vulkan_surface(instance.instance.handle())
            .map_err(|e| VulkanError::InitializationFailed(format!("Surface creation: {}", e)))?;

        Ok(Self { loader, surface })
    }

    /// Get the surface handle
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the surface extension loader
    pub fn loader(&self) -> &Surface {
        &self.loader
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}
