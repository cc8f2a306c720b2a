//! Physical device selection and logical device management

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::vk;
use ash::{Device, Instance};
use std::ffi::CStr;

use crate::render::vulkan::surface::SurfaceHandle;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Physical device chosen by configured index
///
/// No heuristic scoring: the caller names the device by its enumeration
/// index, and an out-of-range index is rejected up front.
pub struct PhysicalDeviceSelection {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Memory heap and type layout, cached for allocations
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Queue family supporting both graphics and presentation
    pub queue_family: u32,
}

impl PhysicalDeviceSelection {
    /// Select the physical device at `device_index` and resolve its
    /// combined graphics+present queue family
    pub fn select_by_index(
        instance: &Instance,
        surface: &SurfaceHandle,
        device_index: u32,
    ) -> VulkanResult<Self> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(VulkanError::Api)?
        };

        let device = *devices
            .get(device_index as usize)
            .ok_or(VulkanError::InvalidDeviceIndex {
                index: device_index,
                available: devices.len() as u32,
            })?;

        let properties = unsafe { instance.get_physical_device_properties(device) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
        let queue_family = Self::find_graphics_present_family(instance, device, surface)?;

        log::info!("Selected GPU: {}", unsafe {
            CStr::from_ptr(properties.device_name.as_ptr()).to_string_lossy()
        });

        Ok(Self {
            device,
            properties,
            memory_properties,
            queue_family,
        })
    }

    /// Find a queue family that supports graphics and can present to
    /// the surface
    fn find_graphics_present_family(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: &SurfaceHandle,
    ) -> VulkanResult<u32> {
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(device) };

        for (index, family) in queue_families.iter().enumerate() {
            let index = index as u32;
            if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                continue;
            }

            let present_support = unsafe {
                surface
                    .loader()
                    .get_physical_device_surface_support(device, index, surface.handle())
                    .map_err(VulkanError::Api)?
            };

            if present_support {
                return Ok(index);
            }
        }

        Err(VulkanError::NoSuitableQueueFamily)
    }
}

/// Logical device, its single queue, and the presentation parameters
/// selected at startup
pub struct DeviceContext {
    /// Vulkan logical device handle
    pub device: Device,
    /// Combined graphics and presentation queue
    pub queue: vk::Queue,
    /// Index of the queue family backing `queue`
    pub queue_family: u32,
    /// Surface format the swapchain and render pass use
    pub surface_format: vk::SurfaceFormatKHR,
    /// Present mode the swapchain uses
    pub present_mode: vk::PresentModeKHR,
}

impl DeviceContext {
    /// Create the logical device and pick the active surface format and
    /// present mode
    ///
    /// The first enumerated format and present mode are used, failing
    /// cleanly when either list is empty. No preference ranking is
    /// applied; callers wanting a specific format must pick the device
    /// accordingly.
    pub fn new(
        instance: &Instance,
        physical: &PhysicalDeviceSelection,
        surface: &SurfaceHandle,
    ) -> VulkanResult<Self> {
        let queue_priorities = [1.0];
        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(physical.queue_family)
            .queue_priorities(&queue_priorities)
            .build()];

        let required_extensions = [SwapchainLoader::name().as_ptr()];

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions);

        let device = unsafe {
            instance
                .create_device(physical.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let queue = unsafe { device.get_device_queue(physical.queue_family, 0) };

        let surface_formats = unsafe {
            surface
                .loader()
                .get_physical_device_surface_formats(physical.device, surface.handle())
                .map_err(VulkanError::Api)?
        };
        let surface_format = surface_formats.first().copied().ok_or_else(|| {
            VulkanError::InitializationFailed("Surface reports no formats".to_string())
        })?;

        let present_modes = unsafe {
            surface
                .loader()
                .get_physical_device_surface_present_modes(physical.device, surface.handle())
                .map_err(VulkanError::Api)?
        };
        let present_mode = present_modes.first().copied().ok_or_else(|| {
            VulkanError::InitializationFailed("Surface reports no present modes".to_string())
        })?;

        Ok(Self {
            device,
            queue,
            queue_family: physical.queue_family,
            surface_format,
            present_mode,
        })
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        unsafe {
            // Outstanding GPU work must finish before the device goes away
            if let Err(err) = self.device.device_wait_idle() {
                log::error!("device_wait_idle failed during teardown: {:?}", err);
            }
            self.device.destroy_device(None);
        }
    }
}
