//! Double-buffered swapchain management

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::vk;
use ash::{Device, Instance};

use crate::render::vulkan::device::DeviceContext;
use crate::render::vulkan::surface::SurfaceHandle;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// The swapchain is strictly double-buffered. A driver returning any
/// other image count violates the backend's contract and is surfaced as
/// an error, never truncated.
pub const SWAPCHAIN_IMAGE_COUNT: usize = 2;

/// Swapchain wrapper holding exactly two images and their views
pub struct Swapchain {
    device: Device,
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: [vk::Image; SWAPCHAIN_IMAGE_COUNT],
    image_views: [vk::ImageView; SWAPCHAIN_IMAGE_COUNT],
    extent: vk::Extent2D,
}

/// Swapchain handle and images before any views exist
///
/// Splitting construction in two keeps the recreation ordering
/// observable: the old swapchain and its views are destroyed after the
/// new chain exists but before the new views are created.
struct SwapchainParts {
    device: Device,
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: [vk::Image; SWAPCHAIN_IMAGE_COUNT],
    extent: vk::Extent2D,
    format: vk::Format,
}

impl Swapchain {
    /// Create the initial swapchain at the surface's current extent
    pub fn new(
        instance: &Instance,
        device_ctx: &DeviceContext,
        surface: &SurfaceHandle,
        physical_device: vk::PhysicalDevice,
        window_extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let parts = create_chain(
            instance,
            device_ctx,
            surface,
            physical_device,
            window_extent,
            vk::SwapchainKHR::null(),
        )?;
        parts.into_swapchain()
    }

    /// Recreate the swapchain at a new extent, chained to the old one
    ///
    /// Consumes the old swapchain. The new chain is created first, then
    /// the old swapchain and its views are destroyed, then the new
    /// views are built. Format, present mode, image count, and usage
    /// are unchanged from initialization.
    pub fn recreate(
        instance: &Instance,
        device_ctx: &DeviceContext,
        surface: &SurfaceHandle,
        physical_device: vk::PhysicalDevice,
        window_extent: vk::Extent2D,
        old: Swapchain,
    ) -> VulkanResult<Self> {
        let parts = create_chain(
            instance,
            device_ctx,
            surface,
            physical_device,
            window_extent,
            old.swapchain,
        )?;
        drop(old);
        parts.into_swapchain()
    }

    /// Acquire the next presentable image, blocking without timeout
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> VulkanResult<u32> {
        let (index, _suboptimal) = unsafe {
            self.loader
                .acquire_next_image(self.swapchain, u64::MAX, semaphore, vk::Fence::null())
                .map_err(VulkanError::Api)?
        };
        Ok(index)
    }

    /// Queue the acquired image for presentation
    pub fn present(&self, queue: vk::Queue, image_index: u32) -> VulkanResult<()> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            self.loader
                .queue_present(queue, &present_info)
                .map_err(VulkanError::Api)?;
        }
        Ok(())
    }

    /// The two presentable images
    pub fn images(&self) -> &[vk::Image; SWAPCHAIN_IMAGE_COUNT] {
        &self.images
    }

    /// The image view for a given acquired index
    pub fn image_view(&self, index: u32) -> vk::ImageView {
        self.image_views[index as usize]
    }

    /// Current swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

impl SwapchainParts {
    /// Build the image views and finish the swapchain
    fn into_swapchain(self) -> VulkanResult<Swapchain> {
        let mut image_views = [vk::ImageView::null(); SWAPCHAIN_IMAGE_COUNT];
        for (slot, &image) in self.images.iter().enumerate() {
            match create_image_view(&self.device, image, self.format) {
                Ok(view) => image_views[slot] = view,
                Err(err) => {
                    unsafe {
                        for &view in &image_views[..slot] {
                            self.device.destroy_image_view(view, None);
                        }
                        self.loader.destroy_swapchain(self.swapchain, None);
                    }
                    return Err(err);
                }
            }
        }

        Ok(Swapchain {
            device: self.device,
            loader: self.loader,
            swapchain: self.swapchain,
            images: self.images,
            image_views,
            extent: self.extent,
        })
    }
}

fn create_chain(
    instance: &Instance,
    device_ctx: &DeviceContext,
    surface: &SurfaceHandle,
    physical_device: vk::PhysicalDevice,
    window_extent: vk::Extent2D,
    old_swapchain: vk::SwapchainKHR,
) -> VulkanResult<SwapchainParts> {
    let device = device_ctx.device.clone();
    let loader = SwapchainLoader::new(instance, &device);

    let surface_caps = unsafe {
        surface
            .loader()
            .get_physical_device_surface_capabilities(physical_device, surface.handle())
            .map_err(VulkanError::Api)?
    };

    let extent = if surface_caps.current_extent.width != u32::MAX {
        surface_caps.current_extent
    } else {
        vk::Extent2D {
            width: window_extent.width.clamp(
                surface_caps.min_image_extent.width,
                surface_caps.max_image_extent.width,
            ),
            height: window_extent.height.clamp(
                surface_caps.min_image_extent.height,
                surface_caps.max_image_extent.height,
            ),
        }
    };

    let format = device_ctx.surface_format;
    let create_info = vk::SwapchainCreateInfoKHR::builder()
        .surface(surface.handle())
        .min_image_count(SWAPCHAIN_IMAGE_COUNT as u32)
        .image_format(format.format)
        .image_color_space(format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        .pre_transform(surface_caps.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(device_ctx.present_mode)
        .clipped(true)
        .old_swapchain(old_swapchain);

    let swapchain = unsafe {
        loader
            .create_swapchain(&create_info, None)
            .map_err(VulkanError::Api)?
    };

    let image_list = unsafe {
        match loader.get_swapchain_images(swapchain) {
            Ok(images) => images,
            Err(err) => {
                loader.destroy_swapchain(swapchain, None);
                return Err(VulkanError::Api(err));
            }
        }
    };

    let images = match images_array(image_list) {
        Ok(images) => images,
        Err(err) => {
            unsafe { loader.destroy_swapchain(swapchain, None) };
            return Err(err);
        }
    };

    Ok(SwapchainParts {
        device,
        loader,
        swapchain,
        images,
        extent,
        format: format.format,
    })
}

/// Enforce the double-buffering contract on the driver's image list
///
/// Any count other than two is surfaced as an error, never truncated or
/// padded.
fn images_array(images: Vec<vk::Image>) -> VulkanResult<[vk::Image; SWAPCHAIN_IMAGE_COUNT]> {
    let count = images.len();
    images
        .as_slice()
        .try_into()
        .map_err(|_| VulkanError::SwapchainImageCount { count })
}

/// Single-mip, single-layer color view over a swapchain image
///
/// The fixed subresource range matches what the swapchain request
/// guarantees: swapchain images are always single-mip, single-layer.
fn create_image_view(
    device: &Device,
    image: vk::Image,
    format: vk::Format,
) -> VulkanResult<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe {
        device
            .create_image_view(&create_info, None)
            .map_err(VulkanError::Api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_two_images_are_accepted() {
        let images = vec![vk::Image::null(); SWAPCHAIN_IMAGE_COUNT];
        assert!(images_array(images).is_ok());
    }

    #[test]
    fn other_image_counts_are_errors_carrying_the_count() {
        for count in [0usize, 1, 3, 4] {
            let images = vec![vk::Image::null(); count];
            match images_array(images) {
                Err(VulkanError::SwapchainImageCount { count: reported }) => {
                    assert_eq!(reported, count);
                }
                other => panic!("expected image count error, got {:?}", other.map(|_| ())),
            }
        }
    }
}
