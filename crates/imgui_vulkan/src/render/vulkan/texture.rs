//! Font atlas texture

use ash::{vk, Device};

use crate::render::vulkan::buffer::find_memory_type;
use crate::render::vulkan::{VulkanError, VulkanResult};
use crate::ui::io::FontAtlas;

/// The single font texture: linear-tiling sampled image backed by
/// host-visible memory, its view, and a nearest-filter sampler
///
/// The pixel data is copied straight into the mapped image memory. No
/// staging buffer or transfer queue is involved; the host-visible
/// linear image is the single source of truth. That trades sampling
/// throughput for a much simpler upload path.
pub struct FontTexture {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    sampler: vk::Sampler,
}

impl FontTexture {
    /// Create the font image from the UI library's RGBA8 atlas
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        atlas: &FontAtlas,
    ) -> VulkanResult<Self> {
        if atlas.pixels.len() != atlas.byte_len() {
            return Err(VulkanError::InitializationFailed(format!(
                "Font atlas pixel buffer is {} bytes, expected {} for {}x{} RGBA8",
                atlas.pixels.len(),
                atlas.byte_len(),
                atlas.width,
                atlas.height
            )));
        }

        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .format(vk::Format::R8G8B8A8_UNORM)
            .extent(vk::Extent3D {
                width: atlas.width,
                height: atlas.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::LINEAR)
            .usage(vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::PREINITIALIZED);

        let image = unsafe {
            device
                .create_image(&image_info, None)
                .map_err(VulkanError::Api)?
        };

        let guard = PartialTexture::new(device.clone(), image);

        let memory_requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory_type_index = find_memory_type(
            memory_properties,
            memory_requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(memory_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe {
            device
                .allocate_memory(&alloc_info, None)
                .map_err(VulkanError::Api)?
        };
        let guard = guard.with_memory(memory);

        unsafe {
            device
                .bind_image_memory(image, memory, 0)
                .map_err(VulkanError::Api)?;
        }

        // The rows of a linear image may be padded; query the actual
        // subresource size and copy row by row when pitch differs.
        let subresource = vk::ImageSubresource {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            array_layer: 0,
        };
        let layout = unsafe { device.get_image_subresource_layout(image, subresource) };

        unsafe {
            let mapped = device
                .map_memory(
                    memory,
                    0,
                    memory_requirements.size,
                    vk::MemoryMapFlags::empty(),
                )
                .map_err(VulkanError::Api)?;

            let row_bytes = atlas.width as usize * 4;
            let dst_base = mapped.cast::<u8>().add(layout.offset as usize);
            if layout.row_pitch as usize == row_bytes {
                std::ptr::copy_nonoverlapping(atlas.pixels.as_ptr(), dst_base, atlas.byte_len());
            } else {
                for row in 0..atlas.height as usize {
                    std::ptr::copy_nonoverlapping(
                        atlas.pixels.as_ptr().add(row * row_bytes),
                        dst_base.add(row * layout.row_pitch as usize),
                        row_bytes,
                    );
                }
            }

            device.unmap_memory(memory);
        }

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(vk::Format::R8G8B8A8_UNORM)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = unsafe {
            device
                .create_image_view(&view_info, None)
                .map_err(VulkanError::Api)?
        };
        let guard = guard.with_view(view);

        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::NEAREST)
            .min_filter(vk::Filter::NEAREST)
            .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE);

        let sampler = unsafe {
            device
                .create_sampler(&sampler_info, None)
                .map_err(VulkanError::Api)?
        };

        guard.release();

        Ok(Self {
            device,
            image,
            memory,
            view,
            sampler,
        })
    }

    /// Get the image view handle
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Get the sampler handle
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for FontTexture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_image_view(self.view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Releases partially created texture resources when construction
/// bails out early
struct PartialTexture {
    device: Device,
    image: vk::Image,
    memory: Option<vk::DeviceMemory>,
    view: Option<vk::ImageView>,
    armed: bool,
}

impl PartialTexture {
    fn new(device: Device, image: vk::Image) -> Self {
        Self {
            device,
            image,
            memory: None,
            view: None,
            armed: true,
        }
    }

    fn with_memory(mut self, memory: vk::DeviceMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    fn with_view(mut self, view: vk::ImageView) -> Self {
        self.view = Some(view);
        self
    }

    fn release(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialTexture {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        unsafe {
            if let Some(view) = self.view {
                self.device.destroy_image_view(view, None);
            }
            self.device.destroy_image(self.image, None);
            if let Some(memory) = self.memory {
                self.device.free_memory(memory, None);
            }
        }
    }
}
