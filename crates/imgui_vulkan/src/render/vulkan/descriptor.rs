//! Descriptor set layout, pool, and the font descriptor set

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Descriptor objects for the single font texture binding
///
/// One combined-image-sampler binding visible to the fragment stage,
/// one pool sized for exactly one set, and the one set allocated from
/// it. The set is returned to the pool when the pool is destroyed.
pub struct Descriptors {
    device: Device,
    set_layout: vk::DescriptorSetLayout,
    pool: vk::DescriptorPool,
    set: vk::DescriptorSet,
}

impl Descriptors {
    /// Create the layout and pool and allocate the font descriptor set
    pub fn new(device: Device) -> VulkanResult<Self> {
        let bindings = [vk::DescriptorSetLayoutBinding::builder()
            .binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::FRAGMENT)
            .build()];

        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings);

        let set_layout = unsafe {
            device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let pool_sizes = [vk::DescriptorPoolSize {
            ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: 1,
        }];

        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(1)
            .pool_sizes(&pool_sizes);

        let pool = unsafe {
            match device.create_descriptor_pool(&pool_info, None) {
                Ok(pool) => pool,
                Err(err) => {
                    device.destroy_descriptor_set_layout(set_layout, None);
                    return Err(VulkanError::Api(err));
                }
            }
        };

        let set_layouts = [set_layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(pool)
            .set_layouts(&set_layouts);

        let sets = unsafe {
            match device.allocate_descriptor_sets(&alloc_info) {
                Ok(sets) => sets,
                Err(err) => {
                    device.destroy_descriptor_pool(pool, None);
                    device.destroy_descriptor_set_layout(set_layout, None);
                    return Err(VulkanError::Api(err));
                }
            }
        };

        Ok(Self {
            device,
            set_layout,
            pool,
            set: sets[0],
        })
    }

    /// Point the descriptor set at the font texture
    pub fn write_font_texture(&self, sampler: vk::Sampler, view: vk::ImageView) {
        let image_info = [vk::DescriptorImageInfo {
            sampler,
            image_view: view,
            image_layout: vk::ImageLayout::GENERAL,
        }];

        let writes = [vk::WriteDescriptorSet::builder()
            .dst_set(self.set)
            .dst_binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_info)
            .build()];

        unsafe {
            self.device.update_descriptor_sets(&writes, &[]);
        }
    }

    /// Get the descriptor set layout handle
    pub fn set_layout(&self) -> vk::DescriptorSetLayout {
        self.set_layout
    }

    /// Get the font descriptor set
    pub fn set(&self) -> vk::DescriptorSet {
        self.set
    }
}

impl Drop for Descriptors {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
            self.device.destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}
