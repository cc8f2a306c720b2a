//! Command pool and primary command buffer management

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Reset-capable command pool with RAII cleanup
///
/// Owns the single primary command buffer the backend re-records every
/// frame.
pub struct CommandPool {
    device: Device,
    command_pool: vk::CommandPool,
    primary_buffer: vk::CommandBuffer,
}

impl CommandPool {
    /// Create the pool and allocate one primary command buffer
    pub fn new(device: Device, queue_family_index: u32) -> VulkanResult<Self> {
        let pool_create_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family_index);

        let command_pool = unsafe {
            device
                .create_command_pool(&pool_create_info, None)
                .map_err(VulkanError::Api)?
        };

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let buffers = unsafe {
            match device.allocate_command_buffers(&alloc_info) {
                Ok(buffers) => buffers,
                Err(err) => {
                    device.destroy_command_pool(command_pool, None);
                    return Err(VulkanError::Api(err));
                }
            }
        };

        Ok(Self {
            device,
            command_pool,
            primary_buffer: buffers[0],
        })
    }

    /// The primary command buffer
    pub fn primary_buffer(&self) -> vk::CommandBuffer {
        self.primary_buffer
    }

    /// Begin recording the primary buffer for one-time submission
    pub fn begin_one_time(&self) -> VulkanResult<vk::CommandBuffer> {
        let begin_info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device
                .begin_command_buffer(self.primary_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
        }
        Ok(self.primary_buffer)
    }

    /// End recording the primary buffer
    pub fn end(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .end_command_buffer(self.primary_buffer)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            // Destroying the pool frees its command buffers
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
