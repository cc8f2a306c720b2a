//! Buffer management for per-frame UI geometry uploads

use ash::{vk, Device};
use std::mem;

use crate::render::vulkan::{VulkanError, VulkanResult};
use crate::ui::draw::{DrawList, DrawVert};

/// Buffer wrapper with memory management
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer with freshly allocated memory
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let mem_requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let memory_type_index = match find_memory_type(
            memory_properties,
            mem_requirements.memory_type_bits,
            properties,
        ) {
            Ok(index) => index,
            Err(err) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(err);
            }
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(mem_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe {
            match device.allocate_memory(&alloc_info, None) {
                Ok(memory) => memory,
                Err(err) => {
                    device.destroy_buffer(buffer, None);
                    return Err(VulkanError::Api(err));
                }
            }
        };

        unsafe {
            if let Err(err) = device.bind_buffer_memory(buffer, memory, 0) {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
                return Err(VulkanError::Api(err));
            }
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
        })
    }

    /// Map the whole allocation for writing
    pub fn map_memory(&self) -> VulkanResult<*mut std::ffi::c_void> {
        unsafe {
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::Api)
        }
    }

    /// Unmap the allocation
    pub fn unmap_memory(&self) {
        unsafe {
            self.device.unmap_memory(self.memory);
        }
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Get buffer size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Byte offset of the index region inside a transient list buffer
///
/// Vertices are packed first, indices follow immediately, so the index
/// bind offset equals the vertex byte length.
pub fn index_region_offset(vertex_count: usize) -> vk::DeviceSize {
    (vertex_count * mem::size_of::<DrawVert>()) as vk::DeviceSize
}

/// Total byte size of a transient list buffer
pub fn transient_buffer_size(vertex_count: usize, index_count: usize) -> vk::DeviceSize {
    index_region_offset(vertex_count) + (index_count * mem::size_of::<u16>()) as vk::DeviceSize
}

/// Host-visible buffer holding one draw list's geometry for one frame
///
/// Created, filled, bound, and destroyed within a single render call.
/// The same buffer is bound twice: as a vertex buffer at offset zero
/// and as a 16-bit index buffer at the vertex region's byte length.
pub struct TransientListBuffer {
    buffer: Buffer,
    index_offset: vk::DeviceSize,
}

impl TransientListBuffer {
    /// Upload a draw list's vertices and indices into a fresh buffer
    pub fn upload(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        list: &DrawList,
    ) -> VulkanResult<Self> {
        let index_offset = index_region_offset(list.vertices.len());
        let size = transient_buffer_size(list.vertices.len(), list.indices.len());

        let buffer = Buffer::new(
            device,
            memory_properties,
            size.max(1),
            vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::INDEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        let mapped = buffer.map_memory()?;
        unsafe {
            let vertex_bytes: &[u8] = bytemuck::cast_slice(&list.vertices);
            let index_bytes: &[u8] = bytemuck::cast_slice(&list.indices);
            std::ptr::copy_nonoverlapping(
                vertex_bytes.as_ptr(),
                mapped.cast::<u8>(),
                vertex_bytes.len(),
            );
            std::ptr::copy_nonoverlapping(
                index_bytes.as_ptr(),
                mapped.cast::<u8>().add(index_offset as usize),
                index_bytes.len(),
            );
        }
        buffer.unmap_memory();

        Ok(Self {
            buffer,
            index_offset,
        })
    }

    /// Bind as vertex buffer (offset 0) and 16-bit index buffer (offset
    /// at the vertex region's end) on the given command buffer
    pub fn bind(&self, device: &Device, command_buffer: vk::CommandBuffer) {
        unsafe {
            device.cmd_bind_vertex_buffers(command_buffer, 0, &[self.buffer.handle()], &[0]);
            device.cmd_bind_index_buffer(
                command_buffer,
                self.buffer.handle(),
                self.index_offset,
                vk::IndexType::UINT16,
            );
        }
    }

    /// Byte offset where the index region starts
    pub fn index_offset(&self) -> vk::DeviceSize {
        self.index_offset
    }
}

/// Find a memory type matching the filter and property flags
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    for i in 0..memory_properties.memory_type_count {
        if (type_filter & (1 << i)) != 0
            && memory_properties.memory_types[i as usize]
                .property_flags
                .contains(properties)
        {
            return Ok(i);
        }
    }

    Err(VulkanError::NoSuitableMemoryType)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_region_starts_after_vertex_bytes() {
        assert_eq!(index_region_offset(0), 0);
        assert_eq!(index_region_offset(4), 4 * 20);
        assert_eq!(index_region_offset(100), 100 * 20);
    }

    #[test]
    fn transient_size_covers_both_regions() {
        assert_eq!(transient_buffer_size(4, 6), 4 * 20 + 6 * 2);
        assert_eq!(transient_buffer_size(0, 0), 0);
    }

    #[test]
    fn memory_type_selection_respects_filter_and_flags() {
        let mut props = vk::PhysicalDeviceMemoryProperties::default();
        props.memory_type_count = 2;
        props.memory_types[0].property_flags = vk::MemoryPropertyFlags::DEVICE_LOCAL;
        props.memory_types[1].property_flags =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;

        let index = find_memory_type(
            &props,
            0b11,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )
        .unwrap();
        assert_eq!(index, 1);

        // Type filter excludes the only matching type
        let err = find_memory_type(&props, 0b01, vk::MemoryPropertyFlags::HOST_VISIBLE);
        assert!(matches!(err, Err(VulkanError::NoSuitableMemoryType)));
    }
}
