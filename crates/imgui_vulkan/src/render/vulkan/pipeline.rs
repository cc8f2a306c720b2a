//! Shader modules and the UI graphics pipeline

use ash::{vk, Device};
use std::fs::File;
use std::io::Read;
use std::mem;
use std::path::{Path, PathBuf};

use crate::render::vulkan::{VulkanError, VulkanResult};
use crate::ui::draw::DrawVert;

/// Where a shader's SPIR-V bytecode comes from
#[derive(Debug, Clone)]
pub enum ShaderSource {
    /// Whole-file binary read at pipeline creation time
    File(PathBuf),
    /// Embedded precompiled bytecode
    Bytes(Vec<u8>),
}

impl ShaderSource {
    /// Resolve the source into raw SPIR-V bytes
    pub fn load(&self) -> VulkanResult<Vec<u8>> {
        match self {
            ShaderSource::File(path) => {
                let mut file = File::open(path).map_err(|e| {
                    VulkanError::InitializationFailed(format!(
                        "Failed to open shader file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).map_err(|e| {
                    VulkanError::InitializationFailed(format!(
                        "Failed to read shader file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(bytes)
            }
            ShaderSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create a shader module from SPIR-V bytecode
    pub fn from_bytes(device: Device, bytes: &[u8]) -> VulkanResult<Self> {
        let words = spirv_words(bytes)?;
        let create_info = vk::ShaderModuleCreateInfo::builder().code(words);

        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, module })
    }

    /// Load a shader module from a SPIR-V file
    pub fn from_file<P: AsRef<Path>>(device: Device, path: P) -> VulkanResult<Self> {
        let bytes = ShaderSource::File(path.as_ref().to_path_buf()).load()?;
        Self::from_bytes(device, &bytes)
    }

    /// Create a shader module from any source
    pub fn from_source(device: Device, source: &ShaderSource) -> VulkanResult<Self> {
        let bytes = source.load()?;
        Self::from_bytes(device, &bytes)
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }
}

/// View a byte blob as SPIR-V words
///
/// SPIR-V words are u32; blobs whose length or address cannot form a
/// whole-word view are rejected before any API call sees them.
fn spirv_words(bytes: &[u8]) -> VulkanResult<&[u32]> {
    let (prefix, words, suffix) = unsafe { bytes.align_to::<u32>() };
    if !prefix.is_empty() || !suffix.is_empty() {
        return Err(VulkanError::InitializationFailed(
            "SPIR-V bytecode is not u32 aligned".to_string(),
        ));
    }
    Ok(words)
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Graphics pipeline for UI draw lists, with its cache, layout, and the
/// two shader modules it was built from
pub struct PipelineBundle {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
    cache: vk::PipelineCache,
    _vertex_shader: ShaderModule,
    _fragment_shader: ShaderModule,
}

impl PipelineBundle {
    /// Build the fixed-function UI pipeline
    ///
    /// Triangle list, no culling, counter-clockwise front face, single
    /// sample, depth test less-or-equal, alpha blending, and dynamic
    /// viewport and scissor so the pipeline survives window resizes
    /// untouched.
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        descriptor_set_layout: vk::DescriptorSetLayout,
        vertex_source: &ShaderSource,
        fragment_source: &ShaderSource,
    ) -> VulkanResult<Self> {
        let vertex_shader = ShaderModule::from_source(device.clone(), vertex_source)?;
        let fragment_shader = ShaderModule::from_source(device.clone(), fragment_source)?;

        let entry_point = std::ffi::CStr::from_bytes_with_nul(b"main\0")
            .map_err(|_| VulkanError::InitializationFailed("Bad entry point name".to_string()))?;

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_shader.handle())
                .name(entry_point)
                .build(),
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_shader.handle())
                .name(entry_point)
                .build(),
        ];

        let binding_descriptions = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: mem::size_of::<DrawVert>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }];

        let attribute_descriptions = [
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 8,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R8G8B8A8_UNORM,
                offset: 16,
            },
        ];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&binding_descriptions)
            .vertex_attribute_descriptions(&attribute_descriptions);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic; only the counts matter here
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(true)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .alpha_blend_op(vk::BlendOp::ADD)
            .build();

        let color_blend_attachments = [color_blend_attachment];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        // One 4x4 f32 projection matrix, pushed from the vertex stage
        let push_constant_ranges = [vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX,
            offset: 0,
            size: mem::size_of::<[[f32; 4]; 4]>() as u32,
        }];

        let set_layouts = [descriptor_set_layout];
        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        let layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let cache_info = vk::PipelineCacheCreateInfo::builder();
        let cache = unsafe {
            match device.create_pipeline_cache(&cache_info, None) {
                Ok(cache) => cache,
                Err(err) => {
                    device.destroy_pipeline_layout(layout, None);
                    return Err(VulkanError::Api(err));
                }
            }
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            match device.create_graphics_pipelines(cache, &[pipeline_info.build()], None) {
                Ok(pipelines) => pipelines,
                Err((_, err)) => {
                    device.destroy_pipeline_cache(cache, None);
                    device.destroy_pipeline_layout(layout, None);
                    return Err(VulkanError::Api(err));
                }
            }
        };

        Ok(Self {
            device,
            pipeline: pipelines[0],
            layout,
            cache,
            _vertex_shader: vertex_shader,
            _fragment_shader: fragment_shader,
        })
    }

    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get pipeline layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineBundle {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_cache(self.cache, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unaligned_spirv_is_rejected_before_any_api_call() {
        // Length not a multiple of four can never be valid SPIR-V
        let err = spirv_words(&[0u8; 7]).unwrap_err();
        assert!(matches!(err, VulkanError::InitializationFailed(_)));
    }

    #[test]
    fn word_aligned_spirv_views_as_whole_words() {
        // Source with u32 alignment guaranteed by the element type
        let words = [0x0723_0203u32, 0x0001_0000];
        let bytes: &[u8] = bytemuck::cast_slice(&words);
        assert_eq!(spirv_words(bytes).unwrap(), &words);
    }

    #[test]
    fn missing_shader_file_reports_path() {
        let source = ShaderSource::File(PathBuf::from("does/not/exist.spv"));
        let err = source.load().unwrap_err();
        match err {
            VulkanError::InitializationFailed(message) => {
                assert!(message.contains("does/not/exist.spv"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn byte_source_round_trips() {
        let source = ShaderSource::Bytes(vec![1, 2, 3, 4]);
        assert_eq!(source.load().unwrap(), vec![1, 2, 3, 4]);
    }
}
