//! The renderer backend: initialization, per-frame entry points, and
//! the process-wide backend registry
//!
//! The UI library's render callback slot is a plain `fn` pointer, so
//! the render entry point recovers the backend through a single-slot
//! registry: one process-wide handle, installed by [`initialize`] and
//! cleared by [`shutdown`]. The whole design assumes a single
//! frame-driving thread; the mutex satisfies Rust's safety rules, not a
//! concurrency ambition.

use ash::vk;
use std::sync::Mutex;

use crate::config::RendererOptions;
use crate::foundation::math::ui_projection;
use crate::foundation::time::FrameTimer;
use crate::platform::window::{self, Window};
use crate::render::draw_plan::{plan_list, DrawStep};
use crate::render::vulkan::{
    CommandPool, Descriptors, DeviceContext, FontTexture, Framebuffer, PhysicalDeviceSelection,
    PipelineBundle, RenderPass, Semaphore, SurfaceHandle, Swapchain, TransientListBuffer,
    VulkanError, VulkanInstance, VulkanResult,
};
use crate::ui::draw::DrawData;
use crate::ui::io::UiIo;

static BACKEND: Mutex<Option<RendererBackend>> = Mutex::new(None);

fn backend_slot() -> std::sync::MutexGuard<'static, Option<RendererBackend>> {
    match BACKEND.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// All long-lived rendering state
///
/// Field declaration order is the teardown order: the font texture goes
/// first and the instance last, so Rust's drop order enforces the
/// reverse-dependency destruction sequence structurally.
struct RendererBackend {
    font_texture: FontTexture,
    pipeline: PipelineBundle,
    descriptors: Descriptors,
    render_pass: RenderPass,
    swapchain: Option<Swapchain>,
    command_pool: CommandPool,
    device: DeviceContext,
    physical: PhysicalDeviceSelection,
    surface: SurfaceHandle,
    instance: VulkanInstance,
    clear_color: [f32; 4],
    frame_timer: FrameTimer,
}

impl Drop for RendererBackend {
    fn drop(&mut self) {
        unsafe {
            if let Err(err) = self.device.device.device_wait_idle() {
                log::error!("device_wait_idle failed before teardown: {:?}", err);
            }
        }
    }
}

/// Initialize the backend and install it into the registry
///
/// Seeds the I/O state (display size, framebuffer scale, key map, IME
/// handle) and registers the render callback. Fails without side
/// effects: on error no backend is installed and no callback is
/// registered, so a subsequent render call cannot reach a half-built
/// context.
pub fn initialize(
    window: &mut Window,
    options: RendererOptions,
    io: &mut UiIo,
) -> VulkanResult<()> {
    let mut slot = backend_slot();
    if slot.is_some() {
        return Err(VulkanError::AlreadyInitialized);
    }

    let backend = RendererBackend::new(window, &options, io)?;

    let (width, height) = window.client_size();
    io.display_size = [width as f32, height as f32];
    let (scale_x, scale_y) = window.content_scale();
    io.display_framebuffer_scale = [scale_x, scale_y];
    window::seed_key_map(&mut io.key_map);
    io.ime_window_handle = Some(window.native_handle());
    io.render_callback = Some(render_callback);

    *slot = Some(backend);
    log::info!("Renderer backend initialized at {}x{}", width, height);
    Ok(())
}

/// Per-frame timing, input, and resize handling
///
/// Call once per frame before the UI library reads its I/O state.
/// Updates delta time, display size, framebuffer scale, and modifier
/// keys, applies the cursor-visibility policy, and recreates the
/// swapchain when the window size changed since the previous frame.
pub fn new_frame(window: &mut Window, io: &mut UiIo) -> VulkanResult<()> {
    let mut slot = backend_slot();
    let backend = slot.as_mut().ok_or(VulkanError::NotInitialized)?;

    backend.frame_timer.tick();
    io.delta_time = backend.frame_timer.delta_time();

    let measured = window.client_size();
    let (scale_x, scale_y) = window.content_scale();
    io.display_framebuffer_scale = [scale_x, scale_y];

    let modifiers = window.modifier_state();
    io.key_ctrl = modifiers.ctrl;
    io.key_shift = modifiers.shift;
    io.key_alt = modifiers.alt;

    window.set_cursor_visible(!io.mouse_draw_cursor);

    if needs_resize(io.display_size, measured) {
        backend.recreate_swapchain(measured)?;
        io.display_size = [measured.0 as f32, measured.1 as f32];
        log::debug!("Swapchain recreated at {}x{}", measured.0, measured.1);
    }

    Ok(())
}

/// Render a frame from the UI library's draw data
///
/// Any step's failure logs, aborts the remaining sequence, and skips
/// presentation for this frame only; the next frame starts the full
/// sequence over.
pub fn render(io: &mut UiIo, draw_data: &mut DrawData) -> VulkanResult<()> {
    let mut slot = backend_slot();
    let backend = slot.as_mut().ok_or(VulkanError::NotInitialized)?;
    backend.render_frame(io, draw_data)
}

/// Tear the backend down and clear the registry slot
///
/// Returns quietly when nothing is installed, so applications can call
/// this unconditionally on exit.
pub fn shutdown() {
    let mut slot = backend_slot();
    if slot.take().is_some() {
        log::info!("Renderer backend shut down");
    } else {
        log::debug!("shutdown called with no backend installed");
    }
}

/// True when the recorded display size no longer matches the window
///
/// Pure decision function: repeated frames at an unchanged size never
/// trigger a recreation.
fn needs_resize(recorded: [f32; 2], measured: (u32, u32)) -> bool {
    recorded[0] != measured.0 as f32 || recorded[1] != measured.1 as f32
}

/// The `fn`-pointer callback registered with the UI library
///
/// The callback contract has no error channel, so failures are logged
/// and the frame is dropped.
fn render_callback(io: &mut UiIo, draw_data: &mut DrawData) {
    if let Err(err) = render(io, draw_data) {
        log::error!("Frame render failed: {}", err);
    }
}

impl RendererBackend {
    /// Build the full rendering context, in dependency order
    ///
    /// Every owned object is a RAII wrapper, so a failure at any step
    /// releases whatever was created before it.
    fn new(window: &mut Window, options: &RendererOptions, io: &UiIo) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(window, "imgui_vulkan", options.enable_validation)?;
        let surface = SurfaceHandle::new(&instance, window)?;
        let physical =
            PhysicalDeviceSelection::select_by_index(&instance.instance, &surface, options.device_index)?;
        let device = DeviceContext::new(&instance.instance, &physical, &surface)?;

        let (width, height) = window.client_size();
        let window_extent = vk::Extent2D { width, height };
        let swapchain = Swapchain::new(
            &instance.instance,
            &device,
            &surface,
            physical.device,
            window_extent,
        )?;

        let command_pool = CommandPool::new(device.device.clone(), device.queue_family)?;
        record_present_transitions(&device, &command_pool, swapchain.images())?;

        let render_pass =
            RenderPass::new_ui_pass(device.device.clone(), device.surface_format.format)?;
        let descriptors = Descriptors::new(device.device.clone())?;

        let (vertex_source, fragment_source) = options
            .shader_sources()
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;
        let pipeline = PipelineBundle::new(
            device.device.clone(),
            render_pass.handle(),
            descriptors.set_layout(),
            &vertex_source,
            &fragment_source,
        )?;

        let font_texture = FontTexture::new(
            device.device.clone(),
            &physical.memory_properties,
            &io.fonts,
        )?;
        descriptors.write_font_texture(font_texture.sampler(), font_texture.view());

        Ok(Self {
            font_texture,
            pipeline,
            descriptors,
            render_pass,
            swapchain: Some(swapchain),
            command_pool,
            device,
            physical,
            surface,
            instance,
            clear_color: options.clear_color,
            frame_timer: FrameTimer::new(),
        })
    }

    /// Replace the swapchain at a new extent
    ///
    /// Pipeline, descriptors, and render pass stay untouched: the
    /// attachment format is unchanged and viewport/scissor are dynamic.
    fn recreate_swapchain(&mut self, measured: (u32, u32)) -> VulkanResult<()> {
        unsafe {
            self.device
                .device
                .device_wait_idle()
                .map_err(VulkanError::Api)?;
        }

        let old = self.swapchain.take().ok_or(VulkanError::NotInitialized)?;
        let window_extent = vk::Extent2D {
            width: measured.0,
            height: measured.1,
        };
        let swapchain = Swapchain::recreate(
            &self.instance.instance,
            &self.device,
            &self.surface,
            self.physical.device,
            window_extent,
            old,
        )?;
        record_present_transitions(&self.device, &self.command_pool, swapchain.images())?;
        self.swapchain = Some(swapchain);
        Ok(())
    }

    /// Record and submit one frame of UI draw data
    fn render_frame(&mut self, io: &mut UiIo, draw_data: &mut DrawData) -> VulkanResult<()> {
        draw_data.scale_clip_rects(io.display_framebuffer_scale);

        let device = self.device.device.clone();
        let swapchain = self.swapchain.as_ref().ok_or(VulkanError::NotInitialized)?;

        let acquire_semaphore = Semaphore::new(device.clone())?;
        let image_index = swapchain.acquire_next_image(acquire_semaphore.handle())?;

        let command_buffer = self.command_pool.begin_one_time()?;

        let framebuffer = Framebuffer::new(
            device.clone(),
            self.render_pass.handle(),
            swapchain.image_view(image_index),
            swapchain.extent(),
        )?;

        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: self.clear_color,
            },
        }];
        let render_pass_begin = vk::RenderPassBeginInfo::builder()
            .render_pass(self.render_pass.handle())
            .framebuffer(framebuffer.handle())
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: swapchain.extent(),
            })
            .clear_values(&clear_values);

        unsafe {
            device.cmd_begin_render_pass(
                command_buffer,
                &render_pass_begin,
                vk::SubpassContents::INLINE,
            );

            let viewport = vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: io.display_size[0],
                height: io.display_size[1],
                min_depth: 0.0,
                max_depth: 1.0,
            };
            device.cmd_set_viewport(command_buffer, 0, &[viewport]);

            let projection = ui_projection(io.display_size[0], io.display_size[1]);
            device.cmd_push_constants(
                command_buffer,
                self.pipeline.layout(),
                vk::ShaderStageFlags::VERTEX,
                0,
                bytemuck::cast_slice(&projection),
            );

            device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.layout(),
                0,
                &[self.descriptors.set()],
                &[],
            );
            device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.handle(),
            );
        }

        // Transient geometry buffers must outlive command execution;
        // they are dropped after the end-of-frame idle wait below.
        let mut list_buffers = Vec::with_capacity(draw_data.lists.len());
        for list in &draw_data.lists {
            let buffer =
                TransientListBuffer::upload(device.clone(), &self.physical.memory_properties, list)?;
            buffer.bind(&device, command_buffer);

            for step in plan_list(list) {
                match step {
                    DrawStep::Indexed {
                        first_index,
                        index_count,
                        scissor,
                    } => unsafe {
                        let rect = vk::Rect2D {
                            offset: vk::Offset2D {
                                x: scissor.x,
                                y: scissor.y,
                            },
                            extent: vk::Extent2D {
                                width: scissor.width,
                                height: scissor.height,
                            },
                        };
                        device.cmd_set_scissor(command_buffer, 0, &[rect]);
                        device.cmd_draw_indexed(command_buffer, index_count, 1, first_index, 0, 0);
                    },
                    DrawStep::Callback {
                        callback,
                        command_index,
                    } => {
                        callback(list, &list.commands[command_index]);
                    }
                }
            }

            list_buffers.push(buffer);
        }

        unsafe {
            device.cmd_end_render_pass(command_buffer);
        }

        // Hand the image back to the attachment layout so the next
        // frame's clear finds it where the render pass expects it,
        // mirroring the undefined-to-present transition at startup.
        record_image_barrier(
            &device,
            command_buffer,
            swapchain.images()[image_index as usize],
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::AccessFlags::MEMORY_READ,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        );

        self.command_pool.end()?;

        let wait_semaphores = [acquire_semaphore.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers);

        unsafe {
            device
                .queue_submit(self.device.queue, &[submit_info.build()], vk::Fence::null())
                .map_err(VulkanError::Api)?;
        }

        // The submitted batch references the transient buffers and the
        // acquire semaphore. From here on the idle wait must run before
        // any return path, or their drops would free resources the GPU
        // is still using. A present failure (out-of-date during a
        // resize race) is therefore captured, not propagated directly.
        let present_result = swapchain.present(self.device.queue, image_index);

        // Blocking idle wait: transient buffers, the framebuffer, and
        // the semaphore are destroyed right after submission with no
        // per-frame fencing. Correct, and a known throughput ceiling.
        let wait_result = unsafe { device.device_wait_idle().map_err(VulkanError::Api) };

        finish_frame(present_result, wait_result)?;

        drop(list_buffers);
        drop(framebuffer);
        drop(acquire_semaphore);
        Ok(())
    }
}

/// Combine the end-of-frame present and idle-wait results
///
/// Called only after the idle wait has completed, so per-frame objects
/// are safe to drop on every return path. The present failure is the
/// root cause when both fail, so it is reported first.
fn finish_frame(present: VulkanResult<()>, wait: VulkanResult<()>) -> VulkanResult<()> {
    present.and(wait)
}

/// Record undefined-to-present transitions for both swapchain images
///
/// Leaves the primary command buffer recorded but unsubmitted. Fresh
/// swapchain images start in the undefined layout, and the first
/// frame's own end-of-pass barrier puts the drawn image where the
/// render pass expects it.
fn record_present_transitions(
    device_ctx: &DeviceContext,
    command_pool: &CommandPool,
    images: &[vk::Image; crate::render::vulkan::SWAPCHAIN_IMAGE_COUNT],
) -> VulkanResult<()> {
    let command_buffer = command_pool.begin_one_time()?;
    for &image in images {
        record_image_barrier(
            &device_ctx.device,
            command_buffer,
            image,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::AccessFlags::empty(),
            vk::AccessFlags::MEMORY_READ,
        );
    }
    command_pool.end()
}

/// Full-color-aspect, single-mip, single-layer layout transition
fn record_image_barrier(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src_access: vk::AccessFlags,
    dst_access: vk::AccessFlags,
) {
    let barrier = vk::ImageMemoryBarrier::builder()
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
        .build();

    unsafe {
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::io::UiIo;

    #[test]
    fn render_without_backend_reports_not_initialized() {
        let mut io = UiIo::default();
        let mut draw_data = DrawData::default();
        let result = render(&mut io, &mut draw_data);
        assert!(matches!(result, Err(VulkanError::NotInitialized)));
    }

    #[test]
    fn shutdown_without_backend_is_a_no_op() {
        shutdown();
        shutdown();
    }

    #[test]
    fn resize_decision_is_idempotent_for_unchanged_sizes() {
        let recorded = [800.0, 600.0];
        for _ in 0..3 {
            assert!(!needs_resize(recorded, (800, 600)));
        }
    }

    #[test]
    fn frame_completion_reports_present_failure_first() {
        let out_of_date = || VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR);
        let lost = || VulkanError::Api(vk::Result::ERROR_DEVICE_LOST);

        assert!(finish_frame(Ok(()), Ok(())).is_ok());
        assert!(matches!(
            finish_frame(Err(out_of_date()), Ok(())),
            Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR))
        ));
        assert!(matches!(
            finish_frame(Ok(()), Err(lost())),
            Err(VulkanError::Api(vk::Result::ERROR_DEVICE_LOST))
        ));
        assert!(matches!(
            finish_frame(Err(out_of_date()), Err(lost())),
            Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR))
        ));
    }

    #[test]
    fn resize_decision_fires_on_either_axis() {
        assert!(needs_resize([800.0, 600.0], (1024, 600)));
        assert!(needs_resize([800.0, 600.0], (800, 768)));
        assert!(needs_resize([0.0, 0.0], (800, 600)));
    }
}
