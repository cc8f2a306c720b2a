//! UI renderer demo application
//!
//! Opens a window, initializes the Vulkan backend, and submits a small
//! synthetic draw list every frame: two overlapping colored panels whose
//! positions track elapsed time. Escape or the window close button
//! exits.

use glfw::{Action, Key, WindowEvent};
use imgui_vulkan::foundation::logging;
use imgui_vulkan::{DrawCmd, DrawData, DrawList, DrawVert, RendererOptions, UiIo, Window};

/// Pack an RGBA color into the vertex byte order
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from(r) | u32::from(g) << 8 | u32::from(b) << 16 | u32::from(a) << 24
}

/// Append an axis-aligned quad to a draw list
fn push_quad(list: &mut DrawList, min: [f32; 2], max: [f32; 2], color: u32) {
    let base = list.vertices.len() as u16;
    let corners = [
        [min[0], min[1]],
        [max[0], min[1]],
        [max[0], max[1]],
        [min[0], max[1]],
    ];
    for pos in corners {
        list.vertices.push(DrawVert {
            pos,
            uv: [0.0, 0.0],
            col: color,
        });
    }
    list.indices
        .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
}

/// Build this frame's draw data: two panels orbiting the window center
fn build_frame(io: &UiIo, elapsed: f32) -> DrawData {
    let [width, height] = io.display_size;
    let center = [width * 0.5, height * 0.5];
    let radius = width.min(height) * 0.25;

    let mut list = DrawList::default();
    for (phase, color) in [
        (0.0, pack_color(0x33, 0x99, 0xff, 0xcc)),
        (std::f32::consts::PI, pack_color(0xff, 0x66, 0x33, 0xcc)),
    ] {
        let angle = elapsed * 0.8 + phase;
        let x = center[0] + angle.cos() * radius;
        let y = center[1] + angle.sin() * radius;
        push_quad(&mut list, [x - 60.0, y - 40.0], [x + 60.0, y + 40.0], color);
    }
    list.commands
        .push(DrawCmd::indexed(12, [0.0, 0.0, width, height]));

    DrawData { lists: vec![list] }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut window = Window::new("UI Renderer Demo", 800, 600)?;
    let mut io = UiIo::default();

    let options = RendererOptions::default()
        .with_clear_color([0.05, 0.05, 0.08, 1.0])
        .with_validation(std::env::var("DEMO_VALIDATION").is_ok());

    imgui_vulkan::initialize(&mut window, options, &mut io)?;
    log::info!("Demo initialized, press Escape to exit");

    let mut elapsed = 0.0f32;
    while !window.should_close() {
        window.poll_events();
        let mut close_requested = false;
        for (_, event) in window.flush_events() {
            if let WindowEvent::Key(Key::Escape, _, Action::Press, _) = event {
                close_requested = true;
            }
        }
        if close_requested {
            window.set_should_close(true);
            continue;
        }

        imgui_vulkan::new_frame(&mut window, &mut io)?;
        elapsed += io.delta_time;

        let mut draw_data = build_frame(&io, elapsed);
        if let Some(callback) = io.render_callback {
            callback(&mut io, &mut draw_data);
        }
    }

    imgui_vulkan::shutdown();
    Ok(())
}

fn main() {
    logging::init_with_default_filter("info");

    if let Err(err) = run() {
        log::error!("Demo failed: {}", err);
        imgui_vulkan::shutdown();
        std::process::exit(1);
    }
}
