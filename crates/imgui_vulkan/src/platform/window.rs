//! Window management using GLFW
//!
//! Provides the small platform capability surface the backend depends
//! on: client-area size, content scale, modifier state, cursor
//! visibility, and Vulkan surface creation. The application keeps
//! ownership of the window and drives the message loop itself.

use glfw::Context;
use thiserror::Error;

use crate::ui::io::UiKey;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Any other GLFW-reported failure
    #[error("GLFW error: {0}")]
    Glfw(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Live state of the keyboard modifier keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    /// Either Ctrl key is held
    pub ctrl: bool,
    /// Either Shift key is held
    pub shift: bool,
    /// Either Alt key is held
    pub alt: bool,
}

/// GLFW window wrapper configured for Vulkan rendering
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Create a window without an OpenGL context, ready for a Vulkan
    /// surface
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|_| WindowError::InitializationFailed)?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_size_polling(true);
        window.set_framebuffer_size_polling(true);

        Ok(Self {
            glfw,
            window,
            events,
        })
    }

    /// Whether the user has requested the window to close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Pump the platform message queue
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drain buffered window events
    pub fn flush_events(&self) -> glfw::FlushedMessages<(f64, glfw::WindowEvent)> {
        glfw::flush_messages(&self.events)
    }

    /// Request the window to close
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Client-area size in logical pixels
    pub fn client_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (width as u32, height as u32)
    }

    /// Framebuffer size in device pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width as u32, height as u32)
    }

    /// Framebuffer pixels per logical pixel, per axis
    pub fn content_scale(&self) -> (f32, f32) {
        self.window.get_content_scale()
    }

    /// Current Ctrl/Shift/Alt state, polled live
    pub fn modifier_state(&self) -> ModifierState {
        let held = |key| self.window.get_key(key) == glfw::Action::Press;
        ModifierState {
            ctrl: held(glfw::Key::LeftControl) || held(glfw::Key::RightControl),
            shift: held(glfw::Key::LeftShift) || held(glfw::Key::RightShift),
            alt: held(glfw::Key::LeftAlt) || held(glfw::Key::RightAlt),
        }
    }

    /// Show or hide the system cursor over this window
    pub fn set_cursor_visible(&mut self, visible: bool) {
        let mode = if visible {
            glfw::CursorMode::Normal
        } else {
            glfw::CursorMode::Hidden
        };
        self.window.set_cursor_mode(mode);
    }

    /// Opaque native window handle, used for IME positioning
    pub fn native_handle(&self) -> usize {
        self.window.window_ptr() as usize
    }

    /// Instance extensions GLFW requires for surface creation
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::Glfw("failed to get required extensions".to_string()))
    }

    /// Create a Vulkan surface for this window
    pub fn create_vulkan_surface(
        &mut self,
        instance: ash::vk::Instance,
    ) -> WindowResult<ash::vk::SurfaceKHR> {
        let mut surface = ash::vk::SurfaceKHR::null();
        let result = self
            .window
            .create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == ash::vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::Glfw(format!(
                "failed to create Vulkan surface: {:?}",
                result
            )))
        }
    }
}

/// Platform key code for a UI navigation key
///
/// Seeds the UI library's key map so it can match platform key events
/// against its own key identifiers.
pub fn ui_key_code(key: UiKey) -> i32 {
    let glfw_key = match key {
        UiKey::Tab => glfw::Key::Tab,
        UiKey::LeftArrow => glfw::Key::Left,
        UiKey::RightArrow => glfw::Key::Right,
        UiKey::UpArrow => glfw::Key::Up,
        UiKey::DownArrow => glfw::Key::Down,
        UiKey::PageUp => glfw::Key::PageUp,
        UiKey::PageDown => glfw::Key::PageDown,
        UiKey::Home => glfw::Key::Home,
        UiKey::End => glfw::Key::End,
        UiKey::Delete => glfw::Key::Delete,
        UiKey::Backspace => glfw::Key::Backspace,
        UiKey::Enter => glfw::Key::Enter,
        UiKey::Escape => glfw::Key::Escape,
        UiKey::A => glfw::Key::A,
        UiKey::C => glfw::Key::C,
        UiKey::V => glfw::Key::V,
        UiKey::X => glfw::Key::X,
        UiKey::Y => glfw::Key::Y,
        UiKey::Z => glfw::Key::Z,
    };
    glfw_key as i32
}

/// Fill a key map with the platform code for every UI key
pub fn seed_key_map(key_map: &mut [i32; UiKey::COUNT]) {
    for key in UiKey::ALL {
        key_map[key.index()] = ui_key_code(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_key_map_has_no_unmapped_slots() {
        let mut key_map = [-1; UiKey::COUNT];
        seed_key_map(&mut key_map);
        assert!(key_map.iter().all(|&code| code >= 0));
    }

    #[test]
    fn letter_keys_map_to_distinct_codes() {
        let letters = [UiKey::A, UiKey::C, UiKey::V, UiKey::X, UiKey::Y, UiKey::Z];
        let codes: Vec<i32> = letters.iter().map(|&key| ui_key_code(key)).collect();
        let mut deduped = codes.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(codes.len(), deduped.len());
    }
}
