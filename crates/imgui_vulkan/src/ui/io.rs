//! Shared I/O state between the application, the UI library, and the
//! rendering backend

use crate::ui::draw::DrawData;

/// Render callback signature registered with the UI library
///
/// The slot is a plain `fn` pointer by contract, so the callback carries
/// no renderer state and recovers the backend itself.
pub type RenderCallback = fn(&mut UiIo, &mut DrawData);

/// Navigation and shortcut keys the UI library understands
///
/// The backend seeds [`UiIo::key_map`] with the platform key code for
/// each of these at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum UiKey {
    /// Tab key
    Tab,
    /// Left arrow
    LeftArrow,
    /// Right arrow
    RightArrow,
    /// Up arrow
    UpArrow,
    /// Down arrow
    DownArrow,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Home key
    Home,
    /// End key
    End,
    /// Delete key
    Delete,
    /// Backspace key
    Backspace,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// A (select all)
    A,
    /// C (copy)
    C,
    /// V (paste)
    V,
    /// X (cut)
    X,
    /// Y (redo)
    Y,
    /// Z (undo)
    Z,
}

impl UiKey {
    /// Number of mapped keys
    pub const COUNT: usize = 19;

    /// All keys in key-map slot order
    pub const ALL: [UiKey; Self::COUNT] = [
        UiKey::Tab,
        UiKey::LeftArrow,
        UiKey::RightArrow,
        UiKey::UpArrow,
        UiKey::DownArrow,
        UiKey::PageUp,
        UiKey::PageDown,
        UiKey::Home,
        UiKey::End,
        UiKey::Delete,
        UiKey::Backspace,
        UiKey::Enter,
        UiKey::Escape,
        UiKey::A,
        UiKey::C,
        UiKey::V,
        UiKey::X,
        UiKey::Y,
        UiKey::Z,
    ];

    /// Slot of this key in [`UiIo::key_map`]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// RGBA8 font atlas owned by the UI library
///
/// The backend reads the pixel data exactly once, during initialization,
/// to build the font texture.
#[derive(Debug, Clone)]
pub struct FontAtlas {
    /// Atlas width in pixels
    pub width: u32,
    /// Atlas height in pixels
    pub height: u32,
    /// Tightly packed RGBA8 pixel data, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl Default for FontAtlas {
    /// A single opaque white texel, enough to render untextured geometry
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![0xff; 4],
        }
    }
}

impl FontAtlas {
    /// Expected byte length of the pixel buffer
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// I/O state object the UI library reads each frame
///
/// The backend writes timing, display metrics, and modifier state into
/// this before the UI library builds its frame.
pub struct UiIo {
    /// Window client-area size in logical pixels
    pub display_size: [f32; 2],
    /// Framebuffer pixels per logical pixel, per axis
    pub display_framebuffer_scale: [f32; 2],
    /// Seconds elapsed since the previous frame
    pub delta_time: f32,
    /// Live state of the Ctrl modifier
    pub key_ctrl: bool,
    /// Live state of the Shift modifier
    pub key_shift: bool,
    /// Live state of the Alt modifier
    pub key_alt: bool,
    /// True when the UI library draws its own software cursor
    pub mouse_draw_cursor: bool,
    /// Platform key code for each [`UiKey`], seeded at initialization
    pub key_map: [i32; UiKey::COUNT],
    /// Native window handle for IME positioning, written once
    pub ime_window_handle: Option<usize>,
    /// Font atlas consumed by the backend during initialization
    pub fonts: FontAtlas,
    /// Render callback the UI library invokes with each frame's draw data
    pub render_callback: Option<RenderCallback>,
}

impl Default for UiIo {
    fn default() -> Self {
        Self {
            display_size: [0.0, 0.0],
            display_framebuffer_scale: [1.0, 1.0],
            delta_time: 0.0,
            key_ctrl: false,
            key_shift: false,
            key_alt: false,
            mouse_draw_cursor: false,
            key_map: [-1; UiKey::COUNT],
            ime_window_handle: None,
            fonts: FontAtlas::default(),
            render_callback: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_slots_are_distinct_and_in_range() {
        for (slot, key) in UiKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), slot);
        }
    }

    #[test]
    fn default_io_has_no_callback_and_unmapped_keys() {
        let io = UiIo::default();
        assert!(io.render_callback.is_none());
        assert!(io.key_map.iter().all(|&code| code == -1));
        assert_eq!(io.display_framebuffer_scale, [1.0, 1.0]);
    }

    #[test]
    fn default_atlas_is_one_white_texel() {
        let atlas = FontAtlas::default();
        assert_eq!(atlas.byte_len(), 4);
        assert_eq!(atlas.pixels, vec![0xff; 4]);
    }
}
