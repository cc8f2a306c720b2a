//! Per-frame draw data produced by the UI library
//!
//! A [`DrawData`] snapshot is immutable once built and is consumed
//! synchronously within one render call; it never outlives that call.

use bytemuck::{Pod, Zeroable};

/// Single UI vertex: position and UV in pixels, packed RGBA color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawVert {
    /// Position in pixel coordinates, origin at the top-left
    pub pos: [f32; 2],
    /// Texture coordinates into the font atlas
    pub uv: [f32; 2],
    /// Packed RGBA color, one byte per channel
    pub col: u32,
}

/// Custom draw callback invoked in place of an indexed draw
pub type DrawCallback = fn(&DrawList, &DrawCmd);

/// One draw instruction: a contiguous run of indices with a clip rect,
/// or a custom callback
#[derive(Debug, Clone, Copy)]
pub struct DrawCmd {
    /// Number of indices consumed by this command
    pub elem_count: u32,
    /// Clip rectangle as (min_x, min_y, max_x, max_y) in pixels
    pub clip_rect: [f32; 4],
    /// When set, invoked instead of issuing a draw call
    pub callback: Option<DrawCallback>,
}

impl DrawCmd {
    /// Create an indexed draw command
    pub fn indexed(elem_count: u32, clip_rect: [f32; 4]) -> Self {
        Self {
            elem_count,
            clip_rect,
            callback: None,
        }
    }
}

/// One batch of vertex/index data plus its ordered draw commands
///
/// The UI library emits one list per logical layer or window. Indices
/// are 16-bit and relative to the list's own vertex buffer.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    /// Vertex buffer for every command in this list
    pub vertices: Vec<DrawVert>,
    /// 16-bit index buffer, consumed in command emission order
    pub indices: Vec<u16>,
    /// Ordered draw commands
    pub commands: Vec<DrawCmd>,
}

impl DrawList {
    /// Total number of indices claimed by this list's commands
    pub fn total_elem_count(&self) -> u32 {
        self.commands.iter().map(|cmd| cmd.elem_count).sum()
    }

    /// Byte size of the vertex region when uploaded
    pub fn vertex_bytes(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<DrawVert>()
    }

    /// Byte size of the index region when uploaded
    pub fn index_bytes(&self) -> usize {
        self.indices.len() * std::mem::size_of::<u16>()
    }
}

/// The complete draw output of one UI frame
#[derive(Debug, Clone, Default)]
pub struct DrawData {
    /// Draw lists in emission order
    pub lists: Vec<DrawList>,
}

impl DrawData {
    /// Scale every clip rectangle by the framebuffer scale factor
    ///
    /// DPI correction: clip rects are emitted in logical pixels and the
    /// scissor test runs in framebuffer pixels.
    pub fn scale_clip_rects(&mut self, scale: [f32; 2]) {
        for list in &mut self.lists {
            for cmd in &mut list.commands {
                cmd.clip_rect[0] *= scale[0];
                cmd.clip_rect[1] *= scale[1];
                cmd.clip_rect[2] *= scale[0];
                cmd.clip_rect[3] *= scale[1];
            }
        }
    }

    /// Total vertex count across all lists
    pub fn total_vtx_count(&self) -> usize {
        self.lists.iter().map(|list| list.vertices.len()).sum()
    }

    /// Total index count across all lists
    pub fn total_idx_count(&self) -> usize {
        self.lists.iter().map(|list| list.indices.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_vert_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<DrawVert>(), 20);
    }

    #[test]
    fn scale_clip_rects_applies_per_axis_factors() {
        let mut data = DrawData {
            lists: vec![DrawList {
                commands: vec![DrawCmd::indexed(6, [10.0, 20.0, 110.0, 220.0])],
                ..DrawList::default()
            }],
        };
        data.scale_clip_rects([2.0, 0.5]);
        assert_eq!(data.lists[0].commands[0].clip_rect, [20.0, 10.0, 220.0, 110.0]);
    }

    #[test]
    fn totals_sum_across_lists() {
        let list = DrawList {
            vertices: vec![DrawVert::zeroed(); 4],
            indices: vec![0, 1, 2, 2, 3, 0],
            commands: vec![DrawCmd::indexed(6, [0.0; 4])],
        };
        let data = DrawData {
            lists: vec![list.clone(), list],
        };
        assert_eq!(data.total_vtx_count(), 8);
        assert_eq!(data.total_idx_count(), 12);
        assert_eq!(data.lists[0].total_elem_count(), 6);
        assert_eq!(data.lists[0].vertex_bytes(), 4 * 20);
        assert_eq!(data.lists[0].index_bytes(), 12);
    }
}
