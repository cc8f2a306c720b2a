//! Pure draw-call planning for one draw list
//!
//! Converting draw commands into scissor + indexed-draw pairs involves
//! only arithmetic, so it lives here where it can be unit tested
//! without a device. The backend replays the resulting steps onto a
//! command buffer.

use crate::ui::draw::{DrawCallback, DrawList};

/// Integer scissor rectangle in framebuffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scissor {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// One planned step of a draw list replay
#[derive(Debug, Clone, Copy)]
pub enum DrawStep {
    /// Set the scissor and issue an indexed draw
    Indexed {
        /// First index into the list's index buffer
        first_index: u32,
        /// Number of indices to draw
        index_count: u32,
        /// Scissor rectangle derived from the command's clip rect
        scissor: Scissor,
    },
    /// Invoke the command's custom callback instead of drawing
    Callback {
        /// The callback to invoke
        callback: DrawCallback,
        /// Index of the originating command within the list
        command_index: usize,
    },
}

/// Truncate a clip rectangle to an integer scissor
///
/// Matches the device convention: offsets and extents are truncated
/// toward zero, with extents computed from the rect's edges first.
pub fn scissor_from_clip(clip: [f32; 4]) -> Scissor {
    Scissor {
        x: clip[0] as i32,
        y: clip[1] as i32,
        width: (clip[2] - clip[0]) as u32,
        height: (clip[3] - clip[1]) as u32,
    }
}

/// Plan the replay of one draw list
///
/// The running index offset starts at zero for every list and
/// accumulates across its commands in emission order. Callback commands
/// advance the offset by their element count just like draws, so
/// geometry claimed by a callback is skipped, not re-drawn.
pub fn plan_list(list: &DrawList) -> Vec<DrawStep> {
    let mut steps = Vec::with_capacity(list.commands.len());
    let mut index_offset = 0u32;

    for (command_index, cmd) in list.commands.iter().enumerate() {
        match cmd.callback {
            Some(callback) => steps.push(DrawStep::Callback {
                callback,
                command_index,
            }),
            None => steps.push(DrawStep::Indexed {
                first_index: index_offset,
                index_count: cmd.elem_count,
                scissor: scissor_from_clip(cmd.clip_rect),
            }),
        }
        index_offset += cmd.elem_count;
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::draw::{DrawCmd, DrawData, DrawList, DrawVert};
    use bytemuck::Zeroable;

    fn list_with_counts(counts: &[u32]) -> DrawList {
        let total: u32 = counts.iter().sum();
        DrawList {
            vertices: vec![DrawVert::zeroed(); total as usize],
            indices: vec![0; total as usize],
            commands: counts
                .iter()
                .map(|&count| DrawCmd::indexed(count, [0.0, 0.0, 64.0, 64.0]))
                .collect(),
        }
    }

    fn planned_index_total(steps: &[DrawStep]) -> u32 {
        steps
            .iter()
            .map(|step| match step {
                DrawStep::Indexed { index_count, .. } => *index_count,
                DrawStep::Callback { .. } => 0,
            })
            .sum()
    }

    #[test]
    fn offsets_accumulate_within_a_list() {
        let list = list_with_counts(&[6, 12, 3]);
        let steps = plan_list(&list);

        let offsets: Vec<u32> = steps
            .iter()
            .map(|step| match step {
                DrawStep::Indexed { first_index, .. } => *first_index,
                DrawStep::Callback { .. } => panic!("no callbacks planned"),
            })
            .collect();
        assert_eq!(offsets, vec![0, 6, 18]);
    }

    #[test]
    fn offsets_reset_per_list() {
        let data = DrawData {
            lists: vec![list_with_counts(&[6, 6]), list_with_counts(&[9])],
        };

        for list in &data.lists {
            match plan_list(list)[0] {
                DrawStep::Indexed { first_index, .. } => assert_eq!(first_index, 0),
                DrawStep::Callback { .. } => panic!("no callbacks planned"),
            }
        }
    }

    #[test]
    fn total_planned_indices_equal_sum_of_elem_counts() {
        let list = list_with_counts(&[6, 12, 3, 30]);
        assert_eq!(planned_index_total(&plan_list(&list)), 51);
        assert_eq!(planned_index_total(&plan_list(&list)), list.total_elem_count());
    }

    #[test]
    fn callback_commands_still_advance_the_offset() {
        fn noop(_list: &DrawList, _cmd: &DrawCmd) {}

        let mut list = list_with_counts(&[6, 6, 6]);
        list.commands[1].callback = Some(noop);

        let steps = plan_list(&list);
        assert!(matches!(steps[1], DrawStep::Callback { command_index: 1, .. }));
        match steps[2] {
            DrawStep::Indexed { first_index, .. } => assert_eq!(first_index, 12),
            DrawStep::Callback { .. } => panic!("third command draws"),
        }
    }

    #[test]
    fn empty_list_plans_no_steps() {
        assert!(plan_list(&DrawList::default()).is_empty());
    }

    #[test]
    fn scissor_truncates_toward_zero() {
        let scissor = scissor_from_clip([10.7, 20.2, 110.9, 220.8]);
        assert_eq!(
            scissor,
            Scissor {
                x: 10,
                y: 20,
                width: 100,
                height: 200,
            }
        );
    }

    #[test]
    fn scissor_extent_is_edge_difference() {
        // Scaled clip rects keep extents consistent with their edges
        let mut data = DrawData {
            lists: vec![DrawList {
                commands: vec![DrawCmd::indexed(6, [10.0, 10.0, 20.0, 30.0])],
                ..DrawList::default()
            }],
        };
        data.scale_clip_rects([2.0, 2.0]);
        let scissor = scissor_from_clip(data.lists[0].commands[0].clip_rect);
        assert_eq!(
            scissor,
            Scissor {
                x: 20,
                y: 20,
                width: 20,
                height: 40,
            }
        );
    }
}
