//! Math types and the UI projection matrix

pub use nalgebra::{Matrix4, Vector2, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Orthographic projection for UI rendering, as column-major arrays
/// ready for push-constant upload.
///
/// Maps pixel space to clip space with the Y axis flipped for Vulkan:
/// pixel (0,0) lands at clip (-1,1), pixel (width,height) at (1,-1).
pub fn ui_projection(width: f32, height: f32) -> [[f32; 4]; 4] {
    [
        [2.0 / width, 0.0, 0.0, 0.0],
        [0.0, -2.0 / height, 0.0, 0.0],
        [0.0, 0.0, -1.0, 0.0],
        [-1.0, 1.0, 0.0, 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn projection_matrix(width: f32, height: f32) -> Mat4 {
        Mat4::from_fn(|row, col| ui_projection(width, height)[col][row])
    }

    fn project(width: f32, height: f32, x: f32, y: f32) -> (f32, f32) {
        let clip = projection_matrix(width, height) * Vec4::new(x, y, 0.0, 1.0);
        (clip.x, clip.y)
    }

    #[test]
    fn origin_maps_to_top_left_clip_corner() {
        let (x, y) = project(800.0, 600.0, 0.0, 0.0);
        assert_relative_eq!(x, -1.0);
        assert_relative_eq!(y, 1.0);
    }

    #[test]
    fn full_extent_maps_to_bottom_right_clip_corner() {
        let (x, y) = project(800.0, 600.0, 800.0, 600.0);
        assert_relative_eq!(x, 1.0);
        assert_relative_eq!(y, -1.0);
    }

    #[test]
    fn center_maps_to_clip_origin() {
        let (x, y) = project(1024.0, 768.0, 512.0, 384.0);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0);
    }

    #[test]
    fn columns_are_column_major() {
        // Translation lives in the last column, not the last row
        let cols = ui_projection(640.0, 480.0);
        assert_relative_eq!(cols[3][0], -1.0);
        assert_relative_eq!(cols[3][1], 1.0);
        assert_relative_eq!(cols[0][3], 0.0);
        assert_relative_eq!(cols[1][3], 0.0);
    }
}
