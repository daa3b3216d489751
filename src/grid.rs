//! Pixel grid math shared by the compute pass and the CPU tracer.

/// Edge length of a compute tile. Must match `@workgroup_size` in trace.wgsl.
pub const WORKGROUP_SIZE: u32 = 32;

/// Workgroups needed to cover a `width` x `height` target with 32x32 tiles.
pub fn workgroup_count(width: u32, height: u32) -> (u32, u32, u32) {
    (
        width.div_ceil(WORKGROUP_SIZE),
        height.div_ceil(WORKGROUP_SIZE),
        1,
    )
}

/// Normalized coordinate of pixel `(x, y)` plus a sub-pixel offset. Each axis spans
/// [0, 1] from the first to the last pixel.
pub fn pixel_uv(x: u32, y: u32, width: u32, height: u32, jitter: [f32; 2]) -> [f32; 2] {
    let du = (width.max(2) - 1) as f32;
    let dv = (height.max(2) - 1) as f32;
    [(x as f32 + jitter[0]) / du, (y as f32 + jitter[1]) / dv]
}

/// Texel the gradient mode writes at `(x, y)`, or `None` for invocations past the
/// edge of the target, which are skipped.
pub fn gradient_texel(x: u32, y: u32, width: u32, height: u32) -> Option<[f32; 4]> {
    if x >= width || y >= height {
        return None;
    }
    let [u, v] = pixel_uv(x, y, width, height, [0.0, 0.0]);
    Some([u, v, 0.25, 1.0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_count() {
        assert_eq!(workgroup_count(800, 600), (25, 19, 1));
        assert_eq!(workgroup_count(64, 32), (2, 1, 1));
        assert_eq!(workgroup_count(65, 1), (3, 1, 1));
        assert_eq!(workgroup_count(0, 0), (0, 0, 1));
    }

    #[test]
    fn test_gradient_at_default_size() {
        assert_eq!(gradient_texel(0, 0, 800, 600), Some([0.0, 0.0, 0.25, 1.0]));
        assert_eq!(gradient_texel(799, 599, 800, 600), Some([1.0, 1.0, 0.25, 1.0]));

        let [r, g, b, a] = gradient_texel(400, 300, 800, 600).unwrap();
        assert!((r - 400.0 / 799.0).abs() < 1e-7);
        assert!((g - 300.0 / 599.0).abs() < 1e-7);
        assert_eq!((b, a), (0.25, 1.0));
    }

    #[test]
    fn test_gradient_skips_excess_invocations() {
        // A 25x19 dispatch covers 800x608; the last 8 rows must be skipped.
        let (gx, gy, _) = workgroup_count(800, 600);
        assert!(gy * WORKGROUP_SIZE > 600);
        assert_eq!(gradient_texel(0, 600, 800, 600), None);
        assert_eq!(gradient_texel(800, 0, 800, 600), None);
        assert_eq!(gradient_texel(gx * WORKGROUP_SIZE - 1, gy * WORKGROUP_SIZE - 1, 800, 600), None);
    }

    #[test]
    fn test_single_pixel_target_has_no_division_by_zero() {
        assert_eq!(gradient_texel(0, 0, 1, 1), Some([0.0, 0.0, 0.25, 1.0]));
    }
}
