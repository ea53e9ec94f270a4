//! Control-point-driven 2D grid warping.
//!
//! This crate deforms a uniform rectangular mesh according to the displacement
//! of a small set of user-chosen control points, using a moving-least-squares
//! (MLS) similarity transform evaluated independently at every grid vertex.
//! It is the puppet-warp building block for images, sprites and 2D shapes:
//! build a grid over the artwork once, then drag a handful of anchor points
//! and re-deform every frame.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero engine dependencies. The grid exposes
//! plain vertex/uv/index buffers any renderer can consume.
//!
//! # Quick Start
//!
//! ```
//! use mesh_warp::{build_grid, deform_grid, Point2};
//!
//! // Cover the unit square with a 0.1-spaced grid.
//! let mut grid = build_grid(0.0, 0.0, 1.0, 1.0, 0.1).unwrap();
//!
//! // Two anchors: drag the top-center one to the right, pin the bottom one.
//! let base = [Point2::new(0.5, 0.0), Point2::new(0.5, 1.0)];
//! let current = [Point2::new(0.7, 0.0), Point2::new(0.5, 1.0)];
//!
//! // Rewrites grid.vertices in place; uvs and triangles are untouched.
//! deform_grid(&base, &current, &mut grid).unwrap();
//! ```
//!
//! # Algorithm
//!
//! For each vertex at its rest position `v`, control points are weighted by
//! inverse squared distance to `v` (clamped near coincidence), and the
//! closed-form best-fit similarity transform from the base pose to the
//! current pose is applied to `v`. Local angles are preserved and local
//! scaling is uniform; there is no global linear solve, so the cost is
//! `O(vertices * control_points)` per call. Vertices are independent of each
//! other and large grids are evaluated on the rayon thread pool.
//!
//! Because every call recomputes vertices from the grid's shape metadata,
//! deformation never accumulates: feeding the same control points twice
//! yields the same result, and restoring `current == base` restores the rest
//! pose.
//!
//! # Quality Standards
//!
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod deform;
mod error;
mod grid;

pub use deform::{control_points_from_interleaved, deform_grid};
pub use error::{WarpError, WarpResult};
pub use grid::{build_grid, WarpGrid};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod integration_tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_puppet_drag_end_to_end() {
        let mut grid = build_grid(0.0, 0.0, 1.0, 1.0, 0.1).unwrap();
        let rest = grid.vertices.clone();

        let base = [Point2::new(0.5, 0.0), Point2::new(0.5, 1.0)];
        let current = [Point2::new(0.7, 0.0), Point2::new(0.5, 1.0)];
        deform_grid(&base, &current, &mut grid).unwrap();

        assert_eq!(grid.vertices.len(), rest.len());
        for v in &grid.vertices {
            assert!(v.x.is_finite() && v.y.is_finite());
        }

        // The vertex on the dragged anchor follows it.
        let dragged = grid.index_of(5, 0);
        let err = (grid.vertices[dragged] - Point2::new(0.7, 0.0)).norm();
        assert!(err < 0.01, "dragged vertex off by {err}");

        // The vertex on the pinned anchor stays put.
        let pinned = grid.index_of(5, 10);
        let err = (grid.vertices[pinned] - Point2::new(0.5, 1.0)).norm();
        assert!(err < 0.01, "pinned vertex off by {err}");
    }

    #[test]
    fn test_uvs_and_triangles_survive_deformation() {
        let mut grid = build_grid(0.0, 0.0, 2.0, 1.0, 0.25).unwrap();
        let uvs = grid.texture_coords.clone();
        let tris = grid.triangles.clone();

        let base = [Point2::new(1.0, 0.5)];
        let current = [Point2::new(1.5, 0.25)];
        deform_grid(&base, &current, &mut grid).unwrap();

        assert_eq!(grid.texture_coords, uvs);
        assert_eq!(grid.triangles, tris);
    }

    #[test]
    fn test_interleaved_round_trip_through_deform() {
        let mut grid = build_grid(0.0, 0.0, 1.0, 1.0, 0.5).unwrap();

        let base = control_points_from_interleaved(&[0.5, 0.0, 0.5, 1.0]).unwrap();
        let current = control_points_from_interleaved(&[0.7, 0.0, 0.5, 1.0]).unwrap();
        deform_grid(&base, &current, &mut grid).unwrap();

        let buffer = grid.vertex_buffer();
        assert_eq!(buffer.len(), 2 * grid.vertex_count());
        for (i, v) in grid.vertices.iter().enumerate() {
            assert_eq!(buffer[2 * i], v.x as f32);
            assert_eq!(buffer[2 * i + 1], v.y as f32);
        }
    }

    #[test]
    fn test_per_frame_update_loop() {
        // Simulate an animation loop: the base pose is fixed, the dragged
        // pivot sweeps, and the last frame returns to the rest pose.
        let mut grid = build_grid(0.0, 0.0, 1.0, 1.0, 0.2).unwrap();
        let rest = grid.vertices.clone();

        let base = [Point2::new(0.2, 0.2), Point2::new(0.8, 0.8)];
        for step in 0..10 {
            let t = f64::from(step) / 10.0;
            let current = [Point2::new(0.2 + 0.3 * t, 0.2), Point2::new(0.8, 0.8)];
            deform_grid(&base, &current, &mut grid).unwrap();
        }
        deform_grid(&base, &base, &mut grid).unwrap();

        for (v, r) in grid.vertices.iter().zip(&rest) {
            assert_relative_eq!(v.x, r.x, epsilon = 1e-9);
            assert_relative_eq!(v.y, r.y, epsilon = 1e-9);
        }
    }
}
