//! Uniform rectangular warp grid construction.
//!
//! A [`WarpGrid`] covers an axis-aligned rectangle with vertices spaced
//! `units` apart, listed left-to-right then top-to-bottom. Each grid cell is
//! split into two triangles for rendering. The grid remembers its defining
//! rectangle and cell size so that [`deform_grid`](crate::deform_grid) can
//! recompute every vertex's rest position from scratch on each call.

use crate::{WarpError, WarpResult};
use nalgebra::Point2;
use tracing::debug;

/// A uniform rectangular 2D mesh driven by control-point deformation.
///
/// Vertices and texture coordinates are stored row-major (left-to-right,
/// top-to-bottom). Only [`vertices`](Self::vertices) is rewritten by
/// [`deform_grid`](crate::deform_grid); everything else is fixed at
/// construction.
///
/// # Examples
///
/// ```
/// use mesh_warp::build_grid;
///
/// let grid = build_grid(0.0, 0.0, 1.0, 1.0, 0.5).unwrap();
///
/// assert_eq!(grid.columns, 3);
/// assert_eq!(grid.rows, 3);
/// assert_eq!(grid.vertices.len(), 9);
/// assert_eq!(grid.triangles.len(), 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WarpGrid {
    /// Upper-left corner of the covered rectangle.
    pub origin: Point2<f64>,
    /// Width of the covered rectangle. Strictly positive.
    pub width: f64,
    /// Height of the covered rectangle. Strictly positive.
    pub height: f64,
    /// Spacing between adjacent vertices. Strictly positive.
    pub units: f64,
    /// Number of vertex columns: `ceil(width / units + 1)`.
    pub columns: usize,
    /// Number of vertex rows: `ceil(height / units + 1)`.
    pub rows: usize,
    /// Vertex positions, row-major, `columns * rows` entries.
    ///
    /// This is the only field [`deform_grid`](crate::deform_grid) mutates.
    pub vertices: Vec<Point2<f64>>,
    /// Normalized texture coordinates, same length and order as `vertices`.
    ///
    /// `u = ix * units / width`, `v = iy * units / height`. Values can exceed
    /// 1.0 on the last row/column when the rectangle is not an exact multiple
    /// of `units`.
    pub texture_coords: Vec<Point2<f64>>,
    /// Triangle faces as indices into `vertices`, two per grid cell.
    ///
    /// Each cell emits `[a, b, c]` then `[c, b, d]` where `a` is the cell's
    /// upper-left corner, `b` upper-right, `c` lower-left, `d` lower-right.
    pub triangles: Vec<[u32; 3]>,
}

impl WarpGrid {
    /// Total number of vertices (`columns * rows`).
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Number of grid cells (`(columns - 1) * (rows - 1)`).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        (self.columns - 1) * (self.rows - 1)
    }

    /// Row-major vertex index for column `ix`, row `iy`.
    #[must_use]
    pub fn index_of(&self, ix: usize, iy: usize) -> usize {
        ix + iy * self.columns
    }

    /// Undeformed position of the vertex at column `ix`, row `iy`.
    ///
    /// Derived from the grid's shape metadata, not from the current (possibly
    /// deformed) `vertices` array.
    #[must_use]
    pub fn rest_position(&self, ix: usize, iy: usize) -> Point2<f64> {
        #[allow(clippy::cast_precision_loss)]
        let (fx, fy) = (ix as f64, iy as f64);
        Point2::new(
            self.origin.x + fx * self.units,
            self.origin.y + fy * self.units,
        )
    }

    /// Vertex positions as an interleaved `[x0, y0, x1, y1, ..]` buffer,
    /// ready for upload to a renderer.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn vertex_buffer(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32])
            .collect()
    }

    /// Texture coordinates as an interleaved `[u0, v0, u1, v1, ..]` buffer.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn uv_buffer(&self) -> Vec<f32> {
        self.texture_coords
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32])
            .collect()
    }

    /// Triangle indices flattened to `[a, b, c, c, b, d, ..]`, preserving the
    /// per-cell winding order.
    #[must_use]
    pub fn index_buffer(&self) -> Vec<u32> {
        self.triangles.iter().flat_map(|t| *t).collect()
    }
}

/// Builds a uniform rectangular warp grid covering `(x, y, w, h)` with
/// vertices spaced `units` apart.
///
/// Vertices and texture coordinates are emitted row-major; each cell is split
/// into two triangles `[a, b, c]` and `[c, b, d]`. The construction is pure
/// and deterministic.
///
/// # Errors
///
/// Returns [`WarpError::NonFiniteArgument`] if any parameter is NaN or
/// infinite, and [`WarpError::NonPositiveDimension`] if `w`, `h` or `units`
/// is zero or negative.
///
/// # Examples
///
/// ```
/// use mesh_warp::build_grid;
///
/// let grid = build_grid(0.0, 0.0, 1.0, 1.0, 0.5).unwrap();
///
/// // Center vertex sits at (0.5, 0.5) with matching texture coordinate.
/// let center = grid.index_of(1, 1);
/// assert_eq!(grid.vertices[center].x, 0.5);
/// assert_eq!(grid.texture_coords[center].y, 0.5);
/// ```
pub fn build_grid(x: f64, y: f64, w: f64, h: f64, units: f64) -> WarpResult<WarpGrid> {
    for (name, value) in [("x", x), ("y", y), ("w", w), ("h", h), ("units", units)] {
        if !value.is_finite() {
            return Err(WarpError::NonFiniteArgument { name, value });
        }
    }
    for (name, value) in [("w", w), ("h", h), ("units", units)] {
        if value <= 0.0 {
            return Err(WarpError::NonPositiveDimension { name, value });
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let columns = (w / units + 1.0).ceil() as usize;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rows = (h / units + 1.0).ceil() as usize;

    let mut vertices = Vec::with_capacity(columns * rows);
    let mut texture_coords = Vec::with_capacity(columns * rows);
    for iy in 0..rows {
        for ix in 0..columns {
            #[allow(clippy::cast_precision_loss)]
            let (fx, fy) = (ix as f64, iy as f64);
            vertices.push(Point2::new(x + fx * units, y + fy * units));
            texture_coords.push(Point2::new(fx * units / w, fy * units / h));
        }
    }

    let mut triangles = Vec::with_capacity((columns - 1) * (rows - 1) * 2);
    #[allow(clippy::cast_possible_truncation)]
    for iy in 0..rows - 1 {
        for ix in 0..columns - 1 {
            let a = (ix + iy * columns) as u32;
            let b = (ix + 1 + iy * columns) as u32;
            let c = (ix + (iy + 1) * columns) as u32;
            let d = (ix + 1 + (iy + 1) * columns) as u32;
            triangles.push([a, b, c]);
            triangles.push([c, b, d]);
        }
    }

    debug!(
        "Built warp grid: {} columns, {} rows, {} triangles",
        columns,
        rows,
        triangles.len()
    );

    Ok(WarpGrid {
        origin: Point2::new(x, y),
        width: w,
        height: h,
        units,
        columns,
        rows,
        vertices,
        texture_coords,
        triangles,
    })
}
