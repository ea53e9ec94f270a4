//! Moving-least-squares similarity deformation of a warp grid.
//!
//! Every grid vertex is repositioned independently by a closed-form weighted
//! least-squares fit of a similarity transform (rotation + uniform scale +
//! translation) from the base control points to the current ones, weighted by
//! inverse squared distance. There is no global linear solve: the cost is
//! `O(vertices * control_points)` and each vertex only reads the control
//! points and its own rest coordinate, so evaluation parallelizes per vertex.

use crate::{WarpError, WarpGrid, WarpResult};
use nalgebra::{Point2, Vector2};
use rayon::prelude::*;
use tracing::debug;

/// Squared distances below this clamp to it, so a vertex sitting exactly on
/// a control point gets a large finite weight (`1e5`) instead of a division
/// by zero.
const WEIGHT_EPS: f64 = 1e-5;

/// Grids larger than this are deformed on the rayon thread pool.
const PARALLEL_THRESHOLD: usize = 1000;

/// Deforms `grid` in place so that the base control points `base` map onto
/// their `current` positions.
///
/// Every vertex is recomputed from its *rest* position (derived from the
/// grid's shape metadata, never from the current `vertices` array), so
/// repeated calls with the same control points are idempotent and prior
/// deformation state never accumulates. Only `grid.vertices` is written;
/// texture coordinates, triangles and the shape metadata are read-only.
///
/// The grid must not be deformed concurrently from multiple threads; the
/// function itself parallelizes across vertices for large grids.
///
/// # Errors
///
/// Returns [`WarpError::NoControlPoints`] if `base` is empty and
/// [`WarpError::ControlPointMismatch`] if the slices differ in length. Both
/// are checked before any vertex is touched.
///
/// # Examples
///
/// A single control point degenerates to a pure translation:
///
/// ```
/// use mesh_warp::{build_grid, deform_grid, Point2};
///
/// let mut grid = build_grid(0.0, 0.0, 1.0, 1.0, 0.5).unwrap();
/// let base = [Point2::new(0.25, 0.25)];
/// let current = [Point2::new(0.45, 0.35)];
///
/// deform_grid(&base, &current, &mut grid).unwrap();
///
/// assert!((grid.vertices[0].x - 0.2).abs() < 1e-12);
/// assert!((grid.vertices[0].y - 0.1).abs() < 1e-12);
/// ```
pub fn deform_grid(
    base: &[Point2<f64>],
    current: &[Point2<f64>],
    grid: &mut WarpGrid,
) -> WarpResult<()> {
    if base.is_empty() {
        return Err(WarpError::NoControlPoints);
    }
    if base.len() != current.len() {
        return Err(WarpError::ControlPointMismatch {
            base: base.len(),
            current: current.len(),
        });
    }

    debug!(
        "Deforming grid: {} vertices, {} control points",
        grid.vertices.len(),
        base.len()
    );

    let origin = grid.origin;
    let units = grid.units;
    let columns = grid.columns;
    #[allow(clippy::cast_precision_loss)]
    let rest = move |i: usize| -> Point2<f64> {
        let (ix, iy) = (i % columns, i / columns);
        Point2::new(origin.x + ix as f64 * units, origin.y + iy as f64 * units)
    };

    if grid.vertices.len() > PARALLEL_THRESHOLD {
        grid.vertices
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, v)| *v = deform_vertex(base, current, rest(i)));
    } else {
        for (i, v) in grid.vertices.iter_mut().enumerate() {
            *v = deform_vertex(base, current, rest(i));
        }
    }

    Ok(())
}

/// Parses an interleaved `[x0, y0, x1, y1, ..]` coordinate buffer into
/// control points.
///
/// Convenience for callers that hold control points in flat renderer-style
/// arrays rather than as `Point2` values.
///
/// # Errors
///
/// Returns [`WarpError::OddCoordinateCount`] if the buffer length is odd.
///
/// # Examples
///
/// ```
/// use mesh_warp::{control_points_from_interleaved, Point2};
///
/// let points = control_points_from_interleaved(&[0.5, 0.0, 0.5, 1.0]).unwrap();
/// assert_eq!(points, vec![Point2::new(0.5, 0.0), Point2::new(0.5, 1.0)]);
/// ```
pub fn control_points_from_interleaved(coords: &[f64]) -> WarpResult<Vec<Point2<f64>>> {
    if coords.len() % 2 != 0 {
        return Err(WarpError::OddCoordinateCount { len: coords.len() });
    }
    Ok(coords
        .chunks_exact(2)
        .map(|c| Point2::new(c[0], c[1]))
        .collect())
}

/// Inverse-squared-distance weight of control point `p` seen from vertex `v`,
/// clamped near coincidence.
fn inverse_square_weight(p: Point2<f64>, v: Point2<f64>) -> f64 {
    let d2 = (p - v).norm_squared();
    // d2 is non-negative, so only the lower bound needs guarding.
    if d2 < WEIGHT_EPS {
        1.0 / WEIGHT_EPS
    } else {
        1.0 / d2
    }
}

/// Solves the weighted similarity fit for a single vertex at rest position
/// `v` and returns its deformed position.
#[allow(clippy::many_single_char_names, clippy::similar_names)]
fn deform_vertex(base: &[Point2<f64>], current: &[Point2<f64>], v: Point2<f64>) -> Point2<f64> {
    // Weighted centroids of both poses.
    let mut sum_w = 0.0;
    let mut p_sum = Vector2::zeros();
    let mut q_sum = Vector2::zeros();
    for (&p, &q) in base.iter().zip(current) {
        let w = inverse_square_weight(p, v);
        sum_w += w;
        p_sum += w * p.coords;
        q_sum += w * q.coords;
    }
    let p_star = Point2::from(p_sum / sum_w);
    let q_star = Point2::from(q_sum / sum_w);

    let d = v - p_star;
    // Clockwise perpendicular of (v - p*); forms the second row of each
    // per-point similarity matrix.
    let d_perp = Vector2::new(d.y, -d.x);

    // Accumulate the current-pose offsets projected through each control
    // point's contribution to the best-fit similarity matrix.
    let mut f: Vector2<f64> = Vector2::zeros();
    for (&p, &q) in base.iter().zip(current) {
        let w = inverse_square_weight(p, v);
        let p_hat = p - p_star;
        let q_hat = q - q_star;
        let a11 = p.coords.dot(&d);
        let a21 = d.perp(&p_hat);
        let a12 = p.coords.dot(&d_perp);
        let a22 = d_perp.perp(&p_hat);
        f.x += w * (q_hat.x * a11 + q_hat.y * a21);
        f.y += w * (q_hat.x * a12 + q_hat.y * a22);
    }

    let f_len2 = f.norm_squared();
    if f_len2 > 0.0 {
        // Rescale the fit vector to the vertex's rest distance from the
        // centroid, turning the similarity fit into uniform local scaling.
        let scale = (d.norm_squared() / f_len2).sqrt();
        q_star + f * scale
    } else {
        // A vanishing fit vector carries no rotation information (e.g. a
        // single control point, or the vertex sits on the weighted centroid):
        // translate by the centroid displacement.
        q_star + d
    }
}
