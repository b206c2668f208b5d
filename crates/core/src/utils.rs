//! Geometry primitives and spatial helpers.
//!
//! Provides the tuple-based `Point`/`Rect`/`Matrix` types used throughout the
//! engine, affine matrix operations, rectangle algebra, the [`HasBBox`] trait,
//! the reading/depth comparators that define layout order, and a [`Plane`]
//! spatial index for neighbor queries over boxed objects.
//!
//! Coordinates are PDF user space: X grows to the right (the reading
//! direction for left-to-right scripts), Y grows upward. "Depth" is measured
//! from the top of the page downward, so a greater depth is further down the
//! page.

use std::cmp::Ordering;

use rstar::{RTree, RTreeObject, AABB};

/// Tolerance below which two coordinates are considered equal.
pub const TOL: f64 = 1e-6;

/// Floating-point infinity stand-in for bounding box accumulation.
pub const INF_F64: f64 = f64::MAX;

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle (x0, y0, x1, y1): lower-left and upper-right corners.
/// Once normalized, `x0 <= x1` and `y0 <= y1`.
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transform (a, b, c, d, e, f) mapping
/// (x, y) to (a·x + c·y + e, b·x + d·y + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

// ============================================================================
// Matrix operations
// ============================================================================

/// Composes two transforms. `m` is applied first, then `n`.
pub fn mult_matrix(m: Matrix, n: Matrix) -> Matrix {
    let (am, bm, cm, dm, em, fm) = m;
    let (an, bn, cn, dn, en, fn_) = n;
    (
        am * an + bm * cn,
        am * bn + bm * dn,
        cm * an + dm * cn,
        cm * bn + dm * dn,
        em * an + fm * cn + en,
        em * bn + fm * dn + fn_,
    )
}

/// Translates a matrix by (x, y) in its own coordinate system, i.e. the
/// translation is applied before `m`.
pub fn translate_matrix(m: Matrix, v: Point) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a, b, c, d, x * a + y * c + e, x * b + y * d + f)
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Applies a matrix to a rectangle.
///
/// The result is not a rotated rectangle but the axis-aligned envelope of
/// the transformed corners.
pub fn apply_matrix_rect(m: Matrix, rect: Rect) -> Rect {
    let (x0, y0, x1, y1) = rect;
    let corners = [
        apply_matrix_pt(m, (x0, y0)),
        apply_matrix_pt(m, (x1, y0)),
        apply_matrix_pt(m, (x1, y1)),
        apply_matrix_pt(m, (x0, y1)),
    ];
    let mut out = (INF_F64, INF_F64, -INF_F64, -INF_F64);
    for (x, y) in corners {
        out.0 = out.0.min(x);
        out.1 = out.1.min(y);
        out.2 = out.2.max(x);
        out.3 = out.3.max(y);
    }
    out
}

/// Applies a matrix to a vector, ignoring translation.
pub fn apply_matrix_norm(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, _e, _f) = m;
    let (p, q) = v;
    (a * p + c * q, b * p + d * q)
}

/// The horizontal scaling factor of a matrix: the length of the image of the
/// unit X vector.
pub fn matrix_scale_x(m: Matrix) -> f64 {
    m.0.hypot(m.1)
}

/// The vertical scaling factor of a matrix: the length of the image of the
/// unit Y vector.
pub fn matrix_scale_y(m: Matrix) -> f64 {
    m.2.hypot(m.3)
}

/// The rotation angle of a matrix in degrees, normalized to [0, 360).
pub fn matrix_angle(m: Matrix) -> f64 {
    let deg = m.1.atan2(m.0).to_degrees();
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

/// The translation component of a matrix.
pub fn matrix_translation(m: Matrix) -> Point {
    (m.4, m.5)
}

/// A pure rotation by `deg` degrees counterclockwise.
pub fn rotation_matrix(deg: f64) -> Matrix {
    let rad = deg.to_radians();
    let (sin, cos) = rad.sin_cos();
    (cos, sin, -sin, cos, 0.0, 0.0)
}

/// Inverts an affine matrix. Returns None for singular matrices.
pub fn matrix_inverse(m: Matrix) -> Option<Matrix> {
    let (a, b, c, d, e, f) = m;
    let det = a * d - b * c;
    if det.abs() < TOL {
        return None;
    }
    let ia = d / det;
    let ib = -b / det;
    let ic = -c / det;
    let id = a / det;
    Some((ia, ib, ic, id, -(e * ia + f * ic), -(e * ib + f * id)))
}

// ============================================================================
// Rectangle operations
// ============================================================================

/// The smallest rectangle containing both `a` and `b`.
pub fn rect_union(a: Rect, b: Rect) -> Rect {
    (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))
}

/// The intersection of `a` and `b`, or None when they do not meet.
///
/// Degenerate (zero-width or zero-height) intersections are kept: a glyph
/// with zero advance still carries text content.
pub fn rect_intersection(a: Rect, b: Rect) -> Option<Rect> {
    let x0 = a.0.max(b.0);
    let y0 = a.1.max(b.1);
    let x1 = a.2.min(b.2);
    let y1 = a.3.min(b.3);
    if x0 > x1 || y0 > y1 {
        None
    } else {
        Some((x0, y0, x1, y1))
    }
}

/// Whether `outer` fully contains `inner`.
pub fn rect_contains(outer: Rect, inner: Rect) -> bool {
    outer.0 <= inner.0 && outer.1 <= inner.1 && inner.2 <= outer.2 && inner.3 <= outer.3
}

/// Normalizes an inverted rectangle by swapping corners.
pub fn rect_normalize(r: Rect) -> Rect {
    let (x0, y0, x1, y1) = r;
    (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
}

/// Whether the X intervals of two rectangles overlap.
pub fn rect_x_overlap(a: Rect, b: Rect) -> bool {
    a.0 <= b.2 && b.0 <= a.2
}

/// Whether the Y intervals of two rectangles overlap.
pub fn rect_y_overlap(a: Rect, b: Rect) -> bool {
    a.1 <= b.3 && b.1 <= a.3
}

// ============================================================================
// Bounded objects and layout comparators
// ============================================================================

/// Trait for objects that have a bounding box.
pub trait HasBBox {
    fn x0(&self) -> f64;
    fn y0(&self) -> f64;
    fn x1(&self) -> f64;
    fn y1(&self) -> f64;

    fn bbox(&self) -> Rect {
        (self.x0(), self.y0(), self.x1(), self.y1())
    }

    fn width(&self) -> f64 {
        self.x1() - self.x0()
    }

    fn height(&self) -> f64 {
        self.y1() - self.y0()
    }
}

impl HasBBox for Rect {
    fn x0(&self) -> f64 {
        self.0
    }
    fn y0(&self) -> f64 {
        self.1
    }
    fn x1(&self) -> f64 {
        self.2
    }
    fn y1(&self) -> f64 {
        self.3
    }
}

/// Difference of reading-axis positions: `a.x0 - b.x0`.
pub fn diff_reading<A: HasBBox + ?Sized, B: HasBBox + ?Sized>(a: &A, b: &B) -> f64 {
    a.x0() - b.x0()
}

/// Difference of depths. Positive when `a` is further down the page than `b`.
pub fn diff_depth<A: HasBBox + ?Sized, B: HasBBox + ?Sized>(a: &A, b: &B) -> f64 {
    b.y0() - a.y0()
}

/// Gap along the reading axis from the end of `b` to the start of `a`.
/// Negative when they overlap.
pub fn gap_reading<A: HasBBox + ?Sized, B: HasBBox + ?Sized>(a: &A, b: &B) -> f64 {
    a.x0() - b.x1()
}

fn ordering_of(first: f64, second: f64) -> Ordering {
    let primary = if first.abs() >= TOL { first } else { second };
    if primary < 0.0 {
        Ordering::Less
    } else if primary > 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Orders by reading-axis position, breaking near-ties by depth.
pub fn diff_reading_then_depth<A: HasBBox + ?Sized, B: HasBBox + ?Sized>(
    a: &A,
    b: &B,
) -> Ordering {
    ordering_of(diff_reading(a, b), diff_depth(a, b))
}

/// Orders by depth, breaking near-ties by reading-axis position.
pub fn diff_depth_then_reading<A: HasBBox + ?Sized, B: HasBBox + ?Sized>(
    a: &A,
    b: &B,
) -> Ordering {
    ordering_of(diff_depth(a, b), diff_reading(a, b))
}

// ============================================================================
// Plane spatial index
// ============================================================================

#[derive(Clone)]
struct PlaneNode {
    id: usize,
    bbox: Rect,
}

impl PartialEq for PlaneNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl RTreeObject for PlaneNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.bbox.0, self.bbox.1], [self.bbox.2, self.bbox.3])
    }
}

/// A set-like structure for objects placed on a plane, with intersection
/// queries backed by an R-tree. Items keep stable ids (insertion order).
pub struct Plane<T> {
    seq: Vec<T>,
    bboxes: Vec<Rect>,
    alive: Vec<bool>,
    alive_count: usize,
    tree: RTree<PlaneNode>,
}

impl<T: HasBBox> Plane<T> {
    pub fn new() -> Self {
        Self {
            seq: Vec::new(),
            bboxes: Vec::new(),
            alive: Vec::new(),
            alive_count: 0,
            tree: RTree::new(),
        }
    }

    /// Adds an object to the plane; it is indexed immediately.
    pub fn add(&mut self, obj: T) -> usize {
        let id = self.seq.len();
        let bbox = obj.bbox();
        self.seq.push(obj);
        self.bboxes.push(bbox);
        self.alive.push(true);
        self.alive_count += 1;
        self.tree.insert(PlaneNode { id, bbox });
        id
    }

    /// Adds multiple objects to the plane.
    pub fn extend(&mut self, objs: impl IntoIterator<Item = T>) {
        for obj in objs {
            self.add(obj);
        }
    }

    /// Removes an object by id. Returns false if the id was unknown or
    /// already removed.
    pub fn remove_by_id(&mut self, id: usize) -> bool {
        if id >= self.seq.len() || !self.alive[id] {
            return false;
        }
        self.alive[id] = false;
        self.alive_count -= 1;
        let bbox = self.bboxes[id];
        self.tree.remove(&PlaneNode { id, bbox }).is_some()
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        if self.alive.get(id).copied().unwrap_or(false) {
            Some(&self.seq[id])
        } else {
            None
        }
    }

    /// Finds objects whose bounding boxes strictly intersect the given box,
    /// returning (id, object) pairs in id order.
    pub fn find(&self, bbox: Rect) -> Vec<(usize, &T)> {
        let (x0, y0, x1, y1) = bbox;
        let env = AABB::from_corners([x0, y0], [x1, y1]);
        let mut result: Vec<(usize, &T)> = self
            .tree
            .locate_in_envelope_intersecting(&env)
            .filter(|node| self.alive[node.id])
            .filter(|node| {
                let b = self.bboxes[node.id];
                !(b.2 <= x0 || x1 <= b.0 || b.3 <= y0 || y1 <= b.1)
            })
            .map(|node| (node.id, &self.seq[node.id]))
            .collect();
        result.sort_by_key(|(id, _)| *id);
        result
    }

    pub fn len(&self) -> usize {
        self.alive_count
    }

    pub fn is_empty(&self) -> bool {
        self.alive_count == 0
    }

    /// Iterates over all live objects with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.seq
            .iter()
            .enumerate()
            .filter(|(i, _)| self.alive[*i])
    }
}

impl<T: HasBBox> Default for Plane<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mult_matrix_identity() {
        assert_eq!(
            mult_matrix(MATRIX_IDENTITY, MATRIX_IDENTITY),
            MATRIX_IDENTITY
        );
    }

    #[test]
    fn mult_matrix_applies_first_argument_first() {
        // Scale by 2, then translate by (5, 0).
        let scale = (2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let translate = (1.0, 0.0, 0.0, 1.0, 5.0, 0.0);
        let m = mult_matrix(scale, translate);
        assert_eq!(apply_matrix_pt(m, (1.0, 1.0)), (7.0, 2.0));
    }

    #[test]
    fn translate_matrix_moves_origin_in_own_frame() {
        let scale = (2.0, 0.0, 0.0, 2.0, 10.0, 10.0);
        let m = translate_matrix(scale, (3.0, 0.0));
        assert_eq!(matrix_translation(m), (16.0, 10.0));
    }

    #[test]
    fn matrix_angle_quadrants() {
        assert_eq!(matrix_angle(MATRIX_IDENTITY), 0.0);
        assert!((matrix_angle(rotation_matrix(90.0)) - 90.0).abs() < 1e-9);
        assert!((matrix_angle(rotation_matrix(180.0)) - 180.0).abs() < 1e-9);
        assert!((matrix_angle(rotation_matrix(270.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn matrix_inverse_round_trips() {
        let m = (2.0, 1.0, -1.0, 3.0, 5.0, -2.0);
        let inv = matrix_inverse(m).unwrap();
        let id = mult_matrix(m, inv);
        assert!((id.0 - 1.0).abs() < 1e-9);
        assert!(id.1.abs() < 1e-9);
        assert!(id.2.abs() < 1e-9);
        assert!((id.3 - 1.0).abs() < 1e-9);
        assert!(id.4.abs() < 1e-9);
        assert!(id.5.abs() < 1e-9);
    }

    #[test]
    fn rect_intersection_keeps_degenerate() {
        let page = (0.0, 0.0, 612.0, 792.0);
        assert_eq!(
            rect_intersection((10.0, 5.0, 10.0, 5.0), page),
            Some((10.0, 5.0, 10.0, 5.0))
        );
        assert_eq!(rect_intersection((-10.0, 0.0, -5.0, 5.0), page), None);
    }

    #[test]
    fn comparator_composites_fall_through_on_ties() {
        let a = (0.0, 10.0, 5.0, 12.0);
        let b = (0.0, 5.0, 5.0, 7.0);
        // Same reading position; a is higher on the page (smaller depth).
        assert_eq!(diff_reading_then_depth(&a, &b), Ordering::Less);
        assert_eq!(diff_depth_then_reading(&a, &b), Ordering::Less);
        let c = (3.0, 10.0, 8.0, 12.0);
        assert_eq!(diff_depth_then_reading(&a, &c), Ordering::Less);
    }

    #[test]
    fn plane_find_and_remove() {
        let mut plane: Plane<Rect> = Plane::new();
        let a = plane.add((0.0, 0.0, 10.0, 10.0));
        let b = plane.add((20.0, 0.0, 30.0, 10.0));
        assert_eq!(plane.len(), 2);

        let hits = plane.find((5.0, 5.0, 25.0, 6.0));
        assert_eq!(hits.len(), 2);

        assert!(plane.remove_by_id(a));
        assert!(!plane.remove_by_id(a));
        let hits = plane.find((5.0, 5.0, 25.0, 6.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, b);
    }
}
