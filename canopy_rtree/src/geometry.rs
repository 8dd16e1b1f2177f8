// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer and floating point geometry used as index keys.
//!
//! Rectangles use half-open extents: a rectangle covers `min <= v < max` on each
//! axis. Two rectangles intersect only when their interiors overlap, so boxes that
//! merely share an edge do not match each other.

use core::cmp::Ordering;
use core::fmt::Debug;
use core::ops::{Add, Mul, Sub};

/// Numeric scalar abstraction for coordinates.
///
/// Areas are computed in a widened accumulator type (`i32`→`i64`, `i64`→`i128`,
/// `f32`→`f64`) so that products of large extents do not overflow.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Widened accumulator type for areas and enlargement costs.
    type Acc: Copy
        + PartialOrd
        + Add<Output = Self::Acc>
        + Sub<Output = Self::Acc>
        + Mul<Output = Self::Acc>
        + Debug;

    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// Unit value for the scalar type.
    fn one() -> Self;

    /// Add two scalar values.
    fn add(a: Self, b: Self) -> Self;

    /// Subtract two scalar values: a - b.
    fn sub(a: Self, b: Self) -> Self;

    /// Convert a scalar to the accumulator type.
    fn widen(v: Self) -> Self::Acc;

    /// False for infinities and NaN. Always true for integers.
    fn is_finite(v: Self) -> bool;
}

macro_rules! int_scalar {
    ($t:ty, $acc:ty) => {
        impl Scalar for $t {
            type Acc = $acc;

            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn one() -> Self {
                1
            }

            #[inline]
            fn add(a: Self, b: Self) -> Self {
                a.saturating_add(b)
            }

            #[inline]
            fn sub(a: Self, b: Self) -> Self {
                a.saturating_sub(b)
            }

            #[inline]
            fn widen(v: Self) -> Self::Acc {
                <$acc>::from(v)
            }

            #[inline]
            fn is_finite(_: Self) -> bool {
                true
            }
        }
    };
}

int_scalar!(i32, i64);
int_scalar!(i64, i128);

impl Scalar for f32 {
    type Acc = f64;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        f64::from(v)
    }

    #[inline]
    fn is_finite(v: Self) -> bool {
        v.is_finite()
    }
}

impl Scalar for f64 {
    type Acc = Self;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v
    }

    #[inline]
    fn is_finite(v: Self) -> bool {
        v.is_finite()
    }
}

/// A point in 2D.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Point<T> {
    /// Horizontal coordinate.
    pub x: T,
    /// Vertical coordinate.
    pub y: T,
}

impl<T: Copy> Point<T> {
    /// Create a point.
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    pub const fn x(&self) -> T {
        self.x
    }

    /// Vertical coordinate.
    pub const fn y(&self) -> T {
        self.y
    }
}

impl<T: Copy> From<(T, T)> for Point<T> {
    fn from((x, y): (T, T)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned rectangle with half-open extents.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect<T> {
    /// Minimum x (left, inclusive)
    pub min_x: T,
    /// Minimum y (top, inclusive)
    pub min_y: T,
    /// Maximum x (right, exclusive)
    pub max_x: T,
    /// Maximum y (bottom, exclusive)
    pub max_y: T,
}

impl<T> Rect<T> {
    /// Create a rectangle from min/max corners.
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl<T: Scalar> Rect<T> {
    /// Create a rectangle from its origin and size.
    pub fn from_xywh(x: T, y: T, w: T, h: T) -> Self {
        Self::new(x, y, T::add(x, w), T::add(y, h))
    }

    /// The 2×2 box centred on `p`, used as the stored extent of point entries.
    ///
    /// Integer coordinates saturate, so at `T::MAX` the box no longer contains
    /// `p`. [`Shape::is_valid`] rejects such points.
    pub fn around(p: Point<T>) -> Self {
        let one = T::one();
        Self::new(
            T::sub(p.x, one),
            T::sub(p.y, one),
            T::add(p.x, one),
            T::add(p.y, one),
        )
    }

    /// Zero-sized rectangle at the origin.
    pub fn degenerate() -> Self {
        Self::new(T::zero(), T::zero(), T::zero(), T::zero())
    }

    /// Horizontal extent.
    pub fn width(&self) -> T {
        T::sub(self.max_x, self.min_x)
    }

    /// Vertical extent.
    pub fn height(&self) -> T {
        T::sub(self.max_y, self.min_y)
    }

    /// Width times height in the widened accumulator.
    ///
    /// Not clamped: an inverted rectangle reports a negative area.
    pub fn area(&self) -> T::Acc {
        T::widen(self.width()) * T::widen(self.height())
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: min_t(self.min_x, other.min_x),
            min_y: min_t(self.min_y, other.min_y),
            max_x: max_t(self.max_x, other.max_x),
            max_y: max_t(self.max_y, other.max_y),
        }
    }

    /// Whether the interiors of both rectangles overlap.
    pub fn intersects(&self, other: &Self) -> bool {
        lt(self.min_x, other.max_x)
            && lt(other.min_x, self.max_x)
            && lt(self.min_y, other.max_y)
            && lt(other.min_y, self.max_y)
    }

    /// Whether `p` lies inside the half-open extent.
    pub fn contains_point(&self, p: Point<T>) -> bool {
        le(self.min_x, p.x) && lt(p.x, self.max_x) && le(self.min_y, p.y) && lt(p.y, self.max_y)
    }

    /// Whether `other` lies entirely within this rectangle.
    pub fn contains_rect(&self, other: &Self) -> bool {
        le(self.min_x, other.min_x)
            && le(self.min_y, other.min_y)
            && le(other.max_x, self.max_x)
            && le(other.max_y, self.max_y)
    }

    /// True when all coordinates are finite and both extents are ordered
    /// (`min <= max`).
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .into_iter()
            .all(T::is_finite)
            && le(self.min_x, self.max_x)
            && le(self.min_y, self.max_y)
    }
}

/// Key shape accepted by insert, delete and find.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape<T> {
    /// A single point.
    Point(Point<T>),
    /// A rectangle.
    Rect(Rect<T>),
}

impl<T: Scalar> Shape<T> {
    /// Rectangle stored for an entry inserted with this shape.
    ///
    /// Points become the 2×2 box from [`Rect::around`]. The same box is used as the
    /// probe when deleting by point.
    pub fn entry_rect(&self) -> Rect<T> {
        match *self {
            Self::Point(p) => Rect::around(p),
            Self::Rect(r) => r,
        }
    }

    /// Whether the shape can be stored.
    ///
    /// Rectangles must be [valid](Rect::is_valid). A point must be finite and lie
    /// inside its own entry box, which fails at the integer maximum and for
    /// floats too large to move by one.
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Point(p) => {
                let r = Rect::around(p);
                r.is_valid() && r.contains_point(p)
            }
            Self::Rect(r) => r.is_valid(),
        }
    }
}

impl<T> From<Point<T>> for Shape<T> {
    fn from(p: Point<T>) -> Self {
        Self::Point(p)
    }
}

impl<T> From<Rect<T>> for Shape<T> {
    fn from(r: Rect<T>) -> Self {
        Self::Rect(r)
    }
}

impl<T: Copy> From<(T, T)> for Shape<T> {
    fn from(p: (T, T)) -> Self {
        Self::Point(p.into())
    }
}

/// Payloads that know their own bounding rectangle.
pub trait Bounded<T> {
    /// Extent under which the payload is indexed.
    fn bounding_rect(&self) -> Rect<T>;
}

#[cfg(feature = "kurbo")]
impl From<kurbo::Rect> for Rect<f64> {
    fn from(r: kurbo::Rect) -> Self {
        let r = r.abs();
        Self::new(r.x0, r.y0, r.x1, r.y1)
    }
}

#[cfg(feature = "kurbo")]
impl From<kurbo::Point> for Point<f64> {
    fn from(p: kurbo::Point) -> Self {
        Self::new(p.x, p.y)
    }
}

#[cfg(feature = "kurbo")]
impl From<kurbo::Point> for Shape<f64> {
    fn from(p: kurbo::Point) -> Self {
        Self::Point(p.into())
    }
}

#[cfg(feature = "kurbo")]
impl From<kurbo::Rect> for Shape<f64> {
    fn from(r: kurbo::Rect) -> Self {
        Self::Rect(r.into())
    }
}

/// Union of two optional rectangles.
pub(crate) fn union_opt<T: Scalar>(a: Option<Rect<T>>, b: Option<Rect<T>>) -> Option<Rect<T>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o == Ordering::Less)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_box_covers_point_and_lower_neighbour() {
        let r = Rect::around(Point::new(5_i64, 5));
        assert_eq!(r, Rect::new(4, 4, 6, 6));
        assert!(r.contains_point(Point::new(5, 5)));
        assert!(r.contains_point(Point::new(4, 4)));
        assert!(!r.contains_point(Point::new(6, 6)));
        assert_eq!(r.area(), 4);
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 20, 10);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&Rect::new(9, 9, 20, 20)));
        assert!(a.intersects(&Rect::new(2, 2, 3, 3)));
    }

    #[test]
    fn union_and_containment() {
        let a = Rect::new(0_i64, 0, 2, 2);
        let b = Rect::from_xywh(5, -1, 1, 1);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0, -1, 6, 2));
        assert!(u.contains_rect(&a));
        assert!(u.contains_rect(&b));
        assert!(!a.contains_rect(&u));
        assert_eq!(u.area(), 18);
    }

    #[test]
    fn union_opt_prefers_present_side() {
        let a = Some(Rect::new(0_i64, 0, 1, 1));
        assert_eq!(union_opt(a, None), a);
        assert_eq!(union_opt(None, a), a);
        assert_eq!(union_opt::<i64>(None, None), None);
    }

    #[test]
    fn inverted_and_nan_rects_are_invalid() {
        assert!(Rect::new(0, 0, 0, 0).is_valid());
        assert!(!Rect::new(3, 0, 1, 5).is_valid());
        assert!(!Rect::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, f64::INFINITY, 1.0).is_valid());
        assert!(!Rect::new(f32::NEG_INFINITY, 0.0, 1.0, 1.0).is_valid());
        assert!(Rect::new(i64::MIN, i64::MIN, i64::MAX, i64::MAX).is_valid());
    }

    #[test]
    fn points_must_fit_inside_their_entry_box() {
        assert!(Shape::from((0_i64, 0)).is_valid());
        assert!(Shape::from((i64::MIN, i64::MIN)).is_valid());
        assert!(!Shape::from((i64::MAX, 0)).is_valid());
        assert!(!Shape::from((0, i32::MAX)).is_valid());
        assert!(!Shape::from((f64::NAN, 0.0)).is_valid());
        assert!(!Shape::from((1e300, 0.0)).is_valid());
        assert!(Shape::from((1e3, 0.0)).is_valid());
    }

    #[test]
    fn widened_area_does_not_overflow() {
        let r = Rect::new(i32::MIN / 2, i32::MIN / 2, i32::MAX / 2, i32::MAX / 2);
        assert!(r.area() > i64::from(i32::MAX));
    }

    #[cfg(feature = "kurbo")]
    #[test]
    fn kurbo_shapes_convert_to_f64() {
        // Inverted Kurbo rectangles are normalized.
        let r: Rect<f64> = kurbo::Rect::new(10.0, 20.0, 0.0, 5.0).into();
        assert_eq!(r, Rect::new(0.0, 5.0, 10.0, 20.0));
        assert!(r.is_valid());

        let p: Point<f64> = kurbo::Point::new(1.5, -2.0).into();
        assert_eq!(p, Point::new(1.5, -2.0));
        assert_eq!(
            Shape::from(kurbo::Point::new(1.0, 1.0)),
            Shape::Point(Point::new(1.0, 1.0))
        );
        assert_eq!(
            Shape::from(kurbo::Rect::new(0.0, 0.0, 1.0, 1.0)),
            Shape::Rect(Rect::new(0.0, 0.0, 1.0, 1.0))
        );
    }
}
