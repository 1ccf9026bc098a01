//! Integer board geometry
//!
//! Points and boxes are kept in board units (nanometres) so positions can be
//! compared and hashed exactly.

use serde::{Deserialize, Serialize};

/// A 2D point in board units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance, saturating at `u64::MAX`
    ///
    /// Only used for ordering, so saturation on absurdly large boards is harmless.
    pub fn distance_2(&self, other: &Point) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box [min, max], inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    /// Bounding box of a point list, `None` when empty
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = *points.first()?;
        let mut bbox = BBox { min: first, max: first };
        for p in &points[1..] {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    /// Box centred on `center` extending `half_w`/`half_h` each way
    pub fn around(center: Point, half_w: i32, half_h: i32) -> Self {
        BBox {
            min: Point::new(center.x.saturating_sub(half_w), center.y.saturating_sub(half_h)),
            max: Point::new(center.x.saturating_add(half_w), center.y.saturating_add(half_h)),
        }
    }

    pub fn area(&self) -> u64 {
        let w = (i64::from(self.max.x) - i64::from(self.min.x)).unsigned_abs();
        let h = (i64::from(self.max.y) - i64::from(self.min.y)).unsigned_abs();
        w.saturating_mul(h)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Point-in-polygon test over a closed ring (last vertex joins the first)
///
/// Points on the ring itself count as inside.
pub fn ring_contains(ring: &[Point], p: Point) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let px = i128::from(p.x);
    let py = i128::from(p.y);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (ax, ay) = (i128::from(ring[i].x), i128::from(ring[i].y));
        let (bx, by) = (i128::from(ring[j].x), i128::from(ring[j].y));

        if on_segment(ax, ay, bx, by, px, py) {
            return true;
        }

        // Crossing test with the half-open rule on y
        if (ay > py) != (by > py) {
            // x coordinate of the crossing compared without division
            let lhs = (px - ax) * (by - ay);
            let rhs = (bx - ax) * (py - ay);
            let crosses = if by > ay { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// True when `p` lies exactly on one of the ring's edges
pub fn ring_boundary_contains(ring: &[Point], p: Point) -> bool {
    let (px, py) = (i128::from(p.x), i128::from(p.y));
    (0..ring.len()).any(|i| {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        on_segment(
            i128::from(a.x),
            i128::from(a.y),
            i128::from(b.x),
            i128::from(b.y),
            px,
            py,
        )
    })
}

fn on_segment(ax: i128, ay: i128, bx: i128, by: i128, px: i128, py: i128) -> bool {
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    cross == 0
        && px >= ax.min(bx)
        && px <= ax.max(bx)
        && py >= ay.min(by)
        && py <= ay.max(by)
}
