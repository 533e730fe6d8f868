//! Shared geometry: transforms, axis-aligned boxes, and the planar helpers used by
//! placement and path following.
//!
//! Distances are in meters and angles stored on [`Rotator`] are in degrees. The vertical
//! axis is `z`; "horizontal" helpers ignore it.
use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Returned by [`circle_radius`] for collinear or duplicate points.
pub const STRAIGHT_LINE_RADIUS: f32 = f32::MAX;

/// Orientation as pitch, yaw and roll in degrees.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Rotation about the vertical axis only.
    pub fn from_yaw(yaw: f32) -> Self {
        Self {
            yaw,
            ..Self::ZERO
        }
    }

    /// Unit vector pointing along this rotation's forward (x) axis.
    pub fn forward(&self) -> Vec3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        Vec3::new(cp * cy, cp * sy, sp)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.pitch, self.yaw, self.roll]
    }
}

impl From<[f32; 3]> for Rotator {
    fn from(value: [f32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

/// Location, orientation and per-axis scale of an object in the scene.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub location: Vec3,
    pub rotation: Rotator,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(location: Vec3, rotation: Rotator) -> Self {
        Self {
            location,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Unrotated, unscaled transform at `location`.
    pub fn at(location: impl Into<mint::Vector3<f32>>) -> Self {
        Self::new(Vec3::from(location.into()), Rotator::ZERO)
    }

    pub fn with_rotation(mut self, rotation: Rotator) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_location(mut self, location: Vec3) -> Self {
        self.location = location;
        self
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation.forward()
    }
}

/// Axis-aligned box described by its center and half extents.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.center + offset, self.half_extents)
    }

    /// Scales the box about the local origin, so the center moves with the scale.
    pub fn scaled(&self, scale: Vec3) -> Self {
        Self::new(self.center * scale, self.half_extents * scale)
    }

    /// Closed intersection test: touching faces count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let gap = (self.center - other.center).abs() - (self.half_extents + other.half_extents);
        gap.max_element() <= 0.0
    }

    /// Smallest per-axis overlap depth; negative when the boxes are apart.
    pub fn penetration_depth(&self, other: &Aabb) -> f32 {
        let overlap =
            (self.half_extents + other.half_extents) - (self.center - other.center).abs();
        overlap.min_element()
    }

    /// Whether the boxes overlap by more than `tolerance` on every axis.
    pub fn penetrates(&self, other: &Aabb, tolerance: f32) -> bool {
        self.penetration_depth(other) > tolerance
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Aabb) -> Self {
        Self::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    /// Whether `point` lies within the box's horizontal footprint, edges included.
    pub fn contains_xy(&self, point: Vec3) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }

    /// Point on or inside the box that is closest to `point`. Points inside the box
    /// are returned unchanged.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min(), self.max())
    }
}

/// Radius of the circle through three points, using only their horizontal coordinates.
///
/// Collinear or duplicate points have no finite circumcircle; they yield
/// [`STRAIGHT_LINE_RADIUS`] so that straight segments never limit speed.
pub fn circle_radius(p1: Vec3, p2: Vec3, p3: Vec3) -> f32 {
    let (x1, y1) = (p1.x, p1.y);
    let (x2, y2) = (p2.x, p2.y);
    let (x3, y3) = (p3.x, p3.y);

    let x12 = x1 - x2;
    let x13 = x1 - x3;
    let y12 = y1 - y2;
    let y13 = y1 - y3;
    let y31 = y3 - y1;
    let y21 = y2 - y1;
    let x31 = x3 - x1;
    let x21 = x2 - x1;

    let sx13 = x1 * x1 - x3 * x3;
    let sy13 = y1 * y1 - y3 * y3;
    let sx21 = x2 * x2 - x1 * x1;
    let sy21 = y2 * y2 - y1 * y1;

    let f_denom = 2.0 * (y31 * x12 - y21 * x13);
    if f_denom == 0.0 {
        return STRAIGHT_LINE_RADIUS;
    }
    let f = (sx13 * x12 + sy13 * x12 + sx21 * x13 + sy21 * x13) / f_denom;

    let g_denom = 2.0 * (x31 * y12 - x21 * y13);
    if g_denom == 0.0 {
        return STRAIGHT_LINE_RADIUS;
    }
    let g = (sx13 * y12 + sy13 * y12 + sx21 * y13 + sy21 * y13) / g_denom;

    // Circle: x² + y² + 2gx + 2fy + c = 0, centered at (-g, -f).
    let c = -(x1 * x1 + y1 * y1) - 2.0 * g * x1 - 2.0 * f * y1;
    let h = -g;
    let k = -f;

    (h * h + k * k - c).sqrt()
}

/// Distance between two points projected onto the horizontal plane.
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    (a.truncate() - b.truncate()).length()
}

/// Signed angle in radians from `forward` to `to_target`, both projected onto the
/// horizontal plane. Positive when the target lies to the left (counter-clockwise).
pub fn signed_horizontal_angle(forward: Vec3, to_target: Vec3) -> f32 {
    let v = Vec3::new(forward.x, forward.y, 0.0);
    let w = Vec3::new(to_target.x, to_target.y, 0.0);

    let cos = w
        .normalize_or_zero()
        .dot(v.normalize_or_zero())
        .clamp(-1.0, 1.0);
    let angle = cos.acos();

    if v.cross(w).z < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Converts a speed in kilometers per hour to meters per second.
#[inline]
pub fn kmh_to_mps(kmh: f32) -> f32 {
    kmh / 3.6
}
