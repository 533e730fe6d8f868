use glam::Vec3;

use crate::geometry::{Rotator, Transform};

/// Piecewise-linear path through a sequence of points, optionally closed into a loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    points: Vec<Vec3>,
    closed: bool,
    /// Cumulative distance at the start of each segment, plus the total length.
    cumulative: Vec<f32>,
}

impl Polyline {
    pub fn new<I, P>(points: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<mint::Vector3<f32>>,
    {
        Self::build(
            points.into_iter().map(|p| Vec3::from(p.into())).collect(),
            false,
        )
    }

    /// The same points joined back to the first.
    pub fn closed(self) -> Self {
        Self::build(self.points, true)
    }

    fn build(points: Vec<Vec3>, closed: bool) -> Self {
        let mut cumulative = Vec::with_capacity(points.len() + 1);
        let mut total = 0.0;
        cumulative.push(total);
        for (a, b) in Self::segments_of(&points, closed) {
            total += a.distance(b);
            cumulative.push(total);
        }
        Self {
            points,
            closed,
            cumulative,
        }
    }

    fn segments_of(points: &[Vec3], closed: bool) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        let wrap = (closed && points.len() > 2)
            .then(|| (points[points.len() - 1], points[0]));
        points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(wrap)
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn segment_count(&self) -> usize {
        self.cumulative.len().saturating_sub(1)
    }

    fn segment(&self, index: usize) -> (Vec3, Vec3) {
        let a = self.points[index];
        let b = self.points[(index + 1) % self.points.len()];
        (a, b)
    }

    /// Segment index containing `distance` and the distance into that segment.
    fn locate(&self, distance: f32) -> Option<(usize, f32)> {
        let count = self.segment_count();
        if count == 0 {
            return None;
        }
        let d = distance.clamp(0.0, self.length());
        let index = self.cumulative[1..]
            .iter()
            .position(|end| d <= *end)
            .unwrap_or(count - 1);
        Some((index, d - self.cumulative[index]))
    }

    pub fn location_at_distance(&self, distance: f32) -> Vec3 {
        match self.locate(distance) {
            Some((index, along)) => {
                let (a, b) = self.segment(index);
                let len = a.distance(b);
                if len <= f32::EPSILON {
                    a
                } else {
                    a.lerp(b, along / len)
                }
            }
            None => self.points.first().copied().unwrap_or(Vec3::ZERO),
        }
    }

    /// Heading in degrees of the segment at `distance`, measured in the horizontal plane.
    pub fn yaw_at_distance(&self, distance: f32) -> f32 {
        match self.locate(distance) {
            Some((index, _)) => {
                let (a, b) = self.segment(index);
                let dir = b - a;
                dir.y.atan2(dir.x).to_degrees()
            }
            None => 0.0,
        }
    }

    pub fn transform_at_distance(&self, distance: f32) -> Transform {
        Transform::new(
            self.location_at_distance(distance),
            Rotator::from_yaw(self.yaw_at_distance(distance)),
        )
    }
}
