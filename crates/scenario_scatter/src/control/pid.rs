use std::collections::VecDeque;

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::signed_horizontal_angle;

/// Number of recent error samples a controller keeps.
pub const ERROR_HISTORY_LEN: usize = 10;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub proportional: f32,
    pub derivative: f32,
    pub integral: f32,
}

impl PidGains {
    /// Throttle/brake gains.
    pub const LONGITUDINAL: PidGains = PidGains::new(0.15, 0.05, 0.07);
    /// Steering gains.
    pub const LATERAL: PidGains = PidGains::new(0.58, 0.02, 0.5);

    pub const fn new(proportional: f32, derivative: f32, integral: f32) -> Self {
        Self {
            proportional,
            derivative,
            integral,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let all_finite = self.proportional.is_finite()
            && self.derivative.is_finite()
            && self.integral.is_finite();
        if !all_finite {
            return Err(Error::InvalidConfig("PID gains must be finite".into()));
        }
        Ok(())
    }
}

/// Discrete PID step over a moving window of the last [`ERROR_HISTORY_LEN`] errors.
///
/// The integral term is the window sum times `dt`, so it cannot wind up past the window.
/// With fewer than two samples, or a non-positive `dt`, derivative and integral are zero.
/// The output is clamped to `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    errors: VecDeque<f32>,
    last_output: f32,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            errors: VecDeque::with_capacity(ERROR_HISTORY_LEN + 1),
            last_output: 0.0,
        }
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn step(&mut self, error: f32, dt: f32) -> f32 {
        self.errors.push_back(error);
        if self.errors.len() > ERROR_HISTORY_LEN {
            self.errors.pop_front();
        }

        let (derivative, integral) = match self.errors.len() {
            n if n >= 2 && dt > 0.0 => {
                let previous = self.errors[n - 2];
                let sum: f32 = self.errors.iter().sum();
                ((error - previous) / dt, sum * dt)
            }
            _ => (0.0, 0.0),
        };

        let g = self.gains;
        let raw = g.proportional * error + g.derivative * derivative + g.integral * integral;
        self.last_output = raw.clamp(-1.0, 1.0);
        self.last_output
    }

    /// Retained error samples, oldest first.
    pub fn errors(&self) -> impl Iterator<Item = f32> + '_ {
        self.errors.iter().copied()
    }

    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    pub fn reset(&mut self) {
        self.errors.clear();
        self.last_output = 0.0;
    }
}

/// Speed controller: positive output is throttle, negative is brake.
#[derive(Debug, Clone)]
pub struct LongitudinalController(PidController);

impl LongitudinalController {
    pub fn new(gains: PidGains) -> Self {
        Self(PidController::new(gains))
    }

    pub fn step(&mut self, target_speed: f32, current_speed: f32, dt: f32) -> f32 {
        self.0.step(target_speed - current_speed, dt)
    }

    pub fn pid(&self) -> &PidController {
        &self.0
    }

    pub fn reset(&mut self) {
        self.0.reset();
    }
}

impl Default for LongitudinalController {
    fn default() -> Self {
        Self::new(PidGains::LONGITUDINAL)
    }
}

/// Steering controller driven by the signed horizontal heading error towards a target.
#[derive(Debug, Clone)]
pub struct LateralController(PidController);

impl LateralController {
    pub fn new(gains: PidGains) -> Self {
        Self(PidController::new(gains))
    }

    pub fn step(&mut self, target: Vec3, current: Vec3, forward: Vec3, dt: f32) -> f32 {
        self.0.step(signed_horizontal_angle(forward, target - current), dt)
    }

    pub fn pid(&self) -> &PidController {
        &self.0
    }

    pub fn reset(&mut self) {
        self.0.reset();
    }
}

impl Default for LateralController {
    fn default() -> Self {
        Self::new(PidGains::LATERAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF: PidGains = PidGains::new(0.5, 0.5, 0.5);

    #[test]
    fn cold_start_is_proportional_only() {
        let mut pid = PidController::new(HALF);
        assert_eq!(pid.step(1.0, 0.02), 0.5);
        assert_eq!(pid.last_output(), 0.5);
    }

    #[test]
    fn second_sample_adds_derivative_and_integral() {
        let mut pid = PidController::new(PidGains::new(0.0, 0.1, 1.0));
        pid.step(0.0, 0.5);
        // derivative = (1 - 0) / 0.5 = 2, integral = 1 * 0.5
        let out = pid.step(1.0, 0.5);
        assert!((out - (0.1 * 2.0 + 0.5)).abs() < 1e-6);
    }

    #[test]
    fn output_saturates() {
        let mut pid = PidController::new(HALF);
        for _ in 0..20 {
            let out = pid.step(100_000.0, 0.02);
            assert!((-1.0..=1.0).contains(&out));
        }
        let out = pid.step(-100_000.0, 0.02);
        assert!((-1.0..=1.0).contains(&out));
    }

    #[test]
    fn history_keeps_the_latest_ten() {
        let mut pid = PidController::new(HALF);
        for i in 0..15 {
            pid.step(i as f32, 0.1);
        }
        let kept: Vec<f32> = pid.errors().collect();
        assert_eq!(kept.len(), ERROR_HISTORY_LEN);
        assert_eq!(kept[0], 5.0);
        assert_eq!(kept[9], 14.0);
    }

    #[test]
    fn zero_dt_does_not_produce_nan() {
        let mut pid = PidController::new(HALF);
        pid.step(1.0, 0.0);
        let out = pid.step(2.0, 0.0);
        assert_eq!(out, 1.0);
    }

    #[test]
    fn lateral_target_straight_ahead_gives_zero() {
        let mut lateral = LateralController::default();
        for distance in [1.0, 50.0, 10_000.0] {
            let out = lateral.step(Vec3::new(distance, 0.0, 2.0), Vec3::ZERO, Vec3::X, 0.02);
            assert_eq!(out, 0.0);
        }
    }

    #[test]
    fn lateral_sign_matches_turn_direction() {
        let mut left = LateralController::new(HALF);
        let mut right = LateralController::new(HALF);
        let l = left.step(Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO, Vec3::X, 0.02);
        let r = right.step(Vec3::new(1.0, -1.0, 0.0), Vec3::ZERO, Vec3::X, 0.02);
        assert!(l > 0.0);
        assert!(r < 0.0);
        assert!((l + r).abs() < 1e-6);
    }

    #[test]
    fn longitudinal_error_is_target_minus_current() {
        let mut lon = LongitudinalController::new(PidGains::new(0.1, 0.0, 0.0));
        assert!((lon.step(10.0, 4.0, 0.02) - 0.6).abs() < 1e-6);
        assert!((lon.step(4.0, 10.0, 0.02) + 0.6).abs() < 1e-6);
        lon.reset();
        assert_eq!(lon.pid().errors().count(), 0);
    }
}
