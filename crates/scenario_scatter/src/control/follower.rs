//! Per-tick waypoint follower producing throttle, brake and steering.
//!
//! [`PathFollower::tick`] runs once per simulation step:
//!
//! 1. An empty buffer holds the vehicle with full brake.
//! 2. A looped route refills the buffer from the fixed route when fewer than three
//!    points remain.
//! 3. Target speed starts at the speed limit and is capped by the turning radius
//!    through the last passed waypoint and the next two, then by every buffered curve
//!    within the look-ahead distance.
//! 4. The longitudinal controller turns the speed error into throttle or brake.
//! 5. The lateral controller steers towards the first buffered waypoint, rate limited
//!    against the previous tick.
//! 6. Leading waypoints within the retirement threshold are dropped.
use std::collections::VecDeque;

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::control::pid::{LateralController, LongitudinalController, PidGains};
use crate::error::{Error, Result};
use crate::geometry::{circle_radius, horizontal_distance, Transform};

/// Buffer size below which a looped route is refilled.
pub const REFILL_BELOW: usize = 3;

/// Follower tunables. Distances are meters, speeds meters per second.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FollowerConfig {
    pub longitudinal_gains: PidGains,
    pub lateral_gains: PidGains,
    /// Maximum steering change per tick.
    pub steering_delta: f32,
    /// Retirement threshold as a fraction of the speed limit.
    pub waypoint_threshold_factor: f32,
    /// Target speed cap as a fraction of the turning radius.
    pub turning_speed_factor: f32,
    /// Look-ahead distance as a multiple of the current speed.
    pub look_ahead_factor: f32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            longitudinal_gains: PidGains::LONGITUDINAL,
            lateral_gains: PidGains::LATERAL,
            steering_delta: 0.2,
            waypoint_threshold_factor: 0.25,
            turning_speed_factor: 0.5,
            look_ahead_factor: 3.0,
        }
    }
}

impl FollowerConfig {
    pub fn with_longitudinal_gains(mut self, gains: PidGains) -> Self {
        self.longitudinal_gains = gains;
        self
    }

    pub fn with_lateral_gains(mut self, gains: PidGains) -> Self {
        self.lateral_gains = gains;
        self
    }

    pub fn with_steering_delta(mut self, steering_delta: f32) -> Self {
        self.steering_delta = steering_delta;
        self
    }

    pub fn with_waypoint_threshold_factor(mut self, factor: f32) -> Self {
        self.waypoint_threshold_factor = factor;
        self
    }

    pub fn with_turning_speed_factor(mut self, factor: f32) -> Self {
        self.turning_speed_factor = factor;
        self
    }

    pub fn with_look_ahead_factor(mut self, factor: f32) -> Self {
        self.look_ahead_factor = factor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.longitudinal_gains.validate()?;
        self.lateral_gains.validate()?;
        let factors = [
            ("steering_delta", self.steering_delta),
            ("waypoint_threshold_factor", self.waypoint_threshold_factor),
            ("turning_speed_factor", self.turning_speed_factor),
            ("look_ahead_factor", self.look_ahead_factor),
        ];
        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// Vehicle pose and speed sampled at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    pub location: Vec3,
    /// Unit forward vector.
    pub forward: Vec3,
    /// Signed speed along `forward`.
    pub forward_speed: f32,
}

impl VehicleState {
    pub fn new(location: Vec3, forward: Vec3, forward_speed: f32) -> Self {
        Self {
            location,
            forward,
            forward_speed,
        }
    }
}

/// Inputs for the vehicle dynamics: throttle and brake in `[0, 1]`, steering in `[-1, 1]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    pub throttle: f32,
    pub brake: f32,
    pub steering: f32,
}

impl ControlOutput {
    /// Zero steering, full brake, no throttle.
    pub const HOLD: ControlOutput = ControlOutput {
        throttle: 0.0,
        brake: 1.0,
        steering: 0.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowerState {
    /// No route has been given.
    Idle,
    /// The buffer ran empty; the vehicle is held.
    Braking,
    /// Following buffered waypoints.
    Tracking,
    /// A looped route will be refilled on the next tick.
    Replenishing,
}

/// Drives a vehicle along a waypoint route, one [`PathFollower::tick`] per simulation step.
#[derive(Debug, Clone)]
pub struct PathFollower {
    config: FollowerConfig,
    longitudinal: LongitudinalController,
    lateral: LateralController,
    route: Vec<Vec3>,
    buffer: VecDeque<Vec3>,
    looped: bool,
    speed_limit: f32,
    waypoint_threshold: f32,
    past_steering: f32,
    last_passed: Vec3,
}

impl Default for PathFollower {
    fn default() -> Self {
        Self::new(FollowerConfig::default())
    }
}

impl PathFollower {
    pub fn new(config: FollowerConfig) -> Self {
        Self {
            longitudinal: LongitudinalController::new(config.longitudinal_gains),
            lateral: LateralController::new(config.lateral_gains),
            config,
            route: Vec::new(),
            buffer: VecDeque::new(),
            looped: false,
            speed_limit: 0.0,
            waypoint_threshold: 0.0,
            past_steering: 0.0,
            last_passed: Vec3::ZERO,
        }
    }

    pub fn try_new(config: FollowerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    /// Replaces the route and refills the buffer with it.
    pub fn set_route<I, P>(&mut self, waypoints: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<mint::Vector3<f32>>,
    {
        self.route = waypoints
            .into_iter()
            .map(|p| Vec3::from(p.into()))
            .collect();
        self.buffer = self.route.iter().copied().collect();
    }

    pub fn set_route_from_transforms(&mut self, transforms: &[Transform]) {
        self.set_route(transforms.iter().map(|t| t.location));
    }

    /// Sets the speed limit in m/s and recomputes the retirement threshold.
    pub fn set_speed_limit(&mut self, speed_limit: f32) {
        self.speed_limit = speed_limit;
        self.waypoint_threshold = speed_limit * self.config.waypoint_threshold_factor;
    }

    pub fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
    }

    /// Starts a session for a vehicle at `location`; curvature is first measured from here.
    pub fn attach(&mut self, location: Vec3) {
        self.last_passed = location;
    }

    /// Ends the session: drops buffered waypoints and controller history.
    pub fn detach(&mut self) {
        self.buffer.clear();
        self.longitudinal.reset();
        self.lateral.reset();
        self.past_steering = 0.0;
    }

    pub fn state(&self) -> FollowerState {
        if self.buffer.is_empty() {
            if self.route.is_empty() {
                FollowerState::Idle
            } else {
                FollowerState::Braking
            }
        } else if self.looped && self.buffer.len() < REFILL_BELOW {
            FollowerState::Replenishing
        } else {
            FollowerState::Tracking
        }
    }

    pub fn route(&self) -> &[Vec3] {
        &self.route
    }

    pub fn buffer(&self) -> &VecDeque<Vec3> {
        &self.buffer
    }

    pub fn last_passed(&self) -> Vec3 {
        self.last_passed
    }

    pub fn speed_limit(&self) -> f32 {
        self.speed_limit
    }

    pub fn waypoint_threshold(&self) -> f32 {
        self.waypoint_threshold
    }

    pub fn is_looped(&self) -> bool {
        self.looped
    }

    pub fn tick(&mut self, vehicle: &VehicleState, dt: f32) -> ControlOutput {
        if self.buffer.is_empty() {
            return ControlOutput::HOLD;
        }
        if self.looped && self.buffer.len() < REFILL_BELOW {
            debug!("Refilling waypoint buffer with {} route points.", self.route.len());
            self.buffer.extend(self.route.iter().copied());
        }

        let target_speed = self.target_speed(vehicle.location, vehicle.forward_speed);
        let acceleration = self
            .longitudinal
            .step(target_speed, vehicle.forward_speed, dt);
        let (throttle, brake) = if acceleration > 0.0 {
            (acceleration, 0.0)
        } else {
            (0.0, -acceleration)
        };

        let steering = match self.buffer.front() {
            Some(target) => {
                let raw = self
                    .lateral
                    .step(*target, vehicle.location, vehicle.forward, dt);
                let delta = self.config.steering_delta;
                raw.clamp(self.past_steering - delta, self.past_steering + delta)
            }
            None => self.past_steering,
        };
        self.past_steering = steering;

        self.retire_waypoints(vehicle.location);

        ControlOutput {
            throttle,
            brake,
            steering,
        }
    }

    /// Speed limit capped by the tightest curve near the vehicle.
    pub fn target_speed(&self, location: Vec3, current_speed: f32) -> f32 {
        let mut target = self.speed_limit;
        if self.buffer.len() < 3 {
            return target;
        }

        let factor = self.config.turning_speed_factor;
        let mut cap = |radius: f32| {
            let limit = radius * factor;
            if target > limit {
                target = limit;
            }
        };

        cap(circle_radius(self.last_passed, self.buffer[0], self.buffer[1]));

        let look_ahead = current_speed * self.config.look_ahead_factor;
        for i in 0..self.buffer.len() - 2 {
            if horizontal_distance(location, self.buffer[i]) >= look_ahead {
                break;
            }
            cap(circle_radius(
                self.buffer[i],
                self.buffer[i + 1],
                self.buffer[i + 2],
            ));
        }
        target
    }

    /// Drops the leading run of waypoints within the retirement threshold. The last one
    /// dropped becomes the last passed waypoint. Returns how many were dropped.
    pub fn retire_waypoints(&mut self, location: Vec3) -> usize {
        let passed = self
            .buffer
            .iter()
            .take_while(|w| horizontal_distance(location, **w) < self.waypoint_threshold)
            .count();
        if passed == 0 {
            return 0;
        }
        if let Some(last) = self.buffer.drain(..passed).last() {
            self.last_passed = last;
        }
        debug!("Retired {passed} waypoints; {} remain.", self.buffer.len());
        passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::STRAIGHT_LINE_RADIUS;

    fn vehicle(x: f32, y: f32, speed: f32) -> VehicleState {
        VehicleState::new(Vec3::new(x, y, 0.0), Vec3::X, speed)
    }

    fn straight(n: usize, spacing: f32) -> Vec<[f32; 3]> {
        (1..=n).map(|i| [i as f32 * spacing, 0.0, 0.0]).collect()
    }

    #[test]
    fn empty_buffer_holds_the_vehicle() {
        let mut follower = PathFollower::default();
        assert_eq!(follower.state(), FollowerState::Idle);
        assert_eq!(follower.tick(&vehicle(0.0, 0.0, 5.0), 0.02), ControlOutput::HOLD);
    }

    #[test]
    fn speed_limit_sets_threshold() {
        let mut follower = PathFollower::default();
        follower.set_speed_limit(20.0);
        assert_eq!(follower.waypoint_threshold(), 5.0);
        follower.set_speed_limit(8.0);
        assert_eq!(follower.waypoint_threshold(), 2.0);
    }

    #[test]
    fn retirement_drops_leading_run_only() {
        let mut follower = PathFollower::default();
        follower.set_speed_limit(8.0); // threshold 2 m
        follower.set_route([[0.5, 0.0, 0.0], [1.5, 0.0, 0.0], [5.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);

        assert_eq!(follower.retire_waypoints(Vec3::ZERO), 2);
        assert_eq!(follower.last_passed(), Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(follower.buffer().len(), 2);
        assert_eq!(follower.buffer()[0], Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn straight_route_is_not_speed_limited() {
        let mut follower = PathFollower::default();
        follower.set_speed_limit(15.0);
        follower.set_route(straight(10, 5.0));
        follower.attach(Vec3::ZERO);
        assert_eq!(follower.target_speed(Vec3::ZERO, 10.0), 15.0);
        assert_eq!(
            circle_radius(Vec3::ZERO, Vec3::X, Vec3::X * 2.0),
            STRAIGHT_LINE_RADIUS
        );
    }

    #[test]
    fn upcoming_curve_within_look_ahead_caps_speed() {
        let mut follower = PathFollower::default();
        follower.set_speed_limit(30.0);
        // Straight, then a bend of radius ~3.2 m towards x = 10.
        follower.set_route([
            [2.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [6.0, 0.0, 0.0],
            [8.0, 0.0, 0.0],
            [10.0, 2.0, 0.0],
            [10.0, 4.0, 0.0],
        ]);
        follower.attach(Vec3::ZERO);

        // Slow vehicle: look-ahead 3 m reaches only the first straight triples.
        assert_eq!(follower.target_speed(Vec3::ZERO, 1.0), 30.0);

        // Fast vehicle: look-ahead 30 m sees the corner.
        let capped = follower.target_speed(Vec3::ZERO, 10.0);
        let corner = circle_radius(
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(8.0, 0.0, 0.0),
            Vec3::new(10.0, 2.0, 0.0),
        );
        assert!(capped < 30.0);
        assert!((capped - corner * 0.5).abs() < 1e-3);
    }

    #[test]
    fn steering_is_rate_limited() {
        let mut follower = PathFollower::default();
        follower.set_speed_limit(10.0);
        follower.set_route([[0.0, 50.0, 0.0], [0.0, 100.0, 0.0], [0.0, 150.0, 0.0]]);
        follower.attach(Vec3::ZERO);

        let first = follower.tick(&vehicle(0.0, 0.0, 0.0), 0.02);
        assert!((first.steering - 0.2).abs() < 1e-6);
        let second = follower.tick(&vehicle(0.0, 0.0, 0.0), 0.02);
        assert!((second.steering - 0.4).abs() < 1e-6);
    }

    #[test]
    fn below_target_speed_throttles_above_brakes() {
        let mut slow = PathFollower::default();
        slow.set_speed_limit(10.0);
        slow.set_route(straight(5, 20.0));
        let out = slow.tick(&vehicle(0.0, 0.0, 0.0), 0.02);
        assert!(out.throttle > 0.0);
        assert_eq!(out.brake, 0.0);

        let mut fast = PathFollower::default();
        fast.set_speed_limit(10.0);
        fast.set_route(straight(5, 20.0));
        let out = fast.tick(&vehicle(0.0, 0.0, 25.0), 0.02);
        assert_eq!(out.throttle, 0.0);
        assert!(out.brake > 0.0);
    }

    #[test]
    fn looped_route_refills_before_running_dry() {
        let mut follower = PathFollower::default();
        follower.set_speed_limit(8.0);
        follower.set_looped(true);
        follower.set_route([[10.0, 0.0, 0.0], [20.0, 0.0, 0.0], [30.0, 0.0, 0.0]]);
        follower.retire_waypoints(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(follower.state(), FollowerState::Replenishing);

        follower.tick(&vehicle(0.0, 0.0, 0.0), 0.02);
        assert_eq!(follower.buffer().len(), 5);
        assert_eq!(follower.state(), FollowerState::Tracking);
    }

    #[test]
    fn open_route_ends_in_braking() {
        let mut follower = PathFollower::default();
        follower.set_speed_limit(8.0);
        follower.set_route([[1.0, 0.0, 0.0]]);
        follower.tick(&vehicle(1.0, 0.0, 0.0), 0.02);
        assert_eq!(follower.state(), FollowerState::Braking);
        assert_eq!(follower.tick(&vehicle(1.0, 0.0, 0.0), 0.02), ControlOutput::HOLD);
    }

    #[test]
    fn detach_clears_session() {
        let mut follower = PathFollower::default();
        follower.set_route(straight(3, 1.0));
        follower.detach();
        assert!(follower.buffer().is_empty());
        assert_eq!(follower.route().len(), 3);
        assert_eq!(follower.state(), FollowerState::Braking);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FollowerConfig::default().with_look_ahead_factor(-1.0);
        assert!(PathFollower::try_new(config).is_err());
    }

    /// Bicycle-model vehicle used to close the loop around the follower.
    struct Kinematic {
        location: Vec3,
        heading: f32,
        speed: f32,
    }

    impl Kinematic {
        const MAX_ACCEL: f32 = 4.0;
        const MAX_DECEL: f32 = 8.0;
        const MAX_WHEEL_ANGLE: f32 = 0.6;
        const WHEELBASE: f32 = 2.7;

        fn state(&self) -> VehicleState {
            let forward = Vec3::new(self.heading.cos(), self.heading.sin(), 0.0);
            VehicleState::new(self.location, forward, self.speed)
        }

        fn apply(&mut self, out: ControlOutput, dt: f32) {
            let accel = out.throttle * Self::MAX_ACCEL - out.brake * Self::MAX_DECEL;
            self.speed = (self.speed + accel * dt).max(0.0);
            self.heading +=
                self.speed * (out.steering * Self::MAX_WHEEL_ANGLE).tan() / Self::WHEELBASE * dt;
            self.location += Vec3::new(self.heading.cos(), self.heading.sin(), 0.0) * self.speed * dt;
        }
    }

    #[test]
    fn drives_laps_around_a_looped_circle() {
        let radius = 40.0;
        let n = 32;
        let route: Vec<Vec3> = (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * std::f32::consts::TAU;
                Vec3::new(radius * a.cos(), radius * a.sin(), 0.0)
            })
            .collect();

        let mut follower = PathFollower::default();
        follower.set_route(route.iter().copied());
        follower.set_speed_limit(8.0);
        follower.set_looped(true);
        follower.attach(route[0]);

        let mut car = Kinematic {
            location: route[0],
            heading: std::f32::consts::FRAC_PI_2,
            speed: 0.0,
        };
        let dt = 0.05;
        let mut passed = 0;
        let mut max_deviation: f32 = 0.0;
        let mut max_speed: f32 = 0.0;

        for _ in 0..2000 {
            let before = follower.last_passed();
            let out = follower.tick(&car.state(), dt);
            if follower.last_passed() != before {
                passed += 1;
            }
            assert_ne!(follower.state(), FollowerState::Braking);
            car.apply(out, dt);
            max_deviation = max_deviation.max((car.location.truncate().length() - radius).abs());
            max_speed = max_speed.max(car.speed);
        }

        assert!(passed > n, "only {passed} waypoints passed");
        assert!(max_deviation < 2.0, "left the circle by {max_deviation} m");
        assert!(max_speed < 8.5, "reached {max_speed} m/s");
    }

    #[test]
    fn open_route_is_driven_to_a_stop() {
        let mut follower = PathFollower::default();
        follower.set_route((1..=5).map(|i| [0.0, i as f32 * 10.0, 0.0]));
        follower.set_speed_limit(8.0);
        follower.attach(Vec3::ZERO);

        let mut car = Kinematic {
            location: Vec3::ZERO,
            heading: std::f32::consts::FRAC_PI_2,
            speed: 0.0,
        };
        for _ in 0..599 {
            let out = follower.tick(&car.state(), 0.05);
            car.apply(out, 0.05);
        }
        let last = follower.tick(&car.state(), 0.05);

        assert_eq!(follower.state(), FollowerState::Braking);
        assert_eq!(last, ControlOutput::HOLD);
        assert!(car.location.y > 45.0);
        assert!(car.location.x.abs() < 1.0);
    }
}
