//! Path following: PID controllers and the per-tick waypoint follower.
pub mod follower;
pub mod pid;

pub use follower::{ControlOutput, FollowerConfig, FollowerState, PathFollower, VehicleState};
pub use pid::{LateralController, LongitudinalController, PidController, PidGains};
