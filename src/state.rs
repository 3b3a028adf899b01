//! Kinematic state of one flight track and the fixed-step integrator.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{EARTH_RADIUS, MIN_DIVISION_THRESHOLD};
use crate::frames::altitude;

/// Acceleration contributions, all in Earth-centred Cartesian (m/s²).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccelBreakdown {
    pub gravity: Vector3<f64>,
    pub drag: Vector3<f64>,
    pub lift: Vector3<f64>,
    pub thrust: Vector3<f64>,
    pub total: Vector3<f64>,
}

impl AccelBreakdown {
    pub fn sum(&self) -> Vector3<f64> {
        self.gravity + self.drag + self.lift + self.thrust
    }

    /// Restore `total == gravity + drag + lift + thrust`.
    pub fn update_total(&mut self) {
        self.total = self.sum();
    }

    /// Apply the same linear map to every component and rebuild the total.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(&Vector3<f64>) -> Vector3<f64>,
    {
        let mut out = Self {
            gravity: f(&self.gravity),
            drag: f(&self.drag),
            lift: f(&self.lift),
            thrust: f(&self.thrust),
            total: Vector3::zeros(),
        };
        out.update_total();
        out
    }

    fn lerp(&self, other: &Self, frac: f64) -> Self {
        Self {
            gravity: lerp(&self.gravity, &other.gravity, frac),
            drag: lerp(&self.drag, &other.drag, frac),
            lift: lerp(&self.lift, &other.lift, frac),
            thrust: lerp(&self.thrust, &other.thrust, frac),
            total: lerp(&self.total, &other.total, frac),
        }
    }
}

fn lerp(a: &Vector3<f64>, b: &Vector3<f64>, frac: f64) -> Vector3<f64> {
    a + (b - a) * frac
}

/// State of one flight track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Elapsed flight time (s)
    pub t: f64,
    /// Thrust longitude angle (rad)
    pub theta_long: f64,
    /// Thrust latitude angle (rad)
    pub theta_lat: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub accel: AccelBreakdown,
    /// Angular offsets injected at launch; zero on unperturbed tracks
    pub theta_long_pert: f64,
    pub theta_lat_pert: f64,
}

impl VehicleState {
    /// At rest on the launch point `(R, 0, 0)` with the commanded thrust angles.
    pub fn at_launch(theta_long: f64, theta_lat: f64) -> Self {
        Self::at_position(Vector3::new(EARTH_RADIUS, 0.0, 0.0), theta_long, theta_lat)
    }

    pub fn at_position(position: Vector3<f64>, theta_long: f64, theta_lat: f64) -> Self {
        Self {
            t: 0.0,
            theta_long,
            theta_lat,
            position,
            velocity: Vector3::zeros(),
            accel: AccelBreakdown::default(),
            theta_long_pert: 0.0,
            theta_lat_pert: 0.0,
        }
    }

    pub fn altitude(&self) -> f64 {
        altitude(&self.position)
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

/// Advance `state` by `dt` with classic four-stage Runge-Kutta.
///
/// The total acceleration is held constant across the sub-stages, so forces
/// are evaluated once per step by the caller.
pub fn rk4_step(state: &mut VehicleState, dt: f64) {
    let a = state.accel.total;
    let v0 = state.velocity;

    // k1
    let k1_x = v0;
    let k1_v = a;

    // k2
    let k2_x = v0 + k1_v * (dt * 0.5);
    let k2_v = a;

    // k3
    let k3_x = v0 + k2_v * (dt * 0.5);
    let k3_v = a;

    // k4
    let k4_x = v0 + k3_v * dt;
    let k4_v = a;

    state.position += (k1_x + k2_x * 2.0 + k3_x * 2.0 + k4_x) * (dt / 6.0);
    state.velocity += (k1_v + k2_v * 2.0 + k3_v * 2.0 + k4_v) * (dt / 6.0);
    state.t += dt;
}

/// Linearly interpolate between two samples of a track to the zero-altitude
/// crossing of the line through their altitudes.
///
/// Time, position, velocity and accelerations are interpolated; thrust angles
/// and launch perturbations are carried from `before`. When both samples
/// share an altitude the later sample is returned.
pub fn interpolate_to_ground(before: &VehicleState, after: &VehicleState) -> VehicleState {
    let h0 = before.altitude();
    let h1 = after.altitude();
    let denom = h0 - h1;
    if denom.abs() < MIN_DIVISION_THRESHOLD {
        return *after;
    }
    let frac = h0 / denom;

    VehicleState {
        t: before.t + (after.t - before.t) * frac,
        position: lerp(&before.position, &after.position, frac),
        velocity: lerp(&before.velocity, &after.velocity, frac),
        accel: before.accel.lerp(&after.accel, frac),
        ..*before
    }
}

/// The three parallel tracks of one flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tracks {
    /// What the vehicle actually does
    pub truth: VehicleState,
    /// What the navigation system believes
    pub estimated: VehicleState,
    /// Error-free reference flight
    pub desired: VehicleState,
}

impl Tracks {
    pub fn for_each_mut<F: FnMut(&mut VehicleState)>(&mut self, mut f: F) {
        f(&mut self.truth);
        f(&mut self.estimated);
        f(&mut self.desired);
    }

    pub fn rk4_step(&mut self, dt: f64) {
        self.for_each_mut(|s| rk4_step(s, dt));
    }

    pub fn interpolate_to_ground(&self, after: &Tracks) -> Tracks {
        Tracks {
            truth: interpolate_to_ground(&self.truth, &after.truth),
            estimated: interpolate_to_ground(&self.estimated, &after.estimated),
            desired: interpolate_to_ground(&self.desired, &after.desired),
        }
    }
}
