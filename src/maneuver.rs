//! Reentry-vehicle lift response to guidance commands.
//!
//! The lag law models the body rotating to a new trim angle of attack with a
//! first-order time constant set by the pitch stiffness:
//!
//! ```text
//! tau     = sqrt(-2 Iyy / (Cm_alpha A rho v^2 L))
//! a_lift += (a_cmd - a_lift) dt / tau
//! ```
//!
//! After each update the implied trim angle of attack
//! `alpha = m |a_lift| / (0.5 rho v^2 Cl_alpha)` is capped at
//! [`MAX_ANGLE_OF_ATTACK`]. The clamp carries no reference area.

use nalgebra::Vector3;

use crate::atmosphere::AtmCondition;
use crate::constants::{MAX_ANGLE_OF_ATTACK, MIN_DIVISION_THRESHOLD};
use crate::state::VehicleState;
use crate::vehicle::ReentryVehicle;

/// Dynamic pressure (Pa).
fn dynamic_pressure(atm: &AtmCondition, speed: f64) -> f64 {
    0.5 * atm.density * speed * speed
}

/// Pitch response time constant (s). `None` when the vehicle has no
/// restoring moment at this flight condition.
pub fn lift_time_constant(rv: &ReentryVehicle, atm: &AtmCondition, speed: f64) -> Option<f64> {
    let stiffness = -rv.c_m_alpha * rv.area * atm.density * speed * speed * rv.length;
    if stiffness <= MIN_DIVISION_THRESHOLD {
        return None;
    }
    let tau = (2.0 * rv.iyy / stiffness).sqrt();
    tau.is_finite().then_some(tau)
}

/// Trim angle of attack needed to generate `lift` (rad).
pub fn angle_of_attack(
    rv: &ReentryVehicle,
    atm: &AtmCondition,
    speed: f64,
    lift: &Vector3<f64>,
) -> f64 {
    let per_radian = dynamic_pressure(atm, speed) * rv.c_l_alpha;
    if per_radian <= MIN_DIVISION_THRESHOLD {
        return 0.0;
    }
    rv.mass * lift.norm() / per_radian
}

/// Cap the lift so the trim angle of attack does not exceed the limit,
/// keeping its direction.
pub fn clamp_lift(
    rv: &ReentryVehicle,
    atm: &AtmCondition,
    speed: f64,
    lift: Vector3<f64>,
) -> Vector3<f64> {
    let alpha = angle_of_attack(rv, atm, speed, &lift);
    if alpha > MAX_ANGLE_OF_ATTACK {
        lift * (MAX_ANGLE_OF_ATTACK / alpha)
    } else {
        lift
    }
}

/// One step of the lift-lag law on `state.accel.lift`.
///
/// Where no time constant exists (vacuum or zero speed) the lift is held.
/// The relaxation fraction is capped at one so a step longer than the time
/// constant lands on the command instead of overshooting it.
pub fn update_lift(
    state: &mut VehicleState,
    command: &Vector3<f64>,
    rv: &ReentryVehicle,
    atm: &AtmCondition,
    dt: f64,
) {
    let speed = state.speed();
    let Some(tau) = lift_time_constant(rv, atm, speed) else {
        return;
    };

    let fraction = (dt / tau).min(1.0);
    let lift = state.accel.lift + (command - state.accel.lift) * fraction;
    state.accel.lift = clamp_lift(rv, atm, speed, lift);
}

/// Idealized maneuver: lift takes the commanded value immediately.
pub fn instant_maneuver(state: &mut VehicleState, command: &Vector3<f64>) {
    state.accel.lift = *command;
    state.accel.update_total();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atmosphere::AtmosphereModel;
    use crate::constants::EARTH_RADIUS;

    fn reentering(speed: f64) -> VehicleState {
        let mut s = VehicleState::at_launch(0.0, 0.0);
        s.position = Vector3::new(EARTH_RADIUS + 20e3, 0.0, 0.0);
        s.velocity = Vector3::new(-speed, 0.0, 0.0);
        s
    }

    #[test]
    fn test_time_constant() {
        let rv = ReentryVehicle::swerve();
        let atm = AtmosphereModel::nominal().conditions(20e3);
        let tau = lift_time_constant(&rv, &atm, 3000.0).unwrap();
        let stiffness = rv.c_m_alpha * rv.area * atm.density * 9.0e6 * rv.length;
        let expected = (-2.0 * rv.iyy / stiffness).sqrt();
        assert!((tau - expected).abs() < 1e-12);
        assert!(lift_time_constant(&rv, &atm, 0.0).is_none());
    }

    #[test]
    fn test_lift_relaxes_towards_zero_command() {
        let rv = ReentryVehicle::swerve();
        let atm = AtmosphereModel::nominal().conditions(20e3);
        let mut s = reentering(3000.0);
        s.accel.lift = Vector3::new(0.0, 5.0, 0.0);

        let mut previous = s.accel.lift.norm();
        for _ in 0..20 {
            update_lift(&mut s, &Vector3::zeros(), &rv, &atm, 0.01);
            let now = s.accel.lift.norm();
            assert!(now < previous);
            previous = now;
        }
    }

    #[test]
    fn test_lift_tracks_command() {
        let rv = ReentryVehicle::swerve();
        let atm = AtmosphereModel::nominal().conditions(20e3);
        let mut s = reentering(3000.0);
        let command = Vector3::new(0.0, 0.0, 2.0);
        for _ in 0..2000 {
            update_lift(&mut s, &command, &rv, &atm, 0.01);
        }
        assert!((s.accel.lift - command).norm() < 1e-6);
    }

    #[test]
    fn test_angle_of_attack_clamped_to_limit() {
        let rv = ReentryVehicle::swerve();
        let atm = AtmosphereModel::nominal().conditions(20e3);
        let mut s = reentering(3000.0);
        // Far beyond anything the vehicle can trim to
        let command = Vector3::new(0.0, 1.0e6, 0.0);
        for _ in 0..50 {
            update_lift(&mut s, &command, &rv, &atm, 0.01);
        }
        let alpha = angle_of_attack(&rv, &atm, s.speed(), &s.accel.lift);
        assert!((alpha - MAX_ANGLE_OF_ATTACK).abs() < 1e-9);
        assert!(s.accel.lift.x.abs() < 1e-12 && s.accel.lift.z.abs() < 1e-12);
    }

    #[test]
    fn test_angle_of_attack_has_no_area_term() {
        let rv = ReentryVehicle::swerve();
        let atm = AtmosphereModel::nominal().conditions(20e3);
        let lift = Vector3::new(0.0, 30.0, 40.0);
        let alpha = angle_of_attack(&rv, &atm, 3000.0, &lift);
        let expected = rv.mass * 50.0 / (0.5 * atm.density * 9.0e6 * rv.c_l_alpha);
        assert!((alpha - expected).abs() < 1e-12 * expected.max(1.0));

        // The lift that sits exactly on the limit is left untouched
        let limit = MAX_ANGLE_OF_ATTACK * 0.5 * atm.density * 9.0e6 * rv.c_l_alpha / rv.mass;
        let on_limit = Vector3::new(0.0, limit, 0.0);
        let clamped = clamp_lift(&rv, &atm, 3000.0, on_limit * 2.0);
        assert!((clamped - on_limit).norm() < 1e-9 * limit);
    }

    #[test]
    fn test_vacuum_holds_lift() {
        let rv = ReentryVehicle::swerve();
        let atm = AtmCondition::default();
        let mut s = reentering(3000.0);
        s.accel.lift = Vector3::new(1.0, 2.0, 3.0);
        update_lift(&mut s, &Vector3::zeros(), &rv, &atm, 0.01);
        assert_eq!(s.accel.lift, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_instant_maneuver() {
        let mut s = reentering(3000.0);
        s.accel.gravity = Vector3::new(-9.8, 0.0, 0.0);
        s.accel.drag = Vector3::new(100.0, 0.0, 0.0);
        let command = Vector3::new(0.0, 1.0, -1.0);
        instant_maneuver(&mut s, &command);
        assert_eq!(s.accel.lift, command);
        assert_eq!(s.accel.total, s.accel.gravity + s.accel.drag + command);
    }
}
