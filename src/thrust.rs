use nalgebra::Vector3;

use crate::constants::VERTICAL_RISE_TIME;
use crate::frames::direction_from_angles;
use crate::state::VehicleState;
use crate::vehicle::Vehicle;

/// Thrust acceleration on `state` (m/s²).
///
/// The burning stage is found from cumulative stage burn times. During the
/// vertical rise the thrust points along the local vertical; afterwards it
/// follows the state's `(theta_long, theta_lat)` thrust angles. Zero at and
/// after total burnout.
pub fn thrust_acceleration(state: &VehicleState, vehicle: &Vehicle) -> Vector3<f64> {
    let Some(stage) = vehicle.booster.active_stage(state.t) else {
        return Vector3::zeros();
    };
    if vehicle.current_mass <= 0.0 {
        return Vector3::zeros();
    }

    let b = &vehicle.booster;
    let magnitude = b.isp0[stage] * b.burn_rate[stage] / vehicle.current_mass;

    let direction = if state.t < VERTICAL_RISE_TIME {
        state
            .position
            .try_normalize(0.0)
            .unwrap_or_else(|| direction_from_angles(state.theta_long, state.theta_lat))
    } else {
        direction_from_angles(state.theta_long, state.theta_lat)
    };

    direction * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RvType;
    use std::f64::consts::PI;

    #[test]
    fn test_liftoff_thrust_is_vertical() {
        let vehicle = Vehicle::from_rv_type(RvType::Ballistic);
        let state = VehicleState::at_launch(PI / 4.0, 0.0);
        let a = thrust_acceleration(&state, &vehicle);
        let expected = 267.0 * 9.81 * (20780.0 / 61.0) / 34610.0;
        assert!((a.x - expected).abs() < 1e-9);
        assert!(a.y.abs() < 1e-12 && a.z.abs() < 1e-12);
        // More than enough to lift off
        assert!(a.x > 9.82);
    }

    #[test]
    fn test_thrust_follows_angles_after_rise() {
        let mut vehicle = Vehicle::from_rv_type(RvType::Ballistic);
        let mut state = VehicleState::at_launch(PI / 4.0, 0.0);
        state.t = 70.0;
        vehicle.update_mass(state.t);
        let a = thrust_acceleration(&state, &vehicle);
        assert!((a.x - a.y).abs() < 1e-9);
        assert!(a.z.abs() < 1e-12);

        let b = &vehicle.booster;
        let expected = b.isp0[1] * b.burn_rate[1] / vehicle.current_mass;
        assert!((a.norm() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_thrust_after_burnout() {
        let mut vehicle = Vehicle::from_rv_type(RvType::Maneuverable);
        let mut state = VehicleState::at_launch(0.0, 0.0);
        state.t = 188.0;
        vehicle.update_mass(state.t);
        assert_eq!(thrust_acceleration(&state, &vehicle), Vector3::zeros());
    }

    #[test]
    fn test_mock_has_no_thrust() {
        let vehicle = Vehicle::mock();
        let state = VehicleState::at_launch(0.0, 0.0);
        assert_eq!(thrust_acceleration(&state, &vehicle), Vector3::zeros());
    }
}
