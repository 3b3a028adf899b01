use nalgebra::Vector3;

use crate::atmosphere::AtmCondition;
use crate::constants::MIN_AIRSPEED;
use crate::frames::local_to_cartesian;
use crate::state::VehicleState;
use crate::vehicle::Vehicle;

/// Aerodynamic drag acceleration on `state` (m/s²).
///
/// Drag opposes the velocity relative to the local wind and uses whichever
/// aero profile is active at the state's time. Below [`MIN_AIRSPEED`] the
/// contribution is zero.
pub fn drag_acceleration(
    state: &VehicleState,
    vehicle: &Vehicle,
    atm: &AtmCondition,
) -> Vector3<f64> {
    let wind = local_to_cartesian(
        &state.position,
        atm.meridional_wind,
        atm.zonal_wind,
        atm.vertical_wind,
    );
    let v_rel = state.velocity - wind;
    let airspeed = v_rel.norm();
    if airspeed < MIN_AIRSPEED || vehicle.current_mass <= 0.0 {
        return Vector3::zeros();
    }

    let aero = vehicle.aero_profile(state.t);
    let magnitude =
        0.5 * atm.density * airspeed * airspeed * aero.c_d_0 * aero.area / vehicle.current_mass;
    -v_rel / airspeed * magnitude
}
