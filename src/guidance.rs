use nalgebra::Vector3;

use crate::constants::{MIN_DIVISION_THRESHOLD, NAV_GAIN};
use crate::state::VehicleState;

/// Proportional navigation acceleration command towards `aimpoint`.
///
/// Uses the line of sight `r = aim - position` and the closing velocity
/// `v = -velocity`. The line-of-sight rotation rate is `r x v / |r|²` and the
/// command is `N * (v x rotation)`. A collision course (`r` parallel to `v`)
/// produces a zero command.
pub fn proportional_navigation(state: &VehicleState, aimpoint: &Vector3<f64>) -> Vector3<f64> {
    let r = aimpoint - state.position;
    let v = -state.velocity;
    let r_sq = r.norm_squared();
    if r_sq < MIN_DIVISION_THRESHOLD {
        return Vector3::zeros();
    }

    let rotation = r.cross(&v) / r_sq;
    NAV_GAIN * v.cross(&rotation)
}
