//! Error-free reference flights: aimpoint calibration and thrust-angle search.

use std::f64::consts::FRAC_PI_4;

use log::{debug, info};
use nalgebra::Vector3;

use crate::config::RunParams;
use crate::constants::ROOT_FINDING_TOLERANCE;
use crate::error::{SimError, SimResult};
use crate::frames::surface_distance;
use crate::noise::ZeroNoise;
use crate::output::NullSink;
use crate::state::VehicleState;
use crate::trajectory::fly;

/// Thrust angles searched by `solve_thrust_angle`, from vertical to 45°.
pub const THRUST_ANGLE_BRACKET: (f64, f64) = (0.0, FRAC_PI_4);

/// Range tolerance for the thrust-angle search (m)
const RANGE_TOLERANCE: f64 = 1.0;
const MAX_ITERATIONS: usize = 60;

/// Impact point of the error-free flight flown with `theta_long`.
pub fn impact_point_for_angle(params: &RunParams, theta_long: f64) -> SimResult<Vector3<f64>> {
    let reference = RunParams {
        theta_long,
        ..params.error_free()
    };
    let result = fly(&reference, &mut ZeroNoise, &mut NullSink)?;
    result
        .impact()
        .map(|impact| impact.position)
        .ok_or(SimError::NoImpact(reference.max_steps))
}

/// Move the aimpoint to the error-free impact point of the configured thrust
/// angles and return it.
pub fn update_aimpoint(params: &mut RunParams) -> SimResult<Vector3<f64>> {
    let aim = impact_point_for_angle(params, params.theta_long)?;
    params.set_aimpoint(&aim);
    info!("aimpoint updated to ({:.3}, {:.3}, {:.3}) m", aim.x, aim.y, aim.z);
    Ok(aim)
}

/// Great-circle range from the launch pad of the error-free flight.
pub fn range_for_angle(params: &RunParams, theta_long: f64) -> SimResult<f64> {
    let pad = VehicleState::at_launch(theta_long, params.theta_lat).position;
    Ok(surface_distance(&pad, &impact_point_for_angle(params, theta_long)?))
}

/// Find the `theta_long` whose error-free flight reaches `target_range`
/// metres downrange.
///
/// Range grows monotonically from a vertical launch up to 45°, so the search
/// is a plain bisection over that bracket.
pub fn solve_thrust_angle(params: &RunParams, target_range: f64) -> SimResult<f64> {
    let (mut low_angle, mut high_angle) = THRUST_ANGLE_BRACKET;
    let min_range = range_for_angle(params, low_angle)?;
    let max_range = range_for_angle(params, high_angle)?;
    if target_range < min_range || target_range > max_range {
        return Err(SimError::RangeNotBracketed {
            target: target_range,
            min: min_range,
            max: max_range,
        });
    }

    let mut mid_angle = 0.5 * (low_angle + high_angle);
    for iteration in 0..MAX_ITERATIONS {
        mid_angle = 0.5 * (low_angle + high_angle);
        let range = range_for_angle(params, mid_angle)?;
        let error = range - target_range;
        debug!(
            "iteration {}: theta_long = {:.6} rad, range = {:.1} m, error = {:.3} m",
            iteration, mid_angle, range, error
        );

        if error.abs() < RANGE_TOLERANCE {
            break;
        }
        if error > 0.0 {
            high_angle = mid_angle;
        } else {
            low_angle = mid_angle;
        }
        if (high_angle - low_angle).abs() < ROOT_FINDING_TOLERANCE {
            break;
        }
    }

    info!("thrust angle {:.6} rad for a range of {:.0} m", mid_angle, target_range);
    Ok(mid_angle)
}
