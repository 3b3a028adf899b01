//! Flight integration core.
//!
//! A flight propagates three tracks in lock step with a fixed-step RK4
//! integrator:
//!
//! * **truth**: the vehicle as it actually flies, in the perturbed environment
//! * **estimated**: the navigation solution, fed by IMU and GNSS models
//! * **desired**: the error-free reference flight
//!
//! Forces are evaluated once per step. At burnout the true track is nudged by
//! the difference between desired and estimated (boost guidance) and the
//! estimate is reset. The loop stops when the true track crosses zero
//! altitude or after `max_steps`.

use log::{debug, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::atmosphere::{AtmCondition, AtmosphereModel};
use crate::config::{ManeuverMode, RunParams};
use crate::constants::{
    BURNOUT_TIME_TOLERANCE, DRAG_NEGLIGIBLE, EARTH_SURFACE_ROTATION_SPEED, REENTRY_ALTITUDE,
};
use crate::drag::drag_acceleration;
use crate::error::SimResult;
use crate::frames::local_frame;
use crate::gravity::GravityModel;
use crate::guidance::proportional_navigation;
use crate::maneuver::{instant_maneuver, update_lift};
use crate::noise::NoiseSource;
use crate::output::TrajectorySink;
use crate::realization::ErrorRealization;
use crate::sensors::{Gnss, Imu};
use crate::state::{AccelBreakdown, Tracks, VehicleState};
use crate::thrust::thrust_acceleration;
use crate::vehicle::Vehicle;

/// Where a flight is, judged from the true track. Boost takes precedence
/// over altitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightPhase {
    Boost,
    /// Unpowered above the reentry altitude
    Coast,
    /// Unpowered below the reentry altitude
    Reentry,
    Impacted,
}

impl FlightPhase {
    pub fn of(state: &VehicleState, burn_time: f64) -> Self {
        let altitude = state.altitude();
        if state.t < burn_time {
            FlightPhase::Boost
        } else if altitude < 0.0 {
            FlightPhase::Impacted
        } else if altitude < REENTRY_ALTITUDE {
            FlightPhase::Reentry
        } else {
            FlightPhase::Coast
        }
    }
}

/// Ground impact of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactRecord {
    pub t: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl From<&VehicleState> for ImpactRecord {
    fn from(s: &VehicleState) -> Self {
        Self {
            t: s.t,
            position: s.position,
            velocity: s.velocity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlightOutcome {
    Impacted(ImpactRecord),
    /// Step ceiling reached without impact; carries the last true state
    Exhausted(VehicleState),
}

#[derive(Debug, Clone)]
pub struct FlightResult {
    pub outcome: FlightOutcome,
    /// Tracks at impact (interpolated and corrected) or at the last step
    pub tracks: Tracks,
    pub steps: usize,
}

impl FlightResult {
    pub fn impact(&self) -> Option<&ImpactRecord> {
        match &self.outcome {
            FlightOutcome::Impacted(record) => Some(record),
            FlightOutcome::Exhausted(_) => None,
        }
    }
}

/// Thrust, gravity and drag on one track. Lift is left as is.
fn update_forces(
    state: &mut VehicleState,
    vehicle: &Vehicle,
    gravity: &GravityModel,
    atm: &AtmCondition,
) {
    state.accel.thrust = thrust_acceleration(state, vehicle);
    state.accel.gravity = gravity.acceleration(&state.position);
    state.accel.drag = drag_acceleration(state, vehicle, atm);
}

/// Burnout correction: move the true track by the navigation system's view
/// of its error and restart the estimate from the reference flight.
pub fn apply_burnout_correction(tracks: &mut Tracks, imu: &mut Imu) {
    let est = tracks.estimated;
    let des = tracks.desired;
    let truth = &mut tracks.truth;

    truth.position += des.position - est.position;
    truth.velocity += des.velocity - est.velocity;
    truth.theta_long += des.theta_long - est.theta_long;
    truth.theta_lat += des.theta_lat - est.theta_lat;
    truth.accel = AccelBreakdown {
        gravity: truth.accel.gravity + des.accel.gravity - est.accel.gravity,
        drag: truth.accel.drag + des.accel.drag - est.accel.drag,
        lift: truth.accel.lift + des.accel.lift - est.accel.lift,
        thrust: truth.accel.thrust + des.accel.thrust - est.accel.thrust,
        total: Vector3::zeros(),
    };
    truth.accel.update_total();

    tracks.estimated = des;
    imu.reset_attitude_error();
}

/// Eastward displacement of the impact point from Earth rotation during the
/// difference between true and estimated flight times.
pub fn coriolis_displacement(lat: f64, long: f64, time_error: f64) -> Vector3<f64> {
    let speed = EARTH_SURFACE_ROTATION_SPEED * lat.cos();
    local_frame(long, lat).east * (speed * time_error)
}

/// One flight: environment, sensors and vehicle for a single run.
pub struct Flight<'a> {
    params: &'a RunParams,
    pub vehicle: Vehicle,
    true_gravity: GravityModel,
    nav_gravity: GravityModel,
    true_atm: AtmosphereModel,
    nav_atm: AtmosphereModel,
    pub imu: Imu,
    gnss: Gnss,
    coriolis_lat: f64,
    coriolis_long: f64,
}

impl<'a> Flight<'a> {
    pub fn new(params: &'a RunParams, vehicle: Vehicle, realization: &ErrorRealization) -> Self {
        Self {
            params,
            vehicle,
            true_gravity: realization.gravity.clone(),
            nav_gravity: GravityModel::nominal(),
            true_atm: realization.true_atmosphere(params),
            nav_atm: AtmosphereModel::nominal(),
            imu: realization.imu.clone(),
            gnss: Gnss::new(params.gnss_noise),
            coriolis_lat: realization.coriolis_lat,
            coriolis_long: realization.coriolis_long,
        }
    }

    fn time_step(&self, phase: FlightPhase) -> f64 {
        match phase {
            FlightPhase::Reentry => self.params.time_step_reentry,
            _ => self.params.time_step_main,
        }
    }

    /// Integrate from `initial` until impact or the step ceiling.
    pub fn run<N, S>(
        &mut self,
        initial: Tracks,
        noise: &mut N,
        sink: &mut S,
    ) -> SimResult<FlightResult>
    where
        N: NoiseSource + ?Sized,
        S: TrajectorySink + ?Sized,
    {
        let params = self.params;
        let aimpoint = params.aimpoint();
        let burn_time = self.vehicle.total_burn_time();
        let mut burnout_corrected = false;

        let mut current = initial;
        sink.record(&current, self.vehicle.current_mass)?;

        for step in 0..params.max_steps {
            let phase = FlightPhase::of(&current.truth, burn_time);
            let dt = self.time_step(phase);
            let past_burnout = phase != FlightPhase::Boost;

            let atm_true = self.true_atm.conditions(current.truth.altitude());
            let atm_est = self.nav_atm.conditions(current.estimated.altitude());
            let atm_des = self.nav_atm.conditions(current.desired.altitude());

            let mut next = current;
            update_forces(&mut next.truth, &self.vehicle, &self.true_gravity, &atm_true);
            update_forces(&mut next.estimated, &self.vehicle, &self.nav_gravity, &atm_est);
            update_forces(&mut next.desired, &self.vehicle, &self.true_gravity, &atm_des);

            let maneuvering = params.rv_maneuv.uses_lift()
                && self.vehicle.rv.maneuverable
                && phase == FlightPhase::Reentry;
            if maneuvering {
                let command = proportional_navigation(&next.estimated, &aimpoint);
                match params.rv_maneuv {
                    ManeuverMode::LiftLag => {
                        update_lift(&mut next.truth, &command, &self.vehicle.rv, &atm_true, dt);
                        update_lift(&mut next.estimated, &command, &self.vehicle.rv, &atm_est, dt);
                    }
                    ManeuverMode::Instantaneous => {
                        instant_maneuver(&mut next.truth, &command);
                        instant_maneuver(&mut next.estimated, &command);
                    }
                    ManeuverMode::Ballistic | ManeuverMode::Perfect => {}
                }
            }

            next.for_each_mut(|s| s.accel.update_total());

            if params.ins_nav {
                next.estimated.accel = self.imu.measure_accel(&next.truth.accel);
                let (theta_long, theta_lat) = self.imu.measure_attitude(&next.truth);
                next.estimated.theta_long = theta_long;
                next.estimated.theta_lat = theta_lat;

                if !maneuvering || !past_burnout || next.truth.accel.drag.norm() > DRAG_NEGLIGIBLE {
                    self.imu.propagate(dt, noise);
                }
            }

            if params.gnss_nav {
                next.estimated.position = self.gnss.measure(&next.truth.position, noise);
            }

            if params.boost_guidance
                && !burnout_corrected
                && (next.truth.t - burn_time).abs() < BURNOUT_TIME_TOLERANCE
            {
                apply_burnout_correction(&mut next, &mut self.imu);
                burnout_corrected = true;
                debug!("burnout correction applied at t = {:.3} s", next.truth.t);
            }

            next.rk4_step(dt);
            self.vehicle.update_mass(next.truth.t);

            // Impact is a downward crossing; a launch error below the pad is not
            if current.truth.altitude() >= 0.0 && next.truth.altitude() < 0.0 {
                let mut impact = current.interpolate_to_ground(&next);

                let time_error = impact.truth.t - impact.estimated.t;
                impact.truth.position +=
                    coriolis_displacement(self.coriolis_lat, self.coriolis_long, time_error);

                if params.rv_maneuv == ManeuverMode::Perfect {
                    impact.truth.position -= impact.estimated.position - aimpoint;
                }

                sink.record(&impact, self.vehicle.current_mass)?;
                sink.finish()?;
                debug!("impact after {} steps at t = {:.3} s", step + 1, impact.truth.t);

                return Ok(FlightResult {
                    outcome: FlightOutcome::Impacted(ImpactRecord::from(&impact.truth)),
                    tracks: impact,
                    steps: step + 1,
                });
            }

            sink.record(&next, self.vehicle.current_mass)?;
            current = next;
        }

        warn!(
            "maximum number of steps ({}) reached with no impact at t = {:.3} s, altitude {:.1} m",
            params.max_steps,
            current.truth.t,
            current.truth.altitude()
        );
        sink.finish()?;

        Ok(FlightResult {
            outcome: FlightOutcome::Exhausted(current.truth),
            tracks: current,
            steps: params.max_steps,
        })
    }
}

/// Sample a realization from `noise` and fly the configured vehicle from the
/// launch pad.
pub fn fly<N, S>(params: &RunParams, noise: &mut N, sink: &mut S) -> SimResult<FlightResult>
where
    N: NoiseSource + ?Sized,
    S: TrajectorySink + ?Sized,
{
    let realization = ErrorRealization::sample(params, noise);
    let vehicle = Vehicle::from_rv_type(params.rv_type);
    let mut flight = Flight::new(params, vehicle, &realization);
    flight.run(realization.initial_tracks(params), noise, sink)
}
