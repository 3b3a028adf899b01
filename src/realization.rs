//! Per-run error realization.
//!
//! Everything random about a run that is fixed at launch is drawn here, in a
//! fixed order, so that two runs from the same substream are identical and
//! switching one error source off does not shift the draws of the others.
//! Per-step noise (gyro random walk, GNSS) is drawn later during the flight.

use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::atmosphere::{AtmPerturbation, AtmosphereModel};
use crate::config::RunParams;
use crate::gravity::GravityModel;
use crate::noise::NoiseSource;
use crate::sensors::Imu;
use crate::state::{Tracks, VehicleState};

#[derive(Debug, Clone)]
pub struct ErrorRealization {
    /// Launch position error (m)
    pub position_error: Vector3<f64>,
    /// Launch velocity error (m/s)
    pub velocity_error: Vector3<f64>,
    pub theta_long_error: f64,
    pub theta_lat_error: f64,
    pub atmosphere: AtmPerturbation,
    pub gravity: GravityModel,
    pub imu: Imu,
    /// Latitude used to resolve the Coriolis displacement (rad)
    pub coriolis_lat: f64,
    /// Longitude used to resolve the Coriolis displacement (rad)
    pub coriolis_long: f64,
}

impl ErrorRealization {
    pub fn sample<N: NoiseSource + ?Sized>(params: &RunParams, noise: &mut N) -> Self {
        let x_error = params.initial_x_error * noise.gaussian();
        let position_error = Vector3::new(
            x_error + params.initial_pos_error * noise.gaussian(),
            params.initial_pos_error * noise.gaussian(),
            params.initial_pos_error * noise.gaussian(),
        );
        let velocity_error = Vector3::new(
            params.initial_vel_error * noise.gaussian(),
            params.initial_vel_error * noise.gaussian(),
            params.initial_vel_error * noise.gaussian(),
        );
        let theta_long_error = params.initial_angle_error * noise.gaussian();
        let theta_lat_error = params.initial_angle_error * noise.gaussian();

        let atm_draw = AtmPerturbation::sample(noise);
        let atmosphere = if params.atm_error {
            atm_draw
        } else {
            AtmPerturbation::default()
        };

        let grav_draw = GravityModel::perturbed(noise);
        let gravity = if params.grav_error {
            grav_draw
        } else {
            GravityModel::nominal()
        };

        let imu = Imu::sample(
            params.acc_scale_stability,
            params.gyro_bias_stability,
            params.gyro_noise,
            noise,
        );

        let coriolis_lat = (noise.uniform() - 0.5) * PI;
        let coriolis_long = (noise.uniform() - 0.5) * 2.0 * PI;

        Self {
            position_error,
            velocity_error,
            theta_long_error,
            theta_lat_error,
            atmosphere,
            gravity,
            imu,
            coriolis_lat,
            coriolis_long,
        }
    }

    /// Atmosphere seen by the true track.
    pub fn true_atmosphere(&self, params: &RunParams) -> AtmosphereModel {
        if params.atm_error {
            AtmosphereModel::perturbed(self.atmosphere)
        } else {
            AtmosphereModel::nominal()
        }
    }

    /// Launch states. The desired and estimated tracks start on the nominal
    /// pad with the commanded angles; the true track carries the launch
    /// errors and remembers its angular offsets.
    pub fn initial_tracks(&self, params: &RunParams) -> Tracks {
        let nominal = VehicleState::at_launch(params.theta_long, params.theta_lat);

        let mut truth = nominal;
        truth.position += self.position_error;
        truth.velocity += self.velocity_error;
        truth.theta_long += self.theta_long_error;
        truth.theta_lat += self.theta_lat_error;
        truth.theta_long_pert = self.theta_long_error;
        truth.theta_lat_pert = self.theta_lat_error;

        Tracks {
            truth,
            estimated: nominal,
            desired: nominal,
        }
    }
}
