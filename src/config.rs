//! Run configuration.
//!
//! [`RunParams`] is read from JSON, validated once and then treated as
//! immutable for the duration of a Monte Carlo ensemble. Defaults reproduce
//! the reference test case: an error-free Minuteman III flight down the
//! equator with a maneuverable RV and inertial navigation.

use std::fs;
use std::path::Path;

use log::info;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_STEPS, EARTH_RADIUS, MAX_RUNS};
use crate::error::{SimError, SimResult};

/// Reentry vehicle selection. Encoded as `0` / `1` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RvType {
    Ballistic,
    Maneuverable,
}

impl TryFrom<u8> for RvType {
    type Error = SimError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(RvType::Ballistic),
            1 => Ok(RvType::Maneuverable),
            other => Err(SimError::InvalidRvType(other)),
        }
    }
}

impl From<RvType> for u8 {
    fn from(rv: RvType) -> u8 {
        match rv {
            RvType::Ballistic => 0,
            RvType::Maneuverable => 1,
        }
    }
}

/// How the RV responds to guidance during reentry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ManeuverMode {
    /// `0`: no reentry guidance
    Ballistic,
    /// `1`: lift follows the command through a first-order lag
    LiftLag,
    /// `2`: ideal terminal correction removes the estimated miss
    Perfect,
    /// `3`: lift equals the command with no lag
    Instantaneous,
}

impl ManeuverMode {
    /// Modes that steer the RV with aerodynamic lift.
    pub fn uses_lift(self) -> bool {
        matches!(self, ManeuverMode::LiftLag | ManeuverMode::Instantaneous)
    }
}

impl TryFrom<u8> for ManeuverMode {
    type Error = SimError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ManeuverMode::Ballistic),
            1 => Ok(ManeuverMode::LiftLag),
            2 => Ok(ManeuverMode::Perfect),
            3 => Ok(ManeuverMode::Instantaneous),
            other => Err(SimError::InvalidManeuverMode(other)),
        }
    }
}

impl From<ManeuverMode> for u8 {
    fn from(mode: ManeuverMode) -> u8 {
        match mode {
            ManeuverMode::Ballistic => 0,
            ManeuverMode::LiftLag => 1,
            ManeuverMode::Perfect => 2,
            ManeuverMode::Instantaneous => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    pub run_name: String,
    pub num_runs: usize,
    /// Ensemble seed; run `i` draws from a substream derived from it
    pub seed: u64,
    /// Step size during boost, coast above the reentry altitude (s)
    pub time_step_main: f64,
    /// Step size after burnout below the reentry altitude (s)
    pub time_step_reentry: f64,
    /// Write a per-step trajectory file for every run
    pub traj_output: bool,
    /// Evaluate runs on the rayon thread pool
    pub parallel: bool,
    pub max_steps: usize,
    pub output_dir: String,

    // Aimpoint (Earth-centred Cartesian, m)
    pub x_aim: f64,
    pub y_aim: f64,
    pub z_aim: f64,

    // Commanded thrust angles (rad)
    pub theta_long: f64,
    pub theta_lat: f64,

    // Error model switches
    pub grav_error: bool,
    pub atm_error: bool,
    pub gnss_nav: bool,
    pub ins_nav: bool,
    /// Apply the burnout correction from the navigation estimate
    pub boost_guidance: bool,
    pub rv_maneuv: ManeuverMode,
    pub rv_type: RvType,

    // Error magnitudes (1σ)
    /// Extra launch-site error along x (m)
    pub initial_x_error: f64,
    /// Launch position error per axis (m)
    pub initial_pos_error: f64,
    /// Launch velocity error per axis (m/s)
    pub initial_vel_error: f64,
    /// Thrust-angle error per angle (rad)
    pub initial_angle_error: f64,
    /// Accelerometer scale-factor error (fractional)
    pub acc_scale_stability: f64,
    /// Gyro bias (rad/s)
    pub gyro_bias_stability: f64,
    /// Gyro random walk (rad/s per step draw)
    pub gyro_noise: f64,
    /// GNSS position noise per axis (m)
    pub gnss_noise: f64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            run_name: "test".to_string(),
            num_runs: 2,
            seed: 0,
            time_step_main: 1.0,
            time_step_reentry: 0.01,
            traj_output: false,
            parallel: false,
            max_steps: DEFAULT_MAX_STEPS,
            output_dir: "./output".to_string(),
            x_aim: EARTH_RADIUS,
            y_aim: 0.0,
            z_aim: 0.0,
            theta_long: std::f64::consts::FRAC_PI_4,
            theta_lat: 0.0,
            grav_error: false,
            atm_error: false,
            gnss_nav: false,
            ins_nav: true,
            boost_guidance: true,
            rv_maneuv: ManeuverMode::LiftLag,
            rv_type: RvType::Maneuverable,
            initial_x_error: 0.0,
            initial_pos_error: 0.0,
            initial_vel_error: 0.0,
            initial_angle_error: 0.0,
            acc_scale_stability: 0.0,
            gyro_bias_stability: 0.0,
            gyro_noise: 0.0,
            gnss_noise: 0.0,
        }
    }
}

impl RunParams {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let params: RunParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> SimResult<()> {
        fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.num_runs > MAX_RUNS {
            return Err(SimError::TooManyRuns {
                requested: self.num_runs,
                max: MAX_RUNS,
            });
        }
        if self.num_runs == 0 {
            return Err("num_runs must be at least 1".into());
        }
        if self.time_step_main <= 0.0 || !self.time_step_main.is_finite() {
            return Err(format!("time_step_main must be > 0, got {}", self.time_step_main).into());
        }
        if self.time_step_reentry <= 0.0 || !self.time_step_reentry.is_finite() {
            return Err(
                format!("time_step_reentry must be > 0, got {}", self.time_step_reentry).into(),
            );
        }
        if self.max_steps == 0 {
            return Err("max_steps must be at least 1".into());
        }
        let sigmas = [
            ("initial_x_error", self.initial_x_error),
            ("initial_pos_error", self.initial_pos_error),
            ("initial_vel_error", self.initial_vel_error),
            ("initial_angle_error", self.initial_angle_error),
            ("acc_scale_stability", self.acc_scale_stability),
            ("gyro_bias_stability", self.gyro_bias_stability),
            ("gyro_noise", self.gyro_noise),
            ("gnss_noise", self.gnss_noise),
        ];
        for (name, value) in sigmas {
            if value < 0.0 || !value.is_finite() {
                return Err(
                    format!("{} must be a finite non-negative value, got {}", name, value).into(),
                );
            }
        }
        Ok(())
    }

    pub fn aimpoint(&self) -> Vector3<f64> {
        Vector3::new(self.x_aim, self.y_aim, self.z_aim)
    }

    pub fn set_aimpoint(&mut self, aim: &Vector3<f64>) {
        self.x_aim = aim.x;
        self.y_aim = aim.y;
        self.z_aim = aim.z;
    }

    /// Copy of these parameters with every random error source switched off.
    pub fn error_free(&self) -> Self {
        Self {
            grav_error: false,
            atm_error: false,
            initial_x_error: 0.0,
            initial_pos_error: 0.0,
            initial_vel_error: 0.0,
            initial_angle_error: 0.0,
            acc_scale_stability: 0.0,
            gyro_bias_stability: 0.0,
            gyro_noise: 0.0,
            gnss_noise: 0.0,
            traj_output: false,
            ..self.clone()
        }
    }

    /// Log the active configuration.
    pub fn log_summary(&self) {
        info!("run '{}': {} runs, seed {}", self.run_name, self.num_runs, self.seed);
        info!(
            "time steps: main {} s, reentry {} s, max {} steps",
            self.time_step_main, self.time_step_reentry, self.max_steps
        );
        info!(
            "aimpoint ({:.3}, {:.3}, {:.3}) m, thrust angles ({:.6}, {:.6}) rad",
            self.x_aim, self.y_aim, self.z_aim, self.theta_long, self.theta_lat
        );
        info!(
            "grav_error={} atm_error={} gnss_nav={} ins_nav={} boost_guidance={}",
            self.grav_error,
            self.atm_error,
            self.gnss_nav,
            self.ins_nav,
            self.boost_guidance
        );
        info!("rv_maneuv={:?} rv_type={:?}", self.rv_maneuv, self.rv_type);
        info!(
            "launch errors: x {} m, pos {} m, vel {} m/s, angle {} rad",
            self.initial_x_error,
            self.initial_pos_error,
            self.initial_vel_error,
            self.initial_angle_error
        );
        info!(
            "sensor errors: acc scale {}, gyro bias {} rad/s, gyro noise {}, gnss {} m",
            self.acc_scale_stability,
            self.gyro_bias_stability,
            self.gyro_noise,
            self.gnss_noise
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_case() {
        let p = RunParams::default();
        assert_eq!(p.num_runs, 2);
        assert_eq!(p.time_step_main, 1.0);
        assert_eq!(p.time_step_reentry, 0.01);
        assert!(!p.traj_output);
        assert_eq!(p.x_aim, 6371e3);
        assert!((p.theta_long - 0.785398163397).abs() < 1e-12);
        assert!(p.ins_nav && !p.gnss_nav && !p.atm_error && !p.grav_error);
        assert_eq!(p.rv_maneuv, ManeuverMode::LiftLag);
        assert_eq!(p.rv_type, RvType::Maneuverable);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"num_runs": 10, "atm_error": true, "rv_maneuv": 2, "rv_type": 0}"#;
        let p = RunParams::from_json_str(json).unwrap();
        assert_eq!(p.num_runs, 10);
        assert!(p.atm_error);
        assert_eq!(p.rv_maneuv, ManeuverMode::Perfect);
        assert_eq!(p.rv_type, RvType::Ballistic);
        assert_eq!(p.time_step_reentry, 0.01);
    }

    #[test]
    fn test_invalid_rv_type_rejected() {
        let err = RunParams::from_json_str(r#"{"rv_type": 7}"#).unwrap_err();
        assert!(err.to_string().contains("type code 7"));
        assert!(RvType::try_from(2).is_err());
        assert!(ManeuverMode::try_from(4).is_err());
    }

    #[test]
    fn test_run_ceiling() {
        let p = RunParams {
            num_runs: 1001,
            ..RunParams::default()
        };
        match p.validate() {
            Err(SimError::TooManyRuns { requested, max }) => {
                assert_eq!(requested, 1001);
                assert_eq!(max, 1000);
            }
            other => panic!("expected TooManyRuns, got {:?}", other),
        }
        let at_limit = RunParams {
            num_runs: 1000,
            ..RunParams::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_bad_time_step_rejected() {
        let p = RunParams {
            time_step_reentry: 0.0,
            ..RunParams::default()
        };
        assert!(matches!(p.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn test_negative_sigma_rejected() {
        let p = RunParams {
            gnss_noise: -1.0,
            ..RunParams::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_error_free_copy() {
        let p = RunParams {
            atm_error: true,
            initial_pos_error: 10.0,
            gyro_noise: 1e-6,
            theta_long: 0.5,
            ..RunParams::default()
        };
        let clean = p.error_free();
        assert!(!clean.atm_error);
        assert_eq!(clean.initial_pos_error, 0.0);
        assert_eq!(clean.gyro_noise, 0.0);
        assert_eq!(clean.theta_long, 0.5);
    }

    #[test]
    fn test_json_round_trip_keeps_codes() {
        let p = RunParams::default();
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"rv_maneuv\":1"));
        assert!(json.contains("\"rv_type\":1"));
        assert_eq!(RunParams::from_json_str(&json).unwrap(), p);
    }
}
