//! Error-budget sensitivity sweep.
//!
//! Each error source is isolated in turn: every other source is switched off
//! and the isolated one is scaled by a range of factors about its configured
//! value. A final "total" series scales every source together with the
//! environment flags left as configured.

use std::io::Write;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::config::RunParams;
use crate::error::SimResult;
use crate::monte_carlo::mc_run;

/// One scalable error source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSource {
    InitialPosition,
    InitialVelocity,
    InitialAngle,
    AccScale,
    GyroBias,
    GyroNoise,
    GnssNoise,
    Total,
}

impl ErrorSource {
    pub fn label(self) -> &'static str {
        match self {
            ErrorSource::InitialPosition => "initial_pos_error",
            ErrorSource::InitialVelocity => "initial_vel_error",
            ErrorSource::InitialAngle => "initial_angle_error",
            ErrorSource::AccScale => "acc_scale_stability",
            ErrorSource::GyroBias => "gyro_bias_stability",
            ErrorSource::GyroNoise => "gyro_noise",
            ErrorSource::GnssNoise => "gnss_noise",
            ErrorSource::Total => "total",
        }
    }

    /// Sources swept for `params`, in output order. GNSS noise only matters
    /// with GNSS navigation enabled.
    pub fn sweep_order(params: &RunParams) -> Vec<ErrorSource> {
        let mut sources = vec![
            ErrorSource::InitialPosition,
            ErrorSource::InitialVelocity,
            ErrorSource::InitialAngle,
            ErrorSource::AccScale,
            ErrorSource::GyroBias,
            ErrorSource::GyroNoise,
        ];
        if params.gnss_nav {
            sources.push(ErrorSource::GnssNoise);
        }
        sources.push(ErrorSource::Total);
        sources
    }

    /// Parameters with this source scaled by `factor` and, unless this is
    /// the total, every other source off.
    pub fn scaled(self, base: &RunParams, factor: f64) -> RunParams {
        let mut p = match self {
            ErrorSource::Total => base.clone(),
            _ => base.error_free(),
        };
        match self {
            ErrorSource::InitialPosition => p.initial_pos_error = base.initial_pos_error * factor,
            ErrorSource::InitialVelocity => p.initial_vel_error = base.initial_vel_error * factor,
            ErrorSource::InitialAngle => p.initial_angle_error = base.initial_angle_error * factor,
            ErrorSource::AccScale => p.acc_scale_stability = base.acc_scale_stability * factor,
            ErrorSource::GyroBias => p.gyro_bias_stability = base.gyro_bias_stability * factor,
            ErrorSource::GyroNoise => p.gyro_noise = base.gyro_noise * factor,
            ErrorSource::GnssNoise => p.gnss_noise = base.gnss_noise * factor,
            ErrorSource::Total => {
                p.initial_x_error *= factor;
                p.initial_pos_error *= factor;
                p.initial_vel_error *= factor;
                p.initial_angle_error *= factor;
                p.acc_scale_stability *= factor;
                p.gyro_bias_stability *= factor;
                p.gyro_noise *= factor;
                p.gnss_noise *= factor;
            }
        }
        p.traj_output = false;
        p
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SensitivityRow {
    pub parameter: ErrorSource,
    pub factor: f64,
    pub cep: f64,
}

/// `count` factors spaced logarithmically from 0.1 to 10.
pub fn log_factors(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..count)
            .map(|i| 10f64.powf(-1.0 + 2.0 * i as f64 / (count - 1) as f64))
            .collect(),
    }
}

pub fn default_factors() -> Vec<f64> {
    log_factors(7)
}

/// Run one ensemble per (source, factor) pair and record its CEP about the
/// configured aimpoint.
pub fn run_sensitivity(params: &RunParams, factors: &[f64]) -> SimResult<Vec<SensitivityRow>> {
    params.validate()?;
    let aim = params.aimpoint();
    let mut rows = Vec::new();

    for source in ErrorSource::sweep_order(params) {
        for &factor in factors {
            let scaled = source.scaled(params, factor);
            let cep = mc_run(&scaled)?.cep(&aim)?;
            info!("{} x{:.3}: CEP {:.3} m", source.label(), factor, cep);
            rows.push(SensitivityRow {
                parameter: source,
                factor,
                cep,
            });
        }
    }
    Ok(rows)
}

#[derive(Serialize)]
struct CsvRow {
    parameter: &'static str,
    factor: f64,
    cep: f64,
}

pub fn write_sensitivity_csv<W: Write>(out: W, rows: &[SensitivityRow]) -> SimResult<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for row in rows {
        wtr.serialize(CsvRow {
            parameter: row.parameter.label(),
            factor: row.factor,
            cep: row.cep,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_sensitivity_csv<P: AsRef<Path>>(path: P, rows: &[SensitivityRow]) -> SimResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_sensitivity_csv(std::fs::File::create(path)?, rows)
}
