//! Monte Carlo driver and impact statistics.
//!
//! Each run samples a fresh error realization and vehicle, flies it, and
//! contributes its impact record to the ensemble. Runs draw from independent
//! random substreams keyed by run index, so the ensemble is the same whether
//! it is evaluated sequentially or with rayon.

use std::path::PathBuf;

use log::{debug, info, warn};
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::RunParams;
use crate::error::{SimError, SimResult};
use crate::frames::{cartesian_to_spherical, local_frame};
use crate::noise::run_rng;
use crate::output::{
    run_directory, save_impact_csv, save_json, CsvTrajectoryWriter, NullSink, TrajectorySink,
};
use crate::trajectory::{fly, FlightOutcome, FlightResult, ImpactRecord};

/// Statistics for a single output field
#[derive(Debug, Clone, Serialize)]
pub struct FieldStatistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Vec<(f64, f64)>, // (percentile, value) pairs
}

const REPORTED_PERCENTILES: [f64; 5] = [0.05, 0.25, 0.5, 0.75, 0.95];

impl FieldStatistics {
    pub fn from_values(values: &[f64]) -> Self {
        let mut stats = StreamingStats::new();
        for &v in values {
            stats.update(v);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let percentiles = REPORTED_PERCENTILES
            .iter()
            .map(|&p| (p, percentile(&sorted, p)))
            .collect();

        Self {
            mean: stats.mean,
            std: stats.std(),
            min: stats.min,
            max: stats.max,
            percentiles,
        }
    }
}

/// Calculate percentile using linear interpolation
pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let n = sorted_values.len();
    if n == 1 {
        return sorted_values[0];
    }

    let index = p * (n - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = index - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

/// Running mean, variance and range using Welford's online algorithm
#[derive(Debug, Clone)]
pub struct StreamingStats {
    pub n: usize,
    pub mean: f64,
    m2: f64, // Sum of squared differences
    pub min: f64,
    pub max: f64,
}

impl Default for StreamingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingStats {
    pub fn new() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, value: f64) {
        self.n += 1;
        let n = self.n as f64;

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / n;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Sample standard deviation, zero below two samples.
    pub fn std(&self) -> f64 {
        if self.n > 1 {
            (self.m2 / (self.n - 1) as f64).sqrt()
        } else {
            0.0
        }
    }
}

/// Impact dispersion about an aimpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactStatistics {
    pub aimpoint: Vector3<f64>,
    pub impacts: usize,
    /// Circular error probable: median miss distance (m)
    pub cep: f64,
    pub miss: FieldStatistics,
    /// Miss resolved along the local east axis at the aimpoint (m)
    pub east: FieldStatistics,
    /// Miss resolved along the local north axis at the aimpoint (m)
    pub north: FieldStatistics,
    pub flight_time: FieldStatistics,
    pub impact_speed: FieldStatistics,
}

impl ImpactStatistics {
    pub fn compute(impacts: &[ImpactRecord], aimpoint: &Vector3<f64>) -> SimResult<Self> {
        if impacts.is_empty() {
            return Err(SimError::NoImpacts);
        }

        let aim = cartesian_to_spherical(aimpoint);
        let frame = local_frame(aim.long, aim.lat);

        let offsets: Vec<Vector3<f64>> = impacts.iter().map(|i| i.position - aimpoint).collect();
        let miss: Vec<f64> = offsets.iter().map(|d| d.norm()).collect();
        let east: Vec<f64> = offsets.iter().map(|d| d.dot(&frame.east)).collect();
        let north: Vec<f64> = offsets.iter().map(|d| d.dot(&frame.north)).collect();
        let times: Vec<f64> = impacts.iter().map(|i| i.t).collect();
        let speeds: Vec<f64> = impacts.iter().map(|i| i.velocity.norm()).collect();

        let miss = FieldStatistics::from_values(&miss);
        let cep = miss
            .percentiles
            .iter()
            .find(|(p, _)| *p == 0.5)
            .map(|(_, v)| *v)
            .unwrap_or(miss.mean);

        Ok(Self {
            aimpoint: *aimpoint,
            impacts: impacts.len(),
            cep,
            miss,
            east: FieldStatistics::from_values(&east),
            north: FieldStatistics::from_values(&north),
            flight_time: FieldStatistics::from_values(&times),
            impact_speed: FieldStatistics::from_values(&speeds),
        })
    }
}

/// Circular error probable of `impacts` about `aimpoint`.
pub fn cep(impacts: &[ImpactRecord], aimpoint: &Vector3<f64>) -> SimResult<f64> {
    Ok(ImpactStatistics::compute(impacts, aimpoint)?.cep)
}

/// Results from a Monte Carlo ensemble
#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloResults {
    /// Impact records in run order, exhausted runs omitted
    pub impacts: Vec<ImpactRecord>,
    pub total_runs: usize,
    pub exhausted_runs: usize,
}

impl MonteCarloResults {
    pub fn statistics(&self, aimpoint: &Vector3<f64>) -> SimResult<ImpactStatistics> {
        ImpactStatistics::compute(&self.impacts, aimpoint)
    }

    pub fn cep(&self, aimpoint: &Vector3<f64>) -> SimResult<f64> {
        cep(&self.impacts, aimpoint)
    }
}

fn trajectory_path(params: &RunParams, run_index: usize) -> PathBuf {
    run_directory(&params.output_dir, &params.run_name)
        .join(format!("trajectory_{}.csv", run_index))
}

/// Fly run `run_index` of the ensemble described by `params`.
pub fn single_run(params: &RunParams, run_index: usize) -> SimResult<FlightResult> {
    let mut rng = run_rng(params.seed, run_index);
    let mut sink: Box<dyn TrajectorySink> = if params.traj_output {
        Box::new(CsvTrajectoryWriter::create(trajectory_path(params, run_index))?)
    } else {
        Box::new(NullSink)
    };

    let result = fly(params, &mut rng, sink.as_mut())?;
    match &result.outcome {
        FlightOutcome::Impacted(impact) => debug!(
            "run {}: impact at t = {:.2} s after {} steps",
            run_index, impact.t, result.steps
        ),
        FlightOutcome::Exhausted(_) => {
            warn!("run {}: no impact within {} steps", run_index, params.max_steps)
        }
    }
    Ok(result)
}

/// Run the Monte Carlo ensemble.
pub fn mc_run(params: &RunParams) -> SimResult<MonteCarloResults> {
    params.validate()?;
    info!(
        "starting {} runs of '{}' ({})",
        params.num_runs,
        params.run_name,
        if params.parallel { "parallel" } else { "sequential" }
    );

    let flights: Vec<FlightResult> = if params.parallel {
        (0..params.num_runs)
            .into_par_iter()
            .map(|i| single_run(params, i))
            .collect::<SimResult<Vec<_>>>()?
    } else {
        (0..params.num_runs)
            .map(|i| single_run(params, i))
            .collect::<SimResult<Vec<_>>>()?
    };

    let impacts: Vec<ImpactRecord> = flights.iter().filter_map(|f| f.impact().copied()).collect();
    let exhausted_runs = flights.len() - impacts.len();
    if exhausted_runs > 0 {
        warn!("{} of {} runs did not impact", exhausted_runs, flights.len());
    }
    info!("finished {} runs, {} impacts", flights.len(), impacts.len());

    Ok(MonteCarloResults {
        impacts,
        total_runs: flights.len(),
        exhausted_runs,
    })
}

/// Write `impact_data.csv` and `summary.json` into the run directory and
/// return the directory.
pub fn save_results(params: &RunParams, results: &MonteCarloResults) -> SimResult<PathBuf> {
    let dir = run_directory(&params.output_dir, &params.run_name);
    save_impact_csv(dir.join("impact_data.csv"), &results.impacts)?;

    #[derive(Serialize)]
    struct Summary<'a> {
        params: &'a RunParams,
        total_runs: usize,
        exhausted_runs: usize,
        statistics: Option<ImpactStatistics>,
    }

    let summary = Summary {
        params,
        total_runs: results.total_runs,
        exhausted_runs: results.exhausted_runs,
        statistics: results.statistics(&params.aimpoint()).ok(),
    };
    save_json(dir.join("summary.json"), &summary)?;
    info!("results written to {}", dir.display());
    Ok(dir)
}
