//! # Ballistic MC
//!
//! Monte Carlo simulator of ballistic-missile flight: powered boost, coast and
//! (optionally maneuvering) reentry, integrated with fixed-step RK4 alongside
//! a navigation estimate and an error-free reference track. Launch, sensor,
//! atmosphere and gravity errors are sampled per run and the impacts are
//! reduced to dispersion statistics such as the CEP.

// Re-export the main types and functions
pub use aimpoint::{impact_point_for_angle, solve_thrust_angle, update_aimpoint};
pub use config::{ManeuverMode, RunParams, RvType};
pub use error::{SimError, SimResult};
pub use monte_carlo::{cep, mc_run, save_results, ImpactStatistics, MonteCarloResults};
pub use noise::{run_rng, NoiseSource, SequenceNoise, ZeroNoise};
pub use output::{CsvTrajectoryWriter, MemorySink, NullSink, TrajectoryRow, TrajectorySink};
pub use realization::ErrorRealization;
pub use sensitivity::{run_sensitivity, ErrorSource, SensitivityRow};
pub use state::{AccelBreakdown, Tracks, VehicleState};
pub use trajectory::{fly, Flight, FlightOutcome, FlightPhase, FlightResult, ImpactRecord};
pub use vehicle::{Booster, ReentryVehicle, Vehicle};

// Module declarations
pub mod aimpoint;
pub mod atmosphere;
pub mod config;
pub mod constants;
pub mod drag;
pub mod error;
pub mod frames;
pub mod gravity;
pub mod guidance;
pub mod maneuver;
pub mod monte_carlo;
pub mod noise;
pub mod output;
pub mod realization;
pub mod sensitivity;
pub mod sensors;
pub mod state;
pub mod thrust;
pub mod trajectory;
pub mod vehicle;
