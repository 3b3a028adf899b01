use thiserror::Error;

/// Errors raised while configuring or running a simulation.
///
/// Configuration problems are fatal. Numerical edge cases inside the force
/// models never surface here; they resolve to zero contributions.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown reentry vehicle type code {0} (expected 0 = ballistic, 1 = maneuverable)")]
    InvalidRvType(u8),

    #[error("unknown RV maneuver code {0} (expected 0-3)")]
    InvalidManeuverMode(u8),

    #[error("requested {requested} Monte Carlo runs, the ceiling is {max}")]
    TooManyRuns { requested: usize, max: usize },

    #[error("no run reached the ground, impact statistics are undefined")]
    NoImpacts,

    #[error("reference flight did not impact within {0} steps")]
    NoImpact(usize),

    #[error("target range {target:.0} m is outside the reachable span {min:.0}-{max:.0} m")]
    RangeNotBracketed { target: f64, min: f64, max: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<String> for SimError {
    fn from(msg: String) -> Self {
        SimError::Config(msg)
    }
}

impl From<&str> for SimError {
    fn from(msg: &str) -> Self {
        SimError::Config(msg.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
