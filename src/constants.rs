/// Physical and numerical constants used by the flight simulation

/// Universal gravitational constant (m³/(kg·s²))
pub const GRAV_CONST: f64 = 6.67408e-11;

/// Mass of the Earth (kg)
pub const EARTH_MASS: f64 = 5.972e24;

/// Mean radius of the spherical Earth model (m)
///
/// Launch sites are placed at this radius and all altitudes are measured
/// from it. No oblateness is modelled.
pub const EARTH_RADIUS: f64 = 6371e3;

/// Equatorial surface speed due to Earth rotation (m/s)
///
/// Scaled by cos(latitude) to get the eastward surface speed used for the
/// post-impact Coriolis displacement.
pub const EARTH_SURFACE_ROTATION_SPEED: f64 = 464.0;

/// Standard gravity used to turn specific impulse into exhaust velocity (m/s²)
pub const G0: f64 = 9.81;

/// Sea-level air density (kg/m³)
pub const SEA_LEVEL_DENSITY: f64 = 1.225;

/// Sea-level temperature (K)
pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15;

/// Sea-level pressure (Pa)
pub const SEA_LEVEL_PRESSURE: f64 = 101325.0;

/// Density scale height of the exponential atmosphere (m)
pub const SCALE_HEIGHT: f64 = 8000.0;

/// Altitude below which the reentry time step is used after burnout (m)
pub const REENTRY_ALTITUDE: f64 = 1e6;

/// Duration of the vertical-rise phase at the start of boost (s)
///
/// Thrust points along the local vertical until this time, then follows the
/// commanded thrust angles.
pub const VERTICAL_RISE_TIME: f64 = 5.0;

/// Proportional navigation gain
pub const NAV_GAIN: f64 = 5.0;

/// Maximum reentry-vehicle angle of attack (rad)
pub const MAX_ANGLE_OF_ATTACK: f64 = 10.0 * std::f64::consts::PI / 180.0;

/// Fixed ceiling on runs per Monte Carlo ensemble
pub const MAX_RUNS: usize = 1000;

/// Default step ceiling for a single flight
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

// Numerical thresholds
/// Relative airspeed below which drag is zero (m/s)
pub const MIN_AIRSPEED: f64 = 1e-2;

/// Drag magnitude above which the gyro keeps drifting while maneuvering (m/s²)
pub const DRAG_NEGLIGIBLE: f64 = 1e-3;

/// Tolerance for matching the flight clock against the burnout time (s)
pub const BURNOUT_TIME_TOLERANCE: f64 = 1e-6;

/// Minimum threshold for preventing division by zero in general calculations
pub const MIN_DIVISION_THRESHOLD: f64 = 1e-12;

/// Tolerance for root finding algorithms
pub const ROOT_FINDING_TOLERANCE: f64 = 1e-6;
