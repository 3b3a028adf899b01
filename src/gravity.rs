use nalgebra::Vector3;

use crate::constants::{EARTH_MASS, EARTH_RADIUS, GRAV_CONST};
use crate::noise::NoiseSource;

/// Standard deviation of the sampled geoid-height error (m)
pub const GEOID_HEIGHT_STD: f64 = 10.0;

/// Point-mass gravity model.
#[derive(Debug, Clone)]
pub struct GravityModel {
    pub grav_const: f64,
    pub earth_mass: f64,
    pub earth_radius: f64,
    pub perturbed: bool,
    /// Sampled once per run when perturbed; not yet applied to the field.
    pub geoid_height_error: f64,
}

impl Default for GravityModel {
    fn default() -> Self {
        Self {
            grav_const: GRAV_CONST,
            earth_mass: EARTH_MASS,
            earth_radius: EARTH_RADIUS,
            perturbed: false,
            geoid_height_error: 0.0,
        }
    }
}

impl GravityModel {
    /// Unperturbed inverse-square model.
    pub fn nominal() -> Self {
        Self::default()
    }

    /// Perturbed model with a freshly sampled geoid-height error.
    pub fn perturbed<N: NoiseSource + ?Sized>(noise: &mut N) -> Self {
        Self {
            perturbed: true,
            geoid_height_error: GEOID_HEIGHT_STD * noise.gaussian(),
            ..Self::default()
        }
    }

    /// Gravitational acceleration at `position`, directed at the Earth's centre.
    ///
    /// Undefined at the origin.
    pub fn acceleration(&self, position: &Vector3<f64>) -> Vector3<f64> {
        let r = position.norm();
        let magnitude = self.grav_const * self.earth_mass / (r * r);
        // Perturbed mode samples a geoid undulation but does not correct the
        // field yet, so both modes share the point-mass result.
        -position / r * magnitude
    }
}
