//! Exponential atmosphere with an optional frozen perturbation realization.
//!
//! The perturbed model draws one Gaussian offset per altitude band for density
//! and each wind component when it is built, and holds them fixed for the whole
//! flight. Winds in the perturbed model are the band offsets themselves; the
//! nominal atmosphere is calm.

use crate::constants::{SCALE_HEIGHT, SEA_LEVEL_DENSITY, SEA_LEVEL_PRESSURE, SEA_LEVEL_TEMPERATURE};
use crate::noise::NoiseSource;

/// Altitude band with its perturbation standard deviations.
#[derive(Debug, Clone, Copy)]
struct PerturbationBand {
    /// Base altitude of this band (m)
    base_altitude: f64,
    /// Fractional density deviation (1σ)
    density_std: f64,
    /// Horizontal wind deviation, applied to meridional and zonal (m/s, 1σ)
    horizontal_wind_std: f64,
    /// Vertical wind deviation (m/s, 1σ)
    vertical_wind_std: f64,
}

pub const NUM_BANDS: usize = 4;

const PERTURBATION_BANDS: [PerturbationBand; NUM_BANDS] = [
    // Lower atmosphere (0 - 50 km)
    PerturbationBand {
        base_altitude: 0.0,
        density_std: 0.05,
        horizontal_wind_std: 10.0,
        vertical_wind_std: 1.0,
    },
    // Mesosphere (50 - 100 km)
    PerturbationBand {
        base_altitude: 50e3,
        density_std: 0.10,
        horizontal_wind_std: 20.0,
        vertical_wind_std: 2.0,
    },
    // Lower thermosphere (100 - 250 km)
    PerturbationBand {
        base_altitude: 100e3,
        density_std: 0.20,
        horizontal_wind_std: 40.0,
        vertical_wind_std: 5.0,
    },
    // Upper thermosphere (250 km and above)
    PerturbationBand {
        base_altitude: 250e3,
        density_std: 0.30,
        horizontal_wind_std: 60.0,
        vertical_wind_std: 10.0,
    },
];

/// Index of the band containing `altitude_m` (clamped at the surface).
pub fn band_index(altitude_m: f64) -> usize {
    let altitude = altitude_m.max(0.0);
    PERTURBATION_BANDS
        .iter()
        .rposition(|band| altitude >= band.base_altitude)
        .unwrap_or(0)
}

/// Atmospheric conditions at one altitude.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AtmCondition {
    pub altitude: f64,
    /// K
    pub temperature: f64,
    /// Pa
    pub pressure: f64,
    /// kg/m³
    pub density: f64,
    /// Northward wind (m/s)
    pub meridional_wind: f64,
    /// Eastward wind (m/s)
    pub zonal_wind: f64,
    /// Upward wind (m/s)
    pub vertical_wind: f64,
}

/// Per-band offsets sampled once per run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AtmPerturbation {
    pub density: [f64; NUM_BANDS],
    pub meridional_wind: [f64; NUM_BANDS],
    pub zonal_wind: [f64; NUM_BANDS],
    pub vertical_wind: [f64; NUM_BANDS],
}

impl AtmPerturbation {
    /// Draw one realization. Draw order is band by band: density, meridional,
    /// zonal, vertical.
    pub fn sample<N: NoiseSource + ?Sized>(noise: &mut N) -> Self {
        let mut p = Self::default();
        for (i, band) in PERTURBATION_BANDS.iter().enumerate() {
            p.density[i] = band.density_std * noise.gaussian();
            p.meridional_wind[i] = band.horizontal_wind_std * noise.gaussian();
            p.zonal_wind[i] = band.horizontal_wind_std * noise.gaussian();
            p.vertical_wind[i] = band.vertical_wind_std * noise.gaussian();
        }
        p
    }
}

#[derive(Debug, Clone)]
pub struct AtmosphereModel {
    pub sea_level_density: f64,
    pub scale_height: f64,
    /// `None` for the nominal atmosphere.
    pub perturbation: Option<AtmPerturbation>,
}

impl Default for AtmosphereModel {
    fn default() -> Self {
        Self {
            sea_level_density: SEA_LEVEL_DENSITY,
            scale_height: SCALE_HEIGHT,
            perturbation: None,
        }
    }
}

impl AtmosphereModel {
    pub fn nominal() -> Self {
        Self::default()
    }

    pub fn perturbed(perturbation: AtmPerturbation) -> Self {
        Self {
            perturbation: Some(perturbation),
            ..Self::default()
        }
    }

    pub fn is_perturbed(&self) -> bool {
        self.perturbation.is_some()
    }

    /// Undisturbed exponential density (kg/m³).
    pub fn base_density(&self, altitude_m: f64) -> f64 {
        self.sea_level_density * (-altitude_m.max(0.0) / self.scale_height).exp()
    }

    pub fn conditions(&self, altitude_m: f64) -> AtmCondition {
        let altitude = altitude_m.max(0.0);
        let decay = (-altitude / self.scale_height).exp();
        let density = self.sea_level_density * decay;
        let temperature = SEA_LEVEL_TEMPERATURE * decay;
        let pressure = SEA_LEVEL_PRESSURE * decay;

        match &self.perturbation {
            None => AtmCondition {
                altitude,
                temperature,
                pressure,
                density,
                ..AtmCondition::default()
            },
            Some(p) => {
                let band = band_index(altitude);
                AtmCondition {
                    altitude,
                    temperature,
                    pressure,
                    // A large negative draw must not flip the sign of density
                    density: (density * (1.0 + p.density[band])).max(0.0),
                    meridional_wind: p.meridional_wind[band],
                    zonal_wind: p.zonal_wind[band],
                    vertical_wind: p.vertical_wind[band],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{SequenceNoise, ZeroNoise};

    #[test]
    fn test_sea_level_density() {
        let atm = AtmosphereModel::nominal();
        let c = atm.conditions(0.0);
        assert!((c.density - 1.225).abs() < 1e-12);
        assert_eq!(c.temperature, 288.15);
        assert_eq!(c.pressure, 101325.0);
        assert_eq!(c.meridional_wind, 0.0);
        assert_eq!(c.zonal_wind, 0.0);
        assert_eq!(c.vertical_wind, 0.0);
    }

    #[test]
    fn test_scale_height_decay() {
        let atm = AtmosphereModel::nominal();
        let ratio = atm.conditions(8000.0).density / atm.conditions(0.0).density;
        assert!((ratio - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_negative_altitude_clamped() {
        let atm = AtmosphereModel::nominal();
        let below = atm.conditions(-500.0);
        assert_eq!(below.altitude, 0.0);
        assert!((below.density - 1.225).abs() < 1e-12);
    }

    #[test]
    fn test_band_lookup() {
        assert_eq!(band_index(-10.0), 0);
        assert_eq!(band_index(49_999.0), 0);
        assert_eq!(band_index(50_000.0), 1);
        assert_eq!(band_index(150_000.0), 2);
        assert_eq!(band_index(1.0e6), 3);
    }

    #[test]
    fn test_zero_perturbation_matches_nominal() {
        let atm = AtmosphereModel::perturbed(AtmPerturbation::sample(&mut ZeroNoise));
        let nominal = AtmosphereModel::nominal();
        for h in [0.0, 30e3, 75e3, 400e3] {
            assert_eq!(atm.conditions(h), nominal.conditions(h));
        }
    }

    #[test]
    fn test_perturbation_frozen_per_band() {
        let mut noise = SequenceNoise::new(vec![1.0]);
        let atm = AtmosphereModel::perturbed(AtmPerturbation::sample(&mut noise));

        // Same band: winds identical, density follows the exponential
        let a = atm.conditions(10e3);
        let b = atm.conditions(40e3);
        assert_eq!(a.zonal_wind, b.zonal_wind);
        assert!((a.zonal_wind - 10.0).abs() < 1e-12);
        assert!((a.density - 1.05 * atm.base_density(10e3)).abs() < 1e-12);

        // Next band picks up its own deviation
        let c = atm.conditions(60e3);
        assert!((c.meridional_wind - 20.0).abs() < 1e-12);
        assert!((c.vertical_wind - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_density_never_negative() {
        let mut noise = SequenceNoise::new(vec![-50.0]);
        let atm = AtmosphereModel::perturbed(AtmPerturbation::sample(&mut noise));
        assert_eq!(atm.conditions(1000.0).density, 0.0);
    }
}
