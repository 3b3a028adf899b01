//! Booster and reentry-vehicle parameters.
//!
//! A [`Vehicle`] pairs an immutable multi-stage booster with an immutable
//! reentry vehicle and tracks the only mutable quantity, the current mass.
//! It is rebuilt for every run.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::RvType;
use crate::constants::G0;

pub const MAX_STAGES: usize = 3;

/// Multi-stage solid booster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booster {
    pub name: String,
    pub num_stages: usize,
    /// Maximum diameter (m)
    pub max_diameter: f64,
    /// Reference area (m²)
    pub area: f64,
    /// Zero-lift drag coefficient
    pub c_d_0: f64,
    pub wet_mass: [f64; MAX_STAGES],
    pub fuel_mass: [f64; MAX_STAGES],
    pub dry_mass: [f64; MAX_STAGES],
    /// Specific impulse times standard gravity, i.e. exhaust velocity (m/s)
    pub isp0: [f64; MAX_STAGES],
    /// Stage burn time (s)
    pub burn_time: [f64; MAX_STAGES],
    /// Fuel burn rate (kg/s)
    pub burn_rate: [f64; MAX_STAGES],
    pub total_burn_time: f64,
    pub total_mass: f64,
}

impl Booster {
    #[allow(clippy::too_many_arguments)]
    fn from_stages(
        name: &str,
        num_stages: usize,
        max_diameter: f64,
        area: f64,
        c_d_0: f64,
        wet_mass: [f64; MAX_STAGES],
        fuel_mass: [f64; MAX_STAGES],
        isp_s: [f64; MAX_STAGES],
        burn_time: [f64; MAX_STAGES],
    ) -> Self {
        let mut dry_mass = [0.0; MAX_STAGES];
        let mut isp0 = [0.0; MAX_STAGES];
        let mut burn_rate = [0.0; MAX_STAGES];
        for i in 0..num_stages {
            dry_mass[i] = wet_mass[i] - fuel_mass[i];
            isp0[i] = isp_s[i] * G0;
            burn_rate[i] = if burn_time[i] > 0.0 {
                fuel_mass[i] / burn_time[i]
            } else {
                0.0
            };
        }

        Self {
            name: name.to_string(),
            num_stages,
            max_diameter,
            area,
            c_d_0,
            wet_mass,
            fuel_mass,
            dry_mass,
            isp0,
            burn_time,
            burn_rate,
            total_burn_time: burn_time[..num_stages].iter().sum(),
            total_mass: wet_mass[..num_stages].iter().sum(),
        }
    }

    /// Three-stage Minuteman III class booster.
    pub fn minuteman_iii() -> Self {
        Self::from_stages(
            "Minuteman III",
            3,
            1.7,
            2.2698,
            0.5,
            [23230.0, 7270.0, 3710.0],
            [20780.0, 6240.0, 3306.0],
            [267.0, 287.0, 285.0],
            [61.0, 66.0, 61.0],
        )
    }

    /// Massless, thrustless booster for unpowered test drops.
    pub fn mock() -> Self {
        Self::from_stages(
            "mock",
            1,
            1.0,
            1.0,
            0.5,
            [0.0; MAX_STAGES],
            [0.0; MAX_STAGES],
            [0.0; MAX_STAGES],
            [0.0; MAX_STAGES],
        )
    }

    /// Index of the stage burning at time `t`, `None` at or after burnout.
    pub fn active_stage(&self, t: f64) -> Option<usize> {
        if t < 0.0 {
            return None;
        }
        let mut stage_end = 0.0;
        for i in 0..self.num_stages {
            stage_end += self.burn_time[i];
            if t < stage_end {
                return Some(i);
            }
        }
        None
    }
}

/// Reentry vehicle aerodynamic and inertial data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReentryVehicle {
    pub name: String,
    pub maneuverable: bool,
    /// kg
    pub mass: f64,
    /// m
    pub length: f64,
    /// m
    pub radius: f64,
    /// Reference area (m²)
    pub area: f64,
    pub c_d_0: f64,
    pub c_d_alpha: f64,
    pub c_m_alpha: f64,
    pub c_m_q: f64,
    pub c_l_alpha: f64,
    /// Control flap area (m²), zero without flaps
    pub flap_area: f64,
    /// Flap location from the nose (m)
    pub x_flap: f64,
    /// Centre of mass location (m)
    pub x_com: f64,
    /// Pitch moment of inertia (kg·m²)
    pub iyy: f64,
}

impl ReentryVehicle {
    /// Unguided conical reentry vehicle.
    pub fn ballistic() -> Self {
        let radius = 0.23;
        Self {
            name: "ballistic RV".to_string(),
            maneuverable: false,
            mass: 400.0,
            length: 1.5,
            radius,
            area: PI * radius * radius,
            c_d_0: 0.1,
            c_d_alpha: 0.4,
            c_m_alpha: -0.1,
            c_m_q: -0.1,
            c_l_alpha: 1.5,
            flap_area: 0.0,
            x_flap: 0.0,
            x_com: 0.75,
            iyy: 290.0,
        }
    }

    /// Flap-controlled maneuvering reentry vehicle.
    pub fn swerve() -> Self {
        let radius = 0.23;
        let length = 2.75;
        Self {
            name: "swerve RV".to_string(),
            maneuverable: true,
            mass: 450.0,
            length,
            radius,
            area: PI * radius * radius,
            c_d_0: 0.1,
            c_d_alpha: 0.487,
            c_m_alpha: -0.15,
            c_m_q: -0.2,
            c_l_alpha: 1.72,
            flap_area: 0.04,
            x_flap: -2.65,
            x_com: -0.6 * length,
            iyy: 290.0,
        }
    }

    /// Small low-drag body for unpowered test drops.
    pub fn mock() -> Self {
        Self {
            name: "mock RV".to_string(),
            mass: 1000.0,
            area: 0.01,
            ..Self::ballistic()
        }
    }
}

/// Reference area and zero-lift drag coefficient in effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroProfile {
    pub area: f64,
    pub c_d_0: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub booster: Booster,
    pub rv: ReentryVehicle,
    pub current_mass: f64,
}

impl Vehicle {
    pub fn new(booster: Booster, rv: ReentryVehicle) -> Self {
        let current_mass = booster.total_mass + rv.mass;
        Self {
            booster,
            rv,
            current_mass,
        }
    }

    /// Minuteman III booster carrying the RV selected by `rv_type`.
    pub fn from_rv_type(rv_type: RvType) -> Self {
        let rv = match rv_type {
            RvType::Ballistic => ReentryVehicle::ballistic(),
            RvType::Maneuverable => ReentryVehicle::swerve(),
        };
        Self::new(Booster::minuteman_iii(), rv)
    }

    pub fn mock() -> Self {
        Self::new(Booster::mock(), ReentryVehicle::mock())
    }

    pub fn total_burn_time(&self) -> f64 {
        self.booster.total_burn_time
    }

    /// Mass at elapsed time `t`: full stack minus fuel burned, with spent
    /// stages dropped, and the bare RV from total burnout onwards.
    pub fn mass_at(&self, t: f64) -> f64 {
        let b = &self.booster;
        let stack = b.total_mass + self.rv.mass;
        let Some(stage) = b.active_stage(t.max(0.0)) else {
            return self.rv.mass;
        };

        let dropped: f64 = b.wet_mass[..stage].iter().sum();
        let stage_start: f64 = b.burn_time[..stage].iter().sum();
        stack - dropped - (t.max(0.0) - stage_start) * b.burn_rate[stage]
    }

    pub fn update_mass(&mut self, t: f64) {
        self.current_mass = self.mass_at(t);
    }

    /// Booster aerodynamics before total burnout, RV aerodynamics after.
    pub fn aero_profile(&self, t: f64) -> AeroProfile {
        if t < self.booster.total_burn_time {
            AeroProfile {
                area: self.booster.area,
                c_d_0: self.booster.c_d_0,
            }
        } else {
            AeroProfile {
                area: self.rv.area,
                c_d_0: self.rv.c_d_0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minuteman_totals() {
        let b = Booster::minuteman_iii();
        assert_eq!(b.total_burn_time, 188.0);
        assert_eq!(b.total_mass, 34210.0);
        assert!((b.dry_mass[0] - 2450.0).abs() < 1e-9);
        assert!((b.isp0[1] - 287.0 * 9.81).abs() < 1e-9);
        assert!((b.burn_rate[2] - 3306.0 / 61.0).abs() < 1e-12);
    }

    #[test]
    fn test_active_stage_cumulative() {
        let b = Booster::minuteman_iii();
        assert_eq!(b.active_stage(0.0), Some(0));
        assert_eq!(b.active_stage(60.9), Some(0));
        assert_eq!(b.active_stage(61.0), Some(1));
        assert_eq!(b.active_stage(126.9), Some(1));
        assert_eq!(b.active_stage(127.0), Some(2));
        assert_eq!(b.active_stage(188.0), None);
        assert_eq!(Booster::mock().active_stage(0.0), None);
    }

    #[test]
    fn test_mass_after_one_second() {
        let v = Vehicle::from_rv_type(RvType::Ballistic);
        let expected = 34210.0 + 400.0 - 20780.0 / 61.0;
        assert!((v.mass_at(1.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_mass_monotonic_and_rv_after_burnout() {
        let v = Vehicle::from_rv_type(RvType::Maneuverable);
        let mut previous = v.mass_at(0.0);
        let mut t = 0.5;
        while t < 250.0 {
            let m = v.mass_at(t);
            assert!(m <= previous, "mass increased at t = {}", t);
            previous = m;
            t += 0.5;
        }
        assert_eq!(v.mass_at(188.0), 450.0);
        assert_eq!(v.mass_at(1000.0), 450.0);
    }

    #[test]
    fn test_stage_separation_drops_wet_mass() {
        let v = Vehicle::from_rv_type(RvType::Ballistic);
        let before = v.mass_at(61.0 - 1e-9);
        let after = v.mass_at(61.0);
        // First stage empty casing (dry mass) is shed at separation
        assert!((before - after - 2450.0).abs() < 1e-3);
    }

    #[test]
    fn test_update_mass() {
        let mut v = Vehicle::from_rv_type(RvType::Ballistic);
        assert_eq!(v.current_mass, 34610.0);
        v.update_mass(200.0);
        assert_eq!(v.current_mass, 400.0);
    }

    #[test]
    fn test_aero_profile_switches_at_burnout() {
        let v = Vehicle::from_rv_type(RvType::Ballistic);
        assert_eq!(v.aero_profile(10.0).c_d_0, 0.5);
        assert_eq!(v.aero_profile(10.0).area, 2.2698);
        let rv = v.aero_profile(188.0);
        assert_eq!(rv.c_d_0, 0.1);
        assert!((rv.area - PI * 0.23 * 0.23).abs() < 1e-12);
    }

    #[test]
    fn test_mock_vehicle() {
        let v = Vehicle::mock();
        assert_eq!(v.total_burn_time(), 0.0);
        assert_eq!(v.current_mass, 1000.0);
        assert_eq!(v.mass_at(0.0), 1000.0);
        assert_eq!(v.aero_profile(0.0).area, 0.01);
    }
}
