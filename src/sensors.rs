//! Inertial and satellite navigation sensor models.

use nalgebra::Vector3;

use crate::noise::NoiseSource;
use crate::state::{AccelBreakdown, VehicleState};

/// Strapdown IMU with per-axis accelerometer scale errors and a two-axis gyro
/// whose attitude error integrates bias and white noise.
#[derive(Debug, Clone, PartialEq)]
pub struct Imu {
    /// Fractional scale-factor error per accelerometer axis
    pub acc_scale: Vector3<f64>,
    /// rad/s
    pub gyro_bias_long: f64,
    pub gyro_bias_lat: f64,
    pub gyro_noise: f64,
    /// Accumulated attitude error (rad)
    pub gyro_error_long: f64,
    pub gyro_error_lat: f64,
}

impl Imu {
    /// Sample the fixed error terms. Draw order: scale x, y, z, then gyro
    /// bias lat, long.
    pub fn sample<N: NoiseSource + ?Sized>(
        acc_scale_stability: f64,
        gyro_bias_stability: f64,
        gyro_noise: f64,
        noise: &mut N,
    ) -> Self {
        let acc_scale = Vector3::new(
            acc_scale_stability * noise.gaussian(),
            acc_scale_stability * noise.gaussian(),
            acc_scale_stability * noise.gaussian(),
        );
        let gyro_bias_lat = gyro_bias_stability * noise.gaussian();
        let gyro_bias_long = gyro_bias_stability * noise.gaussian();
        Self {
            acc_scale,
            gyro_bias_long,
            gyro_bias_lat,
            gyro_noise,
            gyro_error_long: 0.0,
            gyro_error_lat: 0.0,
        }
    }

    /// An IMU with no errors at all.
    pub fn ideal() -> Self {
        Self {
            acc_scale: Vector3::zeros(),
            gyro_bias_long: 0.0,
            gyro_bias_lat: 0.0,
            gyro_noise: 0.0,
            gyro_error_long: 0.0,
            gyro_error_lat: 0.0,
        }
    }

    /// Advance the gyro random walk by one step.
    pub fn propagate<N: NoiseSource + ?Sized>(&mut self, dt: f64, noise: &mut N) {
        self.gyro_error_long += self.gyro_noise * noise.gaussian() * dt + self.gyro_bias_long * dt;
        self.gyro_error_lat += self.gyro_noise * noise.gaussian() * dt + self.gyro_bias_lat * dt;
    }

    pub fn reset_attitude_error(&mut self) {
        self.gyro_error_long = 0.0;
        self.gyro_error_lat = 0.0;
    }

    /// Accelerometer reading of a true acceleration vector.
    ///
    /// The misaligned sensor frame is a small-angle rotation by the gyro
    /// error, with `e_long` about z and `e_lat` about y. Only the z axis keeps
    /// the second-order `e_long * e_lat` term, so the map is not exactly
    /// orthogonal.
    pub fn measure(&self, a: &Vector3<f64>) -> Vector3<f64> {
        let el = self.gyro_error_long;
        let ea = self.gyro_error_lat;
        let rotated = Vector3::new(
            a.x - el * a.y - ea * a.z,
            a.y + el * a.x,
            a.z + ea * a.x - el * ea * a.y,
        );
        rotated.component_mul(&(Vector3::repeat(1.0) + self.acc_scale))
    }

    /// Measured copy of the true acceleration breakdown. Each component goes
    /// through the same linear sensor map, so the total stays their sum.
    pub fn measure_accel(&self, truth: &AccelBreakdown) -> AccelBreakdown {
        truth.map(|a| self.measure(a))
    }

    /// Attitude estimate `(theta_long, theta_lat)`.
    ///
    /// The launch perturbation is already in the true angles, so it is taken
    /// out here rather than counted a second time through the gyro.
    pub fn measure_attitude(&self, truth: &VehicleState) -> (f64, f64) {
        (
            truth.theta_long + self.gyro_error_long - truth.theta_long_pert,
            truth.theta_lat + self.gyro_error_lat - truth.theta_lat_pert,
        )
    }
}

/// GNSS receiver with independent Gaussian position noise per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gnss {
    pub noise_std: f64,
}

impl Gnss {
    pub fn new(noise_std: f64) -> Self {
        Self { noise_std }
    }

    pub fn measure<N: NoiseSource + ?Sized>(
        &self,
        position: &Vector3<f64>,
        noise: &mut N,
    ) -> Vector3<f64> {
        position
            + Vector3::new(
                self.noise_std * noise.gaussian(),
                self.noise_std * noise.gaussian(),
                self.noise_std * noise.gaussian(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::rotate_about_axis;
    use crate::noise::{SequenceNoise, ZeroNoise};

    #[test]
    fn test_ideal_imu_is_transparent() {
        let imu = Imu::ideal();
        let a = Vector3::new(3.0, -4.0, 12.0);
        assert_eq!(imu.measure(&a), a);
        assert_eq!(imu.measure(&Vector3::zeros()), Vector3::zeros());
    }

    #[test]
    fn test_scale_factor_per_axis() {
        let mut noise = SequenceNoise::new(vec![1.0, -1.0, 2.0, 0.0, 0.0]);
        let imu = Imu::sample(1e-3, 0.0, 0.0, &mut noise);
        let m = imu.measure(&Vector3::new(10.0, 10.0, 10.0));
        assert!((m.x - 10.01).abs() < 1e-12);
        assert!((m.y - 9.99).abs() < 1e-12);
        assert!((m.z - 10.02).abs() < 1e-12);
    }

    #[test]
    fn test_gyro_random_walk() {
        let mut imu = Imu::sample(0.0, 1e-4, 1e-5, &mut SequenceNoise::new(vec![1.0]));
        assert_eq!(imu.gyro_bias_long, 1e-4);

        let mut noise = SequenceNoise::new(vec![2.0]);
        imu.propagate(0.5, &mut noise);
        let expected = 1e-5 * 2.0 * 0.5 + 1e-4 * 0.5;
        assert!((imu.gyro_error_long - expected).abs() < 1e-18);
        assert!((imu.gyro_error_lat - expected).abs() < 1e-18);

        imu.reset_attitude_error();
        assert_eq!(imu.gyro_error_long, 0.0);
    }

    #[test]
    fn test_zero_noise_gyro_does_not_drift() {
        let mut imu = Imu::sample(1.0, 1.0, 1.0, &mut ZeroNoise);
        for _ in 0..100 {
            imu.propagate(1.0, &mut ZeroNoise);
        }
        assert_eq!(imu.gyro_error_long, 0.0);
        assert_eq!(imu.gyro_error_lat, 0.0);
    }

    #[test]
    fn test_small_angle_coupling_is_first_order_rotation() {
        // The sensor map matches an exact rotation to first order; the
        // asymmetric second-order term shows up as an O(e²) residual.
        let mut imu = Imu::ideal();
        imu.gyro_error_long = 1e-4;
        let a = Vector3::new(20.0, 0.0, 0.0);
        let exact = rotate_about_axis(&a, &Vector3::z(), 1e-4);
        assert!((imu.measure(&a) - exact).norm() < 1e-6);

        imu.gyro_error_lat = 1e-4;
        let b = Vector3::new(0.0, 20.0, 0.0);
        let m = imu.measure(&b);
        assert!((m.z + 20.0 * 1e-8).abs() < 1e-15);
        assert!((m.x + 20.0 * 1e-4).abs() < 1e-12);
    }

    #[test]
    fn test_measured_breakdown_sums() {
        let mut imu = Imu::ideal();
        imu.acc_scale = Vector3::new(1e-3, 2e-3, 3e-3);
        imu.gyro_error_lat = 2e-4;
        let mut truth = AccelBreakdown {
            gravity: Vector3::new(-9.8, 0.0, 0.0),
            drag: Vector3::new(1.0, 2.0, 3.0),
            lift: Vector3::new(0.0, 0.5, 0.0),
            thrust: Vector3::new(30.0, 30.0, 0.0),
            total: Vector3::zeros(),
        };
        truth.update_total();
        let measured = imu.measure_accel(&truth);
        assert!((measured.total - measured.sum()).norm() < 1e-15);
        assert!((measured.total - imu.measure(&truth.total)).norm() < 1e-12);
    }

    #[test]
    fn test_attitude_removes_launch_perturbation() {
        let mut imu = Imu::ideal();
        imu.gyro_error_long = 0.01;
        let mut truth = VehicleState::at_launch(0.8, 0.1);
        truth.theta_long_pert = 0.05;
        truth.theta_lat_pert = -0.02;
        let (long, lat) = imu.measure_attitude(&truth);
        assert!((long - (0.8 + 0.01 - 0.05)).abs() < 1e-15);
        assert!((lat - 0.12).abs() < 1e-15);
    }

    #[test]
    fn test_gnss_noise() {
        let gnss = Gnss::new(3.0);
        let p = Vector3::new(1.0, 2.0, 3.0);
        let mut noise = SequenceNoise::new(vec![1.0, 0.0, -1.0]);
        assert_eq!(gnss.measure(&p, &mut noise), Vector3::new(4.0, 2.0, 0.0));
        assert_eq!(Gnss::new(0.0).measure(&p, &mut ZeroNoise), p);
    }
}
