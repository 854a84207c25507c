// src/config.rs

use std::f64::consts::PI;

use serde::Deserialize;

use crate::error::PendulumError;
use crate::output::Recorder;
use crate::pendulum::Pendulum;
use crate::G;

/// Run parameters shared by single runs and ensembles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub mass: f64,
    /// Length of the string.
    pub length: f64,
    /// Total simulated time.
    pub sim_time: f64,
    /// Integration time step.
    pub dt: f64,
    /// Steps between diagnostic samples.
    pub write_stride: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            mass: 1.0,
            length: 1.0,
            sim_time: 100.0,
            dt: 1e-4,
            write_stride: 100,
        }
    }
}

impl SimConfig {
    /// Launch a pendulum from the bottom of the swing with the angular
    /// velocity implied by `gamma`.
    pub fn launch(&self, gamma: f64, recorder: Recorder) -> Result<Pendulum, PendulumError> {
        Pendulum::new(
            self.length,
            1.5 * PI,
            omega0_from_gamma(gamma, self.length),
            self.mass,
            self.dt,
            recorder,
        )
    }
}

/// Initial angular velocity for the dimensionless launch parameter
/// `gamma = omega0²·l/g`.
pub fn omega0_from_gamma(gamma: f64, length: f64) -> f64 {
    (gamma * G / length).sqrt()
}

/// `gamma` must keep the pendulum energetic enough to go slack at least
/// once, but not so energetic that it whirls without ever colliding.
pub fn gamma_in_range(gamma: f64) -> bool {
    gamma > 2.0 && gamma < 5.0
}
