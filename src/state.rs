// src/state.rs

use std::f64::consts::PI;

use nalgebra::Vector2;

use crate::accel::AccelPair;
use crate::velocity::Velocity;

/// Cartesian position of the bob together with its polar representation.
///
/// `theta` is measured from the +x axis, so the bottom of the swing sits at
/// `1.5π`. The polar and Cartesian views are only consistent while the
/// string is taut; `update_cartesian`/`update_theta` resynchronize them
/// explicitly.
#[derive(Debug, Clone, Copy)]
pub struct KinematicState {
    pub pos: Vector2<f64>,
    /// Length of the string, constant over a run.
    pub r: f64,
    pub theta: f64,
    /// Angular velocity at the start of the current taut sub-interval;
    /// refreshed at every collision.
    pub omega0: f64,
}

impl KinematicState {
    pub fn new(r: f64, theta: f64, omega0: f64) -> Self {
        KinematicState {
            pos: Vector2::zeros(),
            r,
            theta,
            omega0,
        }
    }

    /// Project the polar angle back onto Cartesian coordinates.
    pub fn update_cartesian(&mut self) {
        if self.theta < 0.0 {
            self.theta += 2.0 * PI;
        }
        self.pos.x = self.r * self.theta.cos();
        self.pos.y = self.r * self.theta.sin();
    }

    /// Recover `theta` from the current Cartesian coordinates, wrapped into
    /// `[0, 2π]`. The `atan2(x, -y) + 1.5π` form keeps the zero at the +x
    /// axis with the bottom of the swing at `1.5π`; downstream trigonometric
    /// comparisons rely on this exact convention.
    pub fn update_theta(&mut self) {
        self.theta = self.pos.x.atan2(-self.pos.y) + 1.5 * PI;
        if self.theta > 2.0 * PI {
            self.theta -= 2.0 * PI;
        }
    }

    /// Verlet position update. Only the newest acceleration sample enters:
    /// x += v·dt + a·dt²/2.
    pub fn position_update(&mut self, a: &AccelPair, v: &Velocity, dt: f64) {
        self.pos += v.v * dt + a.newest() * (dt * dt / 2.0);
    }
}
