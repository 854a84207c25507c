// src/velocity.rs
//
// At a collision the velocity vector can arrive with any orientation. To
// recover its tangential component one must know that orientation, which is
// organized by the values of theta (the bob's angle) and beta (the polar
// angle of the velocity itself). A-D denote the quadrant holding theta and
// 1-8 the intervals in which beta falls.

use std::f64::consts::PI;

use nalgebra::Vector2;

use crate::accel::AccelPair;
use crate::error::PendulumError;

/// The recognized (theta, beta) configurations at a re-engagement. Each case
/// fixes three signs: the sense of the tangential speed and the axis signs
/// used to rebuild the velocity components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TangentCase {
    A8,
    B45,
    C67,
    C5,
    D67,
}

impl TangentCase {
    /// Classify a `(theta, beta)` pair, both already wrapped into `[0, 2π]`.
    /// A pair outside every recognized case is a hard failure: it means the
    /// collision geometry is degenerate or precision has run out, and
    /// approximating here would silently corrupt the post-collision state.
    pub fn classify(theta: f64, beta: f64) -> Result<TangentCase, PendulumError> {
        // first quadrant
        if (0.0..PI / 2.0).contains(&theta) && beta - 1.5 * PI > theta {
            return Ok(TangentCase::A8);
        }
        // second quadrant
        if (PI / 2.0..PI).contains(&theta) && beta > theta && beta - PI / 2.0 < theta {
            return Ok(TangentCase::B45);
        }
        // third quadrant
        if (PI..1.5 * PI).contains(&theta) {
            if beta > theta && beta - PI / 2.0 < theta {
                return Ok(TangentCase::C67);
            }
            if beta < theta {
                return Ok(TangentCase::C5);
            }
        }
        // fourth quadrant
        if (1.5 * PI..=2.0 * PI).contains(&theta) && beta > theta - PI / 2.0 && beta < theta {
            return Ok(TangentCase::D67);
        }

        Err(PendulumError::GeometryExhausted { theta, beta })
    }

    /// Sign triple `(s_m, s_x, s_y)`: `v_tg = s_m·|v|·sin(beta − theta)`,
    /// then `vx = s_x·v_tg·sin θ`, `vy = s_y·v_tg·cos θ`.
    fn signs(self) -> (f64, f64, f64) {
        match self {
            TangentCase::A8 => (-1.0, -1.0, -1.0),
            TangentCase::B45 => (1.0, -1.0, 1.0),
            TangentCase::C67 => (1.0, -1.0, 1.0),
            TangentCase::C5 => (-1.0, -1.0, 1.0),
            TangentCase::D67 => (-1.0, 1.0, -1.0),
        }
    }
}

/// Cartesian velocity of the bob.
#[derive(Debug, Clone, Copy)]
pub struct Velocity {
    pub v: Vector2<f64>,
}

impl Velocity {
    /// Launch velocity: perpendicular to the string at the launch angle,
    /// with angular velocity `omega0` on a string of length `l`.
    pub fn launch(omega0: f64, l: f64, angle: f64) -> Self {
        Velocity {
            v: Vector2::new(-omega0 * l * angle.sin(), -omega0 * l * angle.cos()),
        }
    }

    pub fn from_components(x: f64, y: f64) -> Self {
        Velocity {
            v: Vector2::new(x, y),
        }
    }

    /// Second half of the velocity Verlet step:
    /// v += (a_old + a_new)·dt/2.
    pub fn verlet_update(&mut self, a: &AccelPair, dt: f64) {
        self.v += (a.oldest() + a.newest()) * (dt / 2.0);
    }

    pub fn magnitude(&self) -> f64 {
        self.v.norm()
    }

    /// Collapse the velocity onto the tangential direction at a collision,
    /// preserving the tangential speed and the sense of rotation. The radial
    /// component is discarded; speed can only shrink here, never grow.
    pub fn project_to_tangential(&mut self, theta: f64) -> Result<TangentCase, PendulumError> {
        let mut beta = self.v.y.atan2(self.v.x);
        if beta < 0.0 {
            beta += 2.0 * PI;
        }

        let case = TangentCase::classify(theta, beta)?;
        tracing::debug!(theta, beta, ?case, "tangential projection");

        let (s_m, s_x, s_y) = case.signs();
        let v_tg = s_m * self.magnitude() * (beta - theta).sin();
        self.v.x = s_x * v_tg * theta.sin();
        self.v.y = s_y * v_tg * theta.cos();

        Ok(case)
    }
}
