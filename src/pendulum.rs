// src/pendulum.rs

use std::f64::consts::PI;

use nalgebra::Vector2;

use crate::accel::AccelPair;
use crate::error::PendulumError;
use crate::output::{OutputMode, Recorder, Sample};
use crate::state::KinematicState;
use crate::velocity::Velocity;
use crate::G;

/// The pendulum bob on a string that can go slack. Two regimes, keyed by
/// the string tension: taut (`tension > 0`, constrained circular motion) and
/// slack (`tension == 0`, ballistic flight). A collision is the event where
/// the string snaps taut again after being slack; at that instant the radial
/// velocity component vanishes.
pub struct Pendulum {
    state: KinematicState,
    v: Velocity,
    a: AccelPair,
    mass: f64,
    dt: f64,
    tension: f64,
    /// Angle at the start of the current taut sub-interval; enters the
    /// tension formula and is refreshed at every collision.
    alpha: f64,
    collision: bool,
    collisions: u32,
    last_collision: Vector2<f64>,
    t: f64,
    dtheta: f64,
    recorder: Recorder,
}

impl Pendulum {
    /// Build a pendulum launched at `angle` with angular velocity `omega0`,
    /// perpendicular to the string, and evaluate the initial acceleration.
    pub fn new(
        length: f64,
        angle: f64,
        omega0: f64,
        mass: f64,
        dt: f64,
        recorder: Recorder,
    ) -> Result<Pendulum, PendulumError> {
        let mut p = Pendulum {
            state: KinematicState::new(length, angle, omega0),
            v: Velocity::launch(omega0, length, angle),
            a: AccelPair::new(),
            mass,
            dt,
            tension: 0.0,
            alpha: angle,
            collision: false,
            collisions: 0,
            last_collision: Vector2::zeros(),
            t: 0.0,
            dtheta: 0.0,
            recorder,
        };

        p.state.update_cartesian();
        p.compute_acceleration()?;

        // dtheta is undefined before the first step, so the phase portrait
        // gets no initial sample
        if p.recorder.mode() != OutputMode::PhaseSpace {
            p.emit_sample()?;
        }

        Ok(p)
    }

    /// Advance one time step of velocity Verlet. On a collision step the
    /// velocity half-step is skipped: the tangential projection has already
    /// fixed the velocity completely.
    pub fn step(&mut self) -> Result<(), PendulumError> {
        self.t += self.dt;
        self.state.position_update(&self.a, &self.v, self.dt);
        self.compute_acceleration()?;
        if !self.collision {
            self.v.verlet_update(&self.a, self.dt);
        } else {
            self.collision = false;
        }
        Ok(())
    }

    /// Tension of the string at `theta` for the current taut sub-interval
    /// (angle `alpha`, angular velocity `omega0`).
    fn tension_at(&self, theta: f64) -> f64 {
        self.mass
            * G
            * (-3.0 * theta.sin()
                + 2.0 * self.alpha.sin()
                + self.state.r / G * self.state.omega0 * self.state.omega0)
    }

    fn compute_acceleration(&mut self) -> Result<(), PendulumError> {
        let old_tension = self.tension;
        // distance covered since the last step, and the radial gap between
        // the bob and the circle of radius r
        let delta = self.v.magnitude() * self.dt;
        let epsilon = self.state.r - self.state.pos.norm();
        let old_theta = self.state.theta;

        self.a.rotate();
        self.state.update_theta();
        let theta = self.state.theta;

        self.tension = self.tension_at(theta);

        if self.tension < 0.0 {
            self.tension = 0.0;
            // these projections mean nothing while the string is slack
            self.recorder.suppress_while_slack();
        }

        // the bob has not yet traveled far enough to take up the slack, so a
        // positive tension right at the boundary is numerical noise
        if epsilon > delta && old_tension == 0.0 && self.t != 0.0 {
            self.tension = 0.0;
        }

        if old_tension > 0.0 && self.tension == 0.0 {
            tracing::info!(
                t = self.t,
                x = self.state.pos.x,
                y = self.state.pos.y,
                energy = self.energy(),
                "the string is no longer stretched"
            );
        }

        // the radial component of the velocity vanishes when the string is
        // stretched again
        if old_tension == 0.0 && self.tension > 0.0 && self.t != 0.0 {
            self.collisions += 1;
            self.collision = true;
            tracing::info!(
                collision = self.collisions,
                t = self.t,
                length_error = epsilon,
                "the string is stretched again"
            );
            self.v.project_to_tangential(theta)?;
            self.reinitialize()?;
            self.last_collision = self.state.pos;
            self.recorder.restore_after_collision();
        }

        self.dtheta = theta - old_theta;
        // wrap correction, keeps phase-space diagnostics continuous across
        // the 0/2π seam
        if self.dtheta + 1e-3 > 2.0 * PI {
            self.dtheta -= 2.0 * PI;
        }
        if -self.dtheta + 1e-3 > 2.0 * PI {
            self.dtheta += 2.0 * PI;
        }

        if self.state.pos.norm() - self.state.r > self.state.r / 10.0 {
            return Err(PendulumError::ConstraintViolated {
                t: self.t,
                x: self.state.pos.x,
                y: self.state.pos.y,
                energy: self.energy(),
            });
        }

        self.a.store(Vector2::new(
            -self.tension * theta.cos() / self.mass,
            -self.tension * theta.sin() / self.mass - G,
        ));
        Ok(())
    }

    /// Re-seed the Verlet scheme after a collision: the angular velocity
    /// follows the projected speed and the taut sub-interval restarts at the
    /// current angle, which invalidates the tension just computed.
    fn reinitialize(&mut self) -> Result<(), PendulumError> {
        self.state.omega0 = self.v.magnitude() / self.state.r;
        self.alpha = self.state.theta;

        self.tension = self.tension_at(self.state.theta);

        self.emit_sample()?;
        tracing::debug!(
            x = self.state.pos.x,
            y = self.state.pos.y,
            energy = self.energy(),
            "state after collision"
        );
        Ok(())
    }

    /// Total energy: gravitational potential referenced to the lowest point
    /// of the circle, plus kinetic energy.
    pub fn energy(&self) -> f64 {
        let speed = self.v.magnitude();
        self.mass * G * (self.state.pos.y + self.state.r) + self.mass * speed * speed / 2.0
    }

    /// Project the current state through the active output mode.
    pub fn emit_sample(&mut self) -> Result<(), PendulumError> {
        let sample = Sample {
            t: self.t,
            x: self.state.pos.x,
            y: self.state.pos.y,
            theta: self.state.theta,
            angular_rate: self.dtheta / self.dt,
            energy: self.energy(),
            collisions: self.collisions,
        };
        self.recorder.record(&sample)
    }

    pub fn flush(&mut self) -> Result<(), PendulumError> {
        self.recorder.flush()
    }

    pub fn tension(&self) -> f64 {
        self.tension
    }

    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    /// Coordinates of the last collision, `(0, 0)` before the first one.
    pub fn last_collision(&self) -> (f64, f64) {
        (self.last_collision.x, self.last_collision.y)
    }

    /// Angle of the last collision, in the same convention as `theta`.
    pub fn last_collision_angle(&self) -> f64 {
        self.last_collision.x.atan2(-self.last_collision.y) + 1.5 * PI
    }

    pub fn theta(&self) -> f64 {
        self.state.theta
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.v.v.x, self.v.v.y)
    }

    pub fn dtheta(&self) -> f64 {
        self.dtheta
    }

    pub fn elapsed(&self) -> f64 {
        self.t
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn length(&self) -> f64 {
        self.state.r
    }

    pub fn mode(&self) -> OutputMode {
        self.recorder.mode()
    }
}
