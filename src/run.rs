// src/run.rs

use std::fmt;

use indicatif::ProgressBar;

use crate::error::PendulumError;
use crate::pendulum::Pendulum;
use crate::G;

/// Termination bounds for the driving loop.
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub sim_time: f64,
    pub max_collisions: u32,
    /// Steps between diagnostic samples.
    pub write_stride: u64,
    pub progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    TimeLimit,
    CollisionCap,
    EnergyExhausted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::TimeLimit => write!(f, "time limit"),
            Termination::CollisionCap => write!(f, "collision cap"),
            Termination::EnergyExhausted => write!(f, "energy exhausted"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub collisions: u32,
    pub energy: f64,
    pub last_collision_angle: f64,
    pub elapsed: f64,
    pub steps: u64,
    pub termination: Termination,
}

/// Drive one pendulum until a bound is hit: simulated time, the collision
/// cap, or the energy-exhaustion heuristic. On failure the error propagates
/// and the pendulum keeps its last consistent state for the caller.
pub fn run(p: &mut Pendulum, settings: &RunSettings) -> Result<RunSummary, PendulumError> {
    let total_steps = (settings.sim_time / p.dt()).ceil() as u64;
    let pb = if settings.progress {
        ProgressBar::new(total_steps)
    } else {
        ProgressBar::hidden()
    };

    let stride = settings.write_stride.max(1);
    let mut steps = 0u64;
    let mut sign_changes = 0u32;
    let mut termination = Termination::TimeLimit;

    while p.elapsed() < settings.sim_time {
        if p.collisions() >= settings.max_collisions {
            termination = Termination::CollisionCap;
            break;
        }

        let old_dtheta = p.dtheta();
        p.step()?;

        if steps % stride == 0 {
            p.emit_sample()?;
        }
        steps += 1;
        if steps % 100 == 0 {
            pb.set_position(steps);
        }

        // once the remaining energy cannot produce another collision, wait
        // for three sign changes of dtheta so the phase-space loop closes
        if p.energy() < p.mass() * G * p.length() {
            if old_dtheta * p.dtheta() < 0.0 {
                sign_changes += 1;
            }
            if sign_changes == 3 {
                termination = Termination::EnergyExhausted;
                break;
            }
        }
    }

    p.flush()?;
    pb.finish_and_clear();

    Ok(RunSummary {
        collisions: p.collisions(),
        energy: p.energy(),
        last_collision_angle: p.last_collision_angle(),
        elapsed: p.elapsed(),
        steps,
        termination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::output::Recorder;

    #[test]
    fn time_limit_bounds_the_run() {
        let cfg = SimConfig {
            sim_time: 0.01,
            dt: 1e-3,
            ..SimConfig::default()
        };
        let mut p = cfg.launch(3.0, Recorder::disabled()).unwrap();
        let settings = RunSettings {
            sim_time: cfg.sim_time,
            max_collisions: 100,
            write_stride: cfg.write_stride,
            progress: false,
        };

        let summary = run(&mut p, &settings).unwrap();
        assert_eq!(summary.termination, Termination::TimeLimit);
        assert_eq!(summary.collisions, 0);
        assert!(summary.elapsed >= cfg.sim_time - cfg.dt);
        assert!((10..=11).contains(&summary.steps));
    }

    #[test]
    fn collision_cap_stops_the_run() {
        let cfg = SimConfig {
            sim_time: 1_000.0,
            dt: 1e-3,
            ..SimConfig::default()
        };
        let mut p = cfg.launch(3.0, Recorder::disabled()).unwrap();
        let settings = RunSettings {
            sim_time: cfg.sim_time,
            max_collisions: 1,
            write_stride: cfg.write_stride,
            progress: false,
        };

        let summary = run(&mut p, &settings).unwrap();
        assert_eq!(summary.termination, Termination::CollisionCap);
        assert_eq!(summary.collisions, 1);
        assert!(summary.elapsed < cfg.sim_time);
    }
}
