// src/sweep.rs

use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

use chrono::Utc;
use itertools::izip;
use ordered_float::OrderedFloat;
use rand::Rng;
use rand_distr::Uniform;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::SimConfig;
use crate::output::Recorder;
use crate::run::{run, RunSettings};

/// One results line per run: step size, gamma, collision count, remaining
/// energy, angle of the last collision, elapsed time, and how the run ended.
#[derive(Debug, Clone, Serialize)]
pub struct SweepRecord {
    pub date: String,
    pub gamma: f64,
    pub dt: f64,
    pub collisions: u32,
    pub energy: f64,
    pub last_collision_angle: f64,
    pub elapsed: f64,
    pub outcome: String,
}

struct RunOutcome {
    collisions: u32,
    energy: f64,
    last_collision_angle: f64,
    elapsed: f64,
    outcome: String,
}

/// Draw `n` launch parameters uniformly from the admissible window.
pub fn sample_gammas(n: usize) -> Vec<f64> {
    let mut rng = rand::rng();
    let range = Uniform::new(2.0, 5.0).unwrap();
    (0..n).map(|_| rng.sample(&range)).collect()
}

/// Run one silent simulation per gamma, in parallel. A failed run keeps the
/// pendulum's last consistent state in its record instead of aborting the
/// whole ensemble.
pub fn run_ensemble(gammas: &[f64], cfg: &SimConfig, max_collisions: u32) -> Vec<SweepRecord> {
    let outcomes: Vec<RunOutcome> = gammas
        .par_iter()
        .map(|&gamma| run_silent(gamma, cfg, max_collisions))
        .collect();

    izip!(gammas, outcomes)
        .map(|(&gamma, o)| SweepRecord {
            date: Utc::now().to_rfc3339(),
            gamma,
            dt: cfg.dt,
            collisions: o.collisions,
            energy: o.energy,
            last_collision_angle: o.last_collision_angle,
            elapsed: o.elapsed,
            outcome: o.outcome,
        })
        .collect()
}

fn run_silent(gamma: f64, cfg: &SimConfig, max_collisions: u32) -> RunOutcome {
    let settings = RunSettings {
        sim_time: cfg.sim_time,
        max_collisions,
        write_stride: cfg.write_stride,
        progress: false,
    };

    let mut p = match cfg.launch(gamma, Recorder::disabled()) {
        Ok(p) => p,
        Err(err) => {
            return RunOutcome {
                collisions: 0,
                energy: 0.0,
                last_collision_angle: 0.0,
                elapsed: 0.0,
                outcome: format!("err: {err}"),
            }
        }
    };

    match run(&mut p, &settings) {
        Ok(summary) => RunOutcome {
            collisions: summary.collisions,
            energy: summary.energy,
            last_collision_angle: summary.last_collision_angle,
            elapsed: summary.elapsed,
            outcome: summary.termination.to_string(),
        },
        // keep the partial-run statistics
        Err(err) => RunOutcome {
            collisions: p.collisions(),
            energy: p.energy(),
            last_collision_angle: p.last_collision_angle(),
            elapsed: p.elapsed(),
            outcome: format!("err: {err}"),
        },
    }
}

/// Collision counts keyed by gamma, for collision-statistics studies.
pub fn collision_census(records: &[SweepRecord]) -> HashMap<OrderedFloat<f64>, u32> {
    records
        .iter()
        .map(|r| (OrderedFloat(r.gamma), r.collisions))
        .collect()
}

/// Append the records to a results file, writing the header only when the
/// file does not exist yet.
pub fn export_records(
    path: impl AsRef<Path>,
    records: &[SweepRecord],
) -> Result<(), Box<dyn Error>> {
    let file_exists = path.as_ref().exists();
    let file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampled_gammas_stay_in_window() {
        let gammas = sample_gammas(200);
        assert_eq!(gammas.len(), 200);
        assert!(gammas.iter().all(|&g| (2.0..5.0).contains(&g)));
    }

    #[test]
    fn short_ensemble_produces_one_record_per_gamma() {
        let cfg = SimConfig {
            sim_time: 0.05,
            dt: 1e-3,
            ..SimConfig::default()
        };
        let gammas = [2.5, 3.0, 4.5];
        let records = run_ensemble(&gammas, &cfg, 10);

        assert_eq!(records.len(), 3);
        for (gamma, record) in izip!(&gammas, &records) {
            assert_eq!(record.gamma, *gamma);
            assert_eq!(record.collisions, 0);
            assert_eq!(record.outcome, "time limit");
        }

        let census = collision_census(&records);
        assert_eq!(census[&OrderedFloat(3.0)], 0);
    }
}
