use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use slackline::config::{gamma_in_range, SimConfig};
use slackline::sweep::{export_records, run_ensemble, sample_gammas, SweepRecord};
use slackline::{run, OutputMode, Recorder, RunSettings};

#[derive(Parser, Debug)]
#[command(
    name = "slackline",
    about = "Gravitational pendulum with a slack-capable string"
)]
struct Args {
    /// Dimensionless launch parameter omega0²·l/g, strictly between 2 and 5
    #[arg(long, default_value_t = 3.0)]
    gamma: f64,

    /// Stop the run after this many collisions
    #[arg(long, default_value_t = 50)]
    max_collisions: u32,

    /// Diagnostic projection: 0 none, 1 trajectory, 2 phase space, 3 E(t),
    /// 4 x(t), 5 y(t), 6 theta(t), 7 dtheta/dt(t), 8 E(collisions)
    #[arg(long, default_value_t = 0)]
    mode: u8,

    /// Where diagnostic samples are written
    #[arg(long, default_value = "trajectory.csv")]
    out: PathBuf,

    /// JSON file with mass, length, sim_time, dt, write_stride
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append a one-line run summary to this results file
    #[arg(long)]
    results: Option<PathBuf>,

    /// Instead of a single run, sample this many gammas and run them in
    /// parallel with output disabled
    #[arg(long)]
    sweep: Option<usize>,
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            let reader = BufReader::new(file);
            Ok(serde_json::from_reader(reader)?)
        }
        None => Ok(SimConfig::default()),
    }
}

fn append_results(path: &Path, record: SweepRecord) -> Result<()> {
    export_records(path, &[record]).map_err(|e| anyhow!("{e}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = load_config(args.config.as_deref())?;

    if let Some(n) = args.sweep {
        let gammas = sample_gammas(n);
        let records = run_ensemble(&gammas, &cfg, args.max_collisions);
        for r in &records {
            println!(
                "gamma = {:.4}: {} collisions, E = {:.6} ({})",
                r.gamma, r.collisions, r.energy, r.outcome
            );
        }
        let path = args.results.unwrap_or_else(|| PathBuf::from("results.csv"));
        export_records(&path, &records).map_err(|e| anyhow!("{e}"))?;
        return Ok(());
    }

    if !gamma_in_range(args.gamma) {
        bail!(
            "gamma must be strictly between 2 and 5, got {}",
            args.gamma
        );
    }

    let mode = OutputMode::from_selector(args.mode)?;
    let recorder = Recorder::to_path(&args.out, mode)?;
    let mut pendulum = cfg.launch(args.gamma, recorder)?;

    let settings = RunSettings {
        sim_time: cfg.sim_time,
        max_collisions: args.max_collisions,
        write_stride: cfg.write_stride,
        progress: true,
    };

    let outcome = match run(&mut pendulum, &settings) {
        Ok(summary) => summary.termination.to_string(),
        Err(err) => {
            // the run is over, but the last consistent state is still usable
            eprintln!("{err}");
            format!("err: {err}")
        }
    };

    println!("Number of collisions: {}", pendulum.collisions());
    println!("Energy: {}", pendulum.energy());

    if let Some(path) = &args.results {
        append_results(
            path,
            SweepRecord {
                date: Utc::now().to_rfc3339(),
                gamma: args.gamma,
                dt: cfg.dt,
                collisions: pendulum.collisions(),
                energy: pendulum.energy(),
                last_collision_angle: pendulum.last_collision_angle(),
                elapsed: pendulum.elapsed(),
                outcome,
            },
        )?;
    }

    Ok(())
}
