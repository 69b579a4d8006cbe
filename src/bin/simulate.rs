//! Sensor Export Simulation
//!
//! Generates a realistic cooling-curve CSV in the format the dashboard
//! ingests (`Timestamp,Current[,Predicted][,Threshold]`), for demoing and
//! testing uploads without real equipment exports.
//!
//! # Usage
//! ```bash
//! sensor-sim --points 120 --seed 7 > cooldown.csv
//! sensor-sim --points 240 --predicted --output fixtures/overnight.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::io::Write;
use std::path::PathBuf;

/// Exponential cooling rate per step toward ambient.
const COOLING_RATE: f64 = 0.015;

/// Gaussian measurement noise (standard deviation, degrees).
const NOISE_STD: f64 = 0.15;

#[derive(Parser, Debug)]
#[command(name = "sensor-sim")]
#[command(about = "Cooling-curve CSV generator for Sentra upload testing")]
#[command(version)]
struct Args {
    /// Number of data rows to generate
    #[arg(short, long, default_value = "120", value_parser = clap::value_parser!(u32).range(1..=10_000))]
    points: u32,

    /// Starting temperature (°C)
    #[arg(long, default_value = "48.0")]
    start: f64,

    /// Ambient temperature the curve decays toward (°C)
    #[arg(long, default_value = "35.0")]
    ambient: f64,

    /// Minutes between consecutive timestamps
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=1_440))]
    interval_minutes: u32,

    /// Emit a Predicted column (noise-free curve)
    #[arg(long)]
    predicted: bool,

    /// Emit a Threshold column with this value
    #[arg(long)]
    threshold: Option<f64>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let noise = Normal::new(0.0, NOISE_STD).context("invalid noise distribution")?;

    let mut out = String::new();
    out.push_str("Timestamp,Current");
    if args.predicted {
        out.push_str(",Predicted");
    }
    if args.threshold.is_some() {
        out.push_str(",Threshold");
    }
    out.push('\n');

    for i in 0..args.points {
        let total_minutes = u64::from(i) * u64::from(args.interval_minutes);
        let (hours, minutes) = (total_minutes / 60, total_minutes % 60);

        let decay = (-COOLING_RATE * f64::from(i)).exp();
        let ideal = args.ambient + (args.start - args.ambient) * decay;
        let measured = ideal + noise.sample(&mut rng);

        out.push_str(&format!("{:02}:{:02},{:.2}", hours, minutes, measured));
        if args.predicted {
            out.push_str(&format!(",{:.2}", ideal));
        }
        if let Some(threshold) = args.threshold {
            out.push_str(&format!(",{:.1}", threshold));
        }
        out.push('\n');
    }

    match args.output {
        Some(path) => {
            std::fs::write(&path, out)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {} rows to {}", args.points, path.display());
        }
        None => {
            std::io::stdout()
                .write_all(out.as_bytes())
                .context("failed to write to stdout")?;
        }
    }

    Ok(())
}
