//! Builds a JSON candle fixture from a compact spec of closes per series,
//! mirroring the teacher's `bin/make_demo_cache.rs` role: a small
//! offline tool that turns raw inputs into the on-disk format the main
//! binary reads, run once ahead of time rather than wired into the
//! request path.

use std::path::PathBuf;

use anyhow::{Context, Result};
use callpath::domain::Interval;
use callpath::store::{FixtureBuilder, FixtureFile, FixtureSeries};
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(author, version, about = "Build a candle fixture from a closes spec", long_about = None)]
struct Args {
    /// Path to a JSON array of `{ token, chain, interval, startTs, closes }`.
    #[arg(long)]
    spec: PathBuf,
    /// Where to write the resulting fixture file.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SeriesSpec {
    token: String,
    chain: String,
    interval: Interval,
    start_ts: i64,
    closes: Vec<f64>,
    #[serde(default)]
    wick_pct: Option<f64>,
}

fn main() -> Result<()> {
    callpath::init_tracing();

    let args = Args::parse();
    let bytes = std::fs::read(&args.spec).with_context(|| format!("failed to read {}", args.spec.display()))?;
    let specs: Vec<SeriesSpec> = serde_json::from_slice(&bytes).context("failed to parse closes spec")?;

    let mut series = Vec::with_capacity(specs.len());
    for spec in specs {
        tracing::info!(token = %spec.token, chain = %spec.chain, bars = spec.closes.len(), "building series");
        let mut builder = FixtureBuilder::new(spec.start_ts, spec.interval);
        if let Some(wick_pct) = spec.wick_pct {
            builder = builder.with_wick_pct(wick_pct);
        }
        series.push(FixtureSeries {
            token: spec.token,
            chain: spec.chain,
            interval: spec.interval,
            candles: builder.build(&spec.closes),
        });
    }

    let fixture = FixtureFile { series };
    let out_bytes = serde_json::to_vec_pretty(&fixture)?;
    std::fs::write(&args.out, out_bytes).with_context(|| format!("failed to write {}", args.out.display()))?;
    tracing::info!(path = %args.out.display(), "wrote fixture");
    Ok(())
}
