//! Example: Per-subject crosstalk metrics for a whole dataset, in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] <dataset_dir>
//!
//! Notes:
//! - Parallelism is across subjects. Each subject is analyzed single-threaded.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use rayon::prelude::*;
use std::env;
use std::path::Path;
use std::time::Instant;
use xfeed_dsp::features::spectrum::SpectralTransformer;
use xfeed_dsp::io::dataset::load_dataset;
use xfeed_dsp::{analyze_subject, AnalysisConfig};

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut root: Option<String> = None;

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] <dataset_dir>\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per subject (JSONL)\n"
                );
                return Ok(());
            }
            _ => root = Some(a),
        }
    }

    let root = match root {
        Some(r) => r,
        None => {
            eprintln!("ERROR: Provide a dataset directory. Use --help for usage.");
            std::process::exit(2);
        }
    };

    let jobs = jobs.unwrap_or_else(default_jobs);
    let dataset = load_dataset(Path::new(&root))?;
    eprintln!(
        "Batch: {} subjects ({} files failed), jobs={}",
        dataset.subjects.len(),
        dataset.failures.len(),
        jobs
    );
    for failure in &dataset.failures {
        eprintln!("  failed: {}: {}", failure.path.display(), failure.reason);
    }

    let config = AnalysisConfig::default();
    let transformer = SpectralTransformer::new(config.fft_size, config.sample_rate)?;

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<_> = pool.install(|| {
        dataset
            .subjects
            .par_iter()
            .map(|subject| (subject.name.clone(), analyze_subject(subject, &transformer, &config)))
            .collect()
    });

    for (idx, (name, out)) in outs.iter().enumerate() {
        match out {
            Ok(analysis) if json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "subject": name,
                        "id": analysis.id,
                        "metrics": analysis.metrics,
                        "issues": analysis.issues,
                    })
                );
            }
            Ok(analysis) => {
                println!("[{}/{}] {}:", idx + 1, outs.len(), name);
                for m in &analysis.metrics {
                    println!(
                        "    {}: {:.1} Hz, {:.4} ({:.2} dB)",
                        m.direction, m.frequency_hz, m.attenuation_linear, m.attenuation_db
                    );
                }
                for issue in &analysis.issues {
                    println!("    {}", issue.detail);
                }
            }
            Err(e) if json => {
                println!("{}", serde_json::json!({ "subject": name, "error": e.to_string() }));
            }
            Err(e) => println!("[{}/{}] {}: ERROR: {}", idx + 1, outs.len(), name, e),
        }
    }

    let ok = outs.iter().filter(|(_, o)| o.is_ok()).count();
    eprintln!(
        "Done: ok={}/{} wall={:.0}ms",
        ok,
        outs.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}
