//! Example: Crosstalk metrics of a single subject file
//!
//! Usage:
//!   cargo run --example analyze_subject -- <subject.json>

use std::env;
use std::path::Path;

use xfeed_dsp::features::spectrum::SpectralTransformer;
use xfeed_dsp::io::dataset::load_subject_file;
use xfeed_dsp::{analyze_subject, AnalysisConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let path = env::args().nth(1).ok_or("Usage: analyze_subject <subject.json>")?;
    let subject = load_subject_file(Path::new(&path))?;

    let config = AnalysisConfig::default();
    let transformer = SpectralTransformer::new(config.fft_size, config.sample_rate)?;

    let analysis = analyze_subject(&subject, &transformer, &config)?;

    println!("Subject {} (id {}):", analysis.name, analysis.id);
    for metric in &analysis.metrics {
        println!(
            "  {}: {:.1} Hz (bin {}), attenuation {:.4} ({:.2} dB){}",
            metric.direction,
            metric.frequency_hz,
            metric.crosstalk_bin,
            metric.attenuation_linear,
            metric.attenuation_db,
            if metric.flags.is_empty() {
                String::new()
            } else {
                format!(" {:?}", metric.flags)
            }
        );
    }
    for issue in &analysis.issues {
        println!("  {}", issue.detail);
    }

    Ok(())
}
