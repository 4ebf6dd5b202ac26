//! Crosstalk / anthropometry correlation report
//!
//! Usage:
//!   xfeed_report [--config FILE] [--names FILE] [--json] [--verbose] <dataset_dir> <anthropometry.json>

use std::env;
use std::path::PathBuf;

use xfeed_dsp::io::anthropometry::AnthropometricTable;
use xfeed_dsp::io::dataset::load_dataset;
use xfeed_dsp::io::names::FeatureNames;
use xfeed_dsp::{analyze_dataset, AnalysisConfig, JsonRenderer, ReportRenderer, TextRenderer};

const USAGE: &str = "Usage: xfeed_report [options] <dataset_dir> <anthropometry.json>\n\
                     \n\
                     --config FILE  Analysis configuration (JSON, defaults for missing fields)\n\
                     --names FILE   Feature name map (JSON, default: CIPIC parameter names)\n\
                     --json         Emit the full report as JSON\n\
                     --verbose      List insignificant correlations too\n";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut verbose = false;
    let mut config_path: Option<PathBuf> = None;
    let mut names_path: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--verbose" | "-v" => verbose = true,
            "--config" => {
                let v = args.first().ok_or("--config requires a value")?.clone();
                args.remove(0);
                config_path = Some(PathBuf::from(v));
            }
            "--names" => {
                let v = args.first().ok_or("--names requires a value")?.clone();
                args.remove(0);
                names_path = Some(PathBuf::from(v));
            }
            "--help" | "-h" => {
                eprintln!("{}", USAGE);
                return Ok(());
            }
            _ => positional.push(a),
        }
    }

    if positional.len() != 2 {
        eprintln!("ERROR: Provide a dataset directory and an anthropometry file.\n\n{}", USAGE);
        std::process::exit(2);
    }

    let config = match &config_path {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    let names = match &names_path {
        Some(path) => FeatureNames::from_json_file(path)?,
        None => FeatureNames::cipic(),
    };

    let dataset = load_dataset(&PathBuf::from(&positional[0]))?;
    let table = AnthropometricTable::from_json_file(&PathBuf::from(&positional[1]))?;
    eprintln!(
        "Loaded {} subjects ({} files failed), {} anthropometric rows",
        dataset.subjects.len(),
        dataset.failures.len(),
        table.len()
    );

    let report = analyze_dataset(dataset, &table, &names, &config)?;

    let rendered = if json {
        JsonRenderer.render(&report)?
    } else {
        TextRenderer { verbose }.render(&report)?
    };
    print!("{}", rendered);

    Ok(())
}
