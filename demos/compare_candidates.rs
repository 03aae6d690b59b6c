//! Compare Candidates Example
//!
//! Scores a generated composite and any number of corrected alternates
//! against the scene they were composited into, then prints the report.
//!
//! Run with: cargo run --example compare_candidates -- <scene> <mask> <original> [name=path ...]

use composite_qa::{
    Candidate, ComparisonRequest, MetricSet, QualityAssessor,
    error::Result,
    pipeline::{CorrectionPipeline, CorrectionRequest, PipelineConfig, providers::SaturationBoost},
    report::ComparisonReport,
};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        println!("Composite QA - Compare Candidates Example");
        println!("=========================================");
        println!();
        println!("Usage: {} <scene> <mask> <original> [name=path ...]", args[0]);
        println!();
        println!("Arguments:");
        println!("  scene      - Background the subject was composited into");
        println!("  mask       - Subject mask (white = subject)");
        println!("  original   - The generated composite");
        println!("  name=path  - Optional corrected alternates");
        println!();
        println!("Without alternates a saturation-boost correction is run instead and");
        println!("the report is written to ./output/correction_comparison.json.");
        return Ok(());
    }

    for path in &args[1..4] {
        if !Path::new(path).exists() {
            eprintln!("Error: image file '{}' not found", path);
            std::process::exit(1);
        }
    }

    println!("Loading images...");
    let scene = image::open(&args[1])?;
    let mask = image::open(&args[2])?;
    let original = image::open(&args[3])?;
    println!("  ✓ Scene: {}x{} pixels", scene.width(), scene.height());
    println!();

    let assessor = QualityAssessor::new();

    let report = if args.len() > 4 {
        let mut request = ComparisonRequest::new(&scene, &mask, original);
        for arg in &args[4..] {
            let Some((name, path)) = arg.split_once('=') else {
                eprintln!("Skipping '{}': expected name=path", arg);
                continue;
            };
            let candidate = match image::open(path) {
                Ok(image) => Candidate::new(name, image),
                Err(err) => {
                    eprintln!("  ✗ {} could not be loaded: {}", name, err);
                    Candidate::unavailable(name)
                }
            };
            request = request.with_alternate(candidate);
        }
        assessor.compare(&request)?
    } else {
        let pipeline = CorrectionPipeline::new(assessor)
            .with_provider(SaturationBoost::default())
            .with_config(PipelineConfig {
                output_dir: Some(PathBuf::from("./output")),
                ..PipelineConfig::default()
            });
        let request = CorrectionRequest {
            background: &scene,
            mask: &mask,
            original: &original,
            prompt: "",
        };
        pipeline.run(&request, None, None)?
    };

    print_report(&report);
    Ok(())
}

fn print_report(report: &ComparisonReport) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("RESULTS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    for name in report.ranking() {
        let score = report.scores[name];
        println!("  {} (score {:.3})", name, score);
        if let Some(metrics) = report.results.get(name) {
            for field in MetricSet::NAMES {
                if let Some(value) = metrics.get(field) {
                    println!("     {:<20} {:.4}", field, value);
                }
            }
        }
        println!();
    }

    for (name, available) in &report.method_status {
        if !available {
            println!("  ✗ {} produced no image", name);
        }
    }

    println!("  Best method: {} (improvement {:+.3})", report.best_method, report.improvement);
    println!();
    println!("Recommendations:");
    for recommendation in &report.recommendations {
        println!("  • {}", recommendation);
    }
}
