use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use rotex_core::TrialRecord;
use rotex_experiment::{ExperimentSummary, export, stats};
use tracing::info;

use crate::cli::CommonArgs;

/// Writes the record log to `path`, as JSON if the extension is `.json`
/// and as CSV otherwise.
pub fn write_records(path: &Path, records: &[TrialRecord]) -> Result<()> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let json = export::to_json(records)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?;
    } else {
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        export::write_csv(records, BufWriter::new(file))
            .with_context(|| format!("writing {}", path.display()))?;
    }
    info!(path = %path.display(), records = records.len(), "records written");
    Ok(())
}

/// Writes the records `args` asks for, if it names an output file.
pub fn save(args: &CommonArgs, records: &[TrialRecord]) -> Result<()> {
    let Some(path) = &args.out else {
        return Ok(());
    };
    if args.errors_only {
        let errors: Vec<TrialRecord> = stats::errors(records).cloned().collect();
        write_records(path, &errors)
    } else {
        write_records(path, records)
    }
}

pub fn print_summary(summary: &ExperimentSummary) {
    println!("=== RESULTS ===");
    println!(
        "Overall: {} trials, {}% correct, mean RT {} ms ({} timeouts)",
        summary.overall.total,
        summary.overall.accuracy_pct,
        summary.overall.mean_rt_ms,
        summary.overall.timeouts
    );
    println!(
        "Formal stages: {} trials, {}% correct, mean RT {} ms",
        summary.formal.total, summary.formal.accuracy_pct, summary.formal.mean_rt_ms
    );
    println!("Mean RT by condition:");
    for (label, rt) in &summary.by_condition {
        println!("  {label:<7} {rt:>5} ms");
    }
    println!("Mean RT by angle:");
    for (label, curve) in &summary.by_angle {
        let points: Vec<String> = curve
            .iter()
            .map(|(angle, rt)| format!("{angle}°={rt}"))
            .collect();
        println!("  {label:<7} {}", points.join("  "));
    }
    println!(
        "Accuracy: normal {}%, mirror {}%",
        summary.by_version.normal_pct, summary.by_version.mirror_pct
    );
    println!("Duration: {} s", summary.duration_secs);
}
