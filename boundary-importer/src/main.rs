use std::sync::Arc;

use boundary_importer::{Dependencies, RunError};
use boundary_importer_pipeline::export::export_coordinates;
use boundary_importer_pipeline::orchestrator::Orchestrator;
use boundary_importer_pipeline::reader::LayerCollections;
use boundary_importer_pipeline::verifier::Verifier;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the boundary importer application.
///
/// Initializes dotenv and tracing, sets up application dependencies, reads
/// the boundary layers, runs the import top-down, verifies the stored
/// tables, and writes the coordinate export when configured.
///
/// # Returns
///
/// A `Result` indicating success or a `RunError` if an error occurs during
/// initialization or execution.
#[tokio::main]
async fn main() -> Result<(), RunError> {
    dotenv().ok();
    init_tracing();

    let dependencies = Dependencies::new();

    let layers = LayerCollections::read(&dependencies.plan)?;
    info!(
        divisions = layers.divisions.len(),
        ranges = layers.ranges.len(),
        beats = layers.beats.len(),
        "boundary layers loaded"
    );

    let orchestrator = Orchestrator::new(dependencies.store.clone());
    let summary = orchestrator
        .run_import(&dependencies.plan, &layers)
        .await?;
    for report in summary.reports() {
        info!(
            level = %report.level,
            created = report.created,
            updated = report.updated,
            polygons = report.polygons,
            skipped = report.resolution_failures.len(),
            write_errors = report.write_errors,
            "layer import finished"
        );
        for failure in &report.resolution_failures {
            warn!(failure = %failure, "feature skipped during import");
        }
    }

    let verifier = Verifier::new(dependencies.store.clone());
    let report = verifier.verify(&dependencies.plan, &layers).await?;
    if report.passed() {
        info!("all integrity checks passed");
    } else {
        for table in &report.tables {
            for violation in &table.violations {
                error!(table = %table.table, violation = %violation, "integrity violation");
            }
        }
        error!(
            violations = report.violation_count(),
            "verification finished with violations"
        );
    }

    if let Some(path) = &dependencies.coordinates_out {
        export_coordinates(&layers, path)?;
    }

    info!("import run finished");
    Ok(())
}

fn init_tracing() {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "boundary_importer=info,boundary_importer_pipeline=info".into()
        }),
    );
    let console = tracing_subscriber::fmt::layer().with_target(true);

    // Mirror every log line into import.log next to the console output.
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("import.log")
    {
        Ok(file) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file));
            registry.with(console).with(file_layer).init();
        }
        Err(open_error) => {
            registry.with(console).init();
            warn!(error = %open_error, "could not open import.log, logging to console only");
        }
    }
}
