use anyhow::Result;
use exoplanet_mart::{
    aggregate::aggregate_names,
    cli::{Cli, Commands},
    loader::SupplementSpec,
    pipeline::{run_analysis, run_etl},
    schema::dimension_names,
    store::StoreLayout,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Etl {
            primary,
            supplements,
            out,
        } => {
            etl_stage(&primary, supplements, &StoreLayout::new(out))?;
        }

        Commands::Analyze { store } => {
            analysis_stage(&StoreLayout::new(store))?;
        }

        Commands::Run {
            primary,
            supplements,
            out,
        } => {
            let layout = StoreLayout::new(out);
            etl_stage(&primary, supplements, &layout)?;
            analysis_stage(&layout)?;
        }

        Commands::ListTables => {
            println!("Dimension tables:\n");
            for name in dimension_names() {
                println!("  {}", name);
            }
            println!("\nAggregate tables:\n");
            for name in aggregate_names() {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

fn etl_stage(primary: &Path, supplements: Vec<PathBuf>, layout: &StoreLayout) -> Result<()> {
    let start = Instant::now();
    let supplements: Vec<SupplementSpec> = supplements
        .into_iter()
        .map(SupplementSpec::publication_dates)
        .collect();

    println!("Building star schema...");
    let summary = run_etl(primary, &supplements, layout)?;

    for (name, count) in &summary.dimensions {
        println!("  {:30} {:>8} rows", name, count);
    }
    println!(
        "\nWrote {} fact rows ({} source rows) to {:?} in {:.1}s",
        summary.fact_rows,
        summary.source_rows,
        layout.root(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn analysis_stage(layout: &StoreLayout) -> Result<()> {
    let start = Instant::now();

    println!("Running aggregates...");
    let produced = run_analysis(layout)?;

    for (name, count) in &produced {
        println!("  {:45} {:>6} rows", name, count);
    }
    println!(
        "\nWrote {} aggregate tables under {:?} in {:.1}s",
        produced.len(),
        layout.root().join("results"),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
