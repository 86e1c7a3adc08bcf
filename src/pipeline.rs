//! Pipeline drivers for the two batch stages.
//!
//! The ETL stage and the analysis stage never share a session: the ETL
//! stage ends by exporting every table to the store, and the analysis
//! stage starts from a fresh session that sees only the persisted files.

use anyhow::{Context, Result};
use std::path::Path;

use crate::aggregate;
use crate::dimension;
use crate::fact;
use crate::loader::{self, SupplementSpec, STAGE_TABLE};
use crate::schema;
use crate::store::{self, Session, StoreLayout, FACT_TABLE};

#[derive(Debug)]
pub struct EtlSummary {
    pub source_rows: u64,
    pub dimensions: Vec<(&'static str, u64)>,
    pub fact_rows: u64,
}

/// Full ETL stage: load, enrich, build dimensions, assemble the fact table,
/// export the star schema to the store.
pub fn run_etl(
    primary: &Path,
    supplements: &[SupplementSpec],
    layout: &StoreLayout,
) -> Result<EtlSummary> {
    let session = Session::open()?;

    let source_rows = loader::load_csv(&session, STAGE_TABLE, primary)
        .with_context(|| format!("Failed to load primary catalog {:?}", primary))?;
    for supp in supplements {
        loader::enrich(&session, STAGE_TABLE, supp)
            .with_context(|| format!("Failed to join supplementary catalog {:?}", supp.path))?;
    }
    loader::check_columns(&session, STAGE_TABLE, &schema::required_source_columns())?;

    let dimensions = dimension::build_all(&session, STAGE_TABLE)?;
    let fact_rows = fact::assemble(&session, STAGE_TABLE)?;

    store::export_table(&session, FACT_TABLE, &layout.fact_path())?;
    for dim in schema::DIMENSIONS {
        store::export_table(&session, dim.table, &layout.dimension_path(dim.table))?;
    }

    Ok(EtlSummary {
        source_rows,
        dimensions,
        fact_rows,
    })
}

/// Analysis stage: re-open the persisted star schema as read-only views in
/// a fresh session and produce every aggregate under `results/`.
pub fn run_analysis(layout: &StoreLayout) -> Result<Vec<(&'static str, u64)>> {
    let session = Session::open()?;
    store::import_views(&session, layout)?;
    aggregate::run_all(&session, layout)
}
