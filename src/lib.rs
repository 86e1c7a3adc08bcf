pub mod aggregate;
pub mod category;
pub mod cli;
pub mod dimension;
pub mod fact;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod store;

pub use cli::{Cli, Commands};
pub use pipeline::{run_analysis, run_etl, EtlSummary};
