// Contest Split - Core Library
// Institution identity resolution for competition result sheets, exposed for
// the CLI and for tests

pub mod error;
pub mod config;
pub mod records;        // Upstream validation boundary
pub mod cleaning;
pub mod similarity;     // Fuzzy name scoring
pub mod entities;       // Canonical institutions + registry
pub mod resolver;       // Greedy single-pass clustering
pub mod projection;
pub mod statistics;
pub mod db;
pub mod export;
pub mod pipeline;

// Re-export commonly used types
pub use error::{Error, Result};
pub use config::{SplitConfig, DEFAULT_ID_BASE, DEFAULT_THRESHOLD};
pub use records::{
    load_csv, read_records,
    CsvRow, RawRecord, ResolvedTeamRecord, REQUIRED_COLUMNS,
};
pub use cleaning::{clean_record, clean_records};
pub use similarity::{
    normalize, token_set_ratio, token_set_score, token_sort_ratio,
    ScorerKind, SimilarityScorer,
};
pub use entities::{CanonicalInstitution, InstitutionRegistry, Location};
pub use resolver::{ClusterAssignment, InstitutionResolver};
pub use projection::{project, InstitutionRow, Tables, TeamRow};
pub use statistics::{
    average_teams_per_institution, outstanding_institutions, outstanding_teams,
    summarize, top_institutions, us_meritorious_or_better,
    CountryTeamRow, Ranking, StatisticsReport, TopInstitutionRow,
};
pub use export::{write_outputs, ExportOptions, RunManifest};
pub use pipeline::{run_file, run_records, RunOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
