// 🔄 Pipeline - one complete run
//
// records → clean → resolve → project → statistics
//
// Nothing is written here; the caller decides whether to export. A run
// either returns every table or fails with the first error.

use crate::cleaning::clean_records;
use crate::config::SplitConfig;
use crate::error::Result;
use crate::projection::{project, Tables};
use crate::records::{load_csv, RawRecord};
use crate::resolver::{ClusterAssignment, InstitutionResolver};
use crate::statistics::{summarize, StatisticsReport};
use std::path::Path;
use tracing::info;

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub tables: Tables,
    pub statistics: StatisticsReport,
    pub assignments: Vec<ClusterAssignment>,
    pub record_count: usize,
}

/// Run over records already validated at the boundary
pub fn run_records(records: Vec<RawRecord>, config: &SplitConfig) -> Result<RunOutcome> {
    config.validate()?;

    let records = if config.clean_fields {
        clean_records(&records)
    } else {
        records
    };

    let mut resolver = InstitutionResolver::from_config(config);
    let resolved = resolver.resolve_all(&records)?;
    let (registry, assignments) = resolver.into_parts();

    let tables = project(&resolved, &registry)?;
    let statistics = summarize(&tables, config.top_n);

    info!(
        records = records.len(),
        institutions = tables.institutions.len(),
        "run complete"
    );

    Ok(RunOutcome {
        tables,
        statistics,
        assignments,
        record_count: records.len(),
    })
}

/// Load, validate and run a CSV file
pub fn run_file(input: &Path, config: &SplitConfig) -> Result<RunOutcome> {
    let records = load_csv(input)?;
    run_records(records, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::records::read_records;

    const HEADER: &str =
        "Institution,City,State/Province,Country,Team Number,Advisor,Problem,Ranking\n";

    #[test]
    fn test_run_cleans_before_resolving() {
        let data = format!(
            "{}MIT,cambridge,ma,USA,1,Smith,a,OUTSTANDING WINNER\n\
             M.I.T.,Cambridge,MA,USA,2,Jones,b,meritorious\n",
            HEADER
        );
        let records = read_records(data.as_bytes()).unwrap();

        let outcome = run_records(records, &SplitConfig::default()).unwrap();

        assert_eq!(outcome.tables.institutions.len(), 1);
        let inst = &outcome.tables.institutions[0];
        assert_eq!(inst.name, "MIT");
        assert_eq!(inst.city, "Cambridge");
        assert_eq!(inst.state, "Massachusetts");
        assert_eq!(outcome.tables.teams[0].ranking, "Outstanding winner");
        assert_eq!(outcome.statistics.outstanding_institutions.len(), 1);
    }

    #[test]
    fn test_run_without_cleaning_keeps_raw_values() {
        let data = format!("{}MIT,cambridge,ma,USA,1,Smith,a,meritorious\n", HEADER);
        let records = read_records(data.as_bytes()).unwrap();
        let config = SplitConfig {
            clean_fields: false,
            ..SplitConfig::default()
        };

        let outcome = run_records(records, &config).unwrap();

        assert_eq!(outcome.tables.institutions[0].state, "ma");
        assert_eq!(outcome.tables.teams[0].ranking, "meritorious");
    }

    #[test]
    fn test_invalid_config_fails_before_resolution() {
        let config = SplitConfig {
            threshold: 150,
            ..SplitConfig::default()
        };
        assert!(run_records(Vec::new(), &config).is_err());
    }

    #[test]
    fn test_empty_input() {
        let outcome = run_records(Vec::new(), &SplitConfig::default()).unwrap();

        assert!(outcome.tables.institutions.is_empty());
        assert!(outcome.tables.teams.is_empty());
        assert_eq!(outcome.record_count, 0);
    }

    #[test]
    fn test_id_base_without_room_fails_cleanly() {
        let data = format!(
            "{}MIT,Cambridge,MA,USA,1,Smith,A,Meritorious\n\
             Harvard,Cambridge,MA,USA,2,Jones,A,Meritorious\n",
            HEADER
        );
        let records = read_records(data.as_bytes()).unwrap();
        let config = SplitConfig {
            id_base: u32::MAX,
            ..SplitConfig::default()
        };

        assert!(matches!(run_records(records, &config), Err(Error::Config(_))));
    }
}
