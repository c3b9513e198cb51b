// 💾 Export - CSV tables, optional SQLite copy, run manifest
//
// All files, the SQLite copy included, are staged as "<name>.tmp" first and
// only renamed into place once every one of them has been written. A failed
// run leaves no file under its final name and no staged file behind.

use crate::config::SplitConfig;
use crate::db;
use crate::error::Result;
use crate::pipeline::RunOutcome;
use crate::projection::{InstitutionRow, Tables, TeamRow};
use crate::resolver::ClusterAssignment;
use crate::similarity::ScorerKind;
use crate::statistics::{CountryTeamRow, TopInstitutionRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const INSTITUTIONS_FILE: &str = "Institutions.csv";
pub const TEAMS_FILE: &str = "Teams.csv";
pub const OUTSTANDING_FILE: &str = "Outstanding_Institutions.csv";
pub const TOP_INSTITUTIONS_FILE: &str = "Top_Institutions.csv";
pub const US_MERITORIOUS_FILE: &str = "US_Teams_Meritorious_or_Better.csv";
pub const CLUSTERS_FILE: &str = "Clusters.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

// ============================================================================
// CSV HEADERS
// ============================================================================

/// Header row for a CSV table, written even when the table is empty
pub trait CsvTable: Serialize {
    const HEADERS: &'static [&'static str];
}

impl CsvTable for InstitutionRow {
    const HEADERS: &'static [&'static str] =
        &["Institution ID", "Institution Name", "City", "State/Province", "Country"];
}

impl CsvTable for TeamRow {
    const HEADERS: &'static [&'static str] =
        &["Institution ID", "Team Number", "Advisor", "Problem", "Ranking"];
}

impl CsvTable for TopInstitutionRow {
    const HEADERS: &'static [&'static str] = &[
        "Institution ID",
        "Number of Teams",
        "Institution Name",
        "City",
        "State/Province",
        "Country",
    ];
}

impl CsvTable for CountryTeamRow {
    const HEADERS: &'static [&'static str] =
        &["Institution ID", "Team Number", "Advisor", "Problem", "Ranking", "Country"];
}

impl CsvTable for ClusterAssignment {
    const HEADERS: &'static [&'static str] = &["Raw Name", "Institution ID", "Best Score", "Created"];
}

// ============================================================================
// RUN MANIFEST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_path: Option<String>,

    /// SHA-256 of the input file, hex encoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_sha256: Option<String>,

    pub threshold: u8,
    pub scorer: ScorerKind,
    pub id_base: u32,
    pub record_count: usize,
    pub institution_count: usize,
    pub average_teams_per_institution: usize,
    pub files: Vec<String>,
}

/// Hex SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// STAGED WRITER
// ============================================================================

/// Files written under temporary names, committed together
struct StagedOutput {
    dir: PathBuf,
    staged: Vec<(PathBuf, PathBuf)>,
}

impl StagedOutput {
    fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(StagedOutput {
            dir: dir.to_path_buf(),
            staged: Vec::new(),
        })
    }

    fn paths(&self, file_name: &str) -> (PathBuf, PathBuf) {
        let target = self.dir.join(file_name);
        (staging_path(&target), target)
    }

    fn write_csv<T: CsvTable>(&mut self, file_name: &str, rows: &[T]) -> Result<()> {
        let (tmp, target) = self.paths(file_name);
        self.staged.push((tmp.clone(), target));

        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(&tmp)?;
        wtr.write_record(T::HEADERS)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_json<T: Serialize>(&mut self, file_name: &str, value: &T) -> Result<()> {
        let (tmp, target) = self.paths(file_name);
        self.staged.push((tmp.clone(), target));

        let json = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, json)?;
        Ok(())
    }

    /// Build the SQLite copy next to its target, which may lie outside the output directory
    fn stage_sqlite(&mut self, target: &Path, tables: &Tables) -> Result<()> {
        let tmp = staging_path(target);
        if tmp.exists() {
            // Leftover from an interrupted run
            fs::remove_file(&tmp)?;
        }
        self.staged.push((tmp.clone(), target.to_path_buf()));

        db::export_sqlite(&tmp, tables)
    }

    fn file_names(&self) -> Vec<String> {
        self.staged
            .iter()
            .filter_map(|(_, target)| target.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }

    /// Rename every staged file into place
    ///
    /// Stops at the first failed rename and removes the staged files that
    /// were not renamed yet.
    fn commit(mut self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.staged.len());
        let staged = std::mem::take(&mut self.staged);

        for (i, (tmp, target)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, target) {
                warn!(path = %target.display(), error = %e, "rename failed, discarding the rest");
                self.staged = staged[i..].to_vec();
                self.discard();
                return Err(e.into());
            }
            written.push(target.clone());
        }

        Ok(written)
    }

    fn discard(self) {
        for (tmp, _) in &self.staged {
            if tmp.exists() {
                if let Err(e) = fs::remove_file(tmp) {
                    warn!(path = %tmp.display(), error = %e, "failed to remove staged file");
                }
            }
        }
    }
}

/// "<path>.tmp" next to the final path
fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

// ============================================================================
// EXPORT
// ============================================================================

/// Where and what to write
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    pub sqlite_path: Option<PathBuf>,

    /// Source file, hashed into the manifest when present
    pub input_path: Option<PathBuf>,
}

impl ExportOptions {
    pub fn new<P: Into<PathBuf>>(out_dir: P) -> Self {
        ExportOptions {
            out_dir: out_dir.into(),
            sqlite_path: None,
            input_path: None,
        }
    }
}

fn stage_all(
    staged: &mut StagedOutput,
    outcome: &RunOutcome,
    config: &SplitConfig,
    options: &ExportOptions,
) -> Result<()> {
    let stats = &outcome.statistics;

    staged.write_csv(INSTITUTIONS_FILE, &outcome.tables.institutions)?;
    staged.write_csv(TEAMS_FILE, &outcome.tables.teams)?;
    staged.write_csv(OUTSTANDING_FILE, &stats.outstanding_institutions)?;
    staged.write_csv(TOP_INSTITUTIONS_FILE, &stats.top_institutions)?;
    staged.write_csv(US_MERITORIOUS_FILE, &stats.us_meritorious_or_better)?;

    if config.write_clusters {
        staged.write_csv(CLUSTERS_FILE, &outcome.assignments)?;
    }

    let input_sha256 = match &options.input_path {
        Some(path) => Some(sha256_file(path)?),
        None => None,
    };

    let mut files = staged.file_names();
    files.push(MANIFEST_FILE.to_string());

    let manifest = RunManifest {
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: Utc::now(),
        input_path: options.input_path.as_ref().map(|p| p.display().to_string()),
        input_sha256,
        threshold: config.threshold,
        scorer: config.scorer,
        id_base: config.id_base,
        record_count: outcome.record_count,
        institution_count: outcome.tables.institutions.len(),
        average_teams_per_institution: stats.average_teams_per_institution,
        files,
    };
    staged.write_json(MANIFEST_FILE, &manifest)?;

    // Last, so the manifest only lists the files in the output directory
    if let Some(db_path) = &options.sqlite_path {
        staged.stage_sqlite(db_path, &outcome.tables)?;
    }

    Ok(())
}

/// Write every output of a run; returns the final paths of the files written,
/// the SQLite copy last when one was requested
pub fn write_outputs(
    outcome: &RunOutcome,
    config: &SplitConfig,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>> {
    let mut staged = StagedOutput::new(&options.out_dir)?;

    if let Err(e) = stage_all(&mut staged, outcome, config, options) {
        staged.discard();
        return Err(e);
    }

    let written = staged.commit()?;
    info!(dir = %options.out_dir.display(), files = written.len(), "wrote outputs");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::summarize;
    use std::io::Write;

    fn tables() -> Tables {
        Tables {
            institutions: vec![InstitutionRow {
                id: 1,
                name: "MIT".to_string(),
                city: "Cambridge".to_string(),
                state: "Massachusetts".to_string(),
                country: "USA".to_string(),
            }],
            teams: vec![TeamRow {
                institution_id: 1,
                team_number: "1001".to_string(),
                advisor: "Smith".to_string(),
                problem: "A".to_string(),
                ranking: "Meritorious".to_string(),
            }],
        }
    }

    fn outcome(tables: Tables) -> RunOutcome {
        RunOutcome {
            statistics: summarize(&tables, None),
            record_count: tables.teams.len(),
            assignments: Vec::new(),
            tables,
        }
    }

    fn tmp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "tmp"))
            .collect()
    }

    #[test]
    fn test_sha256_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        assert_eq!(
            sha256_file(file.path()).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut staged = StagedOutput::new(dir.path()).unwrap();

        staged.write_csv::<TeamRow>(TEAMS_FILE, &[]).unwrap();
        let written = staged.commit().unwrap();

        let content = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content, "Institution ID,Team Number,Advisor,Problem,Ranking\n");
        assert!(!dir.path().join("Teams.csv.tmp").exists());
    }

    #[test]
    fn test_discard_removes_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut staged = StagedOutput::new(dir.path()).unwrap();

        staged.write_csv::<TeamRow>(TEAMS_FILE, &[]).unwrap();
        staged.discard();

        assert!(!dir.path().join("Teams.csv.tmp").exists());
        assert!(!dir.path().join("Teams.csv").exists());
    }

    #[test]
    fn test_cluster_rows_serialize_in_header_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut staged = StagedOutput::new(dir.path()).unwrap();

        let rows = vec![
            ClusterAssignment {
                raw_name: "MIT".to_string(),
                institution_id: 1,
                best_score: None,
                created: true,
            },
            ClusterAssignment {
                raw_name: "M.I.T.".to_string(),
                institution_id: 1,
                best_score: Some(100),
                created: false,
            },
        ];
        staged.write_csv(CLUSTERS_FILE, &rows).unwrap();
        staged.commit().unwrap();

        let content = fs::read_to_string(dir.path().join(CLUSTERS_FILE)).unwrap();
        assert_eq!(
            content,
            "Raw Name,Institution ID,Best Score,Created\nMIT,1,,true\nM.I.T.,1,100,false\n"
        );
    }

    #[test]
    fn test_failed_rename_cleans_up_remaining_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory squatting on the target name blocks the rename
        fs::create_dir(dir.path().join(TEAMS_FILE)).unwrap();
        fs::write(dir.path().join(TEAMS_FILE).join("keep"), "x").unwrap();

        let mut staged = StagedOutput::new(dir.path()).unwrap();
        staged.write_csv::<TeamRow>(TEAMS_FILE, &[]).unwrap();
        staged.write_csv::<InstitutionRow>(INSTITUTIONS_FILE, &[]).unwrap();

        assert!(staged.commit().is_err());
        assert!(!dir.path().join(INSTITUTIONS_FILE).exists());
        assert!(tmp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_sqlite_failure_keeps_previous_database_and_writes_no_csv() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("results");
        let db_path = dir.path().join("results.db");
        db::export_sqlite(&db_path, &tables()).unwrap();

        let mut bad = tables();
        bad.teams[0].institution_id = 99;
        let options = ExportOptions {
            out_dir: out_dir.clone(),
            sqlite_path: Some(db_path.clone()),
            input_path: None,
        };

        assert!(write_outputs(&outcome(bad), &SplitConfig::default(), &options).is_err());

        let conn = rusqlite::Connection::open(&db_path).unwrap();
        assert_eq!(db::verify_counts(&conn).unwrap(), (1, 1));
        assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0);
        assert!(tmp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_sqlite_is_committed_with_the_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("results.db");
        let options = ExportOptions {
            out_dir: dir.path().join("results"),
            sqlite_path: Some(db_path.clone()),
            input_path: None,
        };

        let written = write_outputs(&outcome(tables()), &SplitConfig::default(), &options).unwrap();

        assert_eq!(written.last(), Some(&db_path));
        assert!(!dir.path().join("results.db.tmp").exists());
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        assert_eq!(db::verify_counts(&conn).unwrap(), (1, 1));
    }
}
