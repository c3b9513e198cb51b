// 📥 Records - typed rows and the upstream validation boundary
//
// A CSV row is loosely typed (any cell may be empty). A RawRecord is the
// validated form: every required attribute is present and the institution
// name is non-blank. The resolver only ever sees RawRecords.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Headers every input file must carry
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "Institution",
    "City",
    "State/Province",
    "Country",
    "Team Number",
    "Advisor",
    "Problem",
    "Ranking",
];

// ============================================================================
// CSV ROW (unvalidated)
// ============================================================================

/// One input row exactly as read; empty cells become None
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Institution")]
    pub institution: Option<String>,

    #[serde(rename = "City")]
    pub city: Option<String>,

    #[serde(rename = "State/Province")]
    pub state: Option<String>,

    #[serde(rename = "Country")]
    pub country: Option<String>,

    #[serde(rename = "Team Number")]
    pub team_number: Option<String>,

    #[serde(rename = "Advisor")]
    pub advisor: Option<String>,

    #[serde(rename = "Problem")]
    pub problem: Option<String>,

    #[serde(rename = "Ranking")]
    pub ranking: Option<String>,
}

// ============================================================================
// RAW RECORD (validated)
// ============================================================================

/// One team's participation, validated at the boundary
///
/// State/Province may be empty (it is filled in during cleaning); every
/// other attribute is guaranteed present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct RawRecord {
    /// 1-based line in the source file (0 when built in memory)
    pub line: u64,
    pub institution: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub team_number: String,
    pub advisor: String,
    pub problem: String,
    pub ranking: String,
}

fn required(value: Option<String>, line: u64, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::missing_field(line, field)),
    }
}

impl RawRecord {
    /// Validate a row, failing with MissingField on the first absent attribute
    pub fn from_row(line: u64, row: CsvRow) -> Result<Self> {
        Ok(RawRecord {
            line,
            institution: required(row.institution, line, "Institution")?,
            city: required(row.city, line, "City")?,
            state: row.state.unwrap_or_default(),
            country: required(row.country, line, "Country")?,
            team_number: required(row.team_number, line, "Team Number")?,
            advisor: required(row.advisor, line, "Advisor")?,
            problem: required(row.problem, line, "Problem")?,
            ranking: required(row.ranking, line, "Ranking")?,
        })
    }
}

// ============================================================================
// RESOLVED TEAM RECORD
// ============================================================================

/// A RawRecord annotated with the institution it resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTeamRecord {
    pub record: RawRecord,
    pub institution_id: u32,
}

// ============================================================================
// LOADING
// ============================================================================

/// Report any required header the input lacks
pub fn check_headers(headers: &csv::StringRecord) -> Result<()> {
    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    missing.sort();
    Err(Error::MissingColumns(missing))
}

fn map_csv_error(err: csv::Error) -> Error {
    if let csv::ErrorKind::Utf8 { pos, err: utf8 } = err.kind() {
        let line = pos.as_ref().map(|p| p.line()).unwrap_or(0);
        return Error::ScoreComparison(format!("line {} is not valid UTF-8: {}", line, utf8));
    }
    Error::Csv(err)
}

/// Read and validate every record from a CSV source
///
/// The whole stream is validated before anything is returned, so a bad
/// row aborts the run before any institution is resolved.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(map_csv_error)?.clone();
    check_headers(&headers)?;

    let mut records = Vec::new();

    for result in rdr.records() {
        let row = result.map_err(map_csv_error)?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let parsed: CsvRow = row.deserialize(Some(&headers))?;
        records.push(RawRecord::from_row(line, parsed)?);
    }

    debug!(count = records.len(), "validated input records");
    Ok(records)
}

/// Load and validate a CSV file
pub fn load_csv(csv_path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(csv_path)?;
    let records = read_records(file)?;
    info!(path = %csv_path.display(), records = records.len(), "loaded input");
    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================
