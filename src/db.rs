// 🗄️ SQLite export - "SQL ready" copy of the two base tables
//
// The database is an output artifact only: both tables are dropped and
// recreated on every run, nothing is ever read back into the resolver.
// Schema reset and inserts share one transaction, so a failed write leaves
// the previous contents in place.

use crate::error::Result;
use crate::projection::Tables;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

/// Drop and recreate both tables
///
/// Takes a plain connection so it can run on a `Transaction` (via deref).
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS teams;
         DROP TABLE IF EXISTS institutions;

         CREATE TABLE institutions (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            country TEXT NOT NULL
         );

         CREATE TABLE teams (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            institution_id INTEGER NOT NULL REFERENCES institutions(id),
            team_number TEXT NOT NULL,
            advisor TEXT NOT NULL,
            problem TEXT NOT NULL,
            ranking TEXT NOT NULL
         );

         CREATE INDEX idx_teams_institution ON teams(institution_id);",
    )?;

    Ok(())
}

fn insert_rows(conn: &Connection, tables: &Tables) -> Result<usize> {
    let mut inserted = 0;

    let mut stmt = conn.prepare(
        "INSERT INTO institutions (id, name, city, state, country) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for inst in &tables.institutions {
        inserted += stmt.execute(params![inst.id, inst.name, inst.city, inst.state, inst.country])?;
    }

    let mut stmt = conn.prepare(
        "INSERT INTO teams (institution_id, team_number, advisor, problem, ranking)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for team in &tables.teams {
        inserted += stmt.execute(params![
            team.institution_id,
            team.team_number,
            team.advisor,
            team.problem,
            team.ranking,
        ])?;
    }

    Ok(inserted)
}

/// Replace both tables in one transaction; returns rows written
pub fn write_tables(conn: &mut Connection, tables: &Tables) -> Result<usize> {
    // No effect inside a transaction, so set it first
    conn.pragma_update(None, "foreign_keys", "ON")?;

    let tx = conn.transaction()?;
    setup_database(&tx)?;
    let inserted = insert_rows(&tx, tables)?;
    tx.commit()?;

    Ok(inserted)
}

/// Row counts of (institutions, teams)
pub fn verify_counts(conn: &Connection) -> Result<(i64, i64)> {
    let institutions: i64 = conn.query_row("SELECT COUNT(*) FROM institutions", [], |row| row.get(0))?;
    let teams: i64 = conn.query_row("SELECT COUNT(*) FROM teams", [], |row| row.get(0))?;
    Ok((institutions, teams))
}

/// Write the base tables to a SQLite file
///
/// Uses the default rollback journal: once the connection closes the file
/// is self-contained and can be renamed into place.
pub fn export_sqlite(db_path: &Path, tables: &Tables) -> Result<()> {
    let mut conn = Connection::open(db_path)?;
    let inserted = write_tables(&mut conn, tables)?;

    info!(path = %db_path.display(), rows = inserted, "wrote SQLite export");
    Ok(())
}
