// 📊 Relational Projector - the two base output tables
//
// institutions: (id, name, city, state, country)   registry order
// teams:        (institution_id, team number, ...) input order
//
// No deduplication or aggregation happens here; filters run on the result.

use crate::entities::InstitutionRegistry;
use crate::error::{Error, Result};
use crate::records::ResolvedTeamRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstitutionRow {
    #[serde(rename = "Institution ID")]
    pub id: u32,

    #[serde(rename = "Institution Name")]
    pub name: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "State/Province")]
    pub state: String,

    #[serde(rename = "Country")]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRow {
    #[serde(rename = "Institution ID")]
    pub institution_id: u32,

    #[serde(rename = "Team Number")]
    pub team_number: String,

    #[serde(rename = "Advisor")]
    pub advisor: String,

    #[serde(rename = "Problem")]
    pub problem: String,

    #[serde(rename = "Ranking")]
    pub ranking: String,
}

/// Both base tables of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    pub institutions: Vec<InstitutionRow>,
    pub teams: Vec<TeamRow>,
}

/// Join resolved records to the finalized registry
///
/// Fails with NotFound if a record points at an id the registry never
/// assigned.
pub fn project(resolved: &[ResolvedTeamRecord], registry: &InstitutionRegistry) -> Result<Tables> {
    let institutions = registry
        .iter()
        .map(|inst| InstitutionRow {
            id: inst.id,
            name: inst.name.clone(),
            city: inst.city.clone(),
            state: inst.state.clone(),
            country: inst.country.clone(),
        })
        .collect();

    let teams = resolved
        .iter()
        .map(|r| {
            if !registry.contains(r.institution_id) {
                return Err(Error::NotFound(r.institution_id));
            }
            Ok(TeamRow {
                institution_id: r.institution_id,
                team_number: r.record.team_number.clone(),
                advisor: r.record.advisor.clone(),
                problem: r.record.problem.clone(),
                ranking: r.record.ranking.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Tables { institutions, teams })
}

// ============================================================================
// TESTS
// ============================================================================
