// 📈 Statistics - downstream filters over the base tables
//
// Pure relational passes over Tables; none of them touch the registry.

use crate::projection::{InstitutionRow, Tables, TeamRow};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

// ============================================================================
// RANKING
// ============================================================================

/// Award categories, best first (derived ordering follows declaration order)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ranking {
    OutstandingWinner,
    Finalist,
    Meritorious,
    HonorableMention,
    SuccessfulParticipant,
    Unsuccessful,
    /// Anything unrecognised; ranks below every known category
    Other(String),
}

impl Ranking {
    /// Parse a free-form ranking cell, ignoring case and extra whitespace
    pub fn parse(value: &str) -> Self {
        let key = value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match key.as_str() {
            "outstanding winner" | "outstanding" => Ranking::OutstandingWinner,
            "finalist" => Ranking::Finalist,
            "meritorious" | "meritorious winner" => Ranking::Meritorious,
            "honorable mention" | "honourable mention" => Ranking::HonorableMention,
            "successful participant" => Ranking::SuccessfulParticipant,
            "unsuccessful" | "unsuccessful participant" => Ranking::Unsuccessful,
            _ => Ranking::Other(value.trim().to_string()),
        }
    }

    pub fn is_outstanding(&self) -> bool {
        *self == Ranking::OutstandingWinner
    }

    pub fn is_meritorious_or_better(&self) -> bool {
        *self <= Ranking::Meritorious
    }
}

/// Whether a country cell names the United States
pub fn is_united_states(country: &str) -> bool {
    let key = country.trim().replace('.', "").to_lowercase();
    matches!(
        key.as_str(),
        "usa" | "us" | "united states" | "united states of america"
    )
}

// ============================================================================
// OUTPUT ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopInstitutionRow {
    #[serde(rename = "Institution ID")]
    pub id: u32,

    #[serde(rename = "Number of Teams")]
    pub team_count: usize,

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
pub struct CountryTeamRow {
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

    #[serde(rename = "Country")]
    pub country: String,
}

// ============================================================================
// FILTERS
// ============================================================================

/// Team rows ranked Outstanding Winner, in input order
pub fn outstanding_teams(teams: &[TeamRow]) -> Vec<TeamRow> {
    teams
        .iter()
        .filter(|t| Ranking::parse(&t.ranking).is_outstanding())
        .cloned()
        .collect()
}

/// Institutions with at least one Outstanding team, sorted by name
pub fn outstanding_institutions(tables: &Tables) -> Vec<InstitutionRow> {
    let winners: HashSet<u32> = outstanding_teams(&tables.teams)
        .iter()
        .map(|t| t.institution_id)
        .collect();

    let mut rows: Vec<InstitutionRow> = tables
        .institutions
        .iter()
        .filter(|inst| winners.contains(&inst.id))
        .cloned()
        .collect();

    rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    rows
}

/// Institutions by team count, descending; ties by id
pub fn top_institutions(tables: &Tables, top_n: Option<usize>) -> Vec<TopInstitutionRow> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for team in &tables.teams {
        *counts.entry(team.institution_id).or_insert(0) += 1;
    }

    let mut rows: Vec<TopInstitutionRow> = tables
        .institutions
        .iter()
        .filter_map(|inst| {
            counts.get(&inst.id).map(|&team_count| TopInstitutionRow {
                id: inst.id,
                team_count,
                name: inst.name.clone(),
                city: inst.city.clone(),
                state: inst.state.clone(),
                country: inst.country.clone(),
            })
        })
        .collect();

    rows.sort_by(|a, b| b.team_count.cmp(&a.team_count).then(a.id.cmp(&b.id)));

    if let Some(n) = top_n {
        rows.truncate(n);
    }
    rows
}

/// US teams ranked Meritorious or better, in input order
pub fn us_meritorious_or_better(tables: &Tables) -> Vec<CountryTeamRow> {
    let countries: HashMap<u32, &str> = tables
        .institutions
        .iter()
        .map(|inst| (inst.id, inst.country.as_str()))
        .collect();

    tables
        .teams
        .iter()
        .filter_map(|team| {
            let country = countries.get(&team.institution_id)?;
            if !is_united_states(country) || !Ranking::parse(&team.ranking).is_meritorious_or_better() {
                return None;
            }
            Some(CountryTeamRow {
                institution_id: team.institution_id,
                team_number: team.team_number.clone(),
                advisor: team.advisor.clone(),
                problem: team.problem.clone(),
                ranking: team.ranking.clone(),
                country: country.to_string(),
            })
        })
        .collect()
}

/// Mean number of distinct team numbers per institution with teams, truncated
pub fn average_teams_per_institution(tables: &Tables) -> usize {
    let mut per_institution: HashMap<u32, HashSet<&str>> = HashMap::new();
    for team in &tables.teams {
        per_institution
            .entry(team.institution_id)
            .or_default()
            .insert(team.team_number.as_str());
    }

    if per_institution.is_empty() {
        return 0;
    }

    let total: usize = per_institution.values().map(HashSet::len).sum();
    total / per_institution.len()
}

// ============================================================================
// REPORT
// ============================================================================

/// Every statistic for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsReport {
    pub average_teams_per_institution: usize,
    pub top_institutions: Vec<TopInstitutionRow>,
    pub outstanding_institutions: Vec<InstitutionRow>,
    pub us_meritorious_or_better: Vec<CountryTeamRow>,
}

pub fn summarize(tables: &Tables, top_n: Option<usize>) -> StatisticsReport {
    let report = StatisticsReport {
        average_teams_per_institution: average_teams_per_institution(tables),
        top_institutions: top_institutions(tables, top_n),
        outstanding_institutions: outstanding_institutions(tables),
        us_meritorious_or_better: us_meritorious_or_better(tables),
    };

    debug!(
        average = report.average_teams_per_institution,
        outstanding = report.outstanding_institutions.len(),
        us_meritorious = report.us_meritorious_or_better.len(),
        "computed statistics"
    );

    report
}

// ============================================================================
// TESTS
// ============================================================================
