// 🔗 Institution Resolver - greedy single-pass identity resolution
//
// Each incoming name is scored against every institution registered so far.
// Best score >= threshold → join that institution; otherwise mint a new one.
//
// The pass is order-dependent on purpose: earlier records fix the canonical
// spelling, and identical input order always yields identical ids.

use crate::config::SplitConfig;
use crate::entities::{InstitutionRegistry, Location};
use crate::error::Result;
use crate::records::{RawRecord, ResolvedTeamRecord};
use crate::similarity::{ScorerKind, SimilarityScorer};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

// ============================================================================
// CLUSTER ASSIGNMENT
// ============================================================================

/// How one distinct raw spelling was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    /// Spelling as it appeared in the input
    pub raw_name: String,

    pub institution_id: u32,

    /// Best score against the registry at resolution time (None if it was empty)
    pub best_score: Option<u8>,

    /// True if this spelling minted a new institution
    pub created: bool,
}

// ============================================================================
// INSTITUTION RESOLVER
// ============================================================================

pub struct InstitutionResolver<S = ScorerKind> {
    registry: InstitutionRegistry,
    scorer: S,

    /// Inclusive merge threshold (0-100)
    threshold: u8,

    /// Exact raw spelling → id, so repeated names never re-cluster
    seen: HashMap<String, u32>,

    /// One entry per distinct raw spelling, in first-seen order
    assignments: Vec<ClusterAssignment>,
}

impl InstitutionResolver<ScorerKind> {
    /// Build a resolver from run configuration
    pub fn from_config(config: &SplitConfig) -> Self {
        InstitutionResolver::new(config.scorer, config.threshold, config.id_base)
    }
}

impl<S: SimilarityScorer> InstitutionResolver<S> {
    /// Create a resolver with an empty registry
    pub fn new(scorer: S, threshold: u8, id_base: u32) -> Self {
        InstitutionResolver {
            registry: InstitutionRegistry::with_id_base(id_base),
            scorer,
            threshold,
            seen: HashMap::new(),
            assignments: Vec::new(),
        }
    }

    /// Highest-scoring registered institution for a name
    ///
    /// Ties keep the earliest entry (registry insertion order).
    fn best_match(&self, name: &str) -> Option<(u32, u8)> {
        let mut best: Option<(u32, u8)> = None;

        for institution in self.registry.iter() {
            let score = self.scorer.score(name, &institution.name);

            if best.map_or(true, |(_, top)| score > top) {
                best = Some((institution.id, score));
            }

            // Nothing can beat a perfect score
            if score == 100 {
                break;
            }
        }

        best
    }

    /// Resolve one raw institution name to an id
    ///
    /// The location is only used if a new institution is created. Fails
    /// only when the registry has no id left to mint.
    pub fn resolve_name(&mut self, name: &str, location: Location<'_>) -> Result<u32> {
        if let Some(&id) = self.seen.get(name) {
            return Ok(id);
        }

        let best = self.best_match(name);

        let (id, created) = match best {
            Some((id, score)) if score >= self.threshold => {
                debug!(
                    raw = name,
                    canonical = self.registry.name_of(id).unwrap_or_default(),
                    id,
                    score,
                    "merged into existing institution"
                );
                (id, false)
            }
            _ => {
                let id = self.registry.add(name, location)?;
                debug!(
                    name,
                    id,
                    best_score = best.map(|(_, s)| s),
                    "created institution"
                );
                (id, true)
            }
        };

        self.seen.insert(name.to_string(), id);
        self.assignments.push(ClusterAssignment {
            raw_name: name.to_string(),
            institution_id: id,
            best_score: best.map(|(_, score)| score),
            created,
        });

        Ok(id)
    }

    /// Resolve a validated record
    pub fn resolve(&mut self, record: &RawRecord) -> Result<u32> {
        let location = Location {
            city: &record.city,
            state: &record.state,
            country: &record.country,
        };
        self.resolve_name(&record.institution, location)
    }

    /// Resolve every record in input order
    pub fn resolve_all(&mut self, records: &[RawRecord]) -> Result<Vec<ResolvedTeamRecord>> {
        let resolved = records
            .iter()
            .map(|record| {
                Ok(ResolvedTeamRecord {
                    institution_id: self.resolve(record)?,
                    record: record.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            records = resolved.len(),
            spellings = self.assignments.len(),
            institutions = self.registry.len(),
            threshold = self.threshold,
            "resolved institutions"
        );

        Ok(resolved)
    }

    pub fn registry(&self) -> &InstitutionRegistry {
        &self.registry
    }

    pub fn assignments(&self) -> &[ClusterAssignment] {
        &self.assignments
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Finish the pass, handing out the registry read-only from here on
    pub fn into_parts(self) -> (InstitutionRegistry, Vec<ClusterAssignment>) {
        (self.registry, self.assignments)
    }
}

// ============================================================================
// TESTS
// ============================================================================
