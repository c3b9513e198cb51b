// 🧹 Field Cleaning - normalize free-text columns before resolution
//
// - Every field is trimmed
// - State/Province: empty → "Unknown", "MA" → "Massachusetts"
// - City, Problem, Ranking: "OUTSTANDING WINNER" → "Outstanding winner"
// - Institution, Advisor, Country: trimmed only (the first-seen institution
//   spelling stays canonical)

use crate::records::RawRecord;

/// Placeholder for a missing state/province
pub const UNKNOWN_STATE: &str = "Unknown";

const STATE_ABBREVIATIONS: [(&str, &str); 50] = [
    ("AL", "Alabama"), ("AK", "Alaska"), ("AZ", "Arizona"), ("AR", "Arkansas"),
    ("CA", "California"), ("CO", "Colorado"), ("CT", "Connecticut"), ("DE", "Delaware"),
    ("FL", "Florida"), ("GA", "Georgia"), ("HI", "Hawaii"), ("ID", "Idaho"),
    ("IL", "Illinois"), ("IN", "Indiana"), ("IA", "Iowa"), ("KS", "Kansas"),
    ("KY", "Kentucky"), ("LA", "Louisiana"), ("ME", "Maine"), ("MD", "Maryland"),
    ("MA", "Massachusetts"), ("MI", "Michigan"), ("MN", "Minnesota"), ("MS", "Mississippi"),
    ("MO", "Missouri"), ("MT", "Montana"), ("NE", "Nebraska"), ("NV", "Nevada"),
    ("NH", "New Hampshire"), ("NJ", "New Jersey"), ("NM", "New Mexico"), ("NY", "New York"),
    ("NC", "North Carolina"), ("ND", "North Dakota"), ("OH", "Ohio"), ("OK", "Oklahoma"),
    ("OR", "Oregon"), ("PA", "Pennsylvania"), ("RI", "Rhode Island"), ("SC", "South Carolina"),
    ("SD", "South Dakota"), ("TN", "Tennessee"), ("TX", "Texas"), ("UT", "Utah"),
    ("VT", "Vermont"), ("VA", "Virginia"), ("WA", "Washington"), ("WV", "West Virginia"),
    ("WI", "Wisconsin"), ("WY", "Wyoming"),
];

/// Expand a two-letter US state code; anything else comes back trimmed
pub fn expand_state(state: &str) -> String {
    let trimmed = state.trim();

    if trimmed.is_empty() {
        return UNKNOWN_STATE.to_string();
    }

    if trimmed.chars().count() == 2 {
        let upper = trimmed.to_uppercase();
        if let Some((_, full)) = STATE_ABBREVIATIONS.iter().find(|(code, _)| *code == upper) {
            return full.to_string();
        }
    }

    trimmed.to_string()
}

/// First character uppercase, the rest lowercase
pub fn capitalize(value: &str) -> String {
    let mut chars = value.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Produce the cleaned copy of a record
pub fn clean_record(record: &RawRecord) -> RawRecord {
    RawRecord {
        line: record.line,
        institution: record.institution.trim().to_string(),
        city: capitalize(&record.city),
        state: expand_state(&record.state),
        country: record.country.trim().to_string(),
        team_number: record.team_number.trim().to_string(),
        advisor: record.advisor.trim().to_string(),
        problem: capitalize(&record.problem),
        ranking: capitalize(&record.ranking),
    }
}

/// Clean every record, preserving order
pub fn clean_records(records: &[RawRecord]) -> Vec<RawRecord> {
    records.iter().map(clean_record).collect()
}

// ============================================================================
// TESTS
// ============================================================================
