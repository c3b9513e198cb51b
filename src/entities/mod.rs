// Entity Models
//
// Identity persists, values do not drift: an institution's id is minted once
// and every team row refers to it by that id for the rest of the run.

pub mod institution;

pub use institution::{CanonicalInstitution, InstitutionRegistry, Location};
