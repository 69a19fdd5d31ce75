use std::fmt;

use serde::{Deserialize, Serialize};

/// Which tier of the fallback chain produced a row's person identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonIdSource {
    PatientId,
    Mrn,
    EncounterFallback,
    Synthetic,
}

impl PersonIdSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonIdSource::PatientId => "PATIENT_ID",
            PersonIdSource::Mrn => "MRN",
            PersonIdSource::EncounterFallback => "ENCOUNTER_FALLBACK",
            PersonIdSource::Synthetic => "SYNTHETIC",
        }
    }
}

impl fmt::Display for PersonIdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root identifiers assigned to one source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierResolution {
    pub person_id: String,
    pub visit_occurrence_id: String,
    pub person_id_source: PersonIdSource,
}
