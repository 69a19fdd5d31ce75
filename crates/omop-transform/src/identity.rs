//! Root identifier resolution.
//!
//! Every output record carries a `person_id` and a `visit_occurrence_id`. The
//! person identifier is taken from the first populated tier of a fixed chain:
//!
//! 1. the patient identifier column
//! 2. an alternate identifier such as the medical record number
//! 3. the encounter number, prefixed with `ENC_`
//! 4. a synthetic identifier unique within the run
//!
//! Resolution never fails.

use omop_model::{
    CaseInsensitiveSet, FieldMapping, IdentifierResolution, PersonIdSource, SourceRow,
};
use sha2::{Digest, Sha256};

use crate::row::first_present;

const PERSON_TABLE: &str = "person";
const PERSON_ID: &str = "person_id";
const VISIT_TABLE: &str = "visit_occurrence";
const VISIT_ID: &str = "visit_occurrence_id";

/// Source columns fulfilling each identifier role, in lookup order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierRoles {
    pub patient: Vec<String>,
    pub alternate: Vec<String>,
    pub encounter: Vec<String>,
}

impl Default for IdentifierRoles {
    fn default() -> Self {
        Self {
            patient: vec!["patient_id".to_string()],
            alternate: vec!["mrn".to_string(), "medical_record_number".to_string()],
            encounter: vec!["encntr_num".to_string(), "encounter_number".to_string()],
        }
    }
}

impl IdentifierRoles {
    /// Conventional roles extended with the columns the mapping binds to
    /// `person.person_id` and `visit_occurrence.visit_occurrence_id`.
    pub fn from_mapping(mapping: &FieldMapping) -> Self {
        let mut roles = Self::default();
        let mut known = CaseInsensitiveSet::new(
            roles
                .patient
                .iter()
                .chain(&roles.alternate)
                .chain(&roles.encounter),
        );
        for entry in mapping.sources_for(PERSON_TABLE, PERSON_ID) {
            if known.insert(&entry.source_column) {
                roles.patient.push(entry.source_column.clone());
            }
        }
        for entry in mapping.sources_for(VISIT_TABLE, VISIT_ID) {
            if known.insert(&entry.source_column) {
                roles.encounter.push(entry.source_column.clone());
            }
        }
        roles
    }
}

/// Run-scoped allocator for synthetic identifiers.
///
/// Identifiers take the form `SYN_<counter>_<hash8>`; the counter makes them
/// pairwise distinct within a run and the hash ties them to the row content.
#[derive(Debug, Clone, Default)]
pub struct SyntheticIds {
    /// Wider than any offset so that counting past `u64::MAX` cannot wrap.
    next: u128,
    issued: u64,
}

impl SyntheticIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting at `offset`, for runs partitioned across processes.
    pub fn with_offset(offset: u64) -> Self {
        Self {
            next: u128::from(offset),
            issued: 0,
        }
    }

    pub fn allocate(&mut self, row: &SourceRow) -> String {
        self.next += 1;
        self.issued += 1;
        format!("SYN_{}_{}", self.next, row_digest(row))
    }

    /// Number of identifiers allocated so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// First 8 hex digits of a SHA-256 over the row's sorted `key=value` lines.
fn row_digest(row: &SourceRow) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in row {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());
    digest[..8].to_string()
}

#[derive(Debug, Clone)]
pub struct IdentifierResolver {
    roles: IdentifierRoles,
}

impl IdentifierResolver {
    pub fn new(mapping: &FieldMapping) -> Self {
        Self {
            roles: IdentifierRoles::from_mapping(mapping),
        }
    }

    #[must_use]
    pub fn with_roles(mut self, roles: IdentifierRoles) -> Self {
        self.roles = roles;
        self
    }

    pub fn roles(&self) -> &IdentifierRoles {
        &self.roles
    }

    pub fn resolve(&self, row: &SourceRow, ids: &mut SyntheticIds) -> IdentifierResolution {
        let encounter = first_present(row, &self.roles.encounter);
        let mut synthetic: Option<String> = None;

        let (person_id, person_id_source) =
            if let Some(patient) = first_present(row, &self.roles.patient) {
                (patient.to_string(), PersonIdSource::PatientId)
            } else if let Some(alternate) = first_present(row, &self.roles.alternate) {
                (alternate.to_string(), PersonIdSource::Mrn)
            } else if let Some(encounter) = encounter {
                (format!("ENC_{encounter}"), PersonIdSource::EncounterFallback)
            } else {
                let id = ids.allocate(row);
                synthetic = Some(id.clone());
                (id, PersonIdSource::Synthetic)
            };

        let visit_occurrence_id = match (encounter, synthetic) {
            (Some(encounter), _) => encounter.to_string(),
            (None, Some(id)) => id,
            (None, None) => ids.allocate(row),
        };

        IdentifierResolution {
            person_id,
            visit_occurrence_id,
            person_id_source,
        }
    }
}

/// Resolve one row with roles derived from `mapping`.
pub fn resolve(
    row: &SourceRow,
    mapping: &FieldMapping,
    ids: &mut SyntheticIds,
) -> IdentifierResolution {
    IdentifierResolver::new(mapping).resolve(row, ids)
}
