//! Abbreviated table names used in the mapping spreadsheet.
//!
//! Field hints such as `DADDiag.diag_cd` carry a short prefix instead of the
//! catalog table name. The alias table expands those prefixes into candidate
//! catalog names; candidates are tried in order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;
use crate::normalize::normalize_table_name;

const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    ("Admission", &["Admission / Discharge"]),
    ("DADAbs", &["DAD Abstract", "DAD Information"]),
    ("DADDiag", &["DAD Diagnosis"]),
    ("DADDx", &["DAD Diagnosis"]),
    ("DADInt", &["DAD Intervention"]),
    ("DADSCU", &["DAD Special Care Unit"]),
    ("Emerg", &["Emergency"]),
    ("Ord", &["Order"]),
    ("ActMedServ", &["Activity Med Service"]),
    ("ActNursUnit", &["Activity Nursing Unit"]),
    ("MedIm", &["Medical Imaging"]),
    ("Cens", &["Census"]),
    ("ClinEv", &["Clinical Event"]),
    ("Clinical", &["Clinical Event"]),
    ("Lab", &["Laboratory Result"]),
    ("Surg", &["Surgery Case Completed", "Surgery"]),
    ("Surgery", &["Surgery Case Completed"]),
    ("Readm", &["Readmission"]),
    ("PrevAdm", &["Previous Admission"]),
    ("DIM", &["DIM Clinical Event Code"]),
];

/// One alias or a list of candidate table names, as written in alias files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AliasTargets {
    One(String),
    Many(Vec<String>),
}

impl AliasTargets {
    fn into_vec(self) -> Vec<String> {
        match self {
            AliasTargets::One(name) => vec![name],
            AliasTargets::Many(names) => names,
        }
    }
}

#[derive(Debug, Clone)]
struct Alias {
    /// Normalized alias key.
    key: String,
    targets: Vec<String>,
}

/// Ordered alias table. Later insertions of the same alias replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct TableAliases {
    aliases: Vec<Alias>,
}

impl TableAliases {
    /// An alias table with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Abbreviations used by the IHID mapping spreadsheet.
    pub fn builtin() -> Self {
        let mut aliases = Self::empty();
        for (alias, targets) in DEFAULT_ALIASES {
            aliases.insert(alias, targets.iter().map(|t| (*t).to_string()).collect());
        }
        aliases
    }

    /// Parse a JSON object mapping aliases to a table name or a list of names.
    pub fn from_json_str(json: &str) -> Result<Self, RepositoryError> {
        let raw: BTreeMap<String, AliasTargets> =
            serde_json::from_str(json).map_err(RepositoryError::InvalidAliases)?;
        let mut aliases = Self::empty();
        for (alias, targets) in raw {
            aliases.insert(&alias, targets.into_vec());
        }
        Ok(aliases)
    }

    pub fn insert(&mut self, alias: &str, targets: Vec<String>) {
        let key = normalize_table_name(alias);
        if key.is_empty() {
            return;
        }
        match self.aliases.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.targets = targets,
            None => self.aliases.push(Alias { key, targets }),
        }
    }

    /// Overlay `other` on top of `self`; aliases present in both take `other`'s targets.
    #[must_use]
    pub fn merged(mut self, other: TableAliases) -> Self {
        for alias in other.aliases {
            self.insert(&alias.key, alias.targets);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Candidate table names for a hint.
    ///
    /// An alias equal to the normalized hint wins outright. Otherwise every
    /// alias that prefixes the hint contributes its targets, in table order.
    /// Separators are ignored when comparing prefixes, so `DADDxCodes` and
    /// `Lab 2019` both match.
    pub fn candidates(&self, hint: &str) -> Vec<&str> {
        let normalized = normalize_table_name(hint);
        if normalized.is_empty() {
            return Vec::new();
        }
        if let Some(entry) = self.aliases.iter().find(|entry| entry.key == normalized) {
            return entry.targets.iter().map(String::as_str).collect();
        }
        let hint = compact(&normalized);
        let mut candidates: Vec<&str> = Vec::new();
        for entry in &self.aliases {
            if !hint.starts_with(&compact(&entry.key)) {
                continue;
            }
            for target in &entry.targets {
                if !candidates.contains(&target.as_str()) {
                    candidates.push(target);
                }
            }
        }
        candidates
    }
}

fn compact(normalized: &str) -> String {
    normalized.split(' ').collect()
}
