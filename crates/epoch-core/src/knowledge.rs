//! Knowledge base accumulator
//!
//! Holds the per-person record table together with the run diagnostics
//! (century histogram, problematic persons) and counters. Every
//! classification step receives it by `&mut`; there is no global state.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CenturyTag, Evidence, PersonRecord};

// ============================================================================
// Diagnostics
// ============================================================================

/// Side effects of classification: histogram and problematic persons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Number of assignments per century
    pub histogram: BTreeMap<CenturyTag, usize>,

    /// Persons whose evidence spans too many centuries
    pub problematic: BTreeSet<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one assignment of `tag`
    pub fn record_tag(&mut self, tag: CenturyTag) {
        *self.histogram.entry(tag).or_insert(0) += 1;
    }

    /// Flag a person for manual review
    pub fn flag_problematic(&mut self, person_id: &str) {
        self.problematic.insert(person_id.to_string());
    }

    /// Sum of all histogram entries
    pub fn histogram_total(&self) -> usize {
        self.histogram.values().sum()
    }

    pub fn clear(&mut self) {
        self.histogram.clear();
        self.problematic.clear();
    }
}

// ============================================================================
// Counters
// ============================================================================

/// Per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Persons with direct date evidence
    pub direct: usize,
    /// Persons dated through at least one relation
    pub inferred: usize,
    /// Persons with neither
    pub unresolved: usize,
    /// Persons skipped because they are not released
    pub skipped: usize,
    /// Records that could not be read
    pub malformed: usize,
}

impl RunCounters {
    /// Reset the classification counters, keeping extraction counters
    pub fn reset_classification(&mut self) {
        self.direct = 0;
        self.inferred = 0;
        self.unresolved = 0;
    }
}

// ============================================================================
// Knowledge Base
// ============================================================================

/// Per-person record table plus diagnostics for one run
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    records: BTreeMap<String, PersonRecord>,
    diagnostics: Diagnostics,
    counters: RunCounters,
}

impl KnowledgeBase {
    /// Create an empty knowledge base
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a person's record
    pub fn insert(&mut self, record: PersonRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<&PersonRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PersonRecord> {
        self.records.get_mut(id)
    }

    /// Records in identifier order
    pub fn records(&self) -> impl Iterator<Item = &PersonRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut RunCounters {
        &mut self.counters
    }

    /// Split borrow: a record and the diagnostics at the same time
    pub fn record_and_diagnostics(
        &mut self,
        id: &str,
    ) -> Option<(&mut PersonRecord, &mut Diagnostics)> {
        let record = self.records.get_mut(id)?;
        Some((record, &mut self.diagnostics))
    }

    /// Drop everything classification produced, keeping the evidence
    pub fn reset_classification(&mut self) {
        for record in self.records.values_mut() {
            record.centuries.clear();
        }
        self.diagnostics.clear();
        self.counters.reset_classification();
    }

    /// Every (person, century) assignment, in identifier order
    pub fn associations(&self) -> impl Iterator<Item = (&str, CenturyTag)> + '_ {
        self.records.values().flat_map(|record| {
            record
                .centuries
                .iter()
                .map(move |tag| (record.id.as_str(), *tag))
        })
    }

    /// Total number of century tags held by records
    pub fn assigned_tag_total(&self) -> usize {
        self.records.values().map(|r| r.centuries.len()).sum()
    }

    /// Export the evidence table for later resumption
    pub fn snapshot(&self) -> KnowledgeSnapshot {
        KnowledgeSnapshot {
            version: KnowledgeSnapshot::CURRENT_VERSION,
            created_at: Utc::now(),
            persons: self
                .records
                .values()
                .map(|r| (r.id.clone(), r.evidence.clone()))
                .collect(),
            histogram: self.diagnostics.histogram.clone(),
            problematic: self.diagnostics.problematic.iter().cloned().collect(),
        }
    }

    /// Rebuild an unclassified knowledge base from a snapshot
    ///
    /// Stored histogram and problematic lists are informational only; they are
    /// recomputed by the next classification.
    pub fn from_snapshot(snapshot: KnowledgeSnapshot) -> Self {
        let records = snapshot
            .persons
            .into_iter()
            .map(|(id, evidence)| (id.clone(), PersonRecord::new(id, evidence)))
            .collect();

        Self {
            records,
            diagnostics: Diagnostics::default(),
            counters: RunCounters::default(),
        }
    }

    /// End-of-run summary for reporting
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            generated_at: Utc::now(),
            persons: self.records.len(),
            counters: self.counters,
            histogram: self.diagnostics.histogram.clone(),
            problematic: self.diagnostics.problematic.iter().cloned().collect(),
        }
    }
}

// ============================================================================
// Persistence Types
// ============================================================================

/// Serializable evidence table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    /// Format version
    pub version: u32,

    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,

    /// Evidence per person
    pub persons: BTreeMap<String, Evidence>,

    /// Histogram at snapshot time
    #[serde(default)]
    pub histogram: BTreeMap<CenturyTag, usize>,

    /// Problematic persons at snapshot time
    #[serde(default)]
    pub problematic: Vec<String>,
}

impl KnowledgeSnapshot {
    pub const CURRENT_VERSION: u32 = 1;
}

/// Summary handed to the reporting side at the end of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub persons: usize,
    pub counters: RunCounters,
    pub histogram: BTreeMap<CenturyTag, usize>,
    pub problematic: Vec<String>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "found {}, inferred {}, no info on {}",
            self.counters.direct, self.counters.inferred, self.counters.unresolved
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DateBound, RelationLink};

    fn sample_kb() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.insert(PersonRecord::new(
            "P1",
            Evidence::Dated(DateBound::new(1500, 1550)),
        ));
        kb.insert(PersonRecord::new(
            "P2",
            Evidence::Linked(vec![RelationLink::new("P1", "hasFather")]),
        ));
        kb.insert(PersonRecord::new("P3", Evidence::Unresolved));
        kb
    }

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        diag.record_tag(CenturyTag(16));
        diag.record_tag(CenturyTag(16));
        diag.record_tag(CenturyTag(17));
        diag.flag_problematic("P9");
        diag.flag_problematic("P9");

        assert_eq!(diag.histogram[&CenturyTag(16)], 2);
        assert_eq!(diag.histogram_total(), 3);
        assert_eq!(diag.problematic.len(), 1);
    }

    #[test]
    fn test_associations_follow_records() {
        let mut kb = sample_kb();
        kb.get_mut("P1").unwrap().centuries = vec![CenturyTag(16)];
        kb.get_mut("P2").unwrap().centuries = vec![CenturyTag(16), CenturyTag(15)];

        let pairs: Vec<_> = kb.associations().collect();
        assert_eq!(
            pairs,
            vec![
                ("P1", CenturyTag(16)),
                ("P2", CenturyTag(16)),
                ("P2", CenturyTag(15))
            ]
        );
        assert_eq!(kb.assigned_tag_total(), 3);
    }

    #[test]
    fn test_reset_keeps_evidence() {
        let mut kb = sample_kb();
        kb.get_mut("P1").unwrap().centuries = vec![CenturyTag(16)];
        kb.diagnostics_mut().record_tag(CenturyTag(16));
        kb.counters_mut().direct = 1;
        kb.counters_mut().skipped = 4;

        kb.reset_classification();

        assert!(kb.get("P1").unwrap().centuries.is_empty());
        assert!(kb.get("P1").unwrap().evidence.is_dated());
        assert_eq!(kb.diagnostics().histogram_total(), 0);
        assert_eq!(kb.counters().direct, 0);
        assert_eq!(kb.counters().skipped, 4);
    }

    #[test]
    fn test_snapshot_restores_evidence_only() {
        let mut kb = sample_kb();
        kb.get_mut("P1").unwrap().centuries = vec![CenturyTag(16)];
        kb.diagnostics_mut().record_tag(CenturyTag(16));

        let json = serde_json::to_string(&kb.snapshot()).unwrap();
        let restored = KnowledgeBase::from_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.len(), 3);
        assert_eq!(
            restored.get("P1").unwrap().evidence,
            Evidence::Dated(DateBound::new(1500, 1550))
        );
        assert_eq!(restored.get("P2").unwrap().evidence.links().len(), 1);
        assert!(restored.get("P1").unwrap().centuries.is_empty());
        assert_eq!(restored.diagnostics().histogram_total(), 0);
    }

    #[test]
    fn test_summary_display() {
        let mut kb = sample_kb();
        kb.counters_mut().direct = 1;
        kb.counters_mut().inferred = 1;
        kb.counters_mut().unresolved = 1;

        assert_eq!(
            kb.summary().to_string(),
            "found 1, inferred 1, no info on 1"
        );
    }
}
