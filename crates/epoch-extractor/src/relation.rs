//! Relational date propagation
//!
//! Persons without dates borrow a bound from related persons. Each relation
//! identifier maps to a [`TemporalTransform`] through a [`RelationTable`], so
//! supporting a new relation is a table entry rather than new code.

use std::collections::HashMap;

use epoch_core::{DateBound, Evidence, InferenceConfig, KnowledgeBase, RelationLink};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::century::CenturyClassifier;

// ============================================================================
// Relation Categories
// ============================================================================

/// Temporal role of a relation, seen from the linking person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationCategory {
    /// Target belongs to an earlier generation (parent, teacher)
    Ascending,
    /// Target belongs to a later generation (child, student)
    Descending,
    /// Linking person is a later incarnation of the target
    LaterIncarnationOf,
    /// Target is a later incarnation of the linking person
    EarlierIncarnationOf,
}

impl RelationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
            Self::LaterIncarnationOf => "later_incarnation_of",
            Self::EarlierIncarnationOf => "earlier_incarnation_of",
        }
    }

    /// Relation identifiers belonging to this category
    pub fn relations(&self) -> &'static [&'static str] {
        match self {
            Self::Ascending => &[
                "hasMother",
                "hasFather",
                "hasParent",
                "hasAunt",
                "hasUncle",
                "personStudentOf",
            ],
            Self::Descending => &[
                "hasChild",
                "hasSon",
                "hasDaughter",
                "hasNiece",
                "hasNephew",
                "personTeacherOf",
            ],
            Self::LaterIncarnationOf => &[
                "isIncarnation",
                "incarnationBody",
                "incarnationGeneral",
                "incarnationMind",
                "incarnationQualities",
                "incarnationSpeech",
                "incarnationYangtse",
            ],
            Self::EarlierIncarnationOf => &[
                "hasIncarnation",
                "hasIncarnationActivities",
                "hasIncarnationBody",
                "hasIncarnationGeneral",
                "hasIncarnationMind",
                "hasIncarnationQualities",
                "hasIncarnationSpeech",
                "hasIncarnationYangtse",
            ],
        }
    }

    /// Transform used for this category under the given offsets
    pub fn transform(&self, config: &InferenceConfig) -> TemporalTransform {
        match self {
            Self::Ascending => TemporalTransform::Shift(-config.kinship_offset),
            Self::Descending => TemporalTransform::Shift(config.kinship_offset),
            Self::LaterIncarnationOf => TemporalTransform::After(config.incarnation_offset),
            Self::EarlierIncarnationOf => TemporalTransform::Before(config.incarnation_offset),
        }
    }

    pub const ALL: [Self; 4] = [
        Self::Ascending,
        Self::Descending,
        Self::LaterIncarnationOf,
        Self::EarlierIncarnationOf,
    ];
}

impl std::fmt::Display for RelationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Transforms
// ============================================================================

/// How a related person's bound translates to the linking person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalTransform {
    /// Move both ends by the given years
    Shift(i32),
    /// `(latest, latest + n)`
    After(i32),
    /// `(earliest - n, earliest)`
    Before(i32),
    /// Use the bound as is
    Identity,
}

impl TemporalTransform {
    pub fn apply(&self, bound: DateBound) -> DateBound {
        match *self {
            Self::Shift(years) => bound.shifted(years),
            Self::After(years) => {
                DateBound::new(bound.latest, bound.latest.saturating_add(years))
            }
            Self::Before(years) => {
                DateBound::new(bound.earliest.saturating_sub(years), bound.earliest)
            }
            Self::Identity => bound,
        }
    }
}

// ============================================================================
// Relation Table
// ============================================================================

/// Lookup from relation identifier to temporal transform
#[derive(Debug, Clone, Default)]
pub struct RelationTable {
    transforms: HashMap<String, TemporalTransform>,
}

impl RelationTable {
    /// Table with no entries; every relation maps to identity
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table with every known relation registered
    pub fn new(config: &InferenceConfig) -> Self {
        let mut table = Self::empty();
        for category in RelationCategory::ALL {
            table.register_category(category, config);
        }
        table
    }

    /// Register (or override) a single relation
    pub fn register(&mut self, relation: impl Into<String>, transform: TemporalTransform) {
        self.transforms.insert(relation.into(), transform);
    }

    /// Register every relation of a category
    pub fn register_category(&mut self, category: RelationCategory, config: &InferenceConfig) {
        let transform = category.transform(config);
        for relation in category.relations() {
            self.register(*relation, transform);
        }
    }

    pub fn transform_for(&self, relation: &str) -> TemporalTransform {
        self.transforms
            .get(relation)
            .copied()
            .unwrap_or(TemporalTransform::Identity)
    }

    /// Bound borrowed from a target through the given relation
    pub fn apply(&self, relation: &str, bound: DateBound) -> DateBound {
        self.transform_for(relation).apply(bound)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

// ============================================================================
// Propagation
// ============================================================================

/// Dates persons that only have relation links
pub struct RelationshipPropagator<'a> {
    table: &'a RelationTable,
    classifier: &'a CenturyClassifier,
}

impl<'a> RelationshipPropagator<'a> {
    pub fn new(table: &'a RelationTable, classifier: &'a CenturyClassifier) -> Self {
        Self { table, classifier }
    }

    /// Bounds borrowed through every link whose target has direct dates
    pub fn borrowed_bounds(
        &self,
        links: &[RelationLink],
        kb: &KnowledgeBase,
    ) -> Vec<(RelationLink, DateBound)> {
        links
            .iter()
            .filter_map(|link| {
                let target = kb.get(&link.target)?.evidence.bound()?;
                Some((link.clone(), self.table.apply(&link.relation, target)))
            })
            .collect()
    }

    /// Classify every linked-only person from the bounds of its targets
    ///
    /// Only direct evidence is borrowed, so the result does not depend on
    /// the order persons are visited in. Returns the number of persons
    /// that received at least one century.
    pub fn propagate(&self, kb: &mut KnowledgeBase) -> usize {
        let linked: Vec<(String, Vec<RelationLink>)> = kb
            .records()
            .filter_map(|record| match &record.evidence {
                Evidence::Linked(links) => Some((record.id.clone(), links.clone())),
                _ => None,
            })
            .collect();

        let mut inferred = 0;
        for (id, links) in linked {
            let borrowed = self.borrowed_bounds(&links, kb);
            let Some((record, diagnostics)) = kb.record_and_diagnostics(&id) else {
                continue;
            };

            let mut usable = false;
            for (link, bound) in borrowed {
                let tags = self.classifier.classify(bound, diagnostics, &id);
                debug!(
                    person = %id,
                    target = %link.target,
                    relation = %link.relation,
                    %bound,
                    ?tags,
                    "borrowed dates"
                );
                usable |= !tags.is_empty();
                record.centuries.extend(tags);
            }
            if usable {
                inferred += 1;
            }
        }
        inferred
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use epoch_core::{CenturyTag, PersonRecord};

    fn table() -> RelationTable {
        RelationTable::new(&InferenceConfig::default())
    }

    #[test]
    fn test_category_display() {
        assert_eq!(RelationCategory::Ascending.to_string(), "ascending");
        assert_eq!(
            RelationCategory::LaterIncarnationOf.as_str(),
            "later_incarnation_of"
        );
    }

    #[test]
    fn test_transform_table() {
        let table = table();
        let bound = DateBound::new(1500, 1550);

        assert_eq!(table.apply("hasFather", bound), DateBound::new(1480, 1530));
        assert_eq!(table.apply("personStudentOf", bound), DateBound::new(1480, 1530));
        assert_eq!(table.apply("hasSon", bound), DateBound::new(1520, 1570));
        assert_eq!(table.apply("personTeacherOf", bound), DateBound::new(1520, 1570));
        assert_eq!(table.apply("isIncarnation", bound), DateBound::new(1550, 1580));
        assert_eq!(table.apply("hasIncarnationMind", bound), DateBound::new(1470, 1500));
        assert_eq!(table.apply("hasSpouse", bound), bound);
    }

    #[test]
    fn test_register_overrides() {
        let mut table = table();
        let before = table.len();
        table.register("hasGrandfather", TemporalTransform::Shift(-40));
        table.register("hasFather", TemporalTransform::Shift(-25));

        assert_eq!(table.len(), before + 1);
        assert_eq!(
            table.transform_for("hasGrandfather"),
            TemporalTransform::Shift(-40)
        );
        assert_eq!(
            table.apply("hasFather", DateBound::new(1500, 1550)),
            DateBound::new(1475, 1525)
        );
        assert_eq!(
            RelationTable::empty().transform_for("hasFather"),
            TemporalTransform::Identity
        );
    }

    #[test]
    fn test_propagation_from_father() {
        let mut kb = KnowledgeBase::new();
        kb.insert(PersonRecord::new(
            "P2",
            Evidence::Dated(DateBound::new(1500, 1550)),
        ));
        kb.insert(PersonRecord::new(
            "P1",
            Evidence::Linked(vec![RelationLink::new("P2", "hasFather")]),
        ));

        let table = table();
        let classifier = CenturyClassifier::default();
        let inferred = RelationshipPropagator::new(&table, &classifier).propagate(&mut kb);

        // (1480, 1530): 20 years before 1500, 30 after
        assert_eq!(inferred, 1);
        assert_eq!(
            kb.get("P1").unwrap().centuries,
            vec![CenturyTag(16), CenturyTag(15)]
        );
        assert_eq!(kb.diagnostics().histogram_total(), 2);
    }

    #[test]
    fn test_links_to_undated_targets_are_ignored() {
        let mut kb = KnowledgeBase::new();
        kb.insert(PersonRecord::new(
            "P1",
            Evidence::Linked(vec![
                RelationLink::new("P2", "hasFather"),
                RelationLink::new("P404", "hasMother"),
            ]),
        ));
        kb.insert(PersonRecord::new(
            "P2",
            Evidence::Linked(vec![RelationLink::new("P1", "hasSon")]),
        ));

        let table = table();
        let classifier = CenturyClassifier::default();
        let inferred = RelationshipPropagator::new(&table, &classifier).propagate(&mut kb);

        assert_eq!(inferred, 0);
        assert!(kb.get("P1").unwrap().centuries.is_empty());
        assert_eq!(kb.diagnostics().histogram_total(), 0);
    }

    #[test]
    fn test_every_usable_link_contributes() {
        let mut kb = KnowledgeBase::new();
        kb.insert(PersonRecord::new("P2", Evidence::Dated(DateBound::year(1550))));
        kb.insert(PersonRecord::new("P3", Evidence::Dated(DateBound::year(1750))));
        kb.insert(PersonRecord::new(
            "P1",
            Evidence::Linked(vec![
                RelationLink::new("P2", "hasFather"),
                RelationLink::new("P3", "hasSon"),
            ]),
        ));

        let table = table();
        let classifier = CenturyClassifier::default();
        let inferred = RelationshipPropagator::new(&table, &classifier).propagate(&mut kb);

        assert_eq!(inferred, 1);
        assert_eq!(
            kb.get("P1").unwrap().centuries,
            vec![CenturyTag(16), CenturyTag(18)]
        );
    }

    #[test]
    fn test_extreme_years_do_not_overflow() {
        let mut kb = KnowledgeBase::new();
        kb.insert(PersonRecord::new("P2", Evidence::Dated(DateBound::year(i32::MAX))));
        kb.insert(PersonRecord::new("P3", Evidence::Dated(DateBound::year(i32::MIN))));
        kb.insert(PersonRecord::new(
            "P1",
            Evidence::Linked(vec![
                RelationLink::new("P2", "hasSon"),
                RelationLink::new("P2", "isIncarnation"),
                RelationLink::new("P3", "hasFather"),
                RelationLink::new("P3", "hasIncarnation"),
            ]),
        ));

        let table = table();
        assert_eq!(
            table.apply("hasSon", DateBound::year(i32::MAX)),
            DateBound::year(i32::MAX)
        );
        assert_eq!(
            table.apply("hasIncarnation", DateBound::year(i32::MIN)),
            DateBound::year(i32::MIN)
        );

        let classifier = CenturyClassifier::default();
        let inferred = RelationshipPropagator::new(&table, &classifier).propagate(&mut kb);
        assert_eq!(inferred, 1);
    }
}
