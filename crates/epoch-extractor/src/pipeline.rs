//! Inference pipeline
//!
//! Drives extraction, direct classification and propagation over a
//! [`KnowledgeBase`]. Three entry points:
//! - [`InferencePipeline::run_batch`]: the whole corpus from a person store
//! - [`InferencePipeline::inspect`]: one person, nothing else touched
//! - [`InferencePipeline::resume`]: a restored evidence table, no extraction

use epoch_core::{
    DateBound, Diagnostics, InferenceConfig, KnowledgeBase, KnowledgeSnapshot, PersonEntity,
    PersonRecord, PersonSource, PublicationStatus, Result,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::century::CenturyClassifier;
use crate::dates::PersonDateExtractor;
use crate::relation::{RelationTable, RelationshipPropagator};

/// Single-person debug result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    /// Requested person
    pub id: String,

    /// Publication state found in the store
    pub status: PublicationStatus,

    /// Record after direct classification; `None` if not released
    pub record: Option<PersonRecord>,

    /// Histogram and problematic flag for this person alone
    pub diagnostics: Diagnostics,
}

/// Orchestrates century inference over a knowledge base
#[derive(Debug, Clone)]
pub struct InferencePipeline {
    extractor: PersonDateExtractor,
    classifier: CenturyClassifier,
    relations: RelationTable,
}

impl Default for InferencePipeline {
    fn default() -> Self {
        Self::new(&InferenceConfig::default())
    }
}

impl InferencePipeline {
    /// Create a pipeline with the given policy
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            extractor: PersonDateExtractor::new(config),
            classifier: CenturyClassifier::new(config),
            relations: RelationTable::new(config),
        }
    }

    /// Replace the relation table
    pub fn with_relations(mut self, relations: RelationTable) -> Self {
        self.relations = relations;
        self
    }

    pub fn classifier(&self) -> &CenturyClassifier {
        &self.classifier
    }

    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    /// Evidence record for a released person, `None` otherwise
    pub fn extract_person(&self, person: &PersonEntity) -> Option<PersonRecord> {
        if !person.is_released() {
            debug!(person = %person.id, status = %person.status, "skipping unreleased person");
            return None;
        }
        Some(PersonRecord::new(
            person.id.clone(),
            self.extractor.extract(person),
        ))
    }

    /// Read every person from the store into the knowledge base
    ///
    /// Unreadable records are skipped with a warning; only a store that
    /// cannot be listed aborts.
    pub async fn extract_all<S>(&self, source: &S, kb: &mut KnowledgeBase) -> Result<()>
    where
        S: PersonSource + ?Sized,
    {
        let ids = source.list_persons().await?;
        info!(store = source.name(), persons = ids.len(), "extracting person dates");

        for id in ids {
            let person = match source.load_person(&id).await {
                Ok(person) => person,
                Err(e) if e.is_recoverable() => {
                    warn!(person = %id, error = %e, "skipping unreadable person record");
                    kb.counters_mut().malformed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.extract_person(&person) {
                Some(record) => {
                    if kb.get(&record.id).is_some() {
                        warn!(person = %record.id, "duplicate person record, keeping the last one");
                    }
                    kb.insert(record);
                }
                None => kb.counters_mut().skipped += 1,
            }
        }
        Ok(())
    }

    /// Classify every directly dated person
    ///
    /// Earlier classification results are discarded first, so repeated
    /// calls over the same evidence give the same diagnostics.
    pub fn classify_direct(&self, kb: &mut KnowledgeBase) {
        kb.reset_classification();

        let dated: Vec<(String, DateBound)> = kb
            .records()
            .filter_map(|r| r.evidence.bound().map(|b| (r.id.clone(), b)))
            .collect();

        for (id, bound) in dated {
            if let Some((record, diagnostics)) = kb.record_and_diagnostics(&id) {
                record.centuries = self.classifier.classify(bound, diagnostics, &id);
            }
            kb.counters_mut().direct += 1;
        }
    }

    /// Borrow dates for linked-only persons; must follow [`Self::classify_direct`]
    pub fn propagate(&self, kb: &mut KnowledgeBase) {
        let propagator = RelationshipPropagator::new(&self.relations, &self.classifier);
        let inferred = propagator.propagate(kb);

        let undated = kb.records().filter(|r| !r.evidence.is_dated()).count();
        let counters = kb.counters_mut();
        counters.inferred = inferred;
        counters.unresolved = undated - inferred;
    }

    /// Direct classification followed by propagation
    pub fn classify(&self, kb: &mut KnowledgeBase) {
        self.classify_direct(kb);
        self.propagate(kb);

        let summary = kb.summary();
        info!(
            direct = summary.counters.direct,
            inferred = summary.counters.inferred,
            unresolved = summary.counters.unresolved,
            problematic = summary.problematic.len(),
            "{summary}"
        );
    }

    /// Full run over a person store
    pub async fn run_batch<S>(&self, source: &S) -> Result<KnowledgeBase>
    where
        S: PersonSource + ?Sized,
    {
        let mut kb = KnowledgeBase::new();
        self.extract_all(source, &mut kb).await?;
        self.classify(&mut kb);
        Ok(kb)
    }

    /// Re-run classification and propagation over a persisted evidence table
    pub fn resume(&self, snapshot: KnowledgeSnapshot) -> KnowledgeBase {
        let mut kb = KnowledgeBase::from_snapshot(snapshot);
        info!(persons = kb.len(), "resuming from knowledge base snapshot");
        self.classify(&mut kb);
        kb
    }

    /// Compute one person's record without touching the rest of the corpus
    pub async fn inspect<S>(&self, source: &S, id: &str) -> Result<Inspection>
    where
        S: PersonSource + ?Sized,
    {
        let person = source.load_person(id).await?;
        let mut diagnostics = Diagnostics::new();

        let record = self.extract_person(&person).map(|mut record| {
            if let Some(bound) = record.evidence.bound() {
                record.centuries = self.classifier.classify(bound, &mut diagnostics, id);
            }
            record
        });

        Ok(Inspection {
            id: person.id,
            status: person.status,
            record,
            diagnostics,
        })
    }
}
