//! Century classification
//!
//! Maps a year bound to one or more 1-indexed century tags. Ranges
//! straddling two adjacent centuries are settled by how many years fall on
//! each side of the boundary.

use epoch_core::{CenturyTag, DateBound, Diagnostics, InferenceConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of classifying one bound, before any side effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Tags in preference order
    pub tags: Vec<CenturyTag>,

    /// Evidence spans more centuries than the classifier trusts
    pub problematic: bool,
}

impl Classification {
    fn tags(tags: Vec<CenturyTag>) -> Self {
        Self {
            tags,
            problematic: false,
        }
    }
}

/// Classifies year bounds into century tags
#[derive(Debug, Clone)]
pub struct CenturyClassifier {
    /// Largest trusted distance between first and last century index
    max_century_span: i32,
    /// Ratio below which only the later century is kept
    split_ratio_low: f64,
    /// Ratio above which only the earlier century is kept
    split_ratio_high: f64,
}

impl Default for CenturyClassifier {
    fn default() -> Self {
        Self::new(&InferenceConfig::default())
    }
}

impl CenturyClassifier {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            max_century_span: config.max_century_span,
            split_ratio_low: config.split_ratio_low,
            split_ratio_high: config.split_ratio_high,
        }
    }

    /// Pure classification of a bound
    ///
    /// Inverted bounds (including the no-evidence sentinel) yield no tags.
    pub fn assess(&self, bound: DateBound) -> Classification {
        let DateBound { earliest, latest } = bound;
        let first_c = earliest.div_euclid(100);
        let second_c = latest.div_euclid(100);
        let diff = second_c - first_c;

        if diff < 0 {
            return Classification::tags(Vec::new());
        }

        if diff == 0 {
            return Classification::tags(vec![CenturyTag(first_c + 1)]);
        }

        if diff > self.max_century_span {
            // Fallback keeps `second_c`, not `second_c + 1`
            return Classification {
                tags: vec![CenturyTag(second_c)],
                problematic: true,
            };
        }

        if diff > 1 {
            return Classification::tags(
                (first_c + 1..=second_c + 1).map(CenturyTag).collect(),
            );
        }

        // Adjacent centuries
        let boundary = 100 * second_c;
        let years_in_first = boundary - earliest;
        let years_in_second = latest - boundary;
        if years_in_second == 0 {
            return Classification::tags(vec![CenturyTag(first_c + 1)]);
        }

        let ratio = f64::from(years_in_first) / f64::from(years_in_second);
        if ratio < self.split_ratio_low {
            Classification::tags(vec![CenturyTag(second_c + 1)])
        } else if ratio > self.split_ratio_high {
            Classification::tags(vec![CenturyTag(first_c + 1)])
        } else {
            Classification::tags(vec![CenturyTag(second_c + 1), CenturyTag(first_c + 1)])
        }
    }

    /// Classify a bound and record the result in the diagnostics
    pub fn classify(
        &self,
        bound: DateBound,
        diagnostics: &mut Diagnostics,
        person_id: &str,
    ) -> Vec<CenturyTag> {
        let classification = self.assess(bound);
        if classification.problematic {
            debug!(person = person_id, %bound, "evidence spans too many centuries");
            diagnostics.flag_problematic(person_id);
        }
        for tag in &classification.tags {
            diagnostics.record_tag(*tag);
        }
        classification.tags
    }
}
