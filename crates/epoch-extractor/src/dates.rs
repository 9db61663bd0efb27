//! Person date extraction
//!
//! Merges the dates of every event recorded for a person into one
//! outer [`DateBound`].

use epoch_core::{DateBound, Evidence, InferenceConfig, PersonEntity, PersonEvent};
use tracing::{debug, warn};

use crate::edtf::parse_fuzzy_date;

/// Running (earliest, latest) pair with per-side presence
#[derive(Debug, Clone, Copy)]
struct BoundAccumulator {
    bound: DateBound,
    has_earliest: bool,
    has_latest: bool,
}

impl BoundAccumulator {
    fn new() -> Self {
        Self {
            bound: DateBound::NO_EVIDENCE,
            has_earliest: false,
            has_latest: false,
        }
    }

    fn earliest(&mut self, year: i32) {
        self.bound.merge_earliest(year);
        self.has_earliest = true;
    }

    fn latest(&mut self, year: i32) {
        self.bound.merge_latest(year);
        self.has_latest = true;
    }

    /// Close the bound; a known lower side alone stands for both ends,
    /// an upper side alone is not evidence
    fn finish(self) -> DateBound {
        let DateBound { earliest, latest } = self.bound;
        match (self.has_earliest, self.has_latest) {
            (true, true) => DateBound::new(earliest, latest.max(earliest)),
            (true, false) => DateBound::year(earliest),
            (false, _) => DateBound::NO_EVIDENCE,
        }
    }
}

/// Extracts a person's overall date bound from their events
#[derive(Debug, Clone)]
pub struct PersonDateExtractor {
    /// Added to upper bounds taken from birth events
    birth_productive_offset: i32,
}

impl Default for PersonDateExtractor {
    fn default() -> Self {
        Self::new(&InferenceConfig::default())
    }
}

impl PersonDateExtractor {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            birth_productive_offset: config.birth_productive_offset,
        }
    }

    /// Merged bound over all events, or the no-evidence sentinel
    pub fn extract_bound(&self, person: &PersonEntity) -> DateBound {
        let mut acc = BoundAccumulator::new();
        for event in &person.events {
            self.merge_typed(event, &person.id, &mut acc);
            merge_fuzzy(event, &mut acc);
        }
        acc.finish()
    }

    /// Evidence state for the person: dated, linked or unresolved
    pub fn extract(&self, person: &PersonEntity) -> Evidence {
        let bound = self.extract_bound(person);
        let evidence = Evidence::from_parts(bound, person.links.clone());
        debug!(person = %person.id, %bound, links = evidence.links().len(), "extracted evidence");
        evidence
    }

    fn merge_typed(&self, event: &PersonEvent, person_id: &str, acc: &mut BoundAccumulator) {
        let birth_offset = if event.is_birth() {
            self.birth_productive_offset
        } else {
            0
        };

        if let Some(year) = typed_year(event.on_year.as_deref(), person_id) {
            acc.earliest(year);
            acc.latest(year + birth_offset);
        }
        if let Some(year) = typed_year(event.on_date.as_deref(), person_id) {
            acc.earliest(year);
            acc.latest(year + birth_offset);
        }
        if let Some(year) = typed_year(event.not_before.as_deref(), person_id) {
            acc.earliest(year);
        }
        if let Some(literal) = event.not_after.as_deref() {
            if let Some(year) = typed_year(Some(literal), person_id) {
                // "..99" is already a century-wide guess
                let offset = if literal.trim().ends_with("99") {
                    0
                } else {
                    birth_offset
                };
                acc.latest(year + offset);
            }
        }
    }
}

fn merge_fuzzy(event: &PersonEvent, acc: &mut BoundAccumulator) {
    for expression in &event.when {
        let (lower, upper) = parse_fuzzy_date(expression);
        if let Some(year) = lower {
            acc.earliest(year);
        }
        if let Some(year) = upper {
            acc.latest(year);
        }
    }
}

fn typed_year(literal: Option<&str>, person_id: &str) -> Option<i32> {
    let literal = literal?;
    let year = truncate_year(literal);
    if year.is_none() {
        warn!(person = person_id, literal, "unreadable year literal");
    }
    year
}

/// Year of a typed literal, truncated to at most four digits
///
/// `"1550-03-02"` and `"1550"` give 1550; `"-0050"` gives -50.
pub fn truncate_year(literal: &str) -> Option<i32> {
    let literal = literal.trim();
    let (sign, digits) = match literal.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, literal.strip_prefix('+').unwrap_or(literal)),
    };

    let year: String = digits
        .chars()
        .take_while(char::is_ascii_digit)
        .take(4)
        .collect();
    if year.is_empty() {
        return None;
    }
    year.parse::<i32>().ok().map(|y| sign * y)
}
