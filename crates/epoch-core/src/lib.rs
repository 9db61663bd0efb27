//! Epoch Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the century
//! inference workspace:
//! - Year bounds and century tags
//! - Person records, events and relation links
//! - Common error types
//! - The knowledge base accumulator (records, histogram, problematic set)
//! - Collaborator traits for person storage
//! - Configuration management

pub mod config;
pub mod knowledge;

pub use config::{
    ConfigError, EpochConfig, InferenceConfig, LoggingConfig, OutputConfig, StorageConfig,
};
pub use knowledge::{Diagnostics, KnowledgeBase, KnowledgeSnapshot, RunCounters, RunSummary};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for century inference
#[derive(Error, Debug)]
pub enum EpochError {
    #[error("Person not found: {0}")]
    NotFound(String),

    #[error("Person storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Malformed record for {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EpochError {
    /// Whether the error concerns a single record and the run may go on
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::MalformedRecord { .. })
    }
}

impl From<ConfigError> for EpochError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EpochError>;

// ============================================================================
// Temporal Models
// ============================================================================

/// Outer bound of a person's plausible active period, in years
///
/// The sentinel [`DateBound::NO_EVIDENCE`] has `earliest > latest`; every
/// other bound satisfies `earliest <= latest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateBound {
    /// Terminus post quem
    pub earliest: i32,

    /// Terminus ante quem
    pub latest: i32,
}

impl DateBound {
    /// Sentinel for "nothing could be parsed"
    pub const NO_EVIDENCE: Self = Self {
        earliest: 9999,
        latest: 0,
    };

    /// Create a bound from two years
    pub fn new(earliest: i32, latest: i32) -> Self {
        Self { earliest, latest }
    }

    /// A bound covering a single year
    pub fn year(year: i32) -> Self {
        Self::new(year, year)
    }

    /// Whether this is the no-evidence sentinel (or otherwise inverted)
    pub fn is_no_evidence(&self) -> bool {
        self.earliest > self.latest
    }

    /// Lower the earliest year if `year` is earlier
    pub fn merge_earliest(&mut self, year: i32) {
        self.earliest = self.earliest.min(year);
    }

    /// Raise the latest year if `year` is later
    pub fn merge_latest(&mut self, year: i32) {
        self.latest = self.latest.max(year);
    }

    /// Move both ends by the same number of years, saturating at the `i32` range
    pub fn shifted(self, years: i32) -> Self {
        Self::new(
            self.earliest.saturating_add(years),
            self.latest.saturating_add(years),
        )
    }
}

impl Default for DateBound {
    fn default() -> Self {
        Self::NO_EVIDENCE
    }
}

impl std::fmt::Display for DateBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_no_evidence() {
            write!(f, "no evidence")
        } else {
            write!(f, "{}..={}", self.earliest, self.latest)
        }
    }
}

/// A 1-indexed century label: `N` covers the years `(N-1)*100 ..= N*100-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CenturyTag(pub i32);

impl CenturyTag {
    /// Century containing the given year
    pub fn containing(year: i32) -> Self {
        Self(year.div_euclid(100) + 1)
    }

    /// Numeric value of the tag
    pub fn number(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for CenturyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Person Graph Models
// ============================================================================

/// Directed, typed reference from one person to another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationLink {
    /// Identifier of the related person
    pub target: String,

    /// Relation identifier (e.g. "hasFather", "isIncarnation")
    pub relation: String,
}

impl RelationLink {
    /// Create a new link
    pub fn new(target: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            relation: relation.into(),
        }
    }
}

/// Publication state of a person record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    /// Final, publicly released
    Released,
    /// Still being edited
    Editing,
    /// Provisional import, not reviewed
    Provisional,
    /// Withdrawn or merged into another record
    Withdrawn,
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Released => write!(f, "released"),
            Self::Editing => write!(f, "editing"),
            Self::Provisional => write!(f, "provisional"),
            Self::Withdrawn => write!(f, "withdrawn"),
        }
    }
}

/// Event types treated as a birth
const BIRTH_EVENT_TYPES: &[&str] = &["PersonBirth", "Birth"];

/// A life event as delivered by the storage layer
///
/// Typed fields carry year literals (`"1550"`, `"1550-03-02"`); `when`
/// carries free-text fuzzy expressions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEvent {
    /// Event type tag (e.g. "PersonBirth", "PersonDeath", "PersonOccupiesSeat")
    #[serde(rename = "type")]
    pub event_type: String,

    /// Single year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_year: Option<String>,

    /// Not earlier than
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,

    /// Not later than
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<String>,

    /// Exact calendar date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_date: Option<String>,

    /// Fuzzy date expressions
    #[serde(default, rename = "eventWhen", skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<String>,
}

impl PersonEvent {
    /// Create an event of the given type with no dates
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    /// Whether this event records a birth
    pub fn is_birth(&self) -> bool {
        BIRTH_EVENT_TYPES
            .iter()
            .any(|t| self.event_type.eq_ignore_ascii_case(t))
    }

    pub fn with_on_year(mut self, year: impl Into<String>) -> Self {
        self.on_year = Some(year.into());
        self
    }

    pub fn with_not_before(mut self, year: impl Into<String>) -> Self {
        self.not_before = Some(year.into());
        self
    }

    pub fn with_not_after(mut self, year: impl Into<String>) -> Self {
        self.not_after = Some(year.into());
        self
    }

    pub fn with_on_date(mut self, date: impl Into<String>) -> Self {
        self.on_date = Some(date.into());
        self
    }

    pub fn with_when(mut self, expression: impl Into<String>) -> Self {
        self.when.push(expression.into());
        self
    }
}

/// A person entity as delivered by the storage layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonEntity {
    /// Person identifier (e.g. "P1583")
    pub id: String,

    /// Publication state; only released persons are processed
    pub status: PublicationStatus,

    /// Every recorded life event
    #[serde(default)]
    pub events: Vec<PersonEvent>,

    /// Outbound links to other persons
    #[serde(default)]
    pub links: Vec<RelationLink>,
}

impl PersonEntity {
    /// Create a released person with no events or links
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: PublicationStatus::Released,
            events: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: PublicationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_event(mut self, event: PersonEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_link(mut self, target: impl Into<String>, relation: impl Into<String>) -> Self {
        self.links.push(RelationLink::new(target, relation));
        self
    }

    /// Whether the record is in its final publication state
    pub fn is_released(&self) -> bool {
        self.status == PublicationStatus::Released
    }
}

// ============================================================================
// Knowledge Base Records
// ============================================================================

/// What is known about a person's dates before classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    /// Direct date evidence
    Dated(DateBound),
    /// No dates, but links to other persons
    Linked(Vec<RelationLink>),
    /// Neither dates nor links
    Unresolved,
}

impl Evidence {
    /// Build the evidence state from an extracted bound and the person's links
    pub fn from_parts(bound: DateBound, links: Vec<RelationLink>) -> Self {
        if !bound.is_no_evidence() {
            Self::Dated(bound)
        } else if !links.is_empty() {
            Self::Linked(links)
        } else {
            Self::Unresolved
        }
    }

    /// The direct bound, if any
    pub fn bound(&self) -> Option<DateBound> {
        match self {
            Self::Dated(bound) => Some(*bound),
            _ => None,
        }
    }

    /// Outbound links, empty unless the person is only linked
    pub fn links(&self) -> &[RelationLink] {
        match self {
            Self::Linked(links) => links,
            _ => &[],
        }
    }

    pub fn is_dated(&self) -> bool {
        matches!(self, Self::Dated(_))
    }
}

/// One person's row in the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Person identifier
    pub id: String,

    /// Extracted evidence
    pub evidence: Evidence,

    /// Centuries assigned by classification or propagation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub centuries: Vec<CenturyTag>,
}

impl PersonRecord {
    /// Create an unclassified record
    pub fn new(id: impl Into<String>, evidence: Evidence) -> Self {
        Self {
            id: id.into(),
            evidence,
            centuries: Vec::new(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for the storage layer holding person entities
#[async_trait::async_trait]
pub trait PersonSource: Send + Sync {
    /// Identifiers of every person in the store
    ///
    /// Failure here means the store cannot be read at all.
    async fn list_persons(&self) -> Result<Vec<String>>;

    /// Load a single person
    async fn load_person(&self, id: &str) -> Result<PersonEntity>;

    /// Get store name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_evidence_sentinel() {
        assert!(DateBound::NO_EVIDENCE.is_no_evidence());
        assert!(DateBound::default().is_no_evidence());
        assert!(!DateBound::year(1550).is_no_evidence());
    }

    #[test]
    fn test_bound_merge() {
        let mut bound = DateBound::NO_EVIDENCE;
        bound.merge_earliest(1550);
        bound.merge_latest(1600);
        bound.merge_earliest(1570);
        bound.merge_latest(1580);
        assert_eq!(bound, DateBound::new(1550, 1600));
        assert_eq!(bound.shifted(-20), DateBound::new(1530, 1580));
    }

    #[test]
    fn test_shift_saturates_at_extreme_years() {
        let bound = DateBound::year(i32::MAX);
        assert_eq!(bound.shifted(20), DateBound::year(i32::MAX));
        assert_eq!(DateBound::year(i32::MIN).shifted(-20), DateBound::year(i32::MIN));
    }

    #[test]
    fn test_century_tag_years() {
        assert_eq!(CenturyTag::containing(1550), CenturyTag(16));
        assert_eq!(CenturyTag::containing(1500), CenturyTag(16));
        assert_eq!(CenturyTag::containing(1499), CenturyTag(15));
        assert_eq!(CenturyTag::containing(1990).number(), 20);
    }

    #[test]
    fn test_evidence_from_parts() {
        let links = vec![RelationLink::new("P2", "hasFather")];

        assert!(Evidence::from_parts(DateBound::new(1500, 1550), links.clone()).is_dated());
        assert_eq!(
            Evidence::from_parts(DateBound::NO_EVIDENCE, links.clone()),
            Evidence::Linked(links)
        );
        assert_eq!(
            Evidence::from_parts(DateBound::NO_EVIDENCE, vec![]),
            Evidence::Unresolved
        );
    }

    #[test]
    fn test_birth_event_detection() {
        assert!(PersonEvent::new("PersonBirth").is_birth());
        assert!(PersonEvent::new("birth").is_birth());
        assert!(!PersonEvent::new("PersonDeath").is_birth());
    }

    #[test]
    fn test_person_entity_json() {
        let json = r#"{
            "id": "P1583",
            "status": "released",
            "events": [
                {"type": "PersonBirth", "onYear": "1550"},
                {"type": "PersonDeath", "eventWhen": ["16XX"]}
            ],
            "links": [{"target": "P64", "relation": "personStudentOf"}]
        }"#;

        let person: PersonEntity = serde_json::from_str(json).unwrap();
        assert!(person.is_released());
        assert_eq!(person.events.len(), 2);
        assert_eq!(person.events[0].on_year.as_deref(), Some("1550"));
        assert_eq!(person.events[1].when, vec!["16XX".to_string()]);
        assert_eq!(person.links[0].relation, "personStudentOf");
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(EpochError::NotFound("P1".into()).is_recoverable());
        assert!(EpochError::MalformedRecord {
            id: "P1".into(),
            reason: "bad json".into()
        }
        .is_recoverable());
        assert!(!EpochError::StorageUnavailable("gone".into()).is_recoverable());
    }
}
