//! Turtle output of century associations
//!
//! One triple per distinct (person, century) pair:
//! `bdr:P1583 tmp:associatedCentury 16 .`

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use epoch_core::{CenturyTag, KnowledgeBase, OutputConfig, Result};
use tracing::info;

use crate::snapshot::write_atomically;

/// Serializes century associations as Turtle
#[derive(Debug, Clone, Default)]
pub struct TurtleWriter {
    config: OutputConfig,
}

impl TurtleWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Render associations; repeated pairs collapse into one triple
    pub fn render<'a, I>(&self, associations: I) -> String
    where
        I: IntoIterator<Item = (&'a str, CenturyTag)>,
    {
        let pairs: BTreeSet<(&str, CenturyTag)> = associations.into_iter().collect();
        let c = &self.config;

        let mut out = String::new();
        let _ = writeln!(out, "@prefix {}: <{}> .", c.resource_prefix, c.resource_namespace);
        let _ = writeln!(out, "@prefix {}: <{}> .", c.property_prefix, c.property_namespace);
        out.push('\n');

        for (person, tag) in pairs {
            let _ = writeln!(
                out,
                "{} {}:{} {} .",
                self.subject(person),
                c.property_prefix,
                c.century_property,
                tag
            );
        }
        out
    }

    /// Write every association held by the knowledge base
    ///
    /// Returns the number of triples written.
    pub async fn write(&self, path: &Path, kb: &KnowledgeBase) -> Result<usize> {
        let triples = kb.associations().collect::<BTreeSet<_>>().len();
        let turtle = self.render(kb.associations());

        write_atomically(path, turtle.as_bytes()).await?;
        info!(path = %path.display(), triples, "wrote century associations");
        Ok(triples)
    }

    fn subject(&self, person: &str) -> String {
        if is_plain_local_name(person) {
            format!("{}:{}", self.config.resource_prefix, person)
        } else {
            format!("<{}{}>", self.config.resource_namespace, person)
        }
    }
}

/// Local names that need no escaping in a prefixed name
fn is_plain_local_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphanumeric() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_triples() {
        let writer = TurtleWriter::default();
        let turtle = writer.render(vec![
            ("P2", CenturyTag(17)),
            ("P1", CenturyTag(16)),
            ("P2", CenturyTag(16)),
        ]);

        assert!(turtle.starts_with("@prefix bdr: <http://purl.bdrc.io/resource/> ."));
        assert!(turtle.contains("@prefix tmp: <http://purl.bdrc.io/ontology/tmp/> ."));

        let body: Vec<&str> = turtle.lines().skip(3).collect();
        assert_eq!(
            body,
            vec![
                "bdr:P1 tmp:associatedCentury 16 .",
                "bdr:P2 tmp:associatedCentury 16 .",
                "bdr:P2 tmp:associatedCentury 17 .",
            ]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let turtle = TurtleWriter::default().render(vec![
            ("P1", CenturyTag(16)),
            ("P1", CenturyTag(16)),
        ]);
        assert_eq!(turtle.matches("associatedCentury").count(), 1);
    }

    #[test]
    fn test_unusual_ids_use_full_iri() {
        let turtle = TurtleWriter::default().render(vec![("P1.2", CenturyTag(16))]);
        assert!(turtle.contains("<http://purl.bdrc.io/resource/P1.2> tmp:associatedCentury 16 ."));
    }
}
