//! Entities excluded from T-mapping saturation.
//!
//! Some deployments forbid rewriting specific classes or properties (for
//! instance when their mappings must stay byte-identical to hand-audited
//! SQL). An excluded entity's node is skipped entirely: its rules are kept
//! in their original direction, only redundancy-minimized.
//!
//! The on-disk format is one declaration per line, `C <iri>` for classes
//! and `P <iri>` for properties; `#` starts a comment.

use ahash::AHashSet;
use ontomap_model::{Iri, MappingError};

#[derive(Debug, Clone, Default)]
pub struct TMappingExclusionConfig {
    classes: AHashSet<Iri>,
    properties: AHashSet<Iri>,
}

impl TMappingExclusionConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(
        classes: impl IntoIterator<Item = Iri>,
        properties: impl IntoIterator<Item = Iri>,
    ) -> Self {
        TMappingExclusionConfig {
            classes: classes.into_iter().collect(),
            properties: properties.into_iter().collect(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, MappingError> {
        let mut config = Self::empty();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once(char::is_whitespace) {
                Some(("C", iri)) => {
                    config.classes.insert(Iri::new(iri.trim()));
                }
                Some(("P", iri)) => {
                    config.properties.insert(Iri::new(iri.trim()));
                }
                _ => {
                    return Err(MappingError::InvalidExclusionConfig {
                        line: lineno + 1,
                        text: line.to_owned(),
                    });
                }
            }
        }
        Ok(config)
    }

    pub fn contains_class(&self, iri: &Iri) -> bool {
        self.classes.contains(iri)
    }

    pub fn contains_property(&self, iri: &Iri) -> bool {
        self.properties.contains(iri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarations_and_comments() {
        let config = TMappingExclusionConfig::parse(
            "# audited mappings\nC http://ex.org/A\nP http://ex.org/p\n\n",
        )
        .unwrap();
        assert!(config.contains_class(&Iri::new("http://ex.org/A")));
        assert!(config.contains_property(&Iri::new("http://ex.org/p")));
        assert!(!config.contains_class(&Iri::new("http://ex.org/B")));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(TMappingExclusionConfig::parse("X http://ex.org/A").is_err());
    }
}
