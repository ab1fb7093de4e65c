//! Declarative per-organ field tables
//!
//! Each organ declares its sections, the fields within them and, where the
//! exam has repeated findings, one entity collection. The report composer
//! and the template mapper are both driven by these tables, so adding a field
//! here is the only change needed to have it stored, loaded and reported.

pub mod breast;
pub mod echo;
pub mod obstetric;
pub mod thyroid;

use crate::scoring::ScoreField;
use crate::types::Organ;
use std::fmt;

/// Maps stored option codes to display labels
#[derive(Clone, Copy)]
pub enum Labels {
    /// Fixed `(code, label)` pairs
    Table(&'static [(&'static str, &'static str)]),
    /// Lookup provided by a scoring axis or method enum
    Lookup(fn(&str) -> Option<&'static str>),
}

impl Labels {
    /// Returns the label of `code`, ignoring case
    pub fn label(&self, code: &str) -> Option<&'static str> {
        let code = code.trim();
        match self {
            Labels::Table(pairs) => pairs
                .iter()
                .find(|(c, _)| c.eq_ignore_ascii_case(code))
                .map(|(_, label)| *label),
            Labels::Lookup(lookup) => lookup(code),
        }
    }
}

impl fmt::Debug for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Labels::Table(pairs) => f.debug_tuple("Table").field(&pairs.len()).finish(),
            Labels::Lookup(_) => f.write_str("Lookup"),
        }
    }
}

/// How a field is entered and rendered
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Number,
    /// Single-line text
    Text,
    /// Multi-line free text
    Paragraph,
    /// Yes/no
    Flag,
    Date,
    Choice(Labels),
    MultiChoice(Labels),
    /// Read from the calculator outputs under the field key
    Derived,
    /// Read from the score outputs
    Score(ScoreField),
}

/// One declared field
#[derive(Debug, Clone, Copy)]
pub struct FieldDecl {
    /// Canonical flat field name
    pub key: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub kind: FieldKind,
}

impl FieldDecl {
    const fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            unit: None,
            kind,
        }
    }

    pub const fn number(key: &'static str, label: &'static str, unit: &'static str) -> Self {
        Self::new(key, label, FieldKind::Number).with_unit(unit)
    }

    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub const fn paragraph(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Paragraph)
    }

    pub const fn flag(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Flag)
    }

    pub const fn date(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Date)
    }

    pub const fn choice(key: &'static str, label: &'static str, labels: Labels) -> Self {
        Self::new(key, label, FieldKind::Choice(labels))
    }

    pub const fn multi(key: &'static str, label: &'static str, labels: Labels) -> Self {
        Self::new(key, label, FieldKind::MultiChoice(labels))
    }

    pub const fn derived(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Derived)
    }

    pub const fn score(key: &'static str, label: &'static str, field: ScoreField) -> Self {
        Self::new(key, label, FieldKind::Score(field))
    }

    /// Builder: Set the display unit
    pub const fn with_unit(self, unit: &'static str) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    /// Returns whether the field is entered by the operator (and stored in records)
    pub fn is_input(&self) -> bool {
        !matches!(self.kind, FieldKind::Derived | FieldKind::Score(_))
    }
}

/// Rendering style of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStyle {
    /// Label/value lines
    Lines,
    /// Placeholder where the organ's entity collection is rendered
    Entities,
    /// Free-text conclusion, with a generated summary when left empty
    Impression,
}

#[derive(Debug, Clone, Copy)]
pub struct SectionDecl {
    pub key: &'static str,
    pub title: &'static str,
    pub style: SectionStyle,
    pub fields: &'static [FieldDecl],
}

impl SectionDecl {
    pub const fn lines(key: &'static str, title: &'static str, fields: &'static [FieldDecl]) -> Self {
        Self {
            key,
            title,
            style: SectionStyle::Lines,
            fields,
        }
    }

    pub const fn entities(key: &'static str, title: &'static str) -> Self {
        Self {
            key,
            title,
            style: SectionStyle::Entities,
            fields: &[],
        }
    }

    pub const fn impression(fields: &'static [FieldDecl]) -> Self {
        Self {
            key: "impression",
            title: "Impression",
            style: SectionStyle::Impression,
            fields,
        }
    }
}

/// Repeated entities of an organ (nodules, lesions, fetuses)
#[derive(Debug, Clone, Copy)]
pub struct CollectionDecl {
    pub key: &'static str,
    /// Heading of each block, followed by the entity's display number
    pub item_label: &'static str,
    pub fields: &'static [FieldDecl],
}

#[derive(Debug)]
pub struct OrganSchema {
    pub organ: Organ,
    /// Document title
    pub title: &'static str,
    pub sections: &'static [SectionDecl],
    pub collection: Option<CollectionDecl>,
}

impl OrganSchema {
    /// Returns every record-level input field in section order
    pub fn input_fields(&self) -> Vec<FieldDecl> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .filter(|f| f.is_input())
            .copied()
            .collect()
    }
}

/// Returns the schema of an organ
pub fn for_organ(organ: Organ) -> &'static OrganSchema {
    match organ {
        Organ::Thyroid => &thyroid::SCHEMA,
        Organ::Breast => &breast::SCHEMA,
        Organ::Echo => &echo::SCHEMA,
        Organ::Obstetric => &obstetric::SCHEMA,
    }
}

pub(crate) const IMPRESSION: &[FieldDecl] = &[FieldDecl::paragraph("impression", "Impression")];

pub(crate) const OTHER_FINDINGS: &[FieldDecl] =
    &[FieldDecl::paragraph("other_findings", "Other findings")];

/// Laterality options
pub(crate) const SIDE: Labels = Labels::Table(&[("right", "Right"), ("left", "Left")]);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_field_keys_are_unique() {
        for organ in Organ::ALL {
            let schema = for_organ(organ);
            let mut seen = BTreeSet::new();
            for decl in schema.sections.iter().flat_map(|s| s.fields.iter()) {
                assert!(
                    seen.insert(decl.key),
                    "duplicate {} field {}",
                    organ,
                    decl.key
                );
            }
            if let Some(collection) = schema.collection {
                let mut seen = BTreeSet::new();
                for decl in collection.fields {
                    assert!(seen.insert(decl.key), "duplicate entity field {}", decl.key);
                }
            }
        }
    }

    #[test]
    fn test_entity_placeholder_matches_collection() {
        for organ in Organ::ALL {
            let schema = for_organ(organ);
            let placeholders: Vec<_> = schema
                .sections
                .iter()
                .filter(|s| s.style == SectionStyle::Entities)
                .map(|s| s.key)
                .collect();
            match schema.collection {
                Some(c) => assert_eq!(placeholders, vec![c.key]),
                None => assert!(placeholders.is_empty()),
            }
        }
    }

    #[test]
    fn test_section_keys_do_not_shadow_collection() {
        for organ in Organ::ALL {
            let schema = for_organ(organ);
            let sections: Vec<_> = schema
                .sections
                .iter()
                .filter(|s| s.style != SectionStyle::Entities)
                .map(|s| s.key)
                .collect();
            let keys: BTreeSet<_> = sections.iter().copied().collect();
            assert_eq!(keys.len(), sections.len());
            if let Some(c) = schema.collection {
                assert!(!keys.contains(c.key));
            }
        }
    }

    #[test]
    fn test_every_organ_has_impression() {
        for organ in Organ::ALL {
            let schema = for_organ(organ);
            assert_eq!(schema.organ, organ);
            assert!(schema
                .input_fields()
                .iter()
                .any(|f| f.key == "impression"));
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(SIDE.label("RIGHT"), Some("Right"));
        assert_eq!(SIDE.label("middle"), None);

        fn x_label(code: &str) -> Option<&'static str> {
            (code == "x").then_some("X")
        }
        assert_eq!(Labels::Lookup(x_label).label(" x "), Some("X"));
    }
}
