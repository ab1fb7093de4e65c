//! Findings document model and the schema-driven composer
//!
//! The composer walks the organ's section table and emits a line only for
//! fields that hold a value. Sections without lines are left out, so an
//! empty record composes to a document with a title and nothing else.

use crate::calc::gestational_age::{format_date, parse_date};
use crate::calc::{DerivedOutputs, DerivedValues};
use crate::schema::{self, CollectionDecl, FieldDecl, FieldKind, Labels, SectionDecl, SectionStyle};
use crate::scoring::ScoreOutputs;
use crate::types::{format_number, FieldMap, MeasurementRecord, NONE_SELECTED};
use log::debug;
use serde::Serialize;

/// Composed findings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum SectionBody {
    /// Label/value lines
    Lines(Vec<Line>),
    /// Free-text paragraphs, one entry per line
    Text(Vec<String>),
    /// One block per entity, in collection order
    Blocks(Vec<Block>),
}

/// One entity's lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    /// 1-based display number of the entity
    pub number: usize,
    pub heading: String,
    pub lines: Vec<Line>,
}

/// A label with its value
///
/// Multi-line values keep one entry per line; the renderer decides how to
/// break and indent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub label: String,
    pub value: Vec<String>,
}

impl Line {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: vec![value.into()],
        }
    }
}

/// Where a field's value is read from
struct Sources<'a> {
    fields: &'a FieldMap,
    derived: Option<&'a DerivedValues>,
    scores: &'a ScoreOutputs,
    entity_id: Option<u64>,
}

/// Composes the findings document of a record
///
/// # Example
///
/// ```
/// use sonoreport_core::{compose, recompute, score_record, CalcConfig, MeasurementRecord, Organ};
///
/// let mut record = MeasurementRecord::new(Organ::Echo);
/// record.fields.set("lvidd", 50.0);
/// record.fields.set("lvids", 32.0);
///
/// let derived = recompute(&record, &CalcConfig::default());
/// let document = compose(&record, &derived, &score_record(&record));
///
/// assert_eq!(document.sections.len(), 1);
/// assert_eq!(document.sections[0].title, "Left ventricle");
/// ```
pub fn compose(
    record: &MeasurementRecord,
    derived: &DerivedOutputs,
    scores: &ScoreOutputs,
) -> Document {
    let schema = schema::for_organ(record.organ);
    let sources = Sources {
        fields: &record.fields,
        derived: Some(&derived.record),
        scores,
        entity_id: None,
    };

    let mut sections = Vec::new();
    for decl in schema.sections {
        let body = match decl.style {
            SectionStyle::Lines => {
                let lines = compose_lines(decl.fields, &sources);
                (!lines.is_empty()).then_some(SectionBody::Lines(lines))
            }
            SectionStyle::Entities => schema
                .collection
                .and_then(|c| compose_blocks(record, c, derived, scores))
                .map(SectionBody::Blocks),
            SectionStyle::Impression => {
                compose_impression(decl, record, scores).map(SectionBody::Text)
            }
        };
        if let Some(body) = body {
            sections.push(Section {
                title: decl.title.to_string(),
                body,
            });
        }
    }

    Document {
        title: schema.title.to_string(),
        sections,
    }
}

fn compose_lines(decls: &[FieldDecl], sources: &Sources<'_>) -> Vec<Line> {
    decls
        .iter()
        .filter_map(|decl| {
            resolve(decl, sources).map(|value| Line {
                label: decl.label.to_string(),
                value,
            })
        })
        .collect()
}

fn compose_blocks(
    record: &MeasurementRecord,
    collection: CollectionDecl,
    derived: &DerivedOutputs,
    scores: &ScoreOutputs,
) -> Option<Vec<Block>> {
    let mut blocks = Vec::new();
    for entity in record.entities() {
        if !entity.is_valid() {
            debug!("Skipping invalid {} entity {}", collection.key, entity.id);
            continue;
        }
        let sources = Sources {
            fields: &entity.fields,
            derived: derived.entity(entity.id),
            scores,
            entity_id: Some(entity.id),
        };
        let lines = compose_lines(collection.fields, &sources);
        if lines.is_empty() {
            continue;
        }
        blocks.push(Block {
            number: entity.number,
            heading: format!("{} {}", collection.item_label, entity.number),
            lines,
        });
    }
    (!blocks.is_empty()).then_some(blocks)
}

/// Operator text, or a summary of the scored entities when none was entered
fn compose_impression(
    decl: &SectionDecl,
    record: &MeasurementRecord,
    scores: &ScoreOutputs,
) -> Option<Vec<String>> {
    let entered: Vec<String> = decl
        .fields
        .iter()
        .filter_map(|f| record.fields.text(f.key))
        .flat_map(|text| paragraph_lines(&text))
        .collect();
    if !entered.is_empty() {
        return Some(entered);
    }

    let item_label = schema::for_organ(record.organ)
        .collection
        .map_or("Finding", |c| c.item_label);
    let mut summary: Vec<String> = record
        .entities()
        .iter()
        .filter_map(|entity| {
            let assessment = scores.get(entity.id)?;
            Some(format!(
                "{} {}: {}. {}.",
                item_label,
                entity.number,
                assessment.category.full_label(),
                assessment.recommendation
            ))
        })
        .collect();
    if let Some(category) = scores.final_category {
        summary.push(format!(
            "Overall assessment: {}. {}.",
            category.label(),
            category.recommendation()
        ));
    }
    (!summary.is_empty()).then_some(summary)
}

/// Resolves the display value of one field, or `None` to suppress the line
fn resolve(decl: &FieldDecl, sources: &Sources<'_>) -> Option<Vec<String>> {
    let fields = sources.fields;
    let key = decl.key;
    let single = |s: String| Some(vec![with_unit(s, decl.unit)]);

    match decl.kind {
        FieldKind::Number => fields.number(key).map(format_number).and_then(single),
        FieldKind::Text | FieldKind::Paragraph => {
            let text = fields.text(key)?;
            let mut lines = paragraph_lines(&text);
            if let Some(last) = lines.last_mut() {
                *last = with_unit(std::mem::take(last), decl.unit);
            }
            Some(lines)
        }
        FieldKind::Flag => fields
            .flag(key)
            .map(|b| if b { "Yes" } else { "No" }.to_string())
            .and_then(single),
        FieldKind::Date => {
            let text = fields.text(key)?;
            single(parse_date(&text).map(format_date).unwrap_or(text))
        }
        FieldKind::Choice(labels) => {
            let code = fields.text(key)?;
            single(choice_label(&labels, code))
        }
        FieldKind::MultiChoice(labels) => join_selection(&labels, fields.list(key)).and_then(single),
        FieldKind::Derived => sources.derived?.display(key).and_then(single),
        FieldKind::Score(field) => sources.scores.display(sources.entity_id, field).and_then(single),
    }
}

fn choice_label(labels: &Labels, code: String) -> String {
    match labels.label(&code) {
        Some(label) => label.to_string(),
        None => code,
    }
}

/// Joins a multi-select, dropping the "none" sentinel unless it is alone
fn join_selection(labels: &Labels, codes: Vec<String>) -> Option<String> {
    if codes.is_empty() {
        return None;
    }
    let selected: Vec<String> = codes
        .into_iter()
        .filter(|c| !c.eq_ignore_ascii_case(NONE_SELECTED))
        .map(|c| choice_label(labels, c))
        .collect();
    if selected.is_empty() {
        Some("None".to_string())
    } else {
        Some(selected.join(", "))
    }
}

fn with_unit(value: String, unit: Option<&str>) -> String {
    match unit.filter(|u| !u.is_empty()) {
        Some("%") => format!("{}%", value),
        Some(unit) => format!("{} {}", value, unit),
        None => value,
    }
}

/// Splits free text into lines, dropping leading and trailing blank lines
fn paragraph_lines(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].iter().map(|l| l.to_string()).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::recompute;
    use crate::scoring::score_record;
    use crate::types::{CalcConfig, EntitySequence, Organ};

    fn compose_all(record: &MeasurementRecord) -> Document {
        let derived = recompute(record, &CalcConfig::default());
        compose(record, &derived, &score_record(record))
    }

    fn lines<'a>(document: &'a Document, title: &str) -> &'a [Line] {
        match &document.section(title).expect("section present").body {
            SectionBody::Lines(lines) => lines,
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_empty_record_has_no_sections() {
        for organ in crate::types::Organ::ALL {
            let document = compose_all(&MeasurementRecord::new(organ));
            assert!(document.sections.is_empty(), "{}", organ);
            assert!(!document.title.is_empty());
        }
    }

    #[test]
    fn test_single_field_gives_single_line() {
        let mut record = MeasurementRecord::new(Organ::Echo);
        record.fields.set("la_diameter", 38.0);

        let document = compose_all(&record);

        assert_eq!(document.sections.len(), 1);
        assert_eq!(
            lines(&document, "Atria and aorta"),
            &[Line::new("LA diameter", "38 mm")]
        );
    }

    #[test]
    fn test_zero_is_reported_blank_is_not() {
        let mut record = MeasurementRecord::new(Organ::Echo);
        record.fields.set("peak_e", 0.0);
        record.fields.set("peak_a", 0.6);
        record.fields.set("e_prime_septal", "   ");

        let document = compose_all(&record);
        let diastolic = lines(&document, "Diastolic function");

        assert_eq!(
            diastolic,
            &[
                Line::new("Peak E", "0 m/s"),
                Line::new("Peak A", "0.6 m/s"),
                Line::new("E/A", "0.00"),
            ]
        );
    }

    #[test]
    fn test_derived_precision_comes_from_calculator() {
        let mut record = MeasurementRecord::new(Organ::Echo);
        record.fields.set("lvidd", 50.0);
        record.fields.set("lvids", 32.0);
        record.fields.set("height", 1.7);
        record.fields.set("weight", 70.0);

        let document = compose_all(&record);

        assert!(lines(&document, "Left ventricle").contains(&Line::new("EF (Teichholz)", "65%")));
        assert!(lines(&document, "Patient").contains(&Line::new("BSA", "1.82 m²")));
    }

    #[test]
    fn test_no_invalid_numbers_rendered() {
        let mut record = MeasurementRecord::new(Organ::Echo);
        record.fields.set("lvidd", 30.0);
        record.fields.set("lvids", 32.0);
        record.fields.set("mv_pht", "abc");
        record.fields.set("height", f64::NAN);

        let text = format!("{:?}", compose_all(&record));

        for bad in ["NaN", "inf", "undefined"] {
            assert!(!text.contains(bad), "rendered {}", bad);
        }
    }

    #[test]
    fn test_multi_select_sentinel() {
        let labels = Labels::Table(&[("none", "None"), ("a", "Alpha"), ("b", "Beta")]);
        let codes = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(join_selection(&labels, codes(&["none"])), Some("None".into()));
        assert_eq!(
            join_selection(&labels, codes(&["none", "a", "b"])),
            Some("Alpha, Beta".into())
        );
        assert_eq!(join_selection(&labels, codes(&["zeta"])), Some("zeta".into()));
        assert_eq!(join_selection(&labels, Vec::new()), None);
    }

    #[test]
    fn test_entity_blocks_in_collection_order() {
        let mut seq = EntitySequence::new();
        let mut record = MeasurementRecord::new(Organ::Thyroid);
        for size in [30.0, 8.0] {
            let nodule = record.add_entity(&mut seq).unwrap();
            nodule.fields.set("composition", "solid");
            nodule.fields.set("foci", vec!["none"]);
            nodule.fields.set("length", size);
        }
        // an untouched slot produces no block
        record.add_entity(&mut seq);

        let document = compose_all(&record);
        let SectionBody::Blocks(blocks) = &document.section("Nodules").unwrap().body else {
            panic!("expected blocks");
        };

        let headings: Vec<_> = blocks.iter().map(|b| b.heading.as_str()).collect();
        assert_eq!(headings, vec!["Nodule 1", "Nodule 2"]);
        assert!(blocks[0]
            .lines
            .contains(&Line::new("Composition", "Solid or almost completely solid")));
        assert!(blocks[0].lines.contains(&Line::new("Echogenic foci", "None")));
        assert!(blocks[0].lines.contains(&Line::new("Maximum dimension", "30.0 mm")));
        assert!(blocks[0]
            .lines
            .contains(&Line::new("TI-RADS category", "TR2 (Not suspicious)")));
    }

    #[test]
    fn test_paragraph_lines_preserved() {
        let mut record = MeasurementRecord::new(Organ::Thyroid);
        record.fields.set("lymph_nodes", "\nLevel III node 8 mm.\n\n  Fatty hilum present.  \n\n");

        let document = compose_all(&record);

        assert_eq!(
            lines(&document, "Neck")[0].value,
            vec!["Level III node 8 mm.", "", "  Fatty hilum present."]
        );
    }

    #[test]
    fn test_impression_prefers_operator_text() {
        let mut seq = EntitySequence::new();
        let mut record = MeasurementRecord::new(Organ::Breast);
        let lesion = record.add_entity(&mut seq).unwrap();
        lesion.fields.set("shape", "irregular");
        lesion.fields.set("margin", "spiculated");

        let document = compose_all(&record);
        let impression = &document.section("Impression").unwrap().body;
        assert_eq!(
            impression,
            &SectionBody::Text(vec![
                "Lesion 1: BI-RADS 4C (High suspicion for malignancy). Tissue diagnosis."
                    .to_string()
            ])
        );

        record.fields.set("impression", "Suspicious mass, right breast.");
        let document = compose_all(&record);
        assert_eq!(
            document.section("Impression").unwrap().body,
            SectionBody::Text(vec!["Suspicious mass, right breast.".to_string()])
        );
    }

    #[test]
    fn test_choice_date_and_score_lines() {
        let mut record = MeasurementRecord::new(Organ::Breast);
        record.fields.set("birads_final", "4a");
        let document = compose_all(&record);
        assert_eq!(
            lines(&document, "Assessment"),
            &[
                Line::new("Final assessment", "BI-RADS 4A"),
                Line::new("Management", "Tissue diagnosis"),
            ]
        );

        let mut record = MeasurementRecord::new(Organ::Obstetric);
        record.fields.set("exam_date", "05/03/2024");
        let document = compose_all(&record);
        assert_eq!(
            lines(&document, "Examination"),
            &[Line::new("Exam date", "2024-03-05")]
        );
    }

    #[test]
    fn test_compose_is_idempotent() {
        let mut seq = EntitySequence::new();
        let mut record = MeasurementRecord::new(Organ::Obstetric);
        record.fields.set("exam_date", "2024-01-01");
        let fetus = record.add_entity(&mut seq).unwrap();
        fetus.fields.set("ga_bpd", "20w0d");
        fetus.fields.set("bpd", 48.0);

        let derived = recompute(&record, &CalcConfig::default());
        let scores = score_record(&record);

        let first = serde_json::to_string(&compose(&record, &derived, &scores)).unwrap();
        let second = serde_json::to_string(&compose(&record, &derived, &scores)).unwrap();
        assert_eq!(first, second);
    }
}
