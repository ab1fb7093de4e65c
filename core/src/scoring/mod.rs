//! Risk scoring engines
//!
//! Feature selections are parsed into enumerated axis types, summed into a
//! point score, and mapped to a category and recommendation. Category and
//! recommendation are always derived from the point score; they are never
//! stored on the record.

mod macros;

pub mod birads;
pub mod tirads;

use crate::calc::max_dimension;
use crate::types::{FieldMap, MeasurementRecord, Organ};
use birads::{BiradsCategory, BiradsFeatures};
use log::warn;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tirads::{TiradsCategory, TiradsFeatures};

/// Scored category of either system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Tirads(TiradsCategory),
    Birads(BiradsCategory),
}

impl Category {
    /// Returns short label ("TR4", "BI-RADS 4A")
    pub fn label(&self) -> &'static str {
        match self {
            Category::Tirads(c) => c.label(),
            Category::Birads(c) => c.label(),
        }
    }

    /// Returns label with its risk wording ("TR4 (Moderately suspicious)")
    pub fn full_label(&self) -> String {
        let description = match self {
            Category::Tirads(c) => c.description(),
            Category::Birads(c) => c.description(),
        };
        format!("{} ({})", self.label(), description)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Score, category and recommendation for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub point_score: u8,
    pub category: Category,
    pub recommendation: &'static str,
}

/// Which part of a score a report line shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Points,
    Category,
    Recommendation,
    /// Management of the record-level final category (breast)
    FinalRecommendation,
}

/// Scores for every entity of a record, keyed by entity id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreOutputs {
    pub entities: BTreeMap<u64, Assessment>,

    /// Operator-selected final BI-RADS category
    #[serde(serialize_with = "serialize_final")]
    pub final_category: Option<BiradsCategory>,
}

fn serialize_final<S: Serializer>(
    category: &Option<BiradsCategory>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match category {
        Some(c) => serializer.serialize_some(c.label()),
        None => serializer.serialize_none(),
    }
}

impl ScoreOutputs {
    pub fn get(&self, entity_id: u64) -> Option<&Assessment> {
        self.entities.get(&entity_id)
    }

    /// Returns the display text of one score field
    ///
    /// `entity_id` selects the entity for per-entity fields and is ignored
    /// for record-level fields.
    pub fn display(&self, entity_id: Option<u64>, field: ScoreField) -> Option<String> {
        let entity = entity_id.and_then(|id| self.get(id));
        match field {
            ScoreField::Points => entity.map(|a| a.point_score.to_string()),
            ScoreField::Category => entity.map(|a| a.category.full_label()),
            ScoreField::Recommendation => entity.map(|a| a.recommendation.to_string()),
            ScoreField::FinalRecommendation => {
                self.final_category.map(|c| c.recommendation().to_string())
            }
        }
    }
}

/// Scores every valid entity of a record that has a feature selected or, for
/// thyroid nodules, a measured size
///
/// # Example
///
/// ```
/// use sonoreport_core::{score_record, EntitySequence, MeasurementRecord, Organ};
///
/// let mut seq = EntitySequence::new();
/// let mut record = MeasurementRecord::new(Organ::Thyroid);
/// let nodule = record.add_entity(&mut seq).unwrap();
/// nodule.fields.set("composition", "solid");
/// nodule.fields.set("echogenicity", "hypoechoic");
/// nodule.fields.set("length", 12.0);
/// let id = nodule.id;
///
/// let scores = score_record(&record);
/// let assessment = scores.get(id).unwrap();
/// assert_eq!(assessment.point_score, 4);
/// assert_eq!(assessment.recommendation, "Follow-up ultrasound at 1, 2, 3 and 5 years");
/// ```
pub fn score_record(record: &MeasurementRecord) -> ScoreOutputs {
    let mut outputs = ScoreOutputs::default();
    let entities = record.entities().iter().filter(|e| e.is_valid());
    match record.organ {
        Organ::Thyroid => {
            for nodule in entities {
                let features = TiradsFeatures::from_fields(&nodule.fields);
                let size = max_dimension(&nodule.fields);
                if features.is_empty() && size.is_none() {
                    continue;
                }
                let assessment = tirads::score(&features, size);
                outputs.entities.insert(nodule.id, assessment);
            }
        }
        Organ::Breast => {
            for lesion in entities {
                if let Some(assessment) = birads::assess(&BiradsFeatures::from_fields(&lesion.fields))
                {
                    outputs.entities.insert(lesion.id, assessment);
                }
            }
            outputs.final_category =
                parse_axis(&record.fields, "birads_final", BiradsCategory::from_code);
        }
        Organ::Echo | Organ::Obstetric => {}
    }
    outputs
}

/// Reads a single-select axis, logging codes that match no option
pub(crate) fn parse_axis<T>(
    fields: &FieldMap,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let code = fields.text(key)?;
    let parsed = parse(&code);
    if parsed.is_none() {
        warn!("Unrecognized {} selection '{}'; scoring it as 0", key, code);
    }
    parsed
}

/// Reads a multi-select axis, dropping codes that match no option
pub(crate) fn parse_multi_axis<T>(
    fields: &FieldMap,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Vec<T> {
    fields
        .list(key)
        .iter()
        .filter_map(|code| {
            let parsed = parse(code);
            if parsed.is_none() {
                warn!("Unrecognized {} selection '{}'; scoring it as 0", key, code);
            }
            parsed
        })
        .collect()
}
