//! Derived-value calculators
//!
//! Every calculator is a pure function of the current record. Derived values
//! are never written back into the record; [`recompute`] rebuilds all of
//! them from scratch whenever the caller decides inputs changed.

pub mod echo;
pub mod gestational_age;
pub mod obstetric;
pub mod thyroid;

use crate::types::{CalcConfig, FieldMap, MeasurementRecord, Organ, Quantity};
use chrono::{Local, NaiveDate};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key of the per-entity maximum linear dimension (nodules, lesions)
pub const MAX_DIMENSION: &str = "max_dimension";

/// One derived output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DerivedValue {
    Quantity(Quantity),
    Text(String),
}

impl fmt::Display for DerivedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedValue::Quantity(q) => write!(f, "{}", q),
            DerivedValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Derived outputs of one record or entity, keyed by derived field name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DerivedValues(BTreeMap<&'static str, DerivedValue>);

impl DerivedValues {
    /// Stores `value` rounded to `decimals`; blank and non-finite values are skipped
    pub fn set_quantity(&mut self, key: &'static str, value: Option<f64>, decimals: u8) {
        if let Some(q) = value.and_then(|v| Quantity::new(v, decimals)) {
            self.0.insert(key, DerivedValue::Quantity(q));
        }
    }

    pub fn set_text(&mut self, key: &'static str, value: Option<String>) {
        if let Some(text) = value.filter(|t| !t.trim().is_empty()) {
            self.0.insert(key, DerivedValue::Text(text));
        }
    }

    pub fn get(&self, key: &str) -> Option<&DerivedValue> {
        self.0.get(key)
    }

    /// Returns the rounded numeric value of a quantity
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            DerivedValue::Quantity(q) => Some(q.value),
            DerivedValue::Text(_) => None,
        }
    }

    /// Returns the display text at the calculator's precision
    pub fn display(&self, key: &str) -> Option<String> {
        self.get(key).map(ToString::to_string)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&&'static str, &DerivedValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// All derived outputs of a record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedOutputs {
    /// Record-level values
    pub record: DerivedValues,

    /// Per-entity values keyed by entity id
    pub entities: BTreeMap<u64, DerivedValues>,
}

impl DerivedOutputs {
    pub fn entity(&self, id: u64) -> Option<&DerivedValues> {
        self.entities.get(&id)
    }
}

/// Recomputes every derived value of a record
///
/// Calculators run in dependency order; the result depends only on the
/// record, the configuration and the current date (used when an obstetric
/// record has no valid exam date).
///
/// # Example
///
/// ```
/// use sonoreport_core::{recompute, CalcConfig, MeasurementRecord, Organ};
///
/// let mut record = MeasurementRecord::new(Organ::Echo);
/// record.fields.set("lvidd", 50.0);
/// record.fields.set("lvids", 32.0);
///
/// let outputs = recompute(&record, &CalcConfig::default());
/// assert_eq!(outputs.record.display("ef").as_deref(), Some("65"));
/// ```
pub fn recompute(record: &MeasurementRecord, config: &CalcConfig) -> DerivedOutputs {
    recompute_on(record, config, Local::now().date_naive())
}

/// Same as [`recompute`] with an explicit current date
pub fn recompute_on(
    record: &MeasurementRecord,
    config: &CalcConfig,
    today: NaiveDate,
) -> DerivedOutputs {
    debug!("Recomputing derived values for {} record", record.organ);
    let mut outputs = DerivedOutputs::default();
    let entities = record.entities().iter().filter(|e| e.is_valid());

    match record.organ {
        Organ::Echo => {
            outputs.record = echo::derive(&record.fields, config);
        }
        Organ::Thyroid => {
            outputs.record = thyroid::derive_gland(&record.fields);
            for nodule in entities {
                outputs
                    .entities
                    .insert(nodule.id, thyroid::derive_nodule(&nodule.fields));
            }
        }
        Organ::Breast => {
            for lesion in entities {
                let mut values = DerivedValues::default();
                values.set_quantity(MAX_DIMENSION, max_dimension(&lesion.fields), 1);
                outputs.entities.insert(lesion.id, values);
            }
        }
        Organ::Obstetric => {
            let exam_date = record.fields.text("exam_date");
            let mut substituted = false;
            for fetus in entities {
                let derived =
                    obstetric::derive_fetus(&fetus.fields, exam_date.as_deref(), today, config);
                substituted |= derived.exam_date_substituted;
                outputs.entities.insert(fetus.id, derived.values);
            }
            outputs.record = obstetric::derive_dating(&record.fields, today, substituted);
        }
    }

    outputs
}

/// Largest of the entered length, width and depth
pub fn max_dimension(fields: &FieldMap) -> Option<f64> {
    ["length", "width", "depth"]
        .iter()
        .filter_map(|key| fields.positive(key))
        .reduce(f64::max)
}

/// Filters NaN and infinities out of a calculation result
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntitySequence;

    #[test]
    fn test_max_dimension() {
        let mut fields = FieldMap::new();
        assert_eq!(max_dimension(&fields), None);

        fields.set("length", 12.0);
        fields.set("width", "18,5");
        fields.set("depth", "");
        assert_eq!(max_dimension(&fields), Some(18.5));
    }

    #[test]
    fn test_blank_values_are_not_stored() {
        let mut values = DerivedValues::default();
        values.set_quantity("a", None, 1);
        values.set_quantity("b", Some(f64::NAN), 1);
        values.set_text("c", Some("  ".to_string()));
        assert!(values.is_empty());

        values.set_quantity("d", Some(0.0), 2);
        assert_eq!(values.display("d").as_deref(), Some("0.00"));
        assert_eq!(values.number("d"), Some(0.0));
    }

    #[test]
    fn test_recompute_breast_lesions() {
        let mut seq = EntitySequence::new();
        let mut record = MeasurementRecord::new(Organ::Breast);
        let lesion = record.add_entity(&mut seq).unwrap();
        lesion.fields.set("length", 14.0);
        lesion.fields.set("width", 9.0);
        let id = lesion.id;

        let outputs = recompute(&record, &CalcConfig::default());

        assert_eq!(
            outputs.entity(id).unwrap().display(MAX_DIMENSION).as_deref(),
            Some("14.0")
        );
        assert!(outputs.record.is_empty());
    }

    #[test]
    fn test_recompute_skips_invalid_entities() {
        let mut seq = EntitySequence::new();
        let mut record = MeasurementRecord::new(Organ::Thyroid);
        let nodule = record.add_entity(&mut seq).unwrap();
        nodule.invalid = Some("bad".to_string());
        let id = nodule.id;

        assert!(recompute(&record, &CalcConfig::default())
            .entity(id)
            .is_none());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut record = MeasurementRecord::new(Organ::Echo);
        record.fields.set("height", 1.7);
        record.fields.set("weight", 70.0);
        let config = CalcConfig::default();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert_eq!(
            recompute_on(&record, &config, today),
            recompute_on(&record, &config, today)
        );
    }
}
