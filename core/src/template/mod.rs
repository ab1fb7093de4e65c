//! Nested template tree <-> flat field map
//!
//! A template is the JSON tree of one record:
//!
//! ```json
//! { "thyroid": {
//!     "right_lobe": { "right_lobe_length": 45, "right_lobe_width": 15 },
//!     "impression": { "impression": "Normal thyroid." },
//!     "nodules": [ { "composition": "solid", "length": 12 } ]
//! } }
//! ```
//!
//! Section objects hold the record-level fields; the collection array holds
//! one flat object per entity. Loading validates the whole record level
//! before building anything, so a rejected template never leaves a record
//! half-populated.

pub mod preset;

use crate::error::TemplateError;
use crate::schema::{self, FieldDecl, SectionStyle};
use crate::types::{EntityRecord, EntitySequence, FieldMap, FieldValue, MeasurementRecord, Organ};
use log::{debug, warn};
use serde_json::{Map, Value};

pub use preset::{Preset, PresetLibrary};

/// Record-level fields of a template plus its raw entity objects
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTemplate {
    pub organ: Organ,
    /// Every declared record-level input field, keyed by canonical name
    pub fields: FieldMap,
    /// Entity objects in template order, validated only when populated
    pub entities: Vec<Value>,
}

/// Result of loading a template
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub record: MeasurementRecord,
    /// Ids of entities that could not be populated
    pub invalid_entities: Vec<u64>,
}

/// Finds the single organ key of a template tree
pub fn detect_organ(nested: &Value) -> Result<Organ, TemplateError> {
    let root = nested.as_object().ok_or(TemplateError::NotAnObject)?;
    let mut found = Organ::ALL.iter().copied().filter(|o| root.contains_key(o.key()));
    match (found.next(), found.next()) {
        (Some(organ), None) => Ok(organ),
        (Some(_), Some(_)) => Err(TemplateError::schema(
            "organ schema: more than one organ key present",
        )),
        (None, _) => Err(TemplateError::schema("organ schema: no organ key present")),
    }
}

/// Flattens a template tree, detecting its organ
pub fn flatten(nested: &Value) -> Result<FlatTemplate, TemplateError> {
    flatten_as(nested, detect_organ(nested)?)
}

/// Flattens the `organ` part of a template tree
///
/// Undeclared keys are logged and skipped. A section or field of the wrong
/// JSON type rejects the whole template.
pub fn flatten_as(nested: &Value, organ: Organ) -> Result<FlatTemplate, TemplateError> {
    let root = nested.as_object().ok_or(TemplateError::NotAnObject)?;
    let body = root
        .get(organ.key())
        .ok_or_else(|| TemplateError::schema(format!("{} schema: missing '{}' key", organ, organ.key())))?
        .as_object()
        .ok_or(TemplateError::NotAnObject)?;
    let schema = schema::for_organ(organ);

    let mut fields = FieldMap::initialized(&schema.input_fields());
    let mut entities = Vec::new();

    for (key, value) in body {
        if let Some(collection) = schema.collection.filter(|c| c.key == key.as_str()) {
            entities = match value {
                Value::Null => Vec::new(),
                Value::Array(items) => items.clone(),
                _ => {
                    return Err(TemplateError::schema(format!(
                        "{} schema: '{}' is not an array",
                        organ, collection.key
                    )))
                }
            };
            continue;
        }

        let Some(section) = schema
            .sections
            .iter()
            .find(|s| s.key == key.as_str() && s.style != SectionStyle::Entities)
        else {
            warn!("Ignoring unknown {} template section '{}'", organ, key);
            continue;
        };
        let section_body = match value {
            Value::Null => continue,
            Value::Object(map) => map,
            _ => {
                return Err(TemplateError::schema(format!(
                    "{} schema: section '{}' is not an object",
                    organ, key
                )))
            }
        };
        read_fields(section.fields, section_body, &mut fields)
            .map_err(|reason| TemplateError::schema(format!("{} schema: {}", organ, reason)))?;
    }

    Ok(FlatTemplate {
        organ,
        fields,
        entities,
    })
}

/// Rebuilds the template tree of a flat template
///
/// Every declared section and field is written, blank ones as `null`.
pub fn unflatten(flat: &FlatTemplate) -> Value {
    let schema = schema::for_organ(flat.organ);
    let mut body = Map::new();

    for section in schema.sections {
        if section.style == SectionStyle::Entities {
            continue;
        }
        let values = write_fields(section.fields, &flat.fields);
        if section.fields.iter().any(FieldDecl::is_input) {
            body.insert(section.key.to_string(), Value::Object(values));
        }
    }
    if let Some(collection) = schema.collection {
        body.insert(
            collection.key.to_string(),
            Value::Array(flat.entities.clone()),
        );
    }

    let mut root = Map::new();
    root.insert(flat.organ.key().to_string(), Value::Object(body));
    Value::Object(root)
}

/// Captures a live record as a template tree
///
/// # Example
///
/// ```
/// use sonoreport_core::template::{load, snapshot};
/// use sonoreport_core::{EntitySequence, MeasurementRecord, Organ};
///
/// let mut record = MeasurementRecord::new(Organ::Echo);
/// record.fields.set("lvidd", 50.0);
///
/// let tree = snapshot(&record);
/// assert_eq!(tree["echo"]["left_ventricle"]["lvidd"], 50.0);
///
/// let loaded = load(&tree, &mut EntitySequence::new()).unwrap();
/// assert_eq!(loaded.record, record);
/// ```
pub fn snapshot(record: &MeasurementRecord) -> Value {
    let entities = match schema::for_organ(record.organ).collection {
        Some(collection) => record
            .entities()
            .iter()
            .map(|e| Value::Object(write_fields(collection.fields, &e.fields)))
            .collect(),
        None => Vec::new(),
    };
    unflatten(&FlatTemplate {
        organ: record.organ,
        fields: record.fields.clone(),
        entities,
    })
}

/// Populates one entity from its template object
///
/// The entity is only modified when every field is valid.
pub fn populate(
    entity: &mut EntityRecord,
    decls: &[FieldDecl],
    value: &Value,
) -> Result<(), TemplateError> {
    let object = value.as_object().ok_or(TemplateError::NotAnObject)?;
    let mut fields = FieldMap::initialized(decls);
    read_fields(decls, object, &mut fields).map_err(TemplateError::WrongSchema)?;
    entity.fields = fields;
    entity.invalid = None;
    Ok(())
}

/// Loads a template tree into a fresh record, detecting the organ
pub fn load(nested: &Value, seq: &mut EntitySequence) -> Result<LoadOutcome, TemplateError> {
    load_flat(flatten(nested)?, seq)
}

/// Loads the `organ` part of a template tree into a fresh record
pub fn load_as(
    nested: &Value,
    organ: Organ,
    seq: &mut EntitySequence,
) -> Result<LoadOutcome, TemplateError> {
    load_flat(flatten_as(nested, organ)?, seq)
}

/// Replaces `record` with the loaded template, leaving it untouched on error
pub fn load_into(
    record: &mut MeasurementRecord,
    nested: &Value,
    seq: &mut EntitySequence,
) -> Result<Vec<u64>, TemplateError> {
    let outcome = load_as(nested, record.organ, seq)?;
    *record = outcome.record;
    Ok(outcome.invalid_entities)
}

/// Builds a record from a validated flat template
///
/// Entity slots are created in template order; an entity that fails to
/// populate is marked invalid and loading continues with the next one.
pub fn load_flat(
    flat: FlatTemplate,
    seq: &mut EntitySequence,
) -> Result<LoadOutcome, TemplateError> {
    let mut record = MeasurementRecord::new(flat.organ);
    let known = record.fields.clone();
    for (key, value) in flat.fields.iter() {
        if known.contains_key(key) {
            record.fields.set(key.clone(), value.clone());
        }
    }

    let mut invalid_entities = Vec::new();
    if let Some(collection) = schema::for_organ(flat.organ).collection {
        for (idx, value) in flat.entities.iter().enumerate() {
            let Some(entity) = record.add_entity(seq) else {
                break;
            };
            if let Err(e) = populate(entity, collection.fields, value) {
                warn!(
                    "{} entry {} could not be loaded: {}",
                    collection.item_label,
                    idx + 1,
                    e
                );
                entity.invalid = Some(e.to_string());
                invalid_entities.push(entity.id);
            }
        }
    }

    debug!(
        "Loaded {} template with {} entities ({} invalid)",
        flat.organ,
        flat.entities.len(),
        invalid_entities.len()
    );
    Ok(LoadOutcome {
        record,
        invalid_entities,
    })
}

fn read_fields(
    decls: &[FieldDecl],
    object: &Map<String, Value>,
    fields: &mut FieldMap,
) -> Result<(), String> {
    for (key, value) in object {
        if !decls.iter().any(|d| d.is_input() && d.key == key.as_str()) {
            debug!("Ignoring undeclared template field '{}'", key);
            continue;
        }
        let parsed = field_value(value)
            .ok_or_else(|| format!("field '{}' holds an unsupported value", key))?;
        fields.set(key.clone(), parsed);
    }
    Ok(())
}

fn write_fields(decls: &[FieldDecl], fields: &FieldMap) -> Map<String, Value> {
    decls
        .iter()
        .filter(|d| d.is_input())
        .map(|d| {
            let value = fields
                .get(d.key)
                .and_then(|v| serde_json::to_value(v).ok())
                .unwrap_or(Value::Null);
            (d.key.to_string(), value)
        })
        .collect()
}

/// Converts a JSON leaf into a field value; objects and nested arrays are rejected
fn field_value(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => Some(FieldValue::Null),
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(FieldValue::Number),
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(FieldValue::List),
        Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thyroid_tree() -> Value {
        json!({
            "thyroid": {
                "right_lobe": { "right_lobe_length": 45, "right_lobe_width": "15" },
                "gland": { "echotexture": "homogeneous" },
                "impression": { "impression": "Multinodular goitre." },
                "nodules": [
                    { "composition": "solid", "foci": ["punctate", "macrocalcifications"], "length": 12 },
                    { "composition": "mixed" }
                ]
            }
        })
    }

    #[test]
    fn test_detect_organ() {
        assert_eq!(detect_organ(&thyroid_tree()), Ok(Organ::Thyroid));
        assert_eq!(detect_organ(&json!([1, 2])), Err(TemplateError::NotAnObject));
        assert!(matches!(
            detect_organ(&json!({ "liver": {} })),
            Err(TemplateError::WrongSchema(_))
        ));
        assert!(matches!(
            detect_organ(&json!({ "echo": {}, "breast": {} })),
            Err(TemplateError::WrongSchema(_))
        ));
    }

    #[test]
    fn test_flatten_reads_declared_fields() {
        let flat = flatten(&thyroid_tree()).unwrap();

        assert_eq!(flat.organ, Organ::Thyroid);
        assert_eq!(flat.fields.number("right_lobe_length"), Some(45.0));
        assert_eq!(flat.fields.number("right_lobe_width"), Some(15.0));
        assert_eq!(flat.fields.text("echotexture").as_deref(), Some("homogeneous"));
        // declared but absent fields are present as Null
        assert_eq!(flat.fields.get("isthmus"), Some(&FieldValue::Null));
        assert_eq!(flat.entities.len(), 2);
    }

    #[test]
    fn test_flatten_rejects_wrong_types() {
        let not_object = json!({ "thyroid": [] });
        assert_eq!(flatten(&not_object), Err(TemplateError::NotAnObject));

        let bad_section = json!({ "thyroid": { "gland": "homogeneous" } });
        assert!(matches!(flatten(&bad_section), Err(TemplateError::WrongSchema(_))));

        let bad_field = json!({ "thyroid": { "gland": { "isthmus": { "value": 3 } } } });
        assert!(matches!(flatten(&bad_field), Err(TemplateError::WrongSchema(_))));

        let bad_collection = json!({ "thyroid": { "nodules": {} } });
        assert!(matches!(flatten(&bad_collection), Err(TemplateError::WrongSchema(_))));
    }

    #[test]
    fn test_flatten_as_requires_organ_key() {
        let err = flatten_as(&thyroid_tree(), Organ::Breast).unwrap_err();
        assert_eq!(
            err.to_string(),
            "template does not match the breast schema: missing 'breast' key"
        );
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let tree = json!({
            "echo": {
                "patient": { "height": 170, "eye_colour": "blue" },
                "notes": { "anything": 1 }
            }
        });
        let flat = flatten(&tree).unwrap();
        assert_eq!(flat.fields.number("height"), Some(170.0));
        assert!(flat.fields.get("eye_colour").is_none());
    }

    #[test]
    fn test_round_trip_keeps_every_declared_field() {
        let flat = flatten(&thyroid_tree()).unwrap();
        let tree = unflatten(&flat);

        assert_eq!(flatten(&tree).unwrap(), flat);
        assert_eq!(tree["thyroid"]["right_lobe"]["right_lobe_depth"], Value::Null);
        assert_eq!(tree["thyroid"]["nodules"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_round_trip_empty_collection() {
        let record = MeasurementRecord::new(Organ::Obstetric);
        let tree = snapshot(&record);
        assert_eq!(tree["obstetric"]["fetuses"], json!([]));

        let flat = flatten(&tree).unwrap();
        assert_eq!(unflatten(&flat), tree);
        let loaded = load(&tree, &mut EntitySequence::new()).unwrap();
        assert_eq!(loaded.record, record);
    }

    #[test]
    fn test_load_preserves_order_and_numbers() {
        let mut seq = EntitySequence::new();
        let outcome = load(&thyroid_tree(), &mut seq).unwrap();

        let nodules = outcome.record.entities();
        assert_eq!(nodules.len(), 2);
        assert_eq!(nodules[0].number, 1);
        assert_eq!(nodules[0].fields.list("foci"), vec!["punctate", "macrocalcifications"]);
        assert_eq!(nodules[1].fields.text("composition").as_deref(), Some("mixed"));
        assert!(outcome.invalid_entities.is_empty());
    }

    #[test]
    fn test_invalid_entity_does_not_abort_load() {
        let tree = json!({
            "breast": {
                "lesions": [
                    { "shape": "oval" },
                    "not an object",
                    { "margin": { "nested": true } },
                    { "shape": "irregular" }
                ]
            }
        });
        let mut seq = EntitySequence::new();

        let outcome = load(&tree, &mut seq).unwrap();
        let lesions = outcome.record.entities();

        assert_eq!(lesions.len(), 4);
        assert_eq!(outcome.invalid_entities, vec![lesions[1].id, lesions[2].id]);
        assert_eq!(lesions[1].invalid.as_deref(), Some("template is not an object"));
        assert!(lesions[3].is_valid());
        assert_eq!(lesions[3].fields.text("shape").as_deref(), Some("irregular"));
        // the failed entity keeps its initialized slots
        assert_eq!(lesions[2].fields.get("margin"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_snapshot_load_round_trip() {
        let mut seq = EntitySequence::new();
        let mut record = MeasurementRecord::new(Organ::Breast);
        record.fields.set("birads_final", "4a");
        record.fields.set("right_axilla", "Normal.\nNo nodes.");
        let lesion = record.add_entity(&mut seq).unwrap();
        lesion.fields.set("calcifications", vec!["in_mass"]);
        lesion.fields.set("length", 11.5);

        let tree = snapshot(&record);
        let loaded = load(&tree, &mut EntitySequence::new()).unwrap();

        assert_eq!(loaded.record, record);
    }

    #[test]
    fn test_load_into_is_all_or_nothing() {
        let mut seq = EntitySequence::new();
        let mut record = MeasurementRecord::new(Organ::Thyroid);
        record.fields.set("isthmus", 4.0);
        let before = record.clone();

        let bad = json!({ "thyroid": { "gland": { "isthmus": 3, "vascularity": { "x": 1 } } } });
        assert!(load_into(&mut record, &bad, &mut seq).is_err());
        assert_eq!(record, before);

        let invalid = load_into(&mut record, &thyroid_tree(), &mut seq).unwrap();
        assert!(invalid.is_empty());
        assert_eq!(record.fields.number("isthmus"), None);
        assert_eq!(record.entities().len(), 2);
    }
}
