use crate::schema::{self, FieldDecl};
use crate::types::{FieldValue, Organ};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat mapping of field name to value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, FieldValue>);

impl FieldMap {
    /// Creates an empty field map
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map with every declared input field set to `Null`
    pub fn initialized(decls: &[FieldDecl]) -> Self {
        let mut map = Self::new();
        for decl in decls.iter().filter(|d| d.is_input()) {
            map.0.insert(decl.key.to_string(), FieldValue::Null);
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Reads a finite number; missing keys and invalid text are `None`
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_number)
    }

    /// Reads a strictly positive number
    ///
    /// Most physiological inputs are meaningless at or below zero, so
    /// calculators read them through this accessor.
    pub fn positive(&self, key: &str) -> Option<f64> {
        self.number(key).filter(|n| *n > 0.0)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(FieldValue::as_list).unwrap_or_default()
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(FieldValue::as_flag)
    }

    pub fn is_blank(&self, key: &str) -> bool {
        self.get(key).map_or(true, FieldValue::is_blank)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Writes the declared keys of `inputs` and returns the undeclared ones
    fn apply(&mut self, decls: &[FieldDecl], inputs: &BTreeMap<String, FieldValue>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (key, value) in inputs {
            if decls.iter().any(|d| d.is_input() && d.key == key.as_str()) {
                self.0.insert(key.clone(), value.clone());
            } else {
                unknown.push(key.clone());
            }
        }
        unknown
    }
}

impl FromIterator<(String, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Caller-owned allocator for entity ids
///
/// Each editing session owns one sequence and passes it to every
/// entity-creating call, so ids are unique within that session only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySequence {
    next: u64,
}

impl Default for EntitySequence {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntitySequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// One repeated sub-entity (lesion, nodule, fetus)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Stable identifier allocated from an [`EntitySequence`]
    pub id: u64,

    /// 1-based display number (collection order)
    pub number: usize,

    pub fields: FieldMap,

    /// Reason this entity could not be populated from a template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid: Option<String>,
}

impl EntityRecord {
    /// Returns whether the entity was populated without errors
    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }
}

/// Measurement record for one exam of one organ
///
/// # Example
///
/// ```
/// use sonoreport_core::{EntitySequence, MeasurementRecord, Organ};
///
/// let mut seq = EntitySequence::new();
/// let mut record = MeasurementRecord::new(Organ::Thyroid);
///
/// let nodule = record.add_entity(&mut seq).unwrap();
/// nodule.fields.set("composition", "solid");
///
/// assert_eq!(record.entities().len(), 1);
/// assert_eq!(record.entities()[0].number, 1);
/// assert!(record.fields.get("impression").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub organ: Organ,
    pub fields: FieldMap,
    pub collections: BTreeMap<String, Vec<EntityRecord>>,
}

impl MeasurementRecord {
    /// Creates a record with every declared field initialized to `Null`
    pub fn new(organ: Organ) -> Self {
        let schema = schema::for_organ(organ);
        let mut collections = BTreeMap::new();
        if let Some(collection) = schema.collection {
            collections.insert(collection.key.to_string(), Vec::new());
        }
        Self {
            organ,
            fields: FieldMap::initialized(&schema.input_fields()),
            collections,
        }
    }

    /// Resets every field to `Null` and empties all collections
    pub fn clear(&mut self) {
        *self = Self::new(self.organ);
    }

    /// Returns the organ's repeated entities in collection order
    pub fn entities(&self) -> &[EntityRecord] {
        schema::for_organ(self.organ)
            .collection
            .and_then(|c| self.collections.get(c.key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends a new entity slot with all declared fields set to `Null`
    ///
    /// Returns `None` for organs without a repeated-entity collection.
    pub fn add_entity(&mut self, seq: &mut EntitySequence) -> Option<&mut EntityRecord> {
        let collection = schema::for_organ(self.organ).collection?;
        let entities = self.collections.entry(collection.key.to_string()).or_default();
        let number = entities.len() + 1;
        entities.push(EntityRecord {
            id: seq.next_id(),
            number,
            fields: FieldMap::initialized(collection.fields),
            invalid: None,
        });
        entities.last_mut()
    }

    pub fn entity(&self, id: u64) -> Option<&EntityRecord> {
        self.entities().iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: u64) -> Option<&mut EntityRecord> {
        self.collections
            .values_mut()
            .flat_map(|entities| entities.iter_mut())
            .find(|e| e.id == id)
    }

    /// Removes an entity and renumbers the remaining ones
    pub fn remove_entity(&mut self, id: u64) -> bool {
        for entities in self.collections.values_mut() {
            if let Some(pos) = entities.iter().position(|e| e.id == id) {
                entities.remove(pos);
                for (idx, entity) in entities.iter_mut().enumerate() {
                    entity.number = idx + 1;
                }
                return true;
            }
        }
        false
    }

    /// Merges a flat form or OCR result into the record-level fields
    ///
    /// Keys that are not declared input fields are skipped and returned.
    pub fn apply_inputs(&mut self, inputs: &BTreeMap<String, FieldValue>) -> Vec<String> {
        let decls = schema::for_organ(self.organ).input_fields();
        let unknown = self.fields.apply(&decls, inputs);
        for key in &unknown {
            warn!("Ignoring unknown {} field '{}'", self.organ, key);
        }
        unknown
    }

    /// Merges a flat form or OCR result into one entity
    ///
    /// Returns `None` if no entity has this id.
    pub fn apply_entity_inputs(
        &mut self,
        id: u64,
        inputs: &BTreeMap<String, FieldValue>,
    ) -> Option<Vec<String>> {
        let collection = schema::for_organ(self.organ).collection?;
        let entity = self.entity_mut(id)?;
        let unknown = entity.fields.apply(collection.fields, inputs);
        for key in &unknown {
            warn!("Ignoring unknown {} field '{}'", collection.key, key);
        }
        Some(unknown)
    }
}
