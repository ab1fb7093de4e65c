//! Named template presets
//!
//! Built-in presets describe a normal study per organ and cannot be changed.
//! User presets are saved from live records and are only replaced when the
//! caller asks for it. Persistence is left to the caller; the library only
//! converts its user presets to and from JSON.

use super::{detect_organ, flatten_as, load_as, snapshot, LoadOutcome};
use crate::error::{Result, TemplateError};
use crate::types::{EntitySequence, MeasurementRecord, Organ};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A named snapshot of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub organ: Organ,
    /// Nested template tree
    pub template: Value,
    #[serde(default, skip_serializing)]
    pub builtin: bool,
}

impl Preset {
    /// Creates a user preset from a template tree, validating it first
    pub fn new(name: impl Into<String>, template: Value) -> std::result::Result<Self, TemplateError> {
        let organ = detect_organ(&template)?;
        flatten_as(&template, organ)?;
        Ok(Self {
            name: name.into(),
            organ,
            template,
            builtin: false,
        })
    }

    /// Creates a user preset from a live record
    pub fn from_record(name: impl Into<String>, record: &MeasurementRecord) -> Self {
        Self {
            name: name.into(),
            organ: record.organ,
            template: snapshot(record),
            builtin: false,
        }
    }

    /// Loads the preset into a fresh record
    pub fn apply(&self, seq: &mut EntitySequence) -> std::result::Result<LoadOutcome, TemplateError> {
        load_as(&self.template, self.organ, seq)
    }

    fn builtin(name: &str, organ: Organ, template: Value) -> Self {
        Self {
            name: name.to_string(),
            organ,
            template,
            builtin: true,
        }
    }
}

/// Built-in and user presets of every organ
#[derive(Debug, Clone, PartialEq)]
pub struct PresetLibrary {
    presets: Vec<Preset>,
}

impl Default for PresetLibrary {
    fn default() -> Self {
        Self {
            presets: builtin_presets(),
        }
    }
}

impl PresetLibrary {
    /// Creates a library holding only the built-in presets
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, organ: Organ, name: &str) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|p| p.organ == organ && p.name == name)
    }

    /// Returns preset names of an organ, built-ins first
    pub fn names(&self, organ: Organ) -> Vec<&str> {
        self.presets
            .iter()
            .filter(|p| p.organ == organ)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Saves a user preset
    ///
    /// An existing user preset of the same organ and name is replaced only
    /// with `overwrite`; built-in presets are never replaced.
    pub fn save(&mut self, preset: Preset, overwrite: bool) -> std::result::Result<(), TemplateError> {
        match self
            .presets
            .iter()
            .position(|p| p.organ == preset.organ && p.name == preset.name)
        {
            Some(idx) if self.presets[idx].builtin => Err(TemplateError::ReadOnlyPreset(preset.name)),
            Some(_) if !overwrite => Err(TemplateError::PresetExists(preset.name)),
            Some(idx) => {
                info!("Replacing {} preset '{}'", preset.organ, preset.name);
                self.presets[idx] = Preset {
                    builtin: false,
                    ..preset
                };
                Ok(())
            }
            None => {
                self.presets.push(Preset {
                    builtin: false,
                    ..preset
                });
                Ok(())
            }
        }
    }

    pub fn remove(&mut self, organ: Organ, name: &str) -> std::result::Result<Preset, TemplateError> {
        let idx = self
            .presets
            .iter()
            .position(|p| p.organ == organ && p.name == name)
            .ok_or_else(|| TemplateError::PresetNotFound(name.to_string()))?;
        if self.presets[idx].builtin {
            return Err(TemplateError::ReadOnlyPreset(name.to_string()));
        }
        Ok(self.presets.remove(idx))
    }

    /// Loads a preset into a fresh record
    pub fn load(
        &self,
        organ: Organ,
        name: &str,
        seq: &mut EntitySequence,
    ) -> std::result::Result<LoadOutcome, TemplateError> {
        self.get(organ, name)
            .ok_or_else(|| TemplateError::PresetNotFound(name.to_string()))?
            .apply(seq)
    }

    /// Serializes the user presets
    pub fn to_json(&self) -> Result<String> {
        let user: Vec<&Preset> = self.presets.iter().filter(|p| !p.builtin).collect();
        Ok(serde_json::to_string_pretty(&user)?)
    }

    /// Restores user presets saved by [`PresetLibrary::to_json`]
    ///
    /// Every preset is validated; one invalid preset rejects the whole list.
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: Vec<Preset> = serde_json::from_str(json)?;
        let mut library = Self::new();
        for preset in stored {
            let validated = Preset::new(preset.name, preset.template)?;
            if validated.organ != preset.organ {
                return Err(TemplateError::schema(format!(
                    "{} schema: preset '{}' holds a {} template",
                    preset.organ, validated.name, validated.organ
                ))
                .into());
            }
            library.save(validated, true)?;
        }
        Ok(library)
    }
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::builtin(
            "Normal thyroid",
            Organ::Thyroid,
            json!({ "thyroid": {
                "gland": { "echotexture": "homogeneous", "vascularity": "normal" },
                "neck": { "lymph_nodes": "No suspicious cervical lymph nodes." },
                "impression": { "impression": "Normal thyroid ultrasound." },
                "nodules": []
            } }),
        ),
        Preset::builtin(
            "Normal breast",
            Organ::Breast,
            json!({ "breast": {
                "background": { "breast_composition": "fibroglandular", "skin": "Normal" },
                "axillae": {
                    "right_axilla": "No abnormal lymph nodes.",
                    "left_axilla": "No abnormal lymph nodes."
                },
                "assessment": { "birads_final": "1" },
                "impression": { "impression": "No sonographic evidence of malignancy." },
                "lesions": []
            } }),
        ),
        Preset::builtin(
            "Normal echo",
            Organ::Echo,
            json!({ "echo": {
                "left_ventricle": { "wall_motion": "No regional wall motion abnormality." },
                "valves": { "valves": "Structurally normal valves." },
                "pericardium": { "pericardium": "No pericardial effusion." },
                "impression": {
                    "impression": "Normal biventricular size and systolic function."
                }
            } }),
        ),
        Preset::builtin(
            "Singleton, normal",
            Organ::Obstetric,
            json!({ "obstetric": {
                "impression": { "impression": "Single live intrauterine pregnancy." },
                "fetuses": [
                    { "presentation": "cephalic", "placenta": "Posterior, clear of the os" }
                ]
            } }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_load_cleanly() {
        let library = PresetLibrary::new();
        for organ in Organ::ALL {
            let names = library.names(organ);
            assert_eq!(names.len(), 1, "{}", organ);

            let mut seq = EntitySequence::new();
            let outcome = library.load(organ, names[0], &mut seq).unwrap();
            assert!(outcome.invalid_entities.is_empty());
            assert_eq!(outcome.record.organ, organ);
            assert!(outcome.record.fields.text("impression").is_some());
        }
    }

    #[test]
    fn test_builtin_is_read_only() {
        let mut library = PresetLibrary::new();
        let preset = Preset::from_record("Normal echo", &MeasurementRecord::new(Organ::Echo));

        assert_eq!(
            library.save(preset, true),
            Err(TemplateError::ReadOnlyPreset("Normal echo".to_string()))
        );
        assert!(matches!(
            library.remove(Organ::Echo, "Normal echo"),
            Err(TemplateError::ReadOnlyPreset(_))
        ));
    }

    #[test]
    fn test_save_refuses_silent_overwrite() {
        let mut library = PresetLibrary::new();
        let mut record = MeasurementRecord::new(Organ::Thyroid);
        record.fields.set("isthmus", 3.0);
        library
            .save(Preset::from_record("Mine", &record), false)
            .unwrap();

        record.fields.set("isthmus", 5.0);
        assert_eq!(
            library.save(Preset::from_record("Mine", &record), false),
            Err(TemplateError::PresetExists("Mine".to_string()))
        );
        library
            .save(Preset::from_record("Mine", &record), true)
            .unwrap();

        let loaded = library
            .load(Organ::Thyroid, "Mine", &mut EntitySequence::new())
            .unwrap();
        assert_eq!(loaded.record.fields.number("isthmus"), Some(5.0));
    }

    #[test]
    fn test_same_name_per_organ() {
        let mut library = PresetLibrary::new();
        library
            .save(Preset::from_record("Mine", &MeasurementRecord::new(Organ::Echo)), false)
            .unwrap();
        library
            .save(Preset::from_record("Mine", &MeasurementRecord::new(Organ::Breast)), false)
            .unwrap();
        assert_eq!(library.names(Organ::Echo), vec!["Normal echo", "Mine"]);
    }

    #[test]
    fn test_missing_preset() {
        let mut library = PresetLibrary::new();
        assert!(matches!(
            library.load(Organ::Breast, "Nope", &mut EntitySequence::new()),
            Err(TemplateError::PresetNotFound(_))
        ));
        assert!(matches!(
            library.remove(Organ::Breast, "Nope"),
            Err(TemplateError::PresetNotFound(_))
        ));
    }

    #[test]
    fn test_new_validates_template() {
        assert_eq!(
            Preset::new("x", json!("text")),
            Err(TemplateError::NotAnObject)
        );
        assert!(Preset::new("x", json!({ "echo": { "patient": 3 } })).is_err());
        assert_eq!(
            Preset::new("x", json!({ "echo": {} })).unwrap().organ,
            Organ::Echo
        );
    }

    #[test]
    fn test_json_round_trip_keeps_user_presets_only() {
        let mut library = PresetLibrary::new();
        let mut record = MeasurementRecord::new(Organ::Breast);
        record.fields.set("skin", "Thickened");
        library
            .save(Preset::from_record("Thick skin", &record), false)
            .unwrap();

        let json = library.to_json().unwrap();
        assert!(!json.contains("Normal breast"));

        let restored = PresetLibrary::from_json(&json).unwrap();
        assert_eq!(restored, library);
    }

    #[test]
    fn test_from_json_rejects_invalid_preset() {
        let json = r#"[{"name": "bad", "organ": "echo", "template": {"echo": []}}]"#;
        assert!(PresetLibrary::from_json(json).is_err());
    }
}
