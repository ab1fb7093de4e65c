//! Ultrasound measurement scoring and report composition
//!
//! A [`MeasurementRecord`] holds the operator-entered fields of one exam.
//! [`recompute`] derives physiological quantities from it, [`score_record`]
//! assigns TI-RADS or BI-RADS categories to its nodules and lesions, and
//! [`compose`] assembles the findings [`Document`].
//!
//! ```
//! use sonoreport_core::{compose, recompute, score_record, CalcConfig, EntitySequence, MeasurementRecord, Organ};
//!
//! let mut seq = EntitySequence::new();
//! let mut record = MeasurementRecord::new(Organ::Thyroid);
//! let nodule = record.add_entity(&mut seq).unwrap();
//! nodule.fields.set("composition", "solid");
//! nodule.fields.set("margin", "extrathyroidal");
//! nodule.fields.set("length", 18.0);
//!
//! let derived = recompute(&record, &CalcConfig::default());
//! let scores = score_record(&record);
//! let document = compose(&record, &derived, &scores);
//!
//! assert!(document.section("Nodules").is_some());
//! assert!(document.section("Impression").is_some());
//! ```

pub mod calc;
pub mod cli;
pub mod error;
pub mod report;
pub mod schema;
pub mod scoring;
pub mod template;
pub mod types;

pub use calc::{recompute, recompute_on, DerivedOutputs, DerivedValue, DerivedValues};
pub use cli::report::TextReport;
pub use error::{ReportError, Result, TemplateError};
pub use report::{compose, Block, Document, Line, Section, SectionBody};
pub use scoring::{score_record, Assessment, Category, ScoreField, ScoreOutputs};
pub use template::{load, snapshot, FlatTemplate, LoadOutcome, Preset, PresetLibrary};
pub use types::*;
