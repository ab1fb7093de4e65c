//! Core type definitions for ultrasound measurement records
//!
//! This module provides the fundamental types used throughout the sonoreport library:
//! - [`Organ`]: The exam type a record belongs to (thyroid, breast, echo, obstetric)
//! - [`FieldValue`]: A single operator-entered value (number, text, flag, multi-select)
//! - [`Quantity`]: A derived value rounded to its clinical precision
//! - [`MeasurementRecord`]: Per-exam fields plus repeated entities (nodules, lesions, fetuses)
//! - [`EntitySequence`]: Caller-owned id allocator for repeated entities
//! - [`CalcConfig`]: Configuration for derived-value calculation

mod config;
mod enums;
mod record;
mod value;

pub use config::CalcConfig;
pub use enums::{BsaFormula, EfwMethod, Organ};
pub use record::{EntityRecord, EntitySequence, FieldMap, MeasurementRecord};
pub use value::{format_number, parse_number, FieldValue, Quantity, NONE_SELECTED};
