//! BI-RADS assessment for breast ultrasound masses
//!
//! Lexicon features are scored the same way TI-RADS axes are: each selection
//! carries a point value and the total maps to a suggested category through a
//! fixed table. The operator's final assessment is a separate record-level
//! selection and is never overwritten by the suggestion.

use super::macros::scored_choice;
use super::{parse_axis, parse_multi_axis, Assessment, Category};
use crate::types::FieldMap;
use std::fmt;

scored_choice! {
    /// Mass shape
    pub enum MassShape {
        Oval => ("oval", "Oval", 0),
        Round => ("round", "Round", 0),
        Irregular => ("irregular", "Irregular", 2),
    }
}

scored_choice! {
    /// Mass orientation relative to the skin
    pub enum Orientation {
        Parallel => ("parallel", "Parallel", 0),
        NotParallel => ("not_parallel", "Not parallel", 1),
    }
}

scored_choice! {
    /// Mass margin
    pub enum MassMargin {
        Circumscribed => ("circumscribed", "Circumscribed", 0),
        Indistinct => ("indistinct", "Indistinct", 1),
        Angular => ("angular", "Angular", 1),
        Microlobulated => ("microlobulated", "Microlobulated", 1),
        Spiculated => ("spiculated", "Spiculated", 2),
    }
}

scored_choice! {
    /// Internal echo pattern
    pub enum EchoPattern {
        Anechoic => ("anechoic", "Anechoic", 0),
        Hyperechoic => ("hyperechoic", "Hyperechoic", 0),
        Isoechoic => ("isoechoic", "Isoechoic", 1),
        Hypoechoic => ("hypoechoic", "Hypoechoic", 1),
        Heterogeneous => ("heterogeneous", "Heterogeneous", 2),
        Complex => ("complex", "Complex cystic and solid", 2),
    }
}

scored_choice! {
    /// Posterior acoustic features
    pub enum PosteriorFeatures {
        None => ("none", "No posterior features", 0),
        Enhancement => ("enhancement", "Enhancement", 0),
        Shadowing => ("shadowing", "Shadowing", 1),
        Combined => ("combined", "Combined pattern", 1),
    }
}

scored_choice! {
    /// Calcifications (multi-select; the highest-scoring selection counts)
    pub enum Calcification {
        None => ("none", "None", 0),
        OutsideMass => ("outside_mass", "Outside a mass", 0),
        InMass => ("in_mass", "In a mass", 1),
        Intraductal => ("intraductal", "Intraductal", 1),
    }
}

/// BI-RADS assessment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BiradsCategory {
    C0,
    C1,
    C2,
    C3,
    C4a,
    C4b,
    C4c,
    C5,
    C6,
}

impl BiradsCategory {
    pub const ALL: [BiradsCategory; 9] = [
        BiradsCategory::C0,
        BiradsCategory::C1,
        BiradsCategory::C2,
        BiradsCategory::C3,
        BiradsCategory::C4a,
        BiradsCategory::C4b,
        BiradsCategory::C4c,
        BiradsCategory::C5,
        BiradsCategory::C6,
    ];

    /// Maps a suspicious-feature point total to the suggested category
    ///
    /// Only categories 2 through 5 can be suggested from features; 0, 1 and 6
    /// are operator assessments.
    pub fn from_points(points: u8) -> Self {
        match points {
            0 => BiradsCategory::C2,
            1 => BiradsCategory::C3,
            2 => BiradsCategory::C4a,
            3 => BiradsCategory::C4b,
            4..=5 => BiradsCategory::C4c,
            _ => BiradsCategory::C5,
        }
    }

    /// Returns the code stored in measurement records
    pub fn code(&self) -> &'static str {
        match self {
            BiradsCategory::C0 => "0",
            BiradsCategory::C1 => "1",
            BiradsCategory::C2 => "2",
            BiradsCategory::C3 => "3",
            BiradsCategory::C4a => "4a",
            BiradsCategory::C4b => "4b",
            BiradsCategory::C4c => "4c",
            BiradsCategory::C5 => "5",
            BiradsCategory::C6 => "6",
        }
    }

    /// Returns display label
    pub fn label(&self) -> &'static str {
        match self {
            BiradsCategory::C0 => "BI-RADS 0",
            BiradsCategory::C1 => "BI-RADS 1",
            BiradsCategory::C2 => "BI-RADS 2",
            BiradsCategory::C3 => "BI-RADS 3",
            BiradsCategory::C4a => "BI-RADS 4A",
            BiradsCategory::C4b => "BI-RADS 4B",
            BiradsCategory::C4c => "BI-RADS 4C",
            BiradsCategory::C5 => "BI-RADS 5",
            BiradsCategory::C6 => "BI-RADS 6",
        }
    }

    /// Returns the assessment wording
    pub fn description(&self) -> &'static str {
        match self {
            BiradsCategory::C0 => "Incomplete",
            BiradsCategory::C1 => "Negative",
            BiradsCategory::C2 => "Benign",
            BiradsCategory::C3 => "Probably benign",
            BiradsCategory::C4a => "Low suspicion for malignancy",
            BiradsCategory::C4b => "Moderate suspicion for malignancy",
            BiradsCategory::C4c => "High suspicion for malignancy",
            BiradsCategory::C5 => "Highly suggestive of malignancy",
            BiradsCategory::C6 => "Known biopsy-proven malignancy",
        }
    }

    /// Returns the management recommendation
    pub fn recommendation(&self) -> &'static str {
        match self {
            BiradsCategory::C0 => "Additional imaging evaluation needed",
            BiradsCategory::C1 | BiradsCategory::C2 => "Routine screening",
            BiradsCategory::C3 => "Short-interval (6-month) follow-up",
            BiradsCategory::C4a
            | BiradsCategory::C4b
            | BiradsCategory::C4c
            | BiradsCategory::C5 => "Tissue diagnosis",
            BiradsCategory::C6 => "Surgical excision when clinically appropriate",
        }
    }

    /// Parses a category from "4a", "4A", "BI-RADS 4A" and similar
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_lowercase().replace("bi-rads", "");
        let normalized = normalized.trim();
        Self::ALL.iter().copied().find(|c| c.code() == normalized)
    }

    /// Label lookup used by the breast schema
    pub fn label_for(code: &str) -> Option<&'static str> {
        Self::from_code(code).map(|c| c.label())
    }
}

impl fmt::Display for BiradsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Selected lexicon features of one mass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BiradsFeatures {
    pub shape: Option<MassShape>,
    pub orientation: Option<Orientation>,
    pub margin: Option<MassMargin>,
    pub echo_pattern: Option<EchoPattern>,
    pub posterior: Option<PosteriorFeatures>,
    pub calcifications: Vec<Calcification>,
}

impl BiradsFeatures {
    /// Reads the feature selections of a lesion; invalid codes are logged and left unset
    pub fn from_fields(fields: &FieldMap) -> Self {
        Self {
            shape: parse_axis(fields, "shape", MassShape::from_code),
            orientation: parse_axis(fields, "orientation", Orientation::from_code),
            margin: parse_axis(fields, "margin", MassMargin::from_code),
            echo_pattern: parse_axis(fields, "echo_pattern", EchoPattern::from_code),
            posterior: parse_axis(fields, "posterior", PosteriorFeatures::from_code),
            calcifications: parse_multi_axis(fields, "calcifications", Calcification::from_code),
        }
    }

    /// Returns whether no feature has been selected
    pub fn is_empty(&self) -> bool {
        self.shape.is_none()
            && self.orientation.is_none()
            && self.margin.is_none()
            && self.echo_pattern.is_none()
            && self.posterior.is_none()
            && self.calcifications.is_empty()
    }

    /// Returns whether the features describe a simple cyst
    pub fn is_simple_cyst(&self) -> bool {
        self.echo_pattern == Some(EchoPattern::Anechoic)
            && self.margin == Some(MassMargin::Circumscribed)
    }

    /// Sums the axis points
    ///
    /// An anechoic, circumscribed mass is a simple cyst and scores zero
    /// regardless of the other selections.
    pub fn points(&self) -> u8 {
        if self.is_simple_cyst() {
            return 0;
        }
        let calcifications = self
            .calcifications
            .iter()
            .map(|c| c.points())
            .max()
            .unwrap_or(0);
        self.shape.map_or(0, |s| s.points())
            + self.orientation.map_or(0, |o| o.points())
            + self.margin.map_or(0, |m| m.points())
            + self.echo_pattern.map_or(0, |e| e.points())
            + self.posterior.map_or(0, |p| p.points())
            + calcifications
    }
}

/// Suggests a category for a mass
///
/// Returns `None` when no lexicon feature has been selected; an empty lesion
/// has nothing to assess.
///
/// # Example
///
/// ```
/// use sonoreport_core::scoring::birads::{assess, BiradsFeatures, EchoPattern, MassMargin};
///
/// let cyst = BiradsFeatures {
///     echo_pattern: Some(EchoPattern::Anechoic),
///     margin: Some(MassMargin::Circumscribed),
///     ..Default::default()
/// };
///
/// let assessment = assess(&cyst).unwrap();
/// assert_eq!(assessment.category.to_string(), "BI-RADS 2");
/// assert_eq!(assessment.recommendation, "Routine screening");
/// ```
pub fn assess(features: &BiradsFeatures) -> Option<Assessment> {
    if features.is_empty() {
        return None;
    }
    let point_score = features.points();
    let category = BiradsCategory::from_points(point_score);
    Some(Assessment {
        point_score,
        category: Category::Birads(category),
        recommendation: category.recommendation(),
    })
}
