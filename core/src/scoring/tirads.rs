//! ACR TI-RADS point scoring for thyroid nodules

use super::macros::scored_choice;
use super::{parse_axis, parse_multi_axis, Assessment, Category};
use crate::types::FieldMap;
use std::fmt;

scored_choice! {
    /// Nodule composition
    pub enum Composition {
        CysticOrSpongiform => ("cystic_spongiform", "Cystic or spongiform", 0),
        Mixed => ("mixed", "Mixed cystic and solid", 1),
        Solid => ("solid", "Solid or almost completely solid", 2),
    }
}

scored_choice! {
    /// Nodule echogenicity relative to thyroid parenchyma
    pub enum Echogenicity {
        Anechoic => ("anechoic", "Anechoic", 0),
        HyperIsoechoic => ("hyper_isoechoic", "Hyperechoic or isoechoic", 1),
        Hypoechoic => ("hypoechoic", "Hypoechoic", 2),
        VeryHypoechoic => ("very_hypoechoic", "Very hypoechoic", 3),
    }
}

scored_choice! {
    /// Nodule shape on the transverse image
    pub enum Shape {
        WiderThanTall => ("wider_than_tall", "Wider-than-tall", 0),
        TallerThanWide => ("taller_than_wide", "Taller-than-wide", 3),
    }
}

scored_choice! {
    /// Nodule margin
    pub enum Margin {
        Smooth => ("smooth", "Smooth", 0),
        IllDefined => ("ill_defined", "Ill-defined", 0),
        LobulatedIrregular => ("lobulated_irregular", "Lobulated or irregular", 2),
        Extrathyroidal => ("extrathyroidal", "Extra-thyroidal extension", 3),
    }
}

scored_choice! {
    /// Echogenic foci (multi-select; the highest-scoring selection counts)
    pub enum EchogenicFocus {
        None => ("none", "None or large comet-tail artifacts", 0),
        Macrocalcifications => ("macrocalcifications", "Macrocalcifications", 1),
        Peripheral => ("peripheral", "Peripheral (rim) calcifications", 2),
        Punctate => ("punctate", "Punctate echogenic foci", 3),
    }
}

impl Composition {
    /// Parses a composition, also accepting the single-word forms used by older forms
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "cystic" | "spongiform" | "cystic/spongiform" | "almost_completely_cystic" => {
                Some(Composition::CysticOrSpongiform)
            }
            _ => Self::from_code(code),
        }
    }
}

/// TI-RADS risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TiradsCategory {
    Tr1,
    Tr2,
    Tr3,
    Tr4,
    Tr5,
}

/// Closed, ordered point ranges for each category
const CATEGORY_TABLE: [(u8, u8, TiradsCategory); 5] = [
    (0, 1, TiradsCategory::Tr1),
    (2, 2, TiradsCategory::Tr2),
    (3, 3, TiradsCategory::Tr3),
    (4, 6, TiradsCategory::Tr4),
    (7, u8::MAX, TiradsCategory::Tr5),
];

impl TiradsCategory {
    /// Maps a point total to its category
    pub fn from_points(points: u8) -> Self {
        CATEGORY_TABLE
            .iter()
            .find(|(low, high, _)| (*low..=*high).contains(&points))
            .map(|(_, _, category)| *category)
            .unwrap_or(TiradsCategory::Tr5)
    }

    /// Returns short label ("TR1" .. "TR5")
    pub fn label(&self) -> &'static str {
        match self {
            TiradsCategory::Tr1 => "TR1",
            TiradsCategory::Tr2 => "TR2",
            TiradsCategory::Tr3 => "TR3",
            TiradsCategory::Tr4 => "TR4",
            TiradsCategory::Tr5 => "TR5",
        }
    }

    /// Returns the risk description
    pub fn description(&self) -> &'static str {
        match self {
            TiradsCategory::Tr1 => "Benign",
            TiradsCategory::Tr2 => "Not suspicious",
            TiradsCategory::Tr3 => "Mildly suspicious",
            TiradsCategory::Tr4 => "Moderately suspicious",
            TiradsCategory::Tr5 => "Highly suspicious",
        }
    }

    /// Size thresholds in mm as (FNA at or above, follow-up at or above)
    fn size_thresholds(&self) -> Option<(f64, f64)> {
        match self {
            TiradsCategory::Tr1 | TiradsCategory::Tr2 => None,
            TiradsCategory::Tr3 => Some((25.0, 15.0)),
            TiradsCategory::Tr4 => Some((15.0, 10.0)),
            TiradsCategory::Tr5 => Some((10.0, 5.0)),
        }
    }
}

impl fmt::Display for TiradsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Management recommendation for a scored nodule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiradsRecommendation {
    /// TR1/TR2, no size criteria apply
    NoFna,
    /// At or above the FNA threshold
    Fna,
    /// At or above the follow-up threshold
    FollowUp(TiradsCategory),
    /// Below both thresholds
    NoFurtherAction,
    /// Size needed but not available
    NotApplicable,
}

impl TiradsRecommendation {
    /// Derives the recommendation from category and maximum dimension (mm)
    pub fn new(category: TiradsCategory, max_size_mm: Option<f64>) -> Self {
        let Some((fna, follow_up)) = category.size_thresholds() else {
            return TiradsRecommendation::NoFna;
        };
        match max_size_mm.filter(|s| s.is_finite() && *s > 0.0) {
            None => TiradsRecommendation::NotApplicable,
            Some(size) if size >= fna => TiradsRecommendation::Fna,
            Some(size) if size >= follow_up => TiradsRecommendation::FollowUp(category),
            Some(_) => TiradsRecommendation::NoFurtherAction,
        }
    }

    /// Returns the recommendation text
    pub fn text(&self) -> &'static str {
        match self {
            TiradsRecommendation::NoFna => "No FNA",
            TiradsRecommendation::Fna => "FNA recommended",
            TiradsRecommendation::FollowUp(TiradsCategory::Tr3) => {
                "Follow-up ultrasound at 1, 3 and 5 years"
            }
            TiradsRecommendation::FollowUp(TiradsCategory::Tr4) => {
                "Follow-up ultrasound at 1, 2, 3 and 5 years"
            }
            TiradsRecommendation::FollowUp(_) => "Annual follow-up ultrasound for up to 5 years",
            TiradsRecommendation::NoFurtherAction => "No FNA or follow-up required",
            TiradsRecommendation::NotApplicable => "Not applicable (size not measured)",
        }
    }
}

/// Selected features of one nodule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TiradsFeatures {
    pub composition: Option<Composition>,
    pub echogenicity: Option<Echogenicity>,
    pub shape: Option<Shape>,
    pub margin: Option<Margin>,
    pub foci: Vec<EchogenicFocus>,
}

impl TiradsFeatures {
    /// Reads the feature selections of a nodule; invalid codes are logged and left unset
    pub fn from_fields(fields: &FieldMap) -> Self {
        Self {
            composition: parse_axis(fields, "composition", Composition::parse),
            echogenicity: parse_axis(fields, "echogenicity", Echogenicity::from_code),
            shape: parse_axis(fields, "shape", Shape::from_code),
            margin: parse_axis(fields, "margin", Margin::from_code),
            foci: parse_multi_axis(fields, "foci", EchogenicFocus::from_code),
        }
    }

    /// Returns whether no axis has a selection
    pub fn is_empty(&self) -> bool {
        self.composition.is_none()
            && self.echogenicity.is_none()
            && self.shape.is_none()
            && self.margin.is_none()
            && self.foci.is_empty()
    }

    /// Sums the axis points
    ///
    /// Cystic or spongiform composition forces the total to zero. Foci
    /// contribute their highest selection, not the sum.
    pub fn points(&self) -> u8 {
        if self.composition == Some(Composition::CysticOrSpongiform) {
            return 0;
        }
        let foci = self.foci.iter().map(|f| f.points()).max().unwrap_or(0);
        self.composition.map_or(0, |c| c.points())
            + self.echogenicity.map_or(0, |e| e.points())
            + self.shape.map_or(0, |s| s.points())
            + self.margin.map_or(0, |m| m.points())
            + foci
    }
}

/// Scores a nodule
///
/// # Example
///
/// ```
/// use sonoreport_core::scoring::tirads::{score, Composition, Echogenicity, TiradsFeatures};
///
/// let features = TiradsFeatures {
///     composition: Some(Composition::Solid),
///     echogenicity: Some(Echogenicity::Hypoechoic),
///     ..Default::default()
/// };
///
/// let assessment = score(&features, Some(18.0));
/// assert_eq!(assessment.point_score, 4);
/// assert_eq!(assessment.category.to_string(), "TR4");
/// assert_eq!(assessment.recommendation, "FNA recommended");
/// ```
pub fn score(features: &TiradsFeatures, max_size_mm: Option<f64>) -> Assessment {
    let point_score = features.points();
    let category = TiradsCategory::from_points(point_score);
    Assessment {
        point_score,
        category: Category::Tirads(category),
        recommendation: TiradsRecommendation::new(category, max_size_mm).text(),
    }
}
