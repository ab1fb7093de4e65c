use serde::{Deserialize, Serialize};
use std::fmt;

/// Organ (exam type) a measurement record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organ {
    Thyroid,
    Breast,
    Echo,
    Obstetric,
}

impl Organ {
    /// All supported organs in display order
    pub const ALL: [Organ; 4] = [Organ::Thyroid, Organ::Breast, Organ::Echo, Organ::Obstetric];

    /// Returns the key used for this organ in nested templates
    pub fn key(&self) -> &'static str {
        match self {
            Organ::Thyroid => "thyroid",
            Organ::Breast => "breast",
            Organ::Echo => "echo",
            Organ::Obstetric => "obstetric",
        }
    }

    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            Organ::Thyroid => "Thyroid",
            Organ::Breast => "Breast",
            Organ::Echo => "Echocardiogram",
            Organ::Obstetric => "Obstetric",
        }
    }

    /// Parses an organ from its template key or a common alias
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "thyroid" => Some(Organ::Thyroid),
            "breast" => Some(Organ::Breast),
            "echo" | "echocardiogram" | "cardiac" => Some(Organ::Echo),
            "obstetric" | "ob" | "obstetrics" => Some(Organ::Obstetric),
            _ => None,
        }
    }
}

impl fmt::Display for Organ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Body surface area formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BsaFormula {
    /// sqrt(height_cm * weight_kg / 3600)
    #[default]
    Mosteller,
    /// 0.007184 * weight_kg^0.425 * height_cm^0.725
    DuBois,
}

impl BsaFormula {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            BsaFormula::Mosteller => "Mosteller",
            BsaFormula::DuBois => "Du Bois",
        }
    }
}

impl fmt::Display for BsaFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Estimated fetal weight regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EfwMethod {
    /// Hadlock 1985, BPD + HC + AC + FL
    #[default]
    Hadlock4,
    /// Shepard 1982, BPD + AC
    Shepard,
    /// INTERGROWTH-21st (Stirnemann 2017), HC + AC
    Intergrowth21,
}

impl EfwMethod {
    /// Returns the code stored in measurement records
    pub fn code(&self) -> &'static str {
        match self {
            EfwMethod::Hadlock4 => "hadlock4",
            EfwMethod::Shepard => "shepard",
            EfwMethod::Intergrowth21 => "intergrowth21",
        }
    }

    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            EfwMethod::Hadlock4 => "Hadlock (BPD, HC, AC, FL)",
            EfwMethod::Shepard => "Shepard (BPD, AC)",
            EfwMethod::Intergrowth21 => "INTERGROWTH-21st (HC, AC)",
        }
    }

    /// Parses a method from its record code
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let s_lower = s.trim().to_lowercase();
        if s_lower.starts_with("hadlock") {
            Some(EfwMethod::Hadlock4)
        } else if s_lower.starts_with("shepard") {
            Some(EfwMethod::Shepard)
        } else if s_lower.starts_with("intergrowth") {
            Some(EfwMethod::Intergrowth21)
        } else {
            None
        }
    }

    /// Label lookup used by the obstetric schema
    pub fn label_for(code: &str) -> Option<&'static str> {
        Self::from_str(code).map(|m| m.simple_name())
    }
}

impl fmt::Display for EfwMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
