//! Obstetric calculators: fetal weight, biophysical profile, Doppler ratio
//! and dating
//!
//! Biometry is entered in mm and converted to cm before applying the
//! published regressions.

use super::gestational_age::{self, format_date, parse_date, GestationalAge};
use super::{finite, DerivedValues};
use crate::types::{parse_number, CalcConfig, EfwMethod, FieldMap};
use chrono::NaiveDate;
use log::warn;
use std::fmt;

pub const GA: &str = "ga";
pub const EDD: &str = "edd";
pub const GA_METHOD: &str = "ga_method";
pub const EFW: &str = "efw";
pub const EFW_FORMULA: &str = "efw_formula";
pub const BPP_SCORE: &str = "bpp_score";
pub const BPP_INTERPRETATION: &str = "bpp_interpretation";
pub const CPR: &str = "cpr";
pub const GA_LMP: &str = "ga_lmp";
pub const EDD_LMP: &str = "edd_lmp";
pub const EDD_NOTE: &str = "edd_note";

/// Biometric GA fields averaged when CRL dating does not apply
pub const BIOMETRY_GA_FIELDS: [&str; 4] = ["ga_bpd", "ga_hc", "ga_ac", "ga_fl"];

/// BPP component fields, each coded 2 (normal) or 0 (abnormal)
pub const BPP_COMPONENTS: [&str; 4] = ["bpp_tone", "bpp_movement", "bpp_breathing", "bpp_fluid"];

/// Raw code of a normal BPP component
pub const BPP_NORMAL_CODE: f64 = 2.0;

/// Hadlock 1985 four-parameter EFW in grams (inputs in cm)
pub fn hadlock4(bpd: f64, hc: f64, ac: f64, fl: f64) -> Option<f64> {
    if bpd <= 0.0 || hc <= 0.0 || ac <= 0.0 || fl <= 0.0 {
        return None;
    }
    let log10 = 1.3596 - 0.00386 * ac * fl + 0.0064 * hc + 0.00061 * bpd * ac + 0.0424 * ac
        + 0.174 * fl;
    finite(10f64.powf(log10))
}

/// Shepard 1982 EFW in grams (inputs in cm)
///
/// The regression yields kilograms.
pub fn shepard(bpd: f64, ac: f64) -> Option<f64> {
    if bpd <= 0.0 || ac <= 0.0 {
        return None;
    }
    let log10_kg = -1.7492 + 0.166 * bpd + 0.046 * ac - 0.002646 * ac * bpd;
    finite(10f64.powf(log10_kg) * 1000.0)
}

/// INTERGROWTH-21st EFW in grams (inputs in cm)
pub fn intergrowth21(hc: f64, ac: f64) -> Option<f64> {
    if hc <= 0.0 || ac <= 0.0 {
        return None;
    }
    let a = ac / 100.0;
    let ln = 5.084820 - 54.06633 * a.powi(3) - 95.80076 * a.powi(3) * a.ln() + 3.136370 * hc / 100.0;
    finite(ln.exp())
}

/// Runs the selected EFW regression on a fetus's biometry (mm)
pub fn estimated_fetal_weight(method: EfwMethod, fields: &FieldMap) -> Option<f64> {
    let cm = |key: &str| fields.positive(key).map(|mm| mm / 10.0);
    match method {
        EfwMethod::Hadlock4 => hadlock4(cm("bpd")?, cm("hc")?, cm("ac")?, cm("fl")?),
        EfwMethod::Shepard => shepard(cm("bpd")?, cm("ac")?),
        EfwMethod::Intergrowth21 => intergrowth21(cm("hc")?, cm("ac")?),
    }
}

/// Biophysical profile score out of 8
///
/// Each entered component scores 2 only when its code is exactly the normal
/// code; anything else, including an unreadable code, scores 0. No score
/// without at least one entered component.
pub fn bpp_score<S: AsRef<str>>(codes: &[Option<S>]) -> Option<u8> {
    let mut entered = codes.iter().flatten().peekable();
    entered.peek()?;
    let normal = entered
        .filter(|code| parse_number(code.as_ref()) == Some(BPP_NORMAL_CODE))
        .count();
    u8::try_from(normal * 2).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BppInterpretation {
    Normal,
    Equivocal,
    Abnormal,
}

impl BppInterpretation {
    pub fn from_score(score: u8) -> Self {
        match score {
            8..=u8::MAX => BppInterpretation::Normal,
            6..=7 => BppInterpretation::Equivocal,
            _ => BppInterpretation::Abnormal,
        }
    }

    pub fn simple_name(&self) -> &'static str {
        match self {
            BppInterpretation::Normal => "Normal",
            BppInterpretation::Equivocal => "Equivocal",
            BppInterpretation::Abnormal => "Abnormal",
        }
    }
}

impl fmt::Display for BppInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Cerebroplacental ratio, MCA-PI / UA-PI
pub fn cerebroplacental_ratio(mca_pi: f64, ua_pi: f64) -> Option<f64> {
    if ua_pi <= 0.0 || mca_pi < 0.0 {
        return None;
    }
    finite(mca_pi / ua_pi)
}

/// Derived values of one fetus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetusDerivation {
    pub values: DerivedValues,
    pub exam_date_substituted: bool,
}

pub fn derive_fetus(
    fields: &FieldMap,
    exam_date: Option<&str>,
    today: NaiveDate,
    config: &CalcConfig,
) -> FetusDerivation {
    let mut values = DerivedValues::default();

    let crl = fields.text("ga_crl");
    let biometry: Vec<String> = BIOMETRY_GA_FIELDS
        .iter()
        .filter_map(|key| fields.text(key))
        .collect();
    let biometry: Vec<&str> = biometry.iter().map(String::as_str).collect();
    let dating = gestational_age::reconcile_on(crl.as_deref(), &biometry, exam_date, today);
    values.set_text(GA, dating.ga_string());
    values.set_text(EDD, dating.edd_string());
    values.set_text(GA_METHOD, dating.method.map(|m| m.to_string()));

    let method = match fields.text("efw_method") {
        Some(code) => EfwMethod::from_str(&code).unwrap_or_else(|| {
            warn!("Unknown EFW method '{}'; using {}", code, config.default_efw_method);
            config.default_efw_method
        }),
        None => config.default_efw_method,
    };
    let efw = estimated_fetal_weight(method, fields);
    values.set_quantity(EFW, efw, 0);
    if efw.is_some() {
        values.set_text(EFW_FORMULA, Some(method.simple_name().to_string()));
    }

    let codes = BPP_COMPONENTS.map(|key| fields.text(key));
    let score = bpp_score(&codes);
    values.set_text(BPP_SCORE, score.map(|s| format!("{}/8", s)));
    values.set_text(
        BPP_INTERPRETATION,
        score.map(|s| BppInterpretation::from_score(s).to_string()),
    );

    values.set_quantity(
        CPR,
        fields
            .number("mca_pi")
            .zip(fields.number("ua_pi"))
            .and_then(|(mca, ua)| cerebroplacental_ratio(mca, ua)),
        2,
    );

    FetusDerivation {
        values,
        exam_date_substituted: dating.exam_date_substituted,
    }
}

/// Record-level dating by last menstrual period
///
/// `substituted` reports whether a fetus EDD already fell back to `today`.
pub fn derive_dating(fields: &FieldMap, today: NaiveDate, substituted: bool) -> DerivedValues {
    let mut values = DerivedValues::default();
    let exam_date = fields.text("exam_date").as_deref().and_then(parse_date);
    let mut substituted = substituted;

    if let Some(raw) = fields.text("lmp_date") {
        match parse_date(&raw) {
            Some(lmp) => {
                let on = exam_date.unwrap_or_else(|| {
                    warn!(
                        "Exam date missing or invalid; computing GA by LMP on {}",
                        format_date(today)
                    );
                    substituted = true;
                    today
                });
                match GestationalAge::from_lmp(lmp, on) {
                    Some(ga) => values.set_text(GA_LMP, Some(ga.to_string())),
                    None => warn!("LMP {} is after the exam date", raw),
                }
                values.set_text(EDD_LMP, gestational_age::due_date_from_lmp(lmp).map(format_date));
            }
            None => warn!("Ignoring invalid LMP date '{}'", raw),
        }
    }

    if substituted {
        values.set_text(
            EDD_NOTE,
            Some(format!(
                "Exam date not recorded; dates calculated from {}",
                format_date(today)
            )),
        );
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn biometry() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.set("bpd", 85.0);
        fields.set("hc", 300.0);
        fields.set("ac", 300.0);
        fields.set("fl", 65.0);
        fields
    }

    #[test]
    fn test_efw_regressions() {
        let hadlock = hadlock4(8.5, 30.0, 30.0, 6.5).unwrap();
        assert!((hadlock - 2277.5).abs() < 1.0, "{}", hadlock);

        let shepard = shepard(8.5, 30.0).unwrap();
        assert!((shepard - 2328.5).abs() < 1.0, "{}", shepard);

        let intergrowth = intergrowth21(30.0, 30.0).unwrap();
        assert!((intergrowth - 2165.0).abs() < 1.0, "{}", intergrowth);
    }

    #[test]
    fn test_shepard_is_in_grams() {
        // a kilogram result would be around 2.3
        assert!(shepard(8.5, 30.0).unwrap() > 1000.0);
    }

    #[rstest]
    #[case(EfwMethod::Hadlock4, "fl")]
    #[case(EfwMethod::Shepard, "bpd")]
    #[case(EfwMethod::Intergrowth21, "hc")]
    fn test_efw_requires_inputs(#[case] method: EfwMethod, #[case] missing: &str) {
        let mut fields = biometry();
        assert!(estimated_fetal_weight(method, &fields).is_some());
        fields.set(missing, "");
        assert!(estimated_fetal_weight(method, &fields).is_none());
    }

    #[rstest]
    #[case([Some("2"), Some("2"), Some("2"), Some("2")], Some(8))]
    #[case([Some("2"), Some("0"), Some("2"), Some("2")], Some(6))]
    #[case([Some("1"), Some("0"), Some("2"), Some("0")], Some(2))]
    #[case([Some("2"), Some("2"), Some("2"), Some("normal")], Some(6))]
    #[case([Some("2"), None, Some("2"), Some("2")], Some(6))]
    #[case([None, None, Some("0"), None], Some(0))]
    #[case([None, None, None, None], None)]
    fn test_bpp_score(#[case] codes: [Option<&str>; 4], #[case] expected: Option<u8>) {
        assert_eq!(bpp_score(&codes), expected);
    }

    #[test]
    fn test_derive_fetus_bpp_with_unreadable_fluid_code() {
        let mut fields = FieldMap::new();
        fields.set("bpp_tone", "2");
        fields.set("bpp_movement", "2");
        fields.set("bpp_breathing", "2");
        fields.set("bpp_fluid", "normal");

        let derived = derive_fetus(&fields, None, date(2024, 6, 1), &CalcConfig::default());

        assert_eq!(derived.values.display(BPP_SCORE).as_deref(), Some("6/8"));
        assert_eq!(
            derived.values.display(BPP_INTERPRETATION).as_deref(),
            Some("Equivocal")
        );
    }

    #[rstest]
    #[case(8, BppInterpretation::Normal)]
    #[case(6, BppInterpretation::Equivocal)]
    #[case(4, BppInterpretation::Abnormal)]
    #[case(0, BppInterpretation::Abnormal)]
    fn test_bpp_interpretation(#[case] score: u8, #[case] expected: BppInterpretation) {
        assert_eq!(BppInterpretation::from_score(score), expected);
    }

    #[test]
    fn test_cpr() {
        assert_eq!(cerebroplacental_ratio(1.8, 1.2), Some(1.5));
        assert_eq!(cerebroplacental_ratio(1.8, 0.0), None);
    }

    #[test]
    fn test_derive_fetus() {
        let mut fields = biometry();
        fields.set("ga_bpd", "20w0d");
        fields.set("ga_hc", "20w2d");
        fields.set("efw_method", "shepard");
        for key in BPP_COMPONENTS {
            fields.set(key, "2");
        }
        fields.set("mca_pi", 1.8);
        fields.set("ua_pi", 1.2);

        let derived = derive_fetus(
            &fields,
            Some("2024-01-01"),
            date(2024, 6, 1),
            &CalcConfig::default(),
        );
        let v = &derived.values;

        assert_eq!(v.display(GA).as_deref(), Some("20w1d"));
        assert_eq!(v.display(EDD).as_deref(), Some("2024-05-19"));
        assert_eq!(v.display(EFW).as_deref(), Some("2328"));
        assert_eq!(v.display(EFW_FORMULA).as_deref(), Some("Shepard (BPD, AC)"));
        assert_eq!(v.display(BPP_SCORE).as_deref(), Some("8/8"));
        assert_eq!(v.display(BPP_INTERPRETATION).as_deref(), Some("Normal"));
        assert_eq!(v.display(CPR).as_deref(), Some("1.50"));
        assert!(!derived.exam_date_substituted);
    }

    #[test]
    fn test_derive_fetus_uses_configured_method() {
        let config = CalcConfig::default().with_default_efw_method(EfwMethod::Intergrowth21);
        let derived = derive_fetus(&biometry(), None, date(2024, 6, 1), &config);
        assert_eq!(derived.values.display(EFW).as_deref(), Some("2165"));
        // no GA, so no EDD and no substitution
        assert!(derived.values.get(EDD).is_none());
        assert!(!derived.exam_date_substituted);
    }

    #[test]
    fn test_derive_dating_by_lmp() {
        let mut fields = FieldMap::new();
        fields.set("lmp_date", "2024-01-01");
        fields.set("exam_date", "2024-03-01");

        let v = derive_dating(&fields, date(2030, 1, 1), false);

        assert_eq!(v.display(GA_LMP).as_deref(), Some("8w4d"));
        assert_eq!(v.display(EDD_LMP).as_deref(), Some("2024-10-07"));
        assert!(v.get(EDD_NOTE).is_none());
    }

    #[test]
    fn test_derive_dating_notes_substitution() {
        let mut fields = FieldMap::new();
        fields.set("lmp_date", "2024-01-01");

        let v = derive_dating(&fields, date(2024, 3, 1), false);

        assert_eq!(v.display(GA_LMP).as_deref(), Some("8w4d"));
        assert!(v.get(EDD_NOTE).is_some());
        assert!(derive_dating(&FieldMap::new(), date(2024, 3, 1), true)
            .get(EDD_NOTE)
            .is_some());
    }
}
