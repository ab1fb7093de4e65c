//! Echocardiography calculators
//!
//! Linear dimensions are entered in mm, velocities in m/s, VTIs in cm,
//! tissue Doppler e' in cm/s. Every calculator returns `None` instead of a
//! non-finite or meaningless value.

use super::{finite, DerivedValues};
use crate::types::{BsaFormula, CalcConfig, FieldMap};
use log::warn;
use std::f64::consts::PI;

pub const BSA: &str = "bsa";
pub const LV_MASS: &str = "lv_mass";
pub const LV_MASS_INDEX: &str = "lv_mass_index";
pub const RWT: &str = "rwt";
pub const EDV: &str = "edv";
pub const ESV: &str = "esv";
pub const EF: &str = "ef";
pub const FS: &str = "fs";
pub const E_A_RATIO: &str = "e_a_ratio";
pub const E_PRIME_AVG: &str = "e_prime_avg";
pub const E_OVER_E_PRIME: &str = "e_over_e_prime";
pub const STROKE_VOLUME: &str = "stroke_volume";
pub const CARDIAC_OUTPUT: &str = "cardiac_output";
pub const CARDIAC_INDEX: &str = "cardiac_index";
pub const AVA: &str = "ava";
pub const DOPPLER_INDEX: &str = "doppler_index";
pub const AV_PEAK_GRADIENT: &str = "av_peak_gradient";
pub const MVA: &str = "mva";
pub const RAP: &str = "rap";
pub const TR_GRADIENT: &str = "tr_gradient";
pub const RVSP: &str = "rvsp";

/// Heights below this are taken to be in meters
const HEIGHT_METERS_CUTOFF: f64 = 3.0;

/// IVC diameter (mm) separating normal from dilated
const IVC_DILATED_MM: f64 = 21.0;

/// Inspiratory collapse (%) separating normal from reduced
const IVC_COLLAPSE_PCT: f64 = 50.0;

const RAP_NORMAL: f64 = 3.0;
const RAP_INTERMEDIATE: f64 = 8.0;
const RAP_HIGH: f64 = 15.0;

/// Body surface area in m²
///
/// Height may be given in cm or m; weight in kg.
pub fn body_surface_area(height: f64, weight_kg: f64, formula: BsaFormula) -> Option<f64> {
    if height <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let height_cm = if height < HEIGHT_METERS_CUTOFF {
        height * 100.0
    } else {
        height
    };
    let bsa = match formula {
        BsaFormula::Mosteller => (height_cm * weight_kg / 3600.0).sqrt(),
        BsaFormula::DuBois => 0.007184 * weight_kg.powf(0.425) * height_cm.powf(0.725),
    };
    finite(bsa)
}

/// LV mass in g (ASE-corrected Devereux cube formula)
pub fn lv_mass(lvidd_mm: f64, ivsd_mm: f64, lvpwd_mm: f64) -> Option<f64> {
    if lvidd_mm <= 0.0 || ivsd_mm <= 0.0 || lvpwd_mm <= 0.0 {
        return None;
    }
    let (d, s, p) = (lvidd_mm / 10.0, ivsd_mm / 10.0, lvpwd_mm / 10.0);
    finite(0.8 * 1.04 * ((d + s + p).powi(3) - d.powi(3)) + 0.6)
}

/// Relative wall thickness, 2 × LVPWd / LVIDd
pub fn relative_wall_thickness(lvpwd_mm: f64, lvidd_mm: f64) -> Option<f64> {
    if lvpwd_mm <= 0.0 || lvidd_mm <= 0.0 {
        return None;
    }
    finite(2.0 * lvpwd_mm / lvidd_mm)
}

/// Teichholz volume (mL) for a ventricular dimension in cm
pub fn teichholz_volume(dimension_cm: f64) -> f64 {
    7.0 / (2.4 + dimension_cm) * dimension_cm.powi(3)
}

/// Teichholz volumes and systolic function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Teichholz {
    /// End-diastolic volume, mL
    pub edv: f64,
    /// End-systolic volume, mL
    pub esv: f64,
    /// Ejection fraction, %
    pub ef: f64,
    /// Fractional shortening, %
    pub fs: f64,
}

/// Teichholz EF from end-diastolic and end-systolic dimensions (mm)
///
/// Requires LVIDd > LVIDs > 0.
pub fn teichholz(lvidd_mm: f64, lvids_mm: f64) -> Option<Teichholz> {
    if lvids_mm <= 0.0 || lvidd_mm <= lvids_mm {
        return None;
    }
    let edv = teichholz_volume(lvidd_mm / 10.0);
    let esv = teichholz_volume(lvids_mm / 10.0);
    Some(Teichholz {
        edv,
        esv,
        ef: finite((edv - esv) / edv * 100.0)?,
        fs: finite((lvidd_mm - lvids_mm) / lvidd_mm * 100.0)?,
    })
}

/// Mitral inflow E/A ratio
///
/// An absent E wave with a measured A wave is a valid ratio of zero.
pub fn e_a_ratio(peak_e: f64, peak_a: f64) -> Option<f64> {
    if peak_a <= 0.0 || peak_e < 0.0 {
        return None;
    }
    finite(peak_e / peak_a)
}

/// Mean of septal and lateral e' (cm/s), or whichever one is present
pub fn average_e_prime(septal: Option<f64>, lateral: Option<f64>) -> Option<f64> {
    let septal = septal.filter(|v| *v > 0.0);
    let lateral = lateral.filter(|v| *v > 0.0);
    match (septal, lateral) {
        (Some(s), Some(l)) => Some((s + l) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

/// E/e' with E in m/s and e' in cm/s
pub fn e_over_e_prime(peak_e_ms: f64, e_prime_cms: f64) -> Option<f64> {
    if peak_e_ms <= 0.0 || e_prime_cms <= 0.0 {
        return None;
    }
    finite(peak_e_ms / (e_prime_cms / 100.0))
}

/// LVOT cross-sectional area (cm²) from its diameter in mm
pub fn lvot_area(diameter_mm: f64) -> Option<f64> {
    if diameter_mm <= 0.0 {
        return None;
    }
    let radius_cm = diameter_mm / 10.0 / 2.0;
    finite(PI * radius_cm * radius_cm)
}

/// Stroke volume (mL) = LVOT area × LVOT VTI
pub fn stroke_volume(lvot_diameter_mm: f64, lvot_vti_cm: f64) -> Option<f64> {
    if lvot_vti_cm <= 0.0 {
        return None;
    }
    finite(lvot_area(lvot_diameter_mm)? * lvot_vti_cm)
}

/// Cardiac output (L/min)
pub fn cardiac_output(stroke_volume_ml: f64, heart_rate: f64) -> Option<f64> {
    if stroke_volume_ml <= 0.0 || heart_rate <= 0.0 {
        return None;
    }
    finite(stroke_volume_ml * heart_rate / 1000.0)
}

/// Cardiac index (L/min/m²)
pub fn cardiac_index(cardiac_output: f64, bsa: f64) -> Option<f64> {
    if cardiac_output <= 0.0 || bsa <= 0.0 {
        return None;
    }
    finite(cardiac_output / bsa)
}

/// Aortic valve area (cm²) by the continuity equation
pub fn aortic_valve_area(lvot_diameter_mm: f64, lvot_vti_cm: f64, av_vti_cm: f64) -> Option<f64> {
    if lvot_vti_cm <= 0.0 || av_vti_cm <= 0.0 {
        return None;
    }
    finite(lvot_area(lvot_diameter_mm)? * lvot_vti_cm / av_vti_cm)
}

/// Dimensionless index, LVOT VTI / AV VTI
pub fn doppler_index(lvot_vti_cm: f64, av_vti_cm: f64) -> Option<f64> {
    if lvot_vti_cm <= 0.0 || av_vti_cm <= 0.0 {
        return None;
    }
    finite(lvot_vti_cm / av_vti_cm)
}

/// Mitral valve area (cm²) by pressure half-time
pub fn mitral_valve_area(pht_ms: f64) -> Option<f64> {
    if pht_ms <= 0.0 {
        return None;
    }
    finite(220.0 / pht_ms)
}

/// Simplified Bernoulli gradient (mmHg), 4v²
pub fn pressure_gradient(velocity_ms: f64) -> Option<f64> {
    if velocity_ms <= 0.0 {
        return None;
    }
    finite(4.0 * velocity_ms * velocity_ms)
}

/// Right atrial pressure estimate (mmHg) from IVC size and collapse
///
/// Without a collapse measurement the estimate falls back to diameter alone;
/// without a diameter it is the intermediate value.
pub fn estimate_rap(ivc_diameter_mm: Option<f64>, collapse_pct: Option<f64>) -> f64 {
    let Some(diameter) = ivc_diameter_mm else {
        return RAP_INTERMEDIATE;
    };
    let dilated = diameter > IVC_DILATED_MM;
    match collapse_pct {
        Some(collapse) => {
            let collapses = collapse > IVC_COLLAPSE_PCT;
            match (dilated, collapses) {
                (false, true) => RAP_NORMAL,
                (true, false) => RAP_HIGH,
                _ => RAP_INTERMEDIATE,
            }
        }
        None if dilated => RAP_HIGH,
        None => RAP_NORMAL,
    }
}

/// RV systolic pressure (mmHg), 4v² + RAP
pub fn rvsp(tr_velocity_ms: f64, rap: f64) -> Option<f64> {
    finite(pressure_gradient(tr_velocity_ms)? + rap)
}

/// Runs every echo calculator in dependency order
///
/// BSA is computed before the indexed values; stroke volume before cardiac
/// output before cardiac index; RAP before RVSP.
pub fn derive(fields: &FieldMap, config: &CalcConfig) -> DerivedValues {
    let mut out = DerivedValues::default();

    let lvidd = fields.positive("lvidd");
    let lvids = fields.positive("lvids");
    let ivsd = fields.positive("ivsd");
    let lvpwd = fields.positive("lvpwd");

    let bsa = fields
        .positive("height")
        .zip(fields.positive("weight"))
        .and_then(|(h, w)| body_surface_area(h, w, config.bsa_formula));
    out.set_quantity(BSA, bsa, 2);

    let mass = lvidd
        .zip(ivsd)
        .zip(lvpwd)
        .and_then(|((d, s), p)| lv_mass(d, s, p));
    out.set_quantity(LV_MASS, mass, 1);
    out.set_quantity(
        LV_MASS_INDEX,
        mass.zip(bsa).and_then(|(m, b)| finite(m / b)),
        1,
    );
    out.set_quantity(
        RWT,
        lvpwd
            .zip(lvidd)
            .and_then(|(p, d)| relative_wall_thickness(p, d)),
        2,
    );

    if let Some(t) = lvidd.zip(lvids).and_then(|(d, s)| teichholz(d, s)) {
        out.set_quantity(EDV, Some(t.edv), 0);
        out.set_quantity(ESV, Some(t.esv), 0);
        out.set_quantity(EF, Some(t.ef), 0);
        out.set_quantity(FS, Some(t.fs), 0);
    }

    let peak_e = fields.number("peak_e");
    out.set_quantity(
        E_A_RATIO,
        peak_e
            .zip(fields.number("peak_a"))
            .and_then(|(e, a)| e_a_ratio(e, a)),
        2,
    );
    let e_prime = average_e_prime(
        fields.number("e_prime_septal"),
        fields.number("e_prime_lateral"),
    );
    out.set_quantity(E_PRIME_AVG, e_prime, 1);
    out.set_quantity(
        E_OVER_E_PRIME,
        peak_e
            .zip(e_prime)
            .and_then(|(e, ep)| e_over_e_prime(e, ep)),
        1,
    );

    let lvot_diameter = fields.positive("lvot_diameter");
    let lvot_vti = fields.positive("lvot_vti");
    let av_vti = fields.positive("av_vti");
    let sv = lvot_diameter
        .zip(lvot_vti)
        .and_then(|(d, vti)| stroke_volume(d, vti));
    out.set_quantity(STROKE_VOLUME, sv, 1);
    let co = sv
        .zip(fields.positive("heart_rate"))
        .and_then(|(sv, hr)| cardiac_output(sv, hr));
    out.set_quantity(CARDIAC_OUTPUT, co, 2);
    out.set_quantity(
        CARDIAC_INDEX,
        co.zip(bsa).and_then(|(co, b)| cardiac_index(co, b)),
        2,
    );

    out.set_quantity(
        AVA,
        lvot_diameter
            .zip(lvot_vti)
            .zip(av_vti)
            .and_then(|((d, l), a)| aortic_valve_area(d, l, a)),
        2,
    );
    out.set_quantity(
        DOPPLER_INDEX,
        lvot_vti.zip(av_vti).and_then(|(l, a)| doppler_index(l, a)),
        2,
    );
    out.set_quantity(
        AV_PEAK_GRADIENT,
        fields
            .positive("av_peak_velocity")
            .and_then(pressure_gradient),
        0,
    );
    out.set_quantity(MVA, fields.positive("mv_pht").and_then(mitral_valve_area), 2);

    let collapse = fields.number("ivc_collapse").filter(|c| {
        let valid = (0.0..=100.0).contains(c);
        if !valid {
            warn!("Ignoring IVC collapse of {}%", c);
        }
        valid
    });
    let diameter = fields.positive("ivc_diameter");
    let tr_velocity = fields.positive("tr_velocity");
    let rap = estimate_rap(diameter, collapse);
    // only reported once the right heart was assessed
    if diameter.is_some() || collapse.is_some() || tr_velocity.is_some() {
        out.set_quantity(RAP, Some(rap), 0);
    }

    out.set_quantity(TR_GRADIENT, tr_velocity.and_then(pressure_gradient), 0);
    out.set_quantity(RVSP, tr_velocity.and_then(|v| rvsp(v, rap)), 0);

    out
}
