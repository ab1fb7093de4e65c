use super::{FieldDecl, OrganSchema, SectionDecl, IMPRESSION};
use crate::calc::echo as calc;
use crate::types::Organ;

const PATIENT: &[FieldDecl] = &[
    FieldDecl::number("height", "Height", "cm"),
    FieldDecl::number("weight", "Weight", "kg"),
    FieldDecl::derived(calc::BSA, "BSA").with_unit("m²"),
    FieldDecl::number("heart_rate", "Heart rate", "bpm"),
];

const LEFT_VENTRICLE: &[FieldDecl] = &[
    FieldDecl::number("lvidd", "LVIDd", "mm"),
    FieldDecl::number("lvids", "LVIDs", "mm"),
    FieldDecl::number("ivsd", "IVSd", "mm"),
    FieldDecl::number("lvpwd", "LVPWd", "mm"),
    FieldDecl::derived(calc::LV_MASS, "LV mass").with_unit("g"),
    FieldDecl::derived(calc::LV_MASS_INDEX, "LV mass index").with_unit("g/m²"),
    FieldDecl::derived(calc::RWT, "RWT"),
    FieldDecl::derived(calc::EDV, "EDV (Teichholz)").with_unit("mL"),
    FieldDecl::derived(calc::ESV, "ESV (Teichholz)").with_unit("mL"),
    FieldDecl::derived(calc::EF, "EF (Teichholz)").with_unit("%"),
    FieldDecl::derived(calc::FS, "FS").with_unit("%"),
    FieldDecl::paragraph("wall_motion", "Wall motion"),
];

const ATRIA: &[FieldDecl] = &[
    FieldDecl::number("la_diameter", "LA diameter", "mm"),
    FieldDecl::number("aortic_root", "Aortic root", "mm"),
];

const DIASTOLIC: &[FieldDecl] = &[
    FieldDecl::number("peak_e", "Peak E", "m/s"),
    FieldDecl::number("peak_a", "Peak A", "m/s"),
    FieldDecl::derived(calc::E_A_RATIO, "E/A"),
    FieldDecl::number("e_prime_septal", "e' septal", "cm/s"),
    FieldDecl::number("e_prime_lateral", "e' lateral", "cm/s"),
    FieldDecl::derived(calc::E_PRIME_AVG, "e' average").with_unit("cm/s"),
    FieldDecl::derived(calc::E_OVER_E_PRIME, "E/e'"),
];

const FLOW: &[FieldDecl] = &[
    FieldDecl::number("lvot_diameter", "LVOT diameter", "mm"),
    FieldDecl::number("lvot_vti", "LVOT VTI", "cm"),
    FieldDecl::derived(calc::STROKE_VOLUME, "Stroke volume").with_unit("mL"),
    FieldDecl::derived(calc::CARDIAC_OUTPUT, "Cardiac output").with_unit("L/min"),
    FieldDecl::derived(calc::CARDIAC_INDEX, "Cardiac index").with_unit("L/min/m²"),
];

const VALVES: &[FieldDecl] = &[
    FieldDecl::number("av_peak_velocity", "AV peak velocity", "m/s"),
    FieldDecl::derived(calc::AV_PEAK_GRADIENT, "AV peak gradient").with_unit("mmHg"),
    FieldDecl::number("av_vti", "AV VTI", "cm"),
    FieldDecl::derived(calc::AVA, "AVA (continuity)").with_unit("cm²"),
    FieldDecl::derived(calc::DOPPLER_INDEX, "Dimensionless index"),
    FieldDecl::number("mv_pht", "MV pressure half-time", "ms"),
    FieldDecl::derived(calc::MVA, "MVA (PHT)").with_unit("cm²"),
    FieldDecl::paragraph("valves", "Valve morphology"),
];

const RIGHT_HEART: &[FieldDecl] = &[
    FieldDecl::number("ivc_diameter", "IVC diameter", "mm"),
    FieldDecl::number("ivc_collapse", "IVC inspiratory collapse", "%"),
    FieldDecl::derived(calc::RAP, "Estimated RAP").with_unit("mmHg"),
    FieldDecl::number("tr_velocity", "TR peak velocity", "m/s"),
    FieldDecl::derived(calc::TR_GRADIENT, "TR gradient").with_unit("mmHg"),
    FieldDecl::derived(calc::RVSP, "RVSP").with_unit("mmHg"),
];

const PERICARDIUM: &[FieldDecl] = &[FieldDecl::text("pericardium", "Pericardium")];

pub static SCHEMA: OrganSchema = OrganSchema {
    organ: Organ::Echo,
    title: "Echocardiography Report",
    sections: &[
        SectionDecl::lines("patient", "Patient", PATIENT),
        SectionDecl::lines("left_ventricle", "Left ventricle", LEFT_VENTRICLE),
        SectionDecl::lines("atria", "Atria and aorta", ATRIA),
        SectionDecl::lines("diastolic", "Diastolic function", DIASTOLIC),
        SectionDecl::lines("flow", "Flow and output", FLOW),
        SectionDecl::lines("valves", "Valves", VALVES),
        SectionDecl::lines("right_heart", "Right heart", RIGHT_HEART),
        SectionDecl::lines("pericardium", "Pericardium", PERICARDIUM),
        SectionDecl::impression(IMPRESSION),
    ],
    collection: None,
};
