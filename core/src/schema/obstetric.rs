use super::{
    CollectionDecl, FieldDecl, Labels, OrganSchema, SectionDecl, IMPRESSION, OTHER_FINDINGS,
};
use crate::calc::obstetric as calc;
use crate::types::{EfwMethod, Organ};

const PRESENTATION: Labels = Labels::Table(&[
    ("cephalic", "Cephalic"),
    ("breech", "Breech"),
    ("transverse", "Transverse"),
    ("oblique", "Oblique"),
]);

const BPP_COMPONENT: Labels = Labels::Table(&[("2", "Normal (2)"), ("0", "Abnormal (0)")]);

const EXAM: &[FieldDecl] = &[
    FieldDecl::date("exam_date", "Exam date"),
    FieldDecl::text("indication", "Indication"),
    FieldDecl::date("lmp_date", "LMP"),
    FieldDecl::derived(calc::GA_LMP, "GA by LMP"),
    FieldDecl::derived(calc::EDD_LMP, "EDD by LMP"),
    FieldDecl::derived(calc::EDD_NOTE, "Note"),
];

const FETUS: &[FieldDecl] = &[
    FieldDecl::choice("presentation", "Presentation", PRESENTATION),
    FieldDecl::number("fetal_heart_rate", "Fetal heart rate", "bpm"),
    FieldDecl::number("crl", "CRL", "mm"),
    FieldDecl::text("ga_crl", "GA by CRL"),
    FieldDecl::number("bpd", "BPD", "mm"),
    FieldDecl::text("ga_bpd", "GA by BPD"),
    FieldDecl::number("hc", "HC", "mm"),
    FieldDecl::text("ga_hc", "GA by HC"),
    FieldDecl::number("ac", "AC", "mm"),
    FieldDecl::text("ga_ac", "GA by AC"),
    FieldDecl::number("fl", "FL", "mm"),
    FieldDecl::text("ga_fl", "GA by FL"),
    FieldDecl::derived(calc::GA, "Gestational age"),
    FieldDecl::derived(calc::GA_METHOD, "Dating"),
    FieldDecl::derived(calc::EDD, "EDD"),
    FieldDecl::choice("efw_method", "EFW method", Labels::Lookup(EfwMethod::label_for)),
    FieldDecl::derived(calc::EFW, "EFW").with_unit("g"),
    FieldDecl::derived(calc::EFW_FORMULA, "EFW formula"),
    FieldDecl::choice("bpp_tone", "BPP tone", BPP_COMPONENT),
    FieldDecl::choice("bpp_movement", "BPP movement", BPP_COMPONENT),
    FieldDecl::choice("bpp_breathing", "BPP breathing", BPP_COMPONENT),
    FieldDecl::choice("bpp_fluid", "BPP amniotic fluid", BPP_COMPONENT),
    FieldDecl::derived(calc::BPP_SCORE, "BPP score"),
    FieldDecl::derived(calc::BPP_INTERPRETATION, "BPP interpretation"),
    FieldDecl::number("ua_pi", "Umbilical artery PI", ""),
    FieldDecl::number("mca_pi", "MCA PI", ""),
    FieldDecl::derived(calc::CPR, "CPR"),
    FieldDecl::number("afi", "AFI", "cm"),
    FieldDecl::text("placenta", "Placenta"),
    FieldDecl::paragraph("comments", "Comments"),
];

pub static SCHEMA: OrganSchema = OrganSchema {
    organ: Organ::Obstetric,
    title: "Obstetric Ultrasound Report",
    sections: &[
        SectionDecl::lines("exam", "Examination", EXAM),
        SectionDecl::entities("fetuses", "Fetuses"),
        SectionDecl::lines("other", "Other findings", OTHER_FINDINGS),
        SectionDecl::impression(IMPRESSION),
    ],
    collection: Some(CollectionDecl {
        key: "fetuses",
        item_label: "Fetus",
        fields: FETUS,
    }),
};
