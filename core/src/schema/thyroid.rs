use super::{
    CollectionDecl, FieldDecl, Labels, OrganSchema, SectionDecl, IMPRESSION, OTHER_FINDINGS,
};
use crate::calc::{thyroid as calc, MAX_DIMENSION};
use crate::scoring::tirads::{Composition, EchogenicFocus, Echogenicity, Margin, Shape};
use crate::scoring::ScoreField;
use crate::types::Organ;

fn composition_label(code: &str) -> Option<&'static str> {
    Composition::parse(code).map(|c| c.label())
}

const ECHOTEXTURE: Labels = Labels::Table(&[
    ("homogeneous", "Homogeneous"),
    ("heterogeneous", "Heterogeneous"),
    ("coarse", "Coarse"),
]);

const VASCULARITY: Labels = Labels::Table(&[
    ("normal", "Normal"),
    ("increased", "Increased"),
    ("decreased", "Decreased"),
]);

const LOCATION: Labels = Labels::Table(&[
    ("right_lobe", "Right lobe"),
    ("left_lobe", "Left lobe"),
    ("isthmus", "Isthmus"),
]);

const POSITION: Labels = Labels::Table(&[
    ("upper", "Upper pole"),
    ("mid", "Mid portion"),
    ("lower", "Lower pole"),
]);

const RIGHT_LOBE: &[FieldDecl] = &[
    FieldDecl::number("right_lobe_length", "Length", "mm"),
    FieldDecl::number("right_lobe_width", "Width", "mm"),
    FieldDecl::number("right_lobe_depth", "Depth", "mm"),
    FieldDecl::derived(calc::RIGHT_LOBE_VOLUME, "Volume").with_unit("mL"),
];

const LEFT_LOBE: &[FieldDecl] = &[
    FieldDecl::number("left_lobe_length", "Length", "mm"),
    FieldDecl::number("left_lobe_width", "Width", "mm"),
    FieldDecl::number("left_lobe_depth", "Depth", "mm"),
    FieldDecl::derived(calc::LEFT_LOBE_VOLUME, "Volume").with_unit("mL"),
];

const GLAND: &[FieldDecl] = &[
    FieldDecl::number("isthmus", "Isthmus thickness", "mm"),
    FieldDecl::derived(calc::TOTAL_VOLUME, "Total volume").with_unit("mL"),
    FieldDecl::choice("echotexture", "Echotexture", ECHOTEXTURE),
    FieldDecl::choice("vascularity", "Vascularity", VASCULARITY),
];

const NECK: &[FieldDecl] = &[FieldDecl::paragraph("lymph_nodes", "Cervical lymph nodes")];

const NODULE: &[FieldDecl] = &[
    FieldDecl::choice("location", "Location", LOCATION),
    FieldDecl::choice("position", "Position", POSITION),
    FieldDecl::number("length", "Length", "mm"),
    FieldDecl::number("width", "Width", "mm"),
    FieldDecl::number("depth", "Depth", "mm"),
    FieldDecl::derived(MAX_DIMENSION, "Maximum dimension").with_unit("mm"),
    FieldDecl::choice("composition", "Composition", Labels::Lookup(composition_label)),
    FieldDecl::choice("echogenicity", "Echogenicity", Labels::Lookup(Echogenicity::label_for)),
    FieldDecl::choice("shape", "Shape", Labels::Lookup(Shape::label_for)),
    FieldDecl::choice("margin", "Margin", Labels::Lookup(Margin::label_for)),
    FieldDecl::multi("foci", "Echogenic foci", Labels::Lookup(EchogenicFocus::label_for)),
    FieldDecl::score("tirads_points", "TI-RADS points", ScoreField::Points),
    FieldDecl::score("tirads_category", "TI-RADS category", ScoreField::Category),
    FieldDecl::score("tirads_recommendation", "Recommendation", ScoreField::Recommendation),
    FieldDecl::paragraph("comment", "Comment"),
];

pub static SCHEMA: OrganSchema = OrganSchema {
    organ: Organ::Thyroid,
    title: "Thyroid Ultrasound Report",
    sections: &[
        SectionDecl::lines("right_lobe", "Right lobe", RIGHT_LOBE),
        SectionDecl::lines("left_lobe", "Left lobe", LEFT_LOBE),
        SectionDecl::lines("gland", "Gland", GLAND),
        SectionDecl::entities("nodules", "Nodules"),
        SectionDecl::lines("neck", "Neck", NECK),
        SectionDecl::lines("other", "Other findings", OTHER_FINDINGS),
        SectionDecl::impression(IMPRESSION),
    ],
    collection: Some(CollectionDecl {
        key: "nodules",
        item_label: "Nodule",
        fields: NODULE,
    }),
};
