use super::{
    CollectionDecl, FieldDecl, Labels, OrganSchema, SectionDecl, IMPRESSION, OTHER_FINDINGS, SIDE,
};
use crate::calc::MAX_DIMENSION;
use crate::scoring::birads::{
    BiradsCategory, Calcification, EchoPattern, MassMargin, MassShape, Orientation,
    PosteriorFeatures,
};
use crate::scoring::ScoreField;
use crate::types::Organ;

const TISSUE_COMPOSITION: Labels = Labels::Table(&[
    ("fat", "Homogeneous background echotexture, fat"),
    ("fibroglandular", "Homogeneous background echotexture, fibroglandular"),
    ("heterogeneous", "Heterogeneous background echotexture"),
]);

const VASCULARITY: Labels = Labels::Table(&[
    ("absent", "Absent"),
    ("internal", "Internal vascularity"),
    ("rim", "Vessels in rim"),
]);

const ELASTICITY: Labels = Labels::Table(&[
    ("soft", "Soft"),
    ("intermediate", "Intermediate"),
    ("hard", "Hard"),
]);

const BACKGROUND: &[FieldDecl] = &[
    FieldDecl::choice("breast_composition", "Tissue composition", TISSUE_COMPOSITION),
    FieldDecl::text("skin", "Skin"),
    FieldDecl::text("implants", "Implants"),
];

const AXILLAE: &[FieldDecl] = &[
    FieldDecl::paragraph("right_axilla", "Right axilla"),
    FieldDecl::paragraph("left_axilla", "Left axilla"),
];

const ASSESSMENT: &[FieldDecl] = &[
    FieldDecl::choice(
        "birads_final",
        "Final assessment",
        Labels::Lookup(BiradsCategory::label_for),
    ),
    FieldDecl::score("birads_final_management", "Management", ScoreField::FinalRecommendation),
];

const LESION: &[FieldDecl] = &[
    FieldDecl::choice("side", "Side", SIDE),
    FieldDecl::text("clock", "Clock position").with_unit("o'clock"),
    FieldDecl::number("distance_from_nipple", "Distance from nipple", "cm"),
    FieldDecl::number("length", "Length", "mm"),
    FieldDecl::number("width", "Width", "mm"),
    FieldDecl::number("depth", "Depth", "mm"),
    FieldDecl::derived(MAX_DIMENSION, "Maximum dimension").with_unit("mm"),
    FieldDecl::choice("shape", "Shape", Labels::Lookup(MassShape::label_for)),
    FieldDecl::choice("orientation", "Orientation", Labels::Lookup(Orientation::label_for)),
    FieldDecl::choice("margin", "Margin", Labels::Lookup(MassMargin::label_for)),
    FieldDecl::choice("echo_pattern", "Echo pattern", Labels::Lookup(EchoPattern::label_for)),
    FieldDecl::choice(
        "posterior",
        "Posterior features",
        Labels::Lookup(PosteriorFeatures::label_for),
    ),
    FieldDecl::multi(
        "calcifications",
        "Calcifications",
        Labels::Lookup(Calcification::label_for),
    ),
    FieldDecl::choice("vascularity", "Vascularity", VASCULARITY),
    FieldDecl::choice("elasticity", "Elasticity", ELASTICITY),
    FieldDecl::score("birads_points", "Suspicion points", ScoreField::Points),
    FieldDecl::score("birads_category", "Suggested category", ScoreField::Category),
    FieldDecl::score("birads_recommendation", "Recommendation", ScoreField::Recommendation),
    FieldDecl::paragraph("comment", "Comment"),
];

pub static SCHEMA: OrganSchema = OrganSchema {
    organ: Organ::Breast,
    title: "Breast Ultrasound Report",
    sections: &[
        SectionDecl::lines("background", "Background", BACKGROUND),
        SectionDecl::entities("lesions", "Lesions"),
        SectionDecl::lines("axillae", "Axillae", AXILLAE),
        SectionDecl::lines("other", "Other findings", OTHER_FINDINGS),
        SectionDecl::lines("assessment", "Assessment", ASSESSMENT),
        SectionDecl::impression(IMPRESSION),
    ],
    collection: Some(CollectionDecl {
        key: "lesions",
        item_label: "Lesion",
        fields: LESION,
    }),
};
