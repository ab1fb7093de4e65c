pub mod report;

use crate::calc::{recompute, DerivedOutputs};
use crate::error::Result;
use crate::report::{compose, Document};
use crate::scoring::{score_record, ScoreOutputs};
use crate::template::{detect_organ, flatten_as, load_as, unflatten};
use crate::types::{BsaFormula, CalcConfig, EfwMethod, EntitySequence, MeasurementRecord, Organ};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use report::TextReport;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Command-line arguments for sonoreport
#[derive(Parser, Debug)]
#[command(name = "sonoreport")]
#[command(about = "Ultrasound measurement scoring and report composition tool")]
#[command(version)]
pub struct Cli {
    /// Path to a nested measurement record (JSON)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Organ section to read (detected from the record when omitted)
    #[arg(long)]
    pub organ: Option<OrganArg>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Body surface area formula
    #[arg(long, default_value = "mosteller")]
    pub bsa_formula: BsaFormulaArg,

    /// EFW method for fetuses without their own selection
    #[arg(long, default_value = "hadlock4")]
    pub efw_method: EfwMethodArg,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the calculation configuration from the flags
    pub fn calc_config(&self) -> CalcConfig {
        CalcConfig::default()
            .with_bsa_formula(self.bsa_formula.clone().into())
            .with_default_efw_method(self.efw_method.clone().into())
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable findings document
    Text,
    /// Document, derived values and scores as JSON
    Json,
    /// Normalized template tree (every declared field, blanks as null)
    Flat,
}

/// Organ section of the record
#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OrganArg {
    Thyroid,
    Breast,
    /// Adult transthoracic echocardiography
    Echo,
    Obstetric,
}

impl From<OrganArg> for Organ {
    fn from(arg: OrganArg) -> Self {
        match arg {
            OrganArg::Thyroid => Organ::Thyroid,
            OrganArg::Breast => Organ::Breast,
            OrganArg::Echo => Organ::Echo,
            OrganArg::Obstetric => Organ::Obstetric,
        }
    }
}

/// Body surface area formula
#[derive(Debug, Clone, ValueEnum)]
pub enum BsaFormulaArg {
    /// Mosteller: sqrt(height x weight / 3600)
    Mosteller,
    /// Du Bois: 0.007184 x W^0.425 x H^0.725
    DuBois,
}

impl From<BsaFormulaArg> for BsaFormula {
    fn from(arg: BsaFormulaArg) -> Self {
        match arg {
            BsaFormulaArg::Mosteller => BsaFormula::Mosteller,
            BsaFormulaArg::DuBois => BsaFormula::DuBois,
        }
    }
}

/// Estimated fetal weight method
#[derive(Debug, Clone, ValueEnum)]
pub enum EfwMethodArg {
    /// Hadlock (BPD, HC, AC, FL)
    Hadlock4,
    /// Shepard (BPD, AC)
    Shepard,
    /// INTERGROWTH-21st (HC, AC)
    Intergrowth21,
}

impl From<EfwMethodArg> for EfwMethod {
    fn from(arg: EfwMethodArg) -> Self {
        match arg {
            EfwMethodArg::Hadlock4 => EfwMethod::Hadlock4,
            EfwMethodArg::Shepard => EfwMethod::Shepard,
            EfwMethodArg::Intergrowth21 => EfwMethod::Intergrowth21,
        }
    }
}

/// A loaded record with everything computed from it
#[derive(Debug, Clone)]
pub struct Processed {
    pub record: MeasurementRecord,
    pub derived: DerivedOutputs,
    pub scores: ScoreOutputs,
    pub document: Document,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    organ: Organ,
    document: &'a Document,
    derived: &'a DerivedOutputs,
    scores: &'a ScoreOutputs,
}

/// Reads a nested record file and parses it as JSON
pub fn read_record(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Resolves the organ from the flag, or from the tree when no flag is given
pub fn resolve_organ(organ: Option<OrganArg>, nested: &Value) -> Result<Organ> {
    match organ {
        Some(arg) => Ok(arg.into()),
        None => Ok(detect_organ(nested)?),
    }
}

/// Loads, recomputes, scores and composes one nested record
pub fn process(nested: &Value, organ: Organ, config: &CalcConfig) -> Result<Processed> {
    let mut seq = EntitySequence::new();
    let outcome = load_as(nested, organ, &mut seq)?;
    if !outcome.invalid_entities.is_empty() {
        warn!(
            "{} entries could not be loaded and are left out of the report",
            outcome.invalid_entities.len()
        );
    }

    let record = outcome.record;
    let derived = recompute(&record, config);
    let scores = score_record(&record);
    let document = compose(&record, &derived, &scores);
    info!(
        "Composed {} report with {} sections",
        organ,
        document.sections.len()
    );

    Ok(Processed {
        record,
        derived,
        scores,
        document,
    })
}

/// Produces the output text of one input file
pub fn run(cli: &Cli) -> Result<String> {
    info!("Processing file: {}", cli.file.display());
    let nested = read_record(&cli.file)?;
    let organ = resolve_organ(cli.organ.clone(), &nested)?;

    if cli.format == OutputFormat::Flat {
        let flat = flatten_as(&nested, organ)?;
        return Ok(serde_json::to_string_pretty(&unflatten(&flat))?);
    }

    let processed = process(&nested, organ, &cli.calc_config())?;
    match cli.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonOutput {
            organ,
            document: &processed.document,
            derived: &processed.derived,
            scores: &processed.scores,
        })?),
        _ => Ok(TextReport::new(&processed.document).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn cli(file: PathBuf, format: &str) -> Cli {
        Cli::parse_from(["sonoreport", file.to_str().unwrap(), "--format", format])
    }

    const THYROID: &str = r#"{
        "thyroid": {
            "right_lobe": { "right_lobe_length": 45, "right_lobe_width": 15, "right_lobe_depth": 15 },
            "nodules": [
                { "composition": "solid", "echogenicity": "hypoechoic", "length": 12 }
            ]
        }
    }"#;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["sonoreport", "record.json"]);
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.organ, None);
        assert_eq!(cli.calc_config(), CalcConfig::default());
    }

    #[test]
    fn test_cli_config_flags() {
        let cli = Cli::parse_from([
            "sonoreport",
            "record.json",
            "--bsa-formula",
            "du-bois",
            "--efw-method",
            "shepard",
        ]);
        let config = cli.calc_config();
        assert_eq!(config.bsa_formula, BsaFormula::DuBois);
        assert_eq!(config.default_efw_method, EfwMethod::Shepard);
    }

    #[test]
    fn test_run_text() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "thyroid.json", THYROID);

        let output = run(&cli(path, "text")).unwrap();

        assert!(output.starts_with("Thyroid Ultrasound Report\n"));
        assert!(output.contains("Nodule 1"));
        assert!(output.contains("TR4 (Moderately suspicious)"));
    }

    #[test]
    fn test_run_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "thyroid.json", THYROID);

        let output = run(&cli(path, "json")).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["organ"], "thyroid");
        assert_eq!(value["derived"]["record"]["right_lobe_volume"]["value"], 5.3);
        assert!(value["document"]["sections"].is_array());
    }

    #[test]
    fn test_run_flat_fills_declared_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "thyroid.json", THYROID);

        let output = run(&cli(path, "flat")).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["thyroid"]["right_lobe"]["right_lobe_length"], 45.0);
        assert_eq!(value["thyroid"]["left_lobe"]["left_lobe_length"], Value::Null);
    }

    #[rstest]
    #[case(Some(OrganArg::Echo), Organ::Echo)]
    #[case(Some(OrganArg::Thyroid), Organ::Thyroid)]
    #[case(None, Organ::Breast)]
    fn test_resolve_organ(#[case] flag: Option<OrganArg>, #[case] expected: Organ) {
        let nested = serde_json::json!({ "breast": {} });
        assert_eq!(resolve_organ(flag, &nested).unwrap(), expected);
    }

    #[test]
    fn test_organ_flag() {
        let cli = Cli::parse_from(["sonoreport", "record.json", "--organ", "obstetric"]);
        assert_eq!(cli.organ, Some(OrganArg::Obstetric));

        assert!(Cli::try_parse_from(["sonoreport", "record.json", "--organ", "liver"]).is_err());
    }

    #[test]
    fn test_run_reports_bad_input() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(run(&cli(missing, "text")), Err(ReportError::IoError(_))));

        let garbage = write_file(&dir, "garbage.json", "{ not json");
        assert!(matches!(run(&cli(garbage, "text")), Err(ReportError::Json(_))));

        let wrong = write_file(&dir, "wrong.json", r#"{ "echo": { "patient": [1] } }"#);
        assert!(matches!(run(&cli(wrong, "text")), Err(ReportError::Template(_))));
    }
}
