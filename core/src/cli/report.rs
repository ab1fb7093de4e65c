use crate::report::{Document, Line, SectionBody};
use std::fmt;

/// Text report formatter for a findings document
pub struct TextReport<'a> {
    document: &'a Document,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, &self.document.title, '=')?;

        for section in &self.document.sections {
            writeln!(f)?;
            heading(f, &section.title, '-')?;
            match &section.body {
                SectionBody::Lines(lines) => write_lines(f, lines, "")?,
                SectionBody::Text(paragraphs) => {
                    for line in paragraphs {
                        writeln!(f, "{}", line)?;
                    }
                }
                SectionBody::Blocks(blocks) => {
                    for (idx, block) in blocks.iter().enumerate() {
                        if idx > 0 {
                            writeln!(f)?;
                        }
                        writeln!(f, "{}", block.heading)?;
                        write_lines(f, &block.lines, "  ")?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str, underline: char) -> fmt::Result {
    writeln!(f, "{}", title)?;
    writeln!(
        f,
        "{}",
        underline.to_string().repeat(title.chars().count())
    )
}

/// Writes label/value lines with values aligned in one column
fn write_lines(f: &mut fmt::Formatter<'_>, lines: &[Line], indent: &str) -> fmt::Result {
    let width = lines
        .iter()
        .map(|l| l.label.chars().count() + 1)
        .max()
        .unwrap_or(0);

    for line in lines {
        let label = format!("{}:", line.label);
        let mut values = line.value.iter();
        let first = values.next().map(String::as_str).unwrap_or("");
        writeln!(f, "{}{:<width$} {}", indent, label, first, width = width)?;
        for rest in values {
            if rest.is_empty() {
                writeln!(f)?;
            } else {
                writeln!(f, "{}{:<width$} {}", indent, "", rest, width = width)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Block, Section};

    fn document() -> Document {
        Document {
            title: "Thyroid Ultrasound Report".to_string(),
            sections: vec![
                Section {
                    title: "Right lobe".to_string(),
                    body: SectionBody::Lines(vec![
                        Line::new("Length", "45 mm"),
                        Line::new("Volume", "5.3 mL"),
                    ]),
                },
                Section {
                    title: "Nodules".to_string(),
                    body: SectionBody::Blocks(vec![Block {
                        number: 1,
                        heading: "Nodule 1".to_string(),
                        lines: vec![
                            Line::new("Composition", "Solid or almost completely solid"),
                            Line {
                                label: "Comment".to_string(),
                                value: vec!["Lower pole.".to_string(), "".to_string(), "Stable.".to_string()],
                            },
                        ],
                    }]),
                },
                Section {
                    title: "Impression".to_string(),
                    body: SectionBody::Text(vec!["Solitary TR4 nodule.".to_string()]),
                },
            ],
        }
    }

    #[test]
    fn test_text_report_format() {
        let document = document();
        let output = format!("{}", TextReport::new(&document));

        let expected = "\
Thyroid Ultrasound Report
=========================

Right lobe
----------
Length: 45 mm
Volume: 5.3 mL

Nodules
-------
Nodule 1
  Composition: Solid or almost completely solid
  Comment:     Lower pole.

               Stable.

Impression
----------
Solitary TR4 nodule.
";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_empty_document_prints_title_only() {
        let document = Document {
            title: "Echocardiography Report".to_string(),
            sections: Vec::new(),
        };

        assert_eq!(
            TextReport::new(&document).to_string(),
            "Echocardiography Report\n=======================\n"
        );
    }
}
