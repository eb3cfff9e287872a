//! Rendering region listings.
//!
//! A listing has one row per region. When the inspected data is given,
//! each row also carries the value decoded from it.

use std::fmt::Write as _;

use serde::Serialize;

use hexpat::{
    Endian, Evaluation,
    region::AnnotatedRegion,
    value::{self, RegionValue},
};

use crate::args::OutputFormat;

#[derive(Serialize)]
struct Row<'a> {
    #[serde(flatten)]
    region: &'a AnnotatedRegion,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<RegionValue>,
}

#[derive(Serialize)]
struct Listing<'a> {
    endian: &'static str,
    regions: Vec<Row<'a>>,
}

fn endian_name(endian: Endian) -> &'static str {
    match endian {
        Endian::Little => "little",
        Endian::Big => "big",
    }
}

fn rows<'a>(evaluation: &'a Evaluation, data: Option<&[u8]>) -> Vec<Row<'a>> {
    evaluation
        .regions()
        .iter()
        .map(|region| Row {
            region,
            value: data.and_then(|blob| value::decode(region, blob, evaluation.endian())),
        })
        .collect()
}

/// Render the regions of `evaluation` in `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(
    evaluation: &Evaluation,
    data: Option<&[u8]>,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    let rows = rows(evaluation, data);
    match format {
        OutputFormat::Table => Ok(render_table(&rows)),
        OutputFormat::Json => serde_json::to_string_pretty(&Listing {
            endian: endian_name(evaluation.endian()),
            regions: rows,
        }),
    }
}

fn render_table(rows: &[Row<'_>]) -> String {
    let name_width = rows
        .iter()
        .map(|row| row.region.name().len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    let with_values = rows.iter().any(|row| row.value.is_some());

    let mut out = String::new();
    let _ = write!(out, "{:<18} {:>8}  {:<9} {:<name_width$}", "OFFSET", "SIZE", "KIND", "NAME");
    if with_values {
        out.push_str("  VALUE");
    }
    trim_line(&mut out);

    for row in rows {
        let region = row.region;
        let _ = write!(
            out,
            "{:<18} {:>8}  {:<9} {:<name_width$}",
            format!("{:#x}", region.offset()),
            region.size(),
            region.kind().label(),
            region.name(),
        );
        if let Some(value) = &row.value {
            let _ = write!(out, "  {value}");
        }
        trim_line(&mut out);
    }
    out
}

fn trim_line(out: &mut String) {
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out.push('\n');
}
