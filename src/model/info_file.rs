//! Borehole info file
//!
//! Line-tagged text file kept at the top of a borehole directory:
//!
//! ```text
//! BOREHOLE_NAME:<name>
//! #START SECTIONS
//! #START SECTION
//! SECTION_NAME:<name>
//! SECTION_DEPTH:<int>
//! SECTION_LENGTH:<float>
//! #END SECTION
//! #END SECTIONS
//! ```
//!
//! Tags are matched by strict prefix. A file whose first line is not a
//! `BOREHOLE_NAME` line holds no usable information.

use crate::error::{BoreholeError, Result};
use std::fmt::Write as _;

const BOREHOLE_NAME: &str = "BOREHOLE_NAME";
const START_SECTIONS: &str = "#START SECTIONS";
const END_SECTIONS: &str = "#END SECTIONS";
const START_SECTION: &str = "#START SECTION";
const END_SECTION: &str = "#END SECTION";
const SECTION_NAME: &str = "SECTION_NAME";
const SECTION_DEPTH: &str = "SECTION_DEPTH";
const SECTION_LENGTH: &str = "SECTION_LENGTH";

/// Section record as persisted
#[derive(Debug, Clone, PartialEq)]
pub struct SectionInfo {
    pub name: String,
    pub depth: i32,
    pub length: f64,
}

/// Borehole record as persisted
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoreholeInfo {
    pub name: String,
    pub sections: Vec<SectionInfo>,
}

/// Render the info file contents
pub fn write(info: &BoreholeInfo) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "{}:{}", BOREHOLE_NAME, info.name);
    let _ = writeln!(out, "{}", START_SECTIONS);
    for section in &info.sections {
        let _ = writeln!(out, "{}", START_SECTION);
        let _ = writeln!(out, "{}:{}", SECTION_NAME, section.name);
        let _ = writeln!(out, "{}:{}", SECTION_DEPTH, section.depth);
        let _ = writeln!(out, "{}:{:?}", SECTION_LENGTH, section.length);
        let _ = writeln!(out, "{}", END_SECTION);
    }
    let _ = writeln!(out, "{}", END_SECTIONS);
    out
}

/// Parse info file contents.
///
/// Returns `Ok(None)` when the first line is not a `BOREHOLE_NAME` line.
/// A section closed without a name is dropped with a warning; a malformed
/// depth or length is an error naming the line.
pub fn parse(text: &str) -> Result<Option<BoreholeInfo>> {
    let mut lines = text.lines().map(|l| l.strip_suffix('\r').unwrap_or(l));

    let Some(name) = lines.next().and_then(|l| tagged_value(l, BOREHOLE_NAME)) else {
        return Ok(None);
    };
    let mut info = BoreholeInfo {
        name: name.to_string(),
        sections: Vec::new(),
    };

    let mut current: Option<SectionInfo> = None;
    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        if line == END_SECTIONS {
            break;
        }
        if line == START_SECTION {
            current = Some(SectionInfo {
                name: String::new(),
                depth: 0,
                length: 0.0,
            });
            continue;
        }
        if line == END_SECTION {
            if let Some(section) = current.take() {
                if section.name.is_empty() {
                    tracing::warn!("Info file line {}: section without a name skipped", line_no);
                } else {
                    info.sections.push(section);
                }
            }
            continue;
        }
        let Some(section) = current.as_mut() else {
            continue;
        };

        if let Some(value) = tagged_value(line, SECTION_NAME) {
            section.name = value.to_string();
        } else if let Some(value) = tagged_value(line, SECTION_DEPTH) {
            let depth: f64 = parse_number(value, line_no)?;
            section.depth = depth.trunc() as i32;
        } else if let Some(value) = tagged_value(line, SECTION_LENGTH) {
            section.length = parse_number(value, line_no)?;
        }
    }

    Ok(Some(info))
}

/// Value of a `TAG:value` line, `None` for any other line
fn tagged_value<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    line.strip_prefix(tag)?.strip_prefix(':')
}

fn parse_number(value: &str, line_no: usize) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| BoreholeError::InfoFile(format!("line {}: invalid number {:?}", line_no, value)))
}
