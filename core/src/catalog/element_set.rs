use crate::prelude::{TrackError, TrackResult};
use serde::{Deserialize, Serialize};

/// Fixed width of an element line, checksum included.
pub const ELEMENT_LINE_LEN: usize = 69;

/// One catalog entry: display label plus the two fixed-format element lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitalElementSet {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl OrbitalElementSet {
    pub fn new(name: &str, line1: &str, line2: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            line1: line1.trim_end().to_string(),
            line2: line2.trim_end().to_string(),
        }
    }

    /// Structural checks on both element lines: width, line number, checksum
    /// and matching catalog numbers.
    pub fn validate(&self) -> TrackResult<()> {
        validate_line(&self.line1, '1')?;
        validate_line(&self.line2, '2')?;

        if self.line1[2..7] != self.line2[2..7] {
            return Err(TrackError::MalformedElements(format!(
                "{}: catalog number mismatch ({} vs {})",
                self.name,
                &self.line1[2..7],
                &self.line2[2..7]
            )));
        }
        Ok(())
    }

    pub fn catalog_number(&self) -> Option<u32> {
        self.line1.get(2..7)?.trim().parse().ok()
    }
}

fn validate_line(line: &str, number: char) -> TrackResult<()> {
    if !line.is_ascii() || line.len() != ELEMENT_LINE_LEN {
        return Err(TrackError::MalformedElements(format!(
            "line {} must be {} ASCII characters, got {}",
            number,
            ELEMENT_LINE_LEN,
            line.chars().count()
        )));
    }
    if !line.starts_with(number) {
        return Err(TrackError::MalformedElements(format!(
            "expected line {}, found {:?}",
            number,
            line.chars().next()
        )));
    }

    let expected = checksum_digit(&line[..ELEMENT_LINE_LEN - 1]);
    let found = line[ELEMENT_LINE_LEN - 1..]
        .chars()
        .next()
        .and_then(|c| c.to_digit(10));
    match found {
        Some(digit) if digit == expected => Ok(()),
        _ => Err(TrackError::MalformedElements(format!(
            "line {} checksum mismatch (expected {})",
            number, expected
        ))),
    }
}

/// Modulo-10 checksum: digits count their value, minus signs count one.
pub fn checksum_digit(body: &str) -> u32 {
    body.chars()
        .map(|c| match c {
            '0'..='9' => c.to_digit(10).unwrap_or(0),
            '-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}
