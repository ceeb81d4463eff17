use std::io::BufRead;

use anyhow::{Context, Result};

/// A free-text requirement captured from the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement(String);

impl Requirement {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read lines until the first blank line or end of input.
///
/// Lines are joined with `\n` and the whole text is trimmed.
pub fn read_requirement<R: BufRead>(input: &mut R) -> Result<Requirement> {
    let mut lines = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        let read = input.read_line(&mut line).context("Failed to read requirement")?;
        if read == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.trim().is_empty() {
            break;
        }
        lines.push(trimmed.to_string());
    }
    Ok(Requirement::new(lines.join("\n").trim()))
}

/// Read a single answer line; end of input yields an empty answer.
pub fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read answer")?;
    Ok(line.trim().to_string())
}
