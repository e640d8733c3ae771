//! Line reader for sensor scripts.
//!
//! Yields trimmed command lines, skipping blank lines and `#` comments.
//! The cursor only moves forward; the one exception is [`ScriptReader::push_back`],
//! which lets the registry hand the line that ended the declaration block
//! over to the event player.

use crate::error::{Result, SensorError};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A command line from the script, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub number: usize,
    pub text: String,
}

impl ScriptLine {
    /// First whitespace-separated token (the command word).
    pub fn keyword(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or_default()
    }
}

pub struct ScriptReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    pushed_back: Option<ScriptLine>,
}

impl ScriptReader<BufReader<File>> {
    /// Open a script file. Failing to open it is a fatal configuration error.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| SensorError::ScriptOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened sensor script {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ScriptReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            pushed_back: None,
        }
    }

    /// Next non-empty, non-comment line, trimmed of spaces and tabs.
    pub fn next_line(&mut self) -> Result<Option<ScriptLine>> {
        if let Some(line) = self.pushed_back.take() {
            return Ok(Some(line));
        }

        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let raw = strip_line_ending(&self.buf);
            let text = trim_blanks(raw);
            if text.is_empty() || text[0] == b'#' {
                continue;
            }
            // Comments are skipped before decoding; commands are decoded lossily.
            return Ok(Some(ScriptLine {
                number: self.line_number,
                text: String::from_utf8_lossy(text).into_owned(),
            }));
        }
    }

    /// Return a line to the reader; the next `next_line()` yields it again.
    pub fn push_back(&mut self, line: ScriptLine) {
        self.pushed_back = Some(line);
    }
}

impl<R: BufRead> Iterator for ScriptReader<R> {
    type Item = Result<ScriptLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Trim leading and trailing spaces and tabs.
fn trim_blanks(line: &[u8]) -> &[u8] {
    let is_blank = |b: &u8| *b == b' ' || *b == b'\t';
    let start = line.iter().position(|b| !is_blank(b)).unwrap_or(line.len());
    let end = line.iter().rposition(|b| !is_blank(b)).map_or(start, |i| i + 1);
    &line[start..end]
}

/// Parse a finite float token, naming the field when it is missing.
///
/// `nan`, `inf` and `infinity` are rejected: they would slip past the
/// range checks.
pub(crate) fn parse_f32(token: Option<&str>, field: &'static str, line: &ScriptLine) -> Result<f32> {
    let token = token.ok_or_else(|| SensorError::MissingValue {
        line: line.number,
        field,
        command: line.text.clone(),
    })?;
    token
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| SensorError::InvalidNumber {
            line: line.number,
            token: token.to_string(),
            command: line.text.clone(),
        })
}
