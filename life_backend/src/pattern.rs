//! Pattern stamps and the Life RLE file format they are loaded from.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::message::{RleOption, RleOptions};
use crate::world::MAX_DIMENSION;

/// Largest stamp `parse_rle` will allocate.
pub const MAX_PATTERN_CELLS: usize = 1 << 24;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("missing `x = .., y = ..` header")]
    MissingHeader,
    #[error("bad header line `{0}`")]
    BadHeader(String),
    #[error("declared extent {width}x{height} is too large")]
    TooLarge { width: usize, height: usize },
    #[error("run count `{0}` out of range")]
    BadRunCount(String),
    #[error("unexpected `{found}` in pattern body")]
    UnexpectedToken { found: char },
    #[error("run at row {y}, column {x} leaves the declared {width}x{height} extent")]
    Overflow { x: usize, y: usize, width: usize, height: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ============================================================================
// PATTERN
// ============================================================================

/// A named rectangular boolean stamp, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    name: String,
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Pattern {
    fn blank(name: impl Into<String>, width: usize, height: usize) -> Self {
        Pattern {
            name: name.into(),
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Rows of `o`, `*` or `#` for alive; anything else is dead.
    /// Width is the longest row.
    pub fn from_rows(name: impl Into<String>, rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut pattern = Pattern::blank(name, width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                pattern.set(y, x, matches!(c, 'o' | '*' | '#'));
            }
        }
        pattern
    }

    #[inline] pub fn name(&self) -> &str    { &self.name }
    #[inline] pub fn width(&self) -> usize  { self.width }
    #[inline] pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn get(&self, y: usize, x: usize) -> bool {
        self.cells[y * self.width + x]
    }

    fn set(&mut self, y: usize, x: usize, alive: bool) {
        self.cells[y * self.width + x] = alive;
    }

    /// `(y, x)` of every alive cell, row-major.
    pub fn alive_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(move |(i, _)| (i / self.width, i % self.width))
    }

    // ------------------------------------------------------------------------
    // RLE
    // ------------------------------------------------------------------------

    /// Parses Life RLE text. A `#N` line replaces `name`.
    pub fn parse_rle(name: &str, text: &str) -> Result<Pattern, PatternError> {
        let mut title = name.to_string();
        let mut lines = text.lines();
        let mut dims = None;

        for line in lines.by_ref() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("#N") {
                title = rest.trim().to_string();
            } else if line.starts_with('x') || line.starts_with('X') {
                dims = Some(parse_header(line)?);
                break;
            }
        }
        let (width, height) = dims.ok_or(PatternError::MissingHeader)?;
        let too_large = width > MAX_DIMENSION as usize
            || height > MAX_DIMENSION as usize
            || width.checked_mul(height).map_or(true, |n| n > MAX_PATTERN_CELLS);
        if too_large {
            return Err(PatternError::TooLarge { width, height });
        }

        let mut pattern = Pattern::blank(title, width, height);
        let (mut x, mut y) = (0usize, 0usize);
        let mut count = String::new();

        'body: for line in lines {
            for c in line.trim().chars() {
                if c.is_ascii_digit() {
                    count.push(c);
                    continue;
                }
                let run: usize = if count.is_empty() {
                    1
                } else {
                    count.parse().map_err(|_| PatternError::BadRunCount(count.clone()))?
                };
                count.clear();
                let overflow = PatternError::Overflow { x, y, width, height };

                match c {
                    'b' | 'B' | '.' => x = x.checked_add(run).ok_or(overflow)?,
                    'o' | 'O' | 'A' => {
                        let end = x.checked_add(run).filter(|&end| end <= width && y < height);
                        let Some(end) = end else {
                            return Err(overflow);
                        };
                        for col in x..end {
                            pattern.set(y, col, true);
                        }
                        x = end;
                    }
                    '$' => {
                        y = y.checked_add(run).ok_or(overflow)?;
                        x = 0;
                    }
                    '!' => break 'body,
                    c if c.is_whitespace() => {}
                    found => return Err(PatternError::UnexpectedToken { found }),
                }
            }
        }

        Ok(pattern)
    }
}

fn parse_header(line: &str) -> Result<(usize, usize), PatternError> {
    let mut width = None;
    let mut height = None;
    for field in line.split(',') {
        let Some((key, value)) = field.split_once('=') else {
            return Err(PatternError::BadHeader(line.to_string()));
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "x" => width = value.parse().ok(),
            "y" => height = value.parse().ok(),
            _ => {} // rule = B3/S23
        }
    }
    match (width, height) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(PatternError::BadHeader(line.to_string())),
    }
}

// ============================================================================
// LIBRARY
// ============================================================================

/// Patterns available to `PlaceRle`, keyed by the name observers send.
#[derive(Clone, Debug, Default)]
pub struct PatternLibrary {
    patterns: HashMap<String, Pattern>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.rle` file in `dir`, keyed by file stem.
    /// Files that fail to parse are logged and skipped.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, PatternError> {
        let dir = dir.as_ref();
        let mut library = PatternLibrary::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("rle") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let parsed = fs::read_to_string(&path)
                .map_err(PatternError::from)
                .and_then(|text| Pattern::parse_rle(stem, &text));
            match parsed {
                Ok(pattern) => {
                    debug!(
                        name = stem,
                        width = pattern.width,
                        height = pattern.height,
                        "loaded pattern"
                    );
                    library.insert(stem, pattern);
                }
                Err(err) => warn!(path = %path.display(), %err, "skipping pattern file"),
            }
        }

        info!(count = library.len(), dir = %dir.display(), "pattern library loaded");
        Ok(library)
    }

    pub fn insert(&mut self, name: impl Into<String>, pattern: Pattern) {
        self.patterns.insert(name.into(), pattern);
    }

    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.patterns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Pattern list for observers: one byte per cell, 0xFF alive.
    pub fn options(&self) -> RleOptions {
        let rles = self
            .names()
            .into_iter()
            .filter_map(|name| self.patterns.get(name).map(|p| (name, p)))
            .map(|(name, p)| RleOption {
                name: name.to_string(),
                width: p.width as u32,
                height: p.height as u32,
                data: p.cells.iter().map(|&alive| if alive { 0xFF } else { 0x00 }).collect(),
            })
            .collect();
        RleOptions { rles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLIDER: &str = "#N Glider\n#C classic\nx = 3, y = 3, rule = B3/S23\nbob$2bo$3o!\n";

    #[test]
    fn test_parse_glider() {
        let p = Pattern::parse_rle("glider", GLIDER).unwrap();
        assert_eq!(p.name(), "Glider");
        assert_eq!((p.width(), p.height()), (3, 3));
        let alive: Vec<_> = p.alive_cells().collect();
        assert_eq!(alive, vec![(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_parse_multi_line_body_and_row_skips() {
        let text = "x = 4, y = 4\n2o$\n2$\n3bo!";
        let p = Pattern::parse_rle("skip", text).unwrap();
        assert_eq!(p.name(), "skip");
        let alive: Vec<_> = p.alive_cells().collect();
        assert_eq!(alive, vec![(0, 0), (0, 1), (3, 3)]);
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let err = Pattern::parse_rle("wide", "x = 2, y = 1\n3o!").unwrap_err();
        assert!(matches!(err, PatternError::Overflow { .. }));
    }

    #[test]
    fn test_parse_requires_header() {
        let err = Pattern::parse_rle("none", "#C nothing here\nbo$o!").unwrap_err();
        assert!(matches!(err, PatternError::MissingHeader));
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        let err = Pattern::parse_rle("bad", "x = three, y = 3\no!").unwrap_err();
        assert!(matches!(err, PatternError::BadHeader(_)));
    }

    #[test]
    fn test_parse_rejects_huge_header() {
        let err = Pattern::parse_rle("huge", "x = 4294967296, y = 4294967296\no!").unwrap_err();
        assert!(matches!(err, PatternError::TooLarge { .. }));

        // each side fits, the product does not
        let err = Pattern::parse_rle("wide", "x = 1048576, y = 1048576\no!").unwrap_err();
        assert!(matches!(err, PatternError::TooLarge { .. }));
    }

    #[test]
    fn test_parse_rejects_run_overflowing_position() {
        let text = "x = 3, y = 3\n18446744073709551615b18446744073709551615b!";
        let err = Pattern::parse_rle("runs", text).unwrap_err();
        assert!(matches!(err, PatternError::Overflow { .. }));

        let text = "x = 3, y = 3\n18446744073709551615$18446744073709551615$o!";
        let err = Pattern::parse_rle("rows", text).unwrap_err();
        assert!(matches!(err, PatternError::Overflow { .. }));
    }

    #[test]
    fn test_parse_rejects_unparseable_run_count() {
        let err = Pattern::parse_rle("long", "x = 3, y = 1\n99999999999999999999o!").unwrap_err();
        assert!(matches!(err, PatternError::BadRunCount(ref n) if n == "99999999999999999999"));
    }

    #[test]
    fn test_load_dir_skips_oversized_files() {
        let dir = std::env::temp_dir()
            .join(format!("life_backend_oversized_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("glider.rle"), GLIDER).unwrap();
        fs::write(dir.join("huge.rle"), "x = 4294967296, y = 4294967296\no!").unwrap();
        fs::write(dir.join("runs.rle"), "x = 3, y = 3\n18446744073709551615b18446744073709551615b!")
            .unwrap();

        let library = PatternLibrary::load_dir(&dir).unwrap();
        assert_eq!(library.names(), vec!["glider"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_from_rows() {
        let p = Pattern::from_rows("block", &["oo", "oo"]);
        assert_eq!((p.width(), p.height()), (2, 2));
        assert_eq!(p.alive_cells().count(), 4);
    }

    #[test]
    fn test_library_options_are_sorted_and_byte_packed() {
        let mut library = PatternLibrary::new();
        library.insert("blinker", Pattern::from_rows("blinker", &["ooo"]));
        library.insert("block", Pattern::from_rows("block", &["oo", "oo"]));
        library.insert("boat", Pattern::from_rows("boat", &["oo.", "o.o", ".o."]));

        let options = library.options();
        let names: Vec<_> = options.rles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["blinker", "block", "boat"]);
        assert_eq!(options.rles[2].data, vec![0xFF, 0xFF, 0, 0xFF, 0, 0xFF, 0, 0xFF, 0]);
    }

    #[test]
    fn test_load_dir_skips_broken_files() {
        let dir = std::env::temp_dir()
            .join(format!("life_backend_patterns_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("glider.rle"), GLIDER).unwrap();
        fs::write(dir.join("broken.rle"), "no header").unwrap();
        fs::write(dir.join("notes.txt"), "x = 1, y = 1\no!").unwrap();

        let library = PatternLibrary::load_dir(&dir).unwrap();
        assert_eq!(library.names(), vec!["glider"]);
        assert_eq!(library.get("glider").unwrap().alive_cells().count(), 5);

        fs::remove_dir_all(&dir).unwrap();
    }
}
