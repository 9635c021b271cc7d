//! Color table parsing
//!
//! A color table is a line-oriented text file with comma-separated fields:
//!
//! ```text
//! id,red,green,blue,_,_,_,name
//! 7,1.0,0.0,0.0,,,,Thalamus
//! ```
//!
//! Red, green and blue are floats, clamped to `[0, 1]`. The id and the three
//! unnamed columns are ignored. Lines that cannot be parsed are skipped so a single
//! bad row never costs the rest of the table.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Minimum number of comma-separated fields in a table row
const FIELD_COUNT: usize = 8;
const NAME_FIELD: usize = 7;

#[derive(Error, Debug)]
pub enum ColorTableError {
    #[error("color table unavailable: {0}")]
    Unavailable(#[from] std::io::Error),
    #[error("expected at least 8 fields, found {found}")]
    TooFewFields { found: usize },
    #[error("invalid {channel} value {value:?}")]
    InvalidChannel { channel: &'static str, value: String },
    #[error("missing part name")]
    EmptyName,
}

/// Linear RGB color with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// One parsed row of the table
#[derive(Debug, Clone, PartialEq)]
pub struct ColorEntry {
    pub name: String,
    pub color: Rgb,
}

/// Immutable name → color mapping
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    colors: HashMap<String, Rgb>,
}

impl ColorTable {
    /// Create an empty table (every lookup misses)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse table text, skipping malformed lines.
    ///
    /// When a name appears more than once the last row wins.
    pub fn parse(text: &str) -> Self {
        let mut colors = HashMap::new();
        let mut skipped = 0usize;

        for (index, line) in text.lines().enumerate() {
            match Self::parse_line(line) {
                Ok(Some(entry)) => {
                    colors.insert(entry.name, entry.color);
                }
                Ok(None) => {}
                Err(e) => {
                    skipped += 1;
                    debug!(line = index + 1, error = %e, "Skipping malformed color table line");
                }
            }
        }

        if skipped > 0 {
            debug!(skipped, "Color table contained malformed lines");
        }

        Self { colors }
    }

    /// Parse a single row. Blank lines yield `Ok(None)`.
    pub fn parse_line(line: &str) -> Result<Option<ColorEntry>, ColorTableError> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < FIELD_COUNT {
            return Err(ColorTableError::TooFewFields { found: fields.len() });
        }

        let color = Rgb::new(
            parse_channel("red", fields[1])?,
            parse_channel("green", fields[2])?,
            parse_channel("blue", fields[3])?,
        );

        let name = unquote(fields[NAME_FIELD].trim()).trim();
        if name.is_empty() {
            return Err(ColorTableError::EmptyName);
        }

        Ok(Some(ColorEntry {
            name: name.to_string(),
            color,
        }))
    }

    /// Read and parse a table from disk
    pub fn from_file(path: &Path) -> Result<Self, ColorTableError> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::parse(&content);
        info!(path = %path.display(), entries = table.len(), "Loaded color table");
        Ok(table)
    }

    /// Read a table from disk, falling back to an empty table.
    ///
    /// Callers must treat every lookup as a potential miss either way.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(table) => table,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Using empty color table");
                Self::new()
            }
        }
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(&self, name: &str) -> Option<Rgb> {
        self.colors.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn parse_channel(channel: &'static str, raw: &str) -> Result<f32, ColorTableError> {
    let invalid = || ColorTableError::InvalidChannel {
        channel,
        value: raw.to_string(),
    };
    let value: f32 = raw.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Strip one pair of surrounding double quotes
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}
