use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Lookup, Role};

pub const REQUIRED_COLUMNS: [&str; 18] = [
    "id",
    "title",
    "releaseDate",
    "rating",
    "description",
    "duration",
    "num_seasons",
    "tagline",
    "metascore",
    "metascore_count",
    "userscore",
    "userscore_count",
    "genres",
    "production_companies",
    "director",
    "writer",
    "top_cast",
    "created_by",
];

#[derive(Debug, Error, PartialEq)]
pub enum SourceError {
    #[error("source is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("row {row}: column `{field}` is not numeric: {value:?}")]
    InvalidNumber {
        row: usize,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<String>,
    title: Option<String>,
    #[serde(rename = "releaseDate")]
    release_date: Option<String>,
    rating: Option<String>,
    description: Option<String>,
    duration: Option<String>,
    num_seasons: Option<String>,
    tagline: Option<String>,
    metascore: Option<String>,
    metascore_count: Option<String>,
    userscore: Option<String>,
    userscore_count: Option<String>,
    genres: Option<String>,
    production_companies: Option<String>,
    director: Option<String>,
    writer: Option<String>,
    top_cast: Option<String>,
    created_by: Option<String>,
}

/// One validated show row of the source dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    /// `None` when the id cell is empty or unparseable; such rows are skipped.
    pub show_id: Option<i64>,
    pub title: String,
    pub release_date: Option<String>,
    pub rating: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i64>,
    pub num_seasons: Option<i64>,
    pub tagline: Option<String>,
    pub metascore: Option<i64>,
    pub metascore_count: Option<i64>,
    pub userscore: Option<f64>,
    pub userscore_count: Option<i64>,
    pub genres: Option<String>,
    pub production_companies: Option<String>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub top_cast: Option<String>,
    pub created_by: Option<String>,
}

impl SourceRow {
    pub fn people(&self, role: Role) -> Option<&str> {
        match role {
            Role::Director => self.director.as_deref(),
            Role::Writer => self.writer.as_deref(),
            Role::Cast => self.top_cast.as_deref(),
            Role::Creator => self.created_by.as_deref(),
        }
    }

    pub fn names(&self, lookup: Lookup) -> Option<&str> {
        match lookup {
            Lookup::Genre => self.genres.as_deref(),
            Lookup::Company => self.production_companies.as_deref(),
        }
    }

    fn from_raw(row: usize, raw: RawRecord) -> Result<Self, SourceError> {
        Ok(Self {
            show_id: parse_int(row, "id", raw.id.as_deref()).ok().flatten(),
            title: raw.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            release_date: non_empty(raw.release_date),
            rating: non_empty(raw.rating),
            description: non_empty(raw.description),
            duration: parse_int(row, "duration", raw.duration.as_deref())?,
            num_seasons: parse_int(row, "num_seasons", raw.num_seasons.as_deref())?,
            tagline: non_empty(raw.tagline),
            metascore: parse_int(row, "metascore", raw.metascore.as_deref())?,
            metascore_count: parse_int(row, "metascore_count", raw.metascore_count.as_deref())?,
            userscore: parse_float(row, "userscore", raw.userscore.as_deref())?,
            userscore_count: parse_int(row, "userscore_count", raw.userscore_count.as_deref())?,
            genres: non_empty(raw.genres),
            production_companies: non_empty(raw.production_companies),
            director: non_empty(raw.director),
            writer: non_empty(raw.writer),
            top_cast: non_empty(raw.top_cast),
            created_by: non_empty(raw.created_by),
        })
    }
}

/// Reads and validates every data row of a source CSV.
pub fn read_source(path: &Path) -> Result<Vec<SourceRow>> {
    let file = File::open(path)
        .with_context(|| format!("Failed opening source table {}", path.display()))?;
    read_rows(file).with_context(|| format!("Failed reading source table {}", path.display()))
}

pub fn read_rows<R: std::io::Read>(input: R) -> Result<Vec<SourceRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .flexible(false)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(SourceError::MissingColumn(column).into());
        }
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = record?;
        rows.push(SourceRow::from_raw(idx + 1, raw)?);
    }
    Ok(rows)
}

/// Splits a comma-delimited cell into trimmed, non-empty names.
pub fn split_names(cell: Option<&str>) -> impl Iterator<Item = &str> {
    cell.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_int(
    row: usize,
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<i64>, SourceError> {
    let Some(text) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if let Ok(parsed) = text.parse::<i64>() {
        return Ok(Some(parsed));
    }
    // Integer columns with gaps are often exported as `12.0`.
    match text.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed.fract() == 0.0 => Ok(Some(parsed as i64)),
        _ if text.eq_ignore_ascii_case("nan") => Ok(None),
        _ => Err(SourceError::InvalidNumber {
            row,
            field,
            value: text.to_string(),
        }),
    }
}

fn parse_float(
    row: usize,
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<f64>, SourceError> {
    let Some(text) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match text.parse::<f64>() {
        Ok(parsed) if parsed.is_nan() => Ok(None),
        Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
        _ => Err(SourceError::InvalidNumber {
            row,
            field,
            value: text.to_string(),
        }),
    }
}
