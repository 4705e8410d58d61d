use crate::domain::model::ItemRecord;
use crate::utils::error::{Result, UpdaterError};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// What to do with a line that cannot become an [`ItemRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Drop the line and keep going.
    #[default]
    Lenient,
    /// Abort the load on the first malformed line.
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub mode: ParseMode,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self {
            mode: ParseMode::Strict,
        }
    }
}

pub fn load_items<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Vec<ItemRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| UpdaterError::InputFileError {
        path: path.display().to_string(),
        source,
    })?;

    tracing::debug!("Reading items from {}", path.display());
    parse_items(file, options)
}

/// Splits every line on commas: no quoting, no header row. Columns past the
/// fifth are ignored and missing trailing columns are treated as blank.
pub fn parse_items<R: Read>(reader: R, options: LoadOptions) -> Result<Vec<ItemRecord>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(reader);

    let mut items = Vec::new();
    let mut dropped = 0usize;

    for result in csv_reader.records() {
        let parsed = match result {
            Ok(record) => match to_item(&record) {
                Some(item) => item,
                None => continue,
            },
            Err(err) => match err.kind() {
                csv::ErrorKind::Utf8 { pos, .. } => Err(UpdaterError::MalformedLineError {
                    line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
                    reason: "line is not valid UTF-8".to_string(),
                }),
                _ => return Err(UpdaterError::CsvError(err)),
            },
        };

        match parsed {
            Ok(item) => items.push(item),
            Err(err) => match options.mode {
                ParseMode::Strict => return Err(err),
                ParseMode::Lenient => {
                    dropped += 1;
                    tracing::debug!("Dropping line: {}", err);
                }
            },
        }
    }

    if dropped > 0 {
        tracing::debug!("Dropped {} malformed line(s)", dropped);
    }

    Ok(items)
}

/// `None` for a blank line, which is never an error.
fn to_item(record: &StringRecord) -> Option<Result<ItemRecord>> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);

    if record.len() <= 1 && record.get(0).map_or(true, str::is_empty) {
        return None;
    }

    let code = record.get(0).unwrap_or_default();
    if code.is_empty() {
        return Some(Err(UpdaterError::MalformedLineError {
            line,
            reason: "empty item code".to_string(),
        }));
    }

    let column = |index: usize| {
        record
            .get(index)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    Some(Ok(ItemRecord {
        code: code.to_string(),
        length: column(1),
        width: column(2),
        height: column(3),
        weight: column(4),
        line,
    }))
}
