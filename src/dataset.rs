//! Decoding of the registry's two bulk extracts into [`RawRecord`]s.
//!
//! Each extract is a CSV file (or the registry's `.zip` download wrapping
//! one) with a fixed column layout. Only the columns the pipeline needs are
//! read; anything else in the file is ignored. Structural problems (missing
//! file, missing column, undecodable CSV) are fatal. Row-level problems are
//! absorbed: an unparseable price becomes absent and a row without a title
//! number is skipped.

use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};
use crate::models::{ProprietorSlot, RawRecord, SourceTag, PROPRIETOR_SLOTS};

pub const COL_TITLE_NUMBER: &str = "Title Number";
pub const COL_PROPERTY_ADDRESS: &str = "Property Address";
pub const COL_PRICE_PAID: &str = "Price Paid";

pub fn proprietor_column(slot: usize) -> String {
    format!("Proprietor Name ({})", slot)
}

pub fn country_column(slot: usize) -> String {
    format!("Country Incorporated ({})", slot)
}

/// Columns a source extract must carry.
pub fn required_columns(source: SourceTag) -> Vec<String> {
    let mut cols = vec![
        COL_TITLE_NUMBER.to_string(),
        COL_PROPERTY_ADDRESS.to_string(),
        COL_PRICE_PAID.to_string(),
    ];
    cols.extend((1..=PROPRIETOR_SLOTS).map(proprietor_column));
    if source.has_country_columns() {
        cols.extend((1..=PROPRIETOR_SLOTS).map(country_column));
    }
    cols
}

/// Locations of the two extracts handed over by the download step.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    pub domestic: PathBuf,
    pub overseas: PathBuf,
}

impl DatasetPaths {
    pub fn path_for(&self, source: SourceTag) -> &Path {
        match source {
            SourceTag::Domestic => &self.domestic,
            SourceTag::Overseas => &self.overseas,
        }
    }

    /// Fail unless both extracts exist. Runs before any decoding starts.
    pub fn ensure_present(&self) -> Result<()> {
        for source in SourceTag::ALL {
            let path = self.path_for(source);
            if !path.is_file() {
                return Err(IngestError::MissingInput {
                    source_tag: source,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

/// Load one extract from a `.csv` file or a `.zip` archive containing one.
pub fn load_extract(path: &Path, source: SourceTag, delimiter: u8) -> Result<Vec<RawRecord>> {
    if !path.is_file() {
        return Err(IngestError::MissingInput {
            source_tag: source,
            path: path.to_path_buf(),
        });
    }

    let records = if is_zip(path) {
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let index = (0..archive.len())
            .find(|&i| {
                archive
                    .name_for_index(i)
                    .map(|name| !name.ends_with('/') && name.to_lowercase().ends_with(".csv"))
                    .unwrap_or(false)
            })
            .ok_or_else(|| IngestError::EmptyArchive {
                source_tag: source,
                path: path.to_path_buf(),
            })?;
        // A corrupt or unsupported .csv entry surfaces as a zip error.
        let entry = archive.by_index(index)?;
        debug!(source = %source, entry = entry.name(), "reading extract from archive");
        read_records(entry, source, delimiter)?
    } else {
        read_records(File::open(path)?, source, delimiter)?
    };

    info!(source = %source, path = %path.display(), rows = records.len(), "loaded extract");
    Ok(records)
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Column positions resolved from the header row.
struct Layout {
    title_number: usize,
    address: usize,
    price: usize,
    proprietors: [usize; PROPRIETOR_SLOTS],
    countries: Option<[usize; PROPRIETOR_SLOTS]>,
}

impl Layout {
    fn resolve(headers: &StringRecord, source: SourceTag) -> Result<Self> {
        let positions: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();

        let find = |column: &str| -> Result<usize> {
            positions
                .get(column)
                .copied()
                .ok_or_else(|| IngestError::SchemaMismatch {
                    source_tag: source,
                    column: column.to_string(),
                })
        };

        // Check every required column up front so the error names the first
        // missing one in layout order.
        for column in required_columns(source) {
            find(&column)?;
        }

        let mut proprietors = [0usize; PROPRIETOR_SLOTS];
        for (i, slot) in proprietors.iter_mut().enumerate() {
            *slot = find(&proprietor_column(i + 1))?;
        }

        let countries = if source.has_country_columns() {
            let mut countries = [0usize; PROPRIETOR_SLOTS];
            for (i, slot) in countries.iter_mut().enumerate() {
                *slot = find(&country_column(i + 1))?;
            }
            Some(countries)
        } else {
            None
        };

        Ok(Layout {
            title_number: find(COL_TITLE_NUMBER)?,
            address: find(COL_PROPERTY_ADDRESS)?,
            price: find(COL_PRICE_PAID)?,
            proprietors,
            countries,
        })
    }
}

/// Decode CSV rows from any reader. Footer rows are dropped here.
pub fn read_records<R: Read>(reader: R, source: SourceTag, delimiter: u8) -> Result<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let layout = Layout::resolve(&headers, source)?;

    let mut records = Vec::new();
    let mut skipped = 0u64;

    for row in rdr.records() {
        let row = row?;

        // A blank title number cannot key a title.
        let title_number = match field(&row, layout.title_number) {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let mut proprietors: [ProprietorSlot; PROPRIETOR_SLOTS] = Default::default();
        for (i, slot) in proprietors.iter_mut().enumerate() {
            slot.name = field(&row, layout.proprietors[i]);
            slot.country = layout
                .countries
                .as_ref()
                .and_then(|countries| field(&row, countries[i]));
        }

        let record = RawRecord {
            title_number,
            address: field(&row, layout.address),
            price: parse_price(field(&row, layout.price).as_deref()),
            proprietors,
            source,
        };

        if record.is_footer() {
            debug!(source = %source, "dropping footer row");
            continue;
        }
        records.push(record);
    }

    if skipped > 0 {
        warn!(source = %source, skipped, "skipped rows without a title number");
    }

    Ok(records)
}

/// Empty fields are absent; anything else, whitespace included, is a value.
fn field(row: &StringRecord, index: usize) -> Option<String> {
    row.get(index)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parse a `Price Paid` value. Malformed, negative or non-finite prices are
/// treated as absent.
pub fn parse_price(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p >= 0.0)
}
