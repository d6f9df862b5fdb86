//! 📄 Loader: one object in, one `Frame` out.
//!
//! 🚰 session.store() → get_object → (gunzip if `.gz`) → csv::Reader → header cleanup → rows
//!
//! 🧠 Knowledge graph:
//! - `CsvReadOptions`: the `[load]` section. Header on, comma, double quote, empty = null,
//!   permissive mode. The same knobs a spreadsheet person would reach for.
//! - Column names come from the first record and never change after that.
//! - Row width is forced to the header width. How depends on `ReadMode`: pad/truncate,
//!   skip, or fail.
//! - Nothing is cached. Call it twice, read twice.

use std::collections::HashMap;
use std::io::Read;

use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::backends::ObjectStore;
use crate::errors::PeekError;
use crate::frame::Frame;
use crate::resource::ResourcePath;
use crate::session::Session;

/// 🚦 What to do with a row whose field count disagrees with the header.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Pad short rows with nulls, drop extra fields. Keep calm and carry on.
    #[default]
    #[serde(alias = "PERMISSIVE")]
    Permissive,
    /// Skip the misfits silently (well, at debug level).
    #[serde(alias = "DROPMALFORMED")]
    DropMalformed,
    /// First misfit ends the load with a `Parse` error.
    #[serde(alias = "FAILFAST")]
    FailFast,
}

/// 🔧 The `[load]` section.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CsvReadOptions {
    /// Treat the first record as column names.
    pub header: bool,
    pub delimiter: char,
    pub quote: char,
    /// Fields equal to this become null.
    pub null_value: String,
    pub mode: ReadMode,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            header: true,
            delimiter: ',',
            quote: '"',
            null_value: String::new(),
            mode: ReadMode::Permissive,
        }
    }
}

impl CsvReadOptions {
    fn ascii_byte(what: &str, c: char) -> Result<u8, String> {
        if c.is_ascii() {
            Ok(c as u8)
        } else {
            Err(format!("{what} must be a single ASCII character, got '{c}'"))
        }
    }
}

/// 🚀 Read `path` through the session and parse it into a `Frame`.
pub async fn load_csv(
    session: &Session,
    path: &ResourcePath,
    options: &CsvReadOptions,
) -> Result<Frame, PeekError> {
    info!("📥 loading {} (header = {})", path, options.header);
    let the_raw = session.store()?.get_object(path).await?;
    debug!("📦 {} bytes fetched from {}", the_raw.len(), path);

    let the_text = if path.is_gzipped() {
        gunzip(&the_raw).map_err(|reason| PeekError::Parse {
            path: path.to_string(),
            reason,
        })?
    } else {
        the_raw
    };

    let the_frame = parse_csv(&the_text, options).map_err(|reason| PeekError::Parse {
        path: path.to_string(),
        reason,
    })?;
    info!(
        "📊 {} loaded: {} column(s), {} row(s)",
        path,
        the_frame.columns().len(),
        the_frame.row_count()
    );
    Ok(the_frame)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let mut the_decoder = GzDecoder::new(bytes);
    let mut the_out = Vec::with_capacity(bytes.len() * 4);
    the_decoder
        .read_to_end(&mut the_out)
        .map_err(|e| format!("gzip stream is corrupt: {e}"))?;
    Ok(the_out)
}

/// 📄 Parse delimited text into a `Frame`. The error string becomes `PeekError::Parse`'s reason.
pub fn parse_csv(bytes: &[u8], options: &CsvReadOptions) -> Result<Frame, String> {
    let the_delimiter = CsvReadOptions::ascii_byte("delimiter", options.delimiter)?;
    let the_quote = CsvReadOptions::ascii_byte("quote", options.quote)?;

    // -- 📏 flexible: the header decides the width, not the csv crate
    let mut the_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(the_delimiter)
        .quote(the_quote)
        .from_reader(bytes);

    // -- 🧹 the csv reader already skips empty lines; a quoted `""` line is a real row
    let mut the_records = the_reader
        .records()
        .enumerate()
        .map(|(i, record)| (i + 1, record));

    let describe = |line: usize, e: csv::Error| format!("record {line}: {e}");

    let (the_columns, the_first_data) = match the_records.next() {
        None => return Ok(Frame::default()),
        Some((line, record)) => {
            let the_record = record.map_err(|e| describe(line, e))?;
            if options.header {
                (clean_header(&the_record), None)
            } else {
                let the_columns = (0..the_record.len()).map(|i| format!("_c{i}")).collect();
                (the_columns, Some((line, the_record)))
            }
        }
    };
    let the_width = the_columns.len();

    let mut the_rows = Vec::new();
    let mut the_dropped = 0usize;
    let mut push_row = |line: usize, record: &csv::StringRecord| -> Result<(), String> {
        if record.len() != the_width {
            match options.mode {
                ReadMode::FailFast => {
                    return Err(format!(
                        "record {line} has {} field(s), expected {the_width}",
                        record.len()
                    ));
                }
                ReadMode::DropMalformed => {
                    trace!("🗑️ dropping record {line}: {} fields", record.len());
                    the_dropped += 1;
                    return Ok(());
                }
                ReadMode::Permissive => {}
            }
        }
        let mut the_row: Vec<Option<String>> = record
            .iter()
            .take(the_width)
            .map(|field| (field != options.null_value).then(|| field.to_string()))
            .collect();
        the_row.resize(the_width, None);
        the_rows.push(the_row);
        Ok(())
    };

    if let Some((line, record)) = the_first_data {
        push_row(line, &record)?;
    }
    for (line, record) in the_records {
        let the_record = record.map_err(|e| describe(line, e))?;
        push_row(line, &the_record)?;
    }

    if the_dropped > 0 {
        debug!("🗑️ dropped {} malformed record(s)", the_dropped);
    }
    Ok(Frame::new(the_columns, the_rows))
}

/// 🏷️ Names are kept as written. Empty names become `_c<i>`; names that collide (ignoring case) get their index appended.
fn clean_header(record: &csv::StringRecord) -> Vec<String> {
    let the_names: Vec<String> = record
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                format!("_c{i}")
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut the_counts: HashMap<String, usize> = HashMap::new();
    for name in &the_names {
        *the_counts.entry(name.to_lowercase()).or_default() += 1;
    }

    the_names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if the_counts[&name.to_lowercase()] > 1 {
                format!("{name}{i}")
            } else {
                name
            }
        })
        .collect()
}
