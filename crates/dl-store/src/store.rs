//! Append-only tabular data file.
//!
//! The first line of the file is the header (column names joined by the
//! separator); every following line is one row. Rows are only ever
//! appended. When a record introduces new columns, the header is grown
//! through a staged rewrite of the whole file before the row is appended.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use dl_common::{FieldValue, Record, TIMESTAMP_FIELD};
use tracing::{debug, info};

use crate::encode::{EncodeMode, ValueEncoder};
use crate::error::{Result, StoreError};
use crate::migration::{trim_line_end, StagedMigration};
use crate::schema::SchemaRegistry;

/// Options for opening a store.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub separator: char,
    pub encode_mode: EncodeMode,
}

impl StoreOptions {
    pub fn new(separator: char) -> Self {
        Self {
            separator,
            encode_mode: EncodeMode::default(),
        }
    }

    pub fn with_encode_mode(mut self, mode: EncodeMode) -> Self {
        self.encode_mode = mode;
        self
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::new(',')
    }
}

/// One data file and the schema known for it.
///
/// A store assumes it is the only writer of its file; callers that accept
/// records concurrently must serialise access to a single instance.
#[derive(Debug)]
pub struct TabularStore {
    path: PathBuf,
    encoder: ValueEncoder,
    encode_mode: EncodeMode,
    has_data: bool,
    /// The last line of the file lacks its terminator.
    torn_tail: bool,
    schema: SchemaRegistry,
}

impl TabularStore {
    /// Open (or create) the data file at `path`.
    pub fn open(path: impl AsRef<Path>, separator: char) -> Result<Self> {
        Self::open_with_options(path, StoreOptions::new(separator))
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;

        let HeaderProbe {
            header,
            has_data,
            torn_tail,
        } = read_header(file, options.separator).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;

        // Without rows there is nothing to preserve, so the next write
        // lays down a fresh header that starts with the timestamp column.
        let schema = match header {
            Some(columns) if has_data => SchemaRegistry::new(columns),
            _ => {
                let mut schema = SchemaRegistry::default();
                schema.resolve_or_append(TIMESTAMP_FIELD);
                schema
            }
        };

        debug!(
            path = %path.display(),
            columns = schema.committed().len(),
            has_data,
            torn_tail,
            "data file opened"
        );

        Ok(Self {
            path,
            encoder: ValueEncoder::new(options.separator),
            encode_mode: options.encode_mode,
            has_data,
            torn_tail,
            schema,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn separator(&self) -> char {
        self.encoder.separator()
    }

    /// Whether the file holds at least one row.
    pub fn has_data(&self) -> bool {
        self.has_data
    }

    /// All known columns in index order, including pending ones.
    pub fn columns(&self) -> Vec<&str> {
        self.schema.columns().collect()
    }

    /// Columns discovered but not yet written to the header.
    pub fn pending_columns(&self) -> &[String] {
        self.schema.pending()
    }

    /// Append `record` stamped with the current time.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        self.write_record_at(record, Utc::now().timestamp())
    }

    /// Append `record` stamped with `timestamp` (Unix seconds).
    ///
    /// A `Timestamp` field supplied by the caller is replaced. Field names
    /// that would break the header line are refused before anything is
    /// registered or written.
    pub fn write_record_at(&mut self, record: &Record, timestamp: i64) -> Result<()> {
        let separator = self.separator();
        for (name, _) in record.iter().filter(|(n, _)| *n != TIMESTAMP_FIELD) {
            if let Some(reason) = field_name_problem(name, separator) {
                return Err(StoreError::InvalidFieldName {
                    field: name.to_string(),
                    reason,
                });
            }
        }

        if self.encode_mode == EncodeMode::Reject {
            if let Some((field, value)) = record.iter().find(|(n, v)| {
                *n != TIMESTAMP_FIELD && !v.is_supported()
            }) {
                return Err(StoreError::UnencodableValue {
                    field: field.to_string(),
                    kind: value.kind(),
                });
            }
        }

        let stamp = FieldValue::Int(timestamp);
        let mut slots = Vec::with_capacity(record.len() + 1);
        slots.push((self.schema.resolve_or_append(TIMESTAMP_FIELD), &stamp));
        for (name, value) in record.iter().filter(|(n, _)| *n != TIMESTAMP_FIELD) {
            slots.push((self.schema.resolve_or_append(name), value));
        }

        let width = slots.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
        let mut cells = vec![String::new(); width];
        for (i, value) in slots {
            cells[i] = self.encoder.encode_cell(value);
        }

        if self.schema.has_pending() {
            self.migrate_header()?;
        }

        let mut sep = [0u8; 4];
        let line = cells.join(self.separator().encode_utf8(&mut sep));
        self.append_line(&line)?;
        self.has_data = true;
        Ok(())
    }

    /// Rewrite the file with the grown header.
    ///
    /// The pending columns are committed only once the new file is in
    /// place; on error the schema and the file are left as they were.
    fn migrate_header(&mut self) -> Result<()> {
        let header = self.schema.header_line(self.separator());
        let staged = StagedMigration::stage(&self.path, &header, self.has_data)?;
        staged.commit()?;
        // Every row copied into the new file got its terminator back.
        self.torn_tail = false;

        info!(
            path = %self.path.display(),
            added = ?self.schema.pending(),
            "data file header extended"
        );
        self.schema.commit_pending();
        Ok(())
    }

    fn append_line(&mut self, line: &str) -> Result<()> {
        let append_err = |source| StoreError::Append {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(append_err)?;

        let mut buf = Vec::with_capacity(line.len() + 2);
        if self.torn_tail {
            // Close the unterminated last line so this row starts fresh.
            buf.push(b'\n');
        }
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        file.write_all(&buf).map_err(append_err)?;
        file.sync_data().map_err(append_err)?;
        self.torn_tail = false;

        debug!(path = %self.path.display(), bytes = buf.len(), "record line appended");
        Ok(())
    }
}

/// Why `name` cannot be a column, if it cannot.
///
/// Header cells are never quoted, so a name must not split the header or
/// end the line.
fn field_name_problem(name: &str, separator: char) -> Option<&'static str> {
    if name.contains(separator) {
        Some("contains the separator")
    } else if name.contains('"') {
        Some("contains a quote character")
    } else if name.contains(['\r', '\n']) {
        Some("contains a line break")
    } else {
        None
    }
}

/// What `open` learns from the existing file.
struct HeaderProbe {
    header: Option<Vec<String>>,
    has_data: bool,
    torn_tail: bool,
}

/// Read the header columns, probe for a first row and check that the
/// file ends with a line terminator.
fn read_header(mut file: File, separator: char) -> io::Result<HeaderProbe> {
    let len = file.metadata()?.len();
    let torn_tail = if len == 0 {
        false
    } else {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        file.seek(SeekFrom::Start(0))?;
        last[0] != b'\n'
    };

    let mut reader = BufReader::new(file);
    let mut line = Vec::new();

    if reader.read_until(b'\n', &mut line)? == 0 {
        return Ok(HeaderProbe {
            header: None,
            has_data: false,
            torn_tail,
        });
    }
    let header = std::str::from_utf8(trim_line_end(&line))
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "header line is not valid UTF-8"))?
        .split(separator)
        .map(String::from)
        .collect();

    line.clear();
    let has_data = reader.read_until(b'\n', &mut line)? > 0;
    Ok(HeaderProbe {
        header: Some(header),
        has_data,
        torn_tail,
    })
}
