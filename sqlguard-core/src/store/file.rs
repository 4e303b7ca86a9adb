//! JSON file persistence, one `<database>.json` per database.

use super::{SchemaPersistence, validate_database_name};
use crate::error::{Result, SqlGuardError};
use crate::models::RawSchema;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Schema files under a single directory.
///
/// Files are a JSON object of objects written with a one-space indent and no
/// trailing newline, matching cache files already in circulation.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache file for `database`.
    ///
    /// # Errors
    /// Returns a configuration error for names unsafe as a file stem.
    pub fn path_for(&self, database: &str) -> Result<PathBuf> {
        validate_database_name(database)?;
        Ok(self.dir.join(format!("{database}.json")))
    }
}

/// Pretty layout with every character outside printable ASCII written as a
/// lowercase `\uXXXX` escape (UTF-16 surrogate pairs above U+FFFF).
struct AsciiFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    // control characters, quotes and backslashes never reach this point
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (index, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serializes a raw schema in the on-disk cache layout: one-space indent,
/// ASCII-only output, no trailing newline.
///
/// # Errors
/// Returns a serialization error if encoding fails.
pub fn to_cache_bytes(schema: &RawSchema) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let formatter = AsciiFormatter {
        pretty: PrettyFormatter::with_indent(b" "),
    };
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    schema
        .serialize(&mut serializer)
        .map_err(|e| SqlGuardError::serialization("Failed to encode schema", e))?;
    Ok(bytes)
}

impl SchemaPersistence for JsonFileStore {
    fn load(&self, database: &str) -> Result<Option<RawSchema>> {
        let path = self.path_for(database)?;

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SqlGuardError::io(
                    format!("Failed to read schema cache {}", path.display()),
                    e,
                ));
            }
        };

        let schema = serde_json::from_str(&contents).map_err(|e| {
            SqlGuardError::serialization(
                format!("Malformed schema cache {}", path.display()),
                e,
            )
        })?;

        tracing::debug!(database, path = %path.display(), "Loaded schema cache file");
        Ok(Some(schema))
    }

    fn store(&self, database: &str, schema: &RawSchema) -> Result<()> {
        let path = self.path_for(database)?;
        let bytes = to_cache_bytes(schema)?;

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            SqlGuardError::io(
                format!("Failed to create cache directory {}", self.dir.display()),
                e,
            )
        })?;

        // write-then-rename so readers never see a half-written file
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, &bytes).map_err(|e| {
            SqlGuardError::io(format!("Failed to write {}", staging.display()), e)
        })?;
        std::fs::rename(&staging, &path).map_err(|e| {
            SqlGuardError::io(format!("Failed to replace {}", path.display()), e)
        })?;

        tracing::debug!(database, path = %path.display(), bytes = bytes.len(), "Wrote schema cache file");
        Ok(())
    }

    fn remove(&self, database: &str) -> Result<bool> {
        let path = self.path_for(database)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SqlGuardError::io(
                format!("Failed to remove {}", path.display()),
                e,
            )),
        }
    }
}
