//! The done-migrations file: migration names joined with `;`.

use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use atomic_write_file::AtomicWriteFile;

use crate::Result;
use crate::constants::MIGRATION_RECORD_SEPARATOR;

pub struct MigrationRecord;

impl MigrationRecord {
    /// Names recorded in `path`. A missing or empty file is an empty set.
    /// Newlines are accepted as separators too.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(Self::parse(&contents))
    }

    fn parse(contents: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        contents
            .split(|c: char| c == MIGRATION_RECORD_SEPARATOR || c == '\n' || c == '\r')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect()
    }

    /// Replace `path` with `names`.
    pub fn write<P: AsRef<Path>>(path: P, names: &[String]) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let joined = names.join(&MIGRATION_RECORD_SEPARATOR.to_string());
        let mut file = AtomicWriteFile::open(path)?;
        file.write_all(joined.as_bytes())?;
        file.commit()?;
        tracing::debug!(record.path = %path.display(), record.count = names.len(), "migration record written");
        Ok(())
    }
}
