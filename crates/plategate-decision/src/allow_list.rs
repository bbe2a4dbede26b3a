// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Allow-list store
//!
//! Line-oriented source, one plate per line. Blank lines are skipped and every
//! entry is normalized on load, so `" abc 123 "` and `"ABC123"` are the same
//! plate. The list is immutable once loaded.

use ahash::AHashSet;
use plategate_config::{ConfigError, ConfigResult};
use plategate_structures::Identifier;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use tracing::{debug, info, warn};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Set of authorized plate identifiers
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    entries: AHashSet<Identifier>,
    /// Same entries, sorted; fuzzy matching walks this for a stable order
    ordered: Vec<Identifier>,
}

impl AllowList {
    /// Empty list; every scan is denied
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from already-normalized identifiers. Empty identifiers are dropped.
    pub fn from_identifiers<I>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = Identifier>,
    {
        let entries: AHashSet<Identifier> = identifiers
            .into_iter()
            .filter(|id| !id.is_empty())
            .collect();
        let mut ordered: Vec<Identifier> = entries.iter().cloned().collect();
        ordered.sort();
        Self { entries, ordered }
    }

    /// Load from a file
    ///
    /// A missing file is not an error: the system still has to run (and deny
    /// everything) so the rest of the installation can be tested.
    ///
    /// # Errors
    ///
    /// `ConfigError::IoError` for any I/O failure other than not-found, and
    /// `ConfigError::MalformedAllowList` for content that is not a plate list.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "[ALLOW-LIST] File '{}' not found. Starting with an empty list, all plates will be denied",
                    path.display()
                );
                return Ok(Self::empty());
            }
            Err(e) => return Err(ConfigError::IoError(e)),
        };

        let list = Self::from_reader(BufReader::new(file))?;
        info!(
            "[ALLOW-LIST] Loaded {} allowed plates from {}",
            list.len(),
            path.display()
        );
        Ok(list)
    }

    /// Parse line-oriented content
    pub fn parse(content: &str) -> ConfigResult<Self> {
        Self::from_reader(content.as_bytes())
    }

    /// Parse line-oriented content from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> ConfigResult<Self> {
        let mut identifiers = Vec::new();

        for (index, raw_line) in reader.split(b'\n').enumerate() {
            let line_number = index + 1;
            let bytes = raw_line?;
            let line = String::from_utf8(bytes).map_err(|_| ConfigError::MalformedAllowList {
                line: line_number,
                reason: "not valid UTF-8".to_string(),
            })?;

            let line = if line_number == 1 {
                line.trim_start_matches(BYTE_ORDER_MARK)
            } else {
                line.as_str()
            };

            if let Some(bad) = line.chars().find(|c| c.is_control() && !c.is_whitespace()) {
                return Err(ConfigError::MalformedAllowList {
                    line: line_number,
                    reason: format!("control character U+{:04X}", bad as u32),
                });
            }

            let identifier = Identifier::new(line);
            if identifier.is_empty() {
                continue;
            }
            debug!("[ALLOW-LIST] line {}: {}", line_number, identifier);
            identifiers.push(identifier);
        }

        Ok(Self::from_identifiers(identifiers))
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.entries.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in lexical order
    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.ordered.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_normalizes_and_skips_blanks() {
        let list = AllowList::parse("  abc 123 \n\n\t\nxyz-9\r\nABC123\n").unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&Identifier::new("ABC123")));
        assert!(list.contains(&Identifier::new("XYZ-9")));
        let entries: Vec<&str> = list.iter().map(|id| id.as_str()).collect();
        assert_eq!(entries, vec!["ABC123", "XYZ-9"]);
    }

    #[test]
    fn test_parse_rejects_control_characters() {
        let err = AllowList::parse("ABC123\nAB\u{0}C\n").unwrap_err();
        match err {
            ConfigError::MalformedAllowList { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("U+0000"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reader_rejects_invalid_utf8() {
        let bytes: &[u8] = b"ABC123\n\xff\xfe\n";
        let err = AllowList::from_reader(bytes).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedAllowList { line: 2, .. }));
    }

    #[test]
    fn test_byte_order_mark_ignored() {
        let list = AllowList::parse("\u{feff}abc123\n").unwrap();
        assert!(list.contains(&Identifier::new("ABC123")));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = AllowList::load(&dir.path().join("allowed_plates.txt")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allowed_plates.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "abc 123").unwrap();
        writeln!(file, "  KSA 7788").unwrap();

        let list = AllowList::load(&path).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&Identifier::new("KSA7788")));
    }

    #[test]
    fn test_load_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AllowList::load(dir.path());
        assert!(result.is_err());
    }
}
