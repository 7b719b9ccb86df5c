//! Parse options
//!
//! Options can come from a `ktsyn.toml` file:
//!
//! ```toml
//! [parser]
//! entry = "script"
//! collapse_blocks = true
//! max_errors = 50
//! ```

use crate::error::{KtsynError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which production the whole input is parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    #[default]
    File,
    Script,
    Type,
    Expression,
    Block,
    Lambda,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 6] = [
        EntryPoint::File,
        EntryPoint::Script,
        EntryPoint::Type,
        EntryPoint::Expression,
        EntryPoint::Block,
        EntryPoint::Lambda,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryPoint::File => "file",
            EntryPoint::Script => "script",
            EntryPoint::Type => "type",
            EntryPoint::Expression => "expression",
            EntryPoint::Block => "block",
            EntryPoint::Lambda => "lambda",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryPoint {
    type Err = KtsynError;

    fn from_str(s: &str) -> Result<Self> {
        EntryPoint::ALL
            .into_iter()
            .find(|entry| entry.as_str() == s)
            .ok_or_else(|| KtsynError::UnknownEntryPoint(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    pub entry: EntryPoint,
    /// Parse function bodies as a single unstructured BLOCK
    pub collapse_blocks: bool,
    /// Keep at most this many diagnostics; the tree is unaffected
    pub max_errors: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct OptionsFile {
    #[serde(default)]
    parser: ParseOptions,
}

impl ParseOptions {
    pub fn with_entry(mut self, entry: EntryPoint) -> Self {
        self.entry = entry;
        self
    }

    /// Read the `[parser]` table of an options file; other tables are ignored
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: OptionsFile = toml::from_str(s)?;
        Ok(file.parser)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::from_toml_str("").unwrap();
        assert_eq!(options, ParseOptions::default());
        assert_eq!(options.entry, EntryPoint::File);
    }

    #[test]
    fn test_parser_table() {
        let options = ParseOptions::from_toml_str(
            r#"
            [parser]
            entry = "expression"
            collapse_blocks = true
            max_errors = 3

            [other]
            ignored = 1
            "#,
        )
        .unwrap();
        assert_eq!(options.entry, EntryPoint::Expression);
        assert!(options.collapse_blocks);
        assert_eq!(options.max_errors, Some(3));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = ParseOptions::from_toml_str("[parser]\nentri = \"file\"\n");
        assert!(matches!(result, Err(KtsynError::Options(_))));
    }

    #[test]
    fn test_entry_point_names_round_trip() {
        for entry in EntryPoint::ALL {
            assert_eq!(entry.as_str().parse::<EntryPoint>().unwrap(), entry);
        }
        assert!(matches!(
            "module".parse::<EntryPoint>(),
            Err(KtsynError::UnknownEntryPoint(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ktsyn.toml");
        std::fs::write(&path, "[parser]\nentry = \"type\"\n").unwrap();
        assert_eq!(ParseOptions::from_path(&path).unwrap().entry, EntryPoint::Type);

        let missing = ParseOptions::from_path(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(KtsynError::Io(_))));
    }
}
