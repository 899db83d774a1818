// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! What the suggestion engine and the trusted command launcher need to know about the
//! outside world, behind traits so that tests can substitute fixed answers.

use std::{fmt::Display,
          io,
          path::{Path, PathBuf}};

use crate::{ConfigurationError, Value};

/// A granted `(command, subcommand chain)` pair, e.g. `git log` is `("git", ["log"])`.
/// Used to filter completions and to authorize trusted external commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandPermission {
    pub command_name: String,
    pub subcommand_chain: Vec<String>,
}

impl CommandPermission {
    /// Parse a textual grant like `"cmd help build"`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidPermission`] when the text is empty or a word
    /// contains characters other than ASCII alphanumerics, `-` and `_`.
    pub fn try_parse(spec: &str) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidPermission {
            spec: spec.to_string(),
        };

        let words: Vec<&str> = spec.split_whitespace().collect();
        let Some((command_name, subcommands)) = words.split_first() else {
            return Err(invalid());
        };

        let is_valid_word = |word: &&str| {
            word.chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        };
        if !words.iter().all(is_valid_word) {
            return Err(invalid());
        }

        Ok(Self {
            command_name: (*command_name).to_string(),
            subcommand_chain: subcommands.iter().map(ToString::to_string).collect(),
        })
    }

    /// `true` if this grant covers exactly `command` followed by `chain`.
    #[must_use]
    pub fn matches_exactly(&self, command: &str, chain: &[&str]) -> bool {
        self.command_name == command
            && self.subcommand_chain.len() == chain.len()
            && self
                .subcommand_chain
                .iter()
                .zip(chain)
                .all(|(granted, typed)| granted == typed)
    }
}

impl Display for CommandPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command_name)?;
        for it in &self.subcommand_chain {
            write!(f, " {it}")?;
        }
        Ok(())
    }
}

/// Everything the editor may look up about the live evaluation state.
pub trait ScopeProvider {
    fn global_names(&self) -> Vec<String>;
    fn local_names(&self) -> Vec<String>;
    /// Locals shadow globals.
    fn resolve(&self, name: &str) -> Option<Value>;
    fn command_permissions(&self) -> Vec<CommandPermission>;
    fn named_patterns(&self) -> Vec<String>;
    fn pattern_namespaces(&self) -> Vec<String>;
    /// Known resolvable hosts, e.g. `https://example.com`.
    fn host_definitions(&self) -> Vec<String>;
    /// Known URLs, e.g. `https://example.com/api/users`.
    fn url_entries(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
}

pub trait FilesystemProvider: Send + Sync {
    /// List the entries of `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory can't be read.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>>;
}

/// [`FilesystemProvider`] backed by [`std::fs`]. Entries are sorted by name so that the
/// same directory always yields the same candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl FilesystemProvider for OsFilesystem {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut acc = vec![];
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let is_dir = entry.file_type().map(|it| it.is_dir()).unwrap_or(false);
            acc.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        acc.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(acc)
    }
}

/// The directory that `read_dir` should list for a typed path, i.e. everything up to and
/// including the last `/`. An empty directory part means the current directory.
#[must_use]
pub fn dir_to_list(typed_dir: &str) -> PathBuf {
    if typed_dir.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(typed_dir)
    }
}
