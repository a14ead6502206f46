//! Script catalog
//!
//! An ordered view over the script pairs found in a scripts directory.

use std::collections::BTreeMap;
use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::scripts::filename::{Direction, ScriptFile};

#[derive(Debug, Clone, Default)]
struct ScriptPair {
    up: Option<ScriptFile>,
    down: Option<ScriptFile>,
}

/// Script files keyed by version, ascending
#[derive(Debug, Clone, Default)]
pub struct ScriptCatalog {
    root: PathBuf,
    pairs: BTreeMap<u64, ScriptPair>,
}

impl ScriptCatalog {
    /// Create an empty catalog rooted at a directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pairs: BTreeMap::new(),
        }
    }

    /// Scan a scripts directory.
    ///
    /// Sub-directories and file names outside the script grammar are skipped.
    /// A missing directory yields [`Error::ScriptsNotFound`].
    pub fn from_dir(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::ScriptsNotFound(root.display().to_string()));
        }

        let mut catalog = Self::new(root);
        let mut names = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        for name in names {
            match ScriptFile::parse(&name) {
                Ok(file) => {
                    tracing::debug!(
                        version = file.version,
                        direction = %file.direction,
                        "Append script to catalog"
                    );
                    catalog.append(file)?;
                }
                Err(_) => {
                    tracing::warn!(file = %name, "Skipping file that is not a migration script");
                }
            }
        }

        Ok(catalog)
    }

    /// Add a script; a second script for the same version and direction is fatal
    pub fn append(&mut self, file: ScriptFile) -> Result<()> {
        let pair = self.pairs.entry(file.version).or_default();
        let slot = match file.direction {
            Direction::Up => &mut pair.up,
            Direction::Down => &mut pair.down,
        };

        if let Some(existing) = slot {
            return Err(Error::fatal(format!(
                "duplicate {} script for version {}: {} and {}",
                file.direction, file.version, existing.raw, file.raw
            )));
        }
        *slot = Some(file);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Every known version, ascending
    pub fn versions(&self) -> Vec<u64> {
        self.pairs.keys().copied().collect()
    }

    pub fn first(&self) -> Option<u64> {
        self.pairs.keys().next().copied()
    }

    pub fn last(&self) -> Option<u64> {
        self.pairs.keys().next_back().copied()
    }

    /// The first known version strictly greater than `version`
    pub fn next(&self, version: u64) -> Option<u64> {
        self.pairs
            .range((Bound::Excluded(version), Bound::Unbounded))
            .next()
            .map(|(v, _)| *v)
    }

    /// The last known version strictly lower than `version`
    pub fn prev(&self, version: u64) -> Option<u64> {
        self.pairs.range(..version).next_back().map(|(v, _)| *v)
    }

    pub fn up(&self, version: u64) -> Option<&ScriptFile> {
        self.pairs.get(&version).and_then(|p| p.up.as_ref())
    }

    pub fn down(&self, version: u64) -> Option<&ScriptFile> {
        self.pairs.get(&version).and_then(|p| p.down.as_ref())
    }

    /// Suffix of the up script of the earliest version
    pub fn first_up_suffix(&self) -> Option<&str> {
        self.first()
            .and_then(|v| self.up(v))
            .map(|file| file.suffix.as_str())
    }

    /// Path of a script inside the catalog root
    pub fn path_of(&self, file: &ScriptFile) -> PathBuf {
        self.root.join(&file.raw)
    }

    /// Versions strictly greater than `version`, ascending
    pub fn pending_after(&self, version: Option<u64>) -> Vec<u64> {
        match version {
            Some(v) => self
                .pairs
                .range((Bound::Excluded(v), Bound::Unbounded))
                .map(|(k, _)| *k)
                .collect(),
            None => self.versions(),
        }
    }
}
