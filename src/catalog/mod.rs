//! Message catalog: every user-visible string, addressed by stable keys.
//!
//! The catalog is a JSON document (see `data/catalog.json`) with a flat set
//! of global keys plus nested sub-catalogs per location and per NPC. Game
//! code never embeds English text; it asks the catalog and treats a missing
//! key as a hard configuration error rather than falling back to a default.
//!
//! Content is data, not code: admins can rewrite the story without
//! recompiling. [`CatalogCache`] re-reads the file whenever its modification
//! time changes, so edits land on the next message.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

/// The catalog shipped with the crate. Used by `init`, as the fallback when
/// no catalog path is configured, and by tests.
pub const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// Errors raised by catalog loading and lookup. All of them are fatal for
/// the message being processed; a missing key is a configuration error,
/// never a silent default.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not valid JSON.
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A referenced key does not exist in the document.
    #[error("missing catalog key: {0}")]
    MissingKey(String),

    /// The key exists but does not hold the expected shape.
    #[error("catalog key {0} is not a string")]
    NotText(String),

    /// The key exists but does not hold an array of strings.
    #[error("catalog key {0} is not a list of strings")]
    NotTextList(String),
}

/// A parsed, read-only message catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: Value,
}

impl Catalog {
    /// Parse a catalog from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let root: Value = serde_json::from_str(text)?;
        Ok(Self { root })
    }

    /// Parse the catalog embedded in the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Read and parse a catalog file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    fn node(&self, path: &[&str]) -> Result<&Value, CatalogError> {
        let mut node = &self.root;
        for (depth, segment) in path.iter().enumerate() {
            node = node
                .get(segment)
                .ok_or_else(|| CatalogError::MissingKey(path[..=depth].join(".")))?;
        }
        Ok(node)
    }

    /// Look up a string at a key path, e.g. `["npcs", "doctor", "greeting"]`.
    pub fn text(&self, path: &[&str]) -> Result<&str, CatalogError> {
        self.node(path)?
            .as_str()
            .ok_or_else(|| CatalogError::NotText(path.join(".")))
    }

    /// Look up a top-level string.
    pub fn global(&self, key: &str) -> Result<&str, CatalogError> {
        self.text(&[key])
    }

    /// Look up a string in one location's sub-catalog.
    pub fn location_text(&self, location: &str, key: &str) -> Result<&str, CatalogError> {
        self.text(&["locations", location, key])
    }

    /// Look up a string in one NPC's sub-catalog.
    pub fn npc_text(&self, npc: &str, key: &str) -> Result<&str, CatalogError> {
        self.text(&["npcs", npc, key])
    }

    /// The label on the "go to <destination>" button.
    pub fn go_to_label(&self, destination: &str) -> Result<&str, CatalogError> {
        self.text(&["go_to", destination])
    }

    /// Display name for an object key.
    pub fn object_name(&self, object: &str) -> Result<&str, CatalogError> {
        self.text(&["objects", object])
    }

    /// Inventory description for an object key.
    pub fn object_description(&self, object: &str) -> Result<&str, CatalogError> {
        self.text(&["object_descriptions", object])
    }

    /// A top-level array of strings (used for the intro menu).
    pub fn text_list(&self, key: &str) -> Result<Vec<String>, CatalogError> {
        let node = self.node(&[key])?;
        let items = node
            .as_array()
            .ok_or_else(|| CatalogError::NotTextList(key.to_string()))?;
        items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| CatalogError::NotTextList(key.to_string()))
            })
            .collect()
    }

    /// Fail fast on catalogs missing the keys every session needs. Variant
    /// keys are checked lazily at use; this covers the top-level contract.
    pub fn validate(&self) -> Result<(), CatalogError> {
        const REQUIRED: [&str; 14] = [
            "intro",
            "ask_name",
            "story",
            "help",
            "apology",
            "wrong_action",
            "show_inventory",
            "take",
            "took",
            "talk",
            "nothing",
            "you_won",
            "highscores_header",
            "highscore_row",
        ];
        for key in REQUIRED {
            self.global(key)?;
        }
        self.text_list("intro_menu")?;
        Ok(())
    }
}

/// Substitute positional arguments into a catalog template. Each `{}` in the
/// template consumes one argument, left to right; surplus placeholders are
/// left in place so broken templates stay visible instead of panicking.
pub fn fill(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    let mut args = args.iter();
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

/// A catalog that watches its source file and reloads on change.
///
/// The file's mtime is checked on every [`CatalogCache::current`] call; the
/// parse only happens when the timestamp moved. A failed reload keeps the
/// previous catalog and logs a warning so a half-saved edit cannot take the
/// bot down.
pub struct CatalogCache {
    path: Option<PathBuf>,
    modified: Option<SystemTime>,
    catalog: Catalog,
}

impl CatalogCache {
    /// A cache over the embedded catalog; never reloads.
    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self {
            path: None,
            modified: None,
            catalog: Catalog::builtin()?,
        })
    }

    /// A cache over a catalog file on disk.
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Result<Self, CatalogError> {
        let path = path.into();
        let catalog = Catalog::from_path(&path)?;
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        Ok(Self {
            path: Some(path),
            modified,
            catalog,
        })
    }

    /// The current catalog, reloaded first if the backing file changed.
    pub fn current(&mut self) -> &Catalog {
        if let Some(path) = &self.path {
            let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
            if modified.is_some() && modified != self.modified {
                match Catalog::from_path(path) {
                    Ok(catalog) => {
                        debug!("reloaded catalog from {}", path.display());
                        self.catalog = catalog;
                        self.modified = modified;
                    }
                    Err(err) => {
                        warn!(
                            "catalog reload failed, keeping previous content: {}",
                            err
                        );
                        // Remember the timestamp anyway so a broken file is
                        // not re-parsed on every message.
                        self.modified = modified;
                    }
                }
            }
        }
        &self.catalog
    }
}
