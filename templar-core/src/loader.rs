//! Template catalog loading.
//!
//! A catalog file holds either one template or a list of templates, as JSON
//! (`.json`) or YAML (`.yaml`, `.yml`):
//!
//! ```text
//! templates.json   [ { "id": "com.example.mail", "version": 2, ... }, ... ]
//! mail.yaml        id: com.example.mail
//!                  version: 2
//!                  properties: [ ... ]
//! ```
//!
//! Parse failures carry the file path so callers can report them as-is.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::LoadError;
use crate::types::{Template, TemplateId};

// ---------------------------------------------------------------------------
// 1. Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogCompat {
    Many(Vec<Template>),
    One(Box<Template>),
}

/// Read and deserialize a JSON or YAML file, picking the format from the extension.
pub(crate) fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound { path: path.to_path_buf() });
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let contents = std::fs::read_to_string(path)?;
    match extension.as_deref() {
        Some("json") => serde_json::from_str(&contents).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&contents).map_err(|source| LoadError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Err(LoadError::UnsupportedFormat { path: path.to_path_buf() }),
    }
}

/// Load every template in the catalog file at `path`.
pub fn load_templates_at(path: &Path) -> Result<Vec<Template>, LoadError> {
    Ok(match parse_file::<CatalogCompat>(path)? {
        CatalogCompat::Many(templates) => templates,
        CatalogCompat::One(template) => vec![*template],
    })
}

// ---------------------------------------------------------------------------
// 2. Selection
// ---------------------------------------------------------------------------

/// `<id>` or `<id>@<version>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub id: TemplateId,
    pub version: Option<u32>,
}

impl TemplateRef {
    pub fn new(id: impl Into<TemplateId>, version: Option<u32>) -> Self {
        Self { id: id.into(), version }
    }
}

impl FromStr for TemplateRef {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LoadError::InvalidReference(s.to_string());
        match s.rsplit_once('@') {
            Some((id, version)) => {
                if id.is_empty() {
                    return Err(invalid());
                }
                let version = version.parse::<u32>().map_err(|_| invalid())?;
                Ok(Self::new(id, Some(version)))
            }
            None if s.is_empty() => Err(invalid()),
            None => Ok(Self::new(s, None)),
        }
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}@{version}", self.id),
            None => self.id.fmt(f),
        }
    }
}

/// Find a template by id and version. Without a version the highest
/// versioned template with that id wins.
pub fn find_template<'a>(templates: &'a [Template], reference: &TemplateRef) -> Option<&'a Template> {
    let mut candidates = templates.iter().filter(|t| t.id == reference.id);
    match reference.version {
        Some(version) => candidates.find(|t| t.version == Some(version)),
        None => candidates.max_by_key(|t| t.version),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
