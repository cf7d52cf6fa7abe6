use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::RegistryError, skeleton::SkeletonSpec};

/// The registry document shipped with the binary.
const BUILTIN_REGISTRY: &str = include_str!("../config/resources.json");

/// Section
///
/// The URL prefix and breadcrumb label every resource page sits under (e.g. `/admin`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub slug: String,
    pub label: String,
}

impl Section {
    pub fn href(&self) -> String {
        format!("/{}", self.slug)
    }
}

/// A table column of the list view: which record field, under which heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub field: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Text,
    Email,
    Password,
    Textarea,
    Number,
    Checkbox,
    Date,
}

/// A form input of the create/edit view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub input: InputKind,
}

fn default_enabled() -> bool {
    true
}

/// ResourceMapEntry
///
/// One row of the registry: the URL-facing `key`, the backing `resource_name` used for
/// permissions and backend calls, and everything the pages need to present it.
///
/// Disabled rows (pivot/junction resources) stay resolvable through `lookup` for
/// internal checks but are never routable and never listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMapEntry {
    pub key: String,
    pub resource_name: String,
    pub label: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub skeleton: SkeletonSpec,
}

#[derive(Deserialize)]
struct RegistryDocument {
    section: Section,
    resources: Vec<ResourceMapEntry>,
}

/// ResourceRegistry
///
/// Immutable after construction and shared behind an `Arc`, so concurrent requests
/// read it without synchronization. It is the single enumeration of administrable
/// resources: nothing else in the crate branches on a literal resource key.
#[derive(Debug)]
pub struct ResourceRegistry {
    section: Section,
    entries: Vec<ResourceMapEntry>,
    index: HashMap<String, usize>,
}

impl ResourceRegistry {
    /// Builds and validates a registry.
    ///
    /// Rejects duplicate or non URL-safe keys, and enabled entries whose skeleton
    /// counts disagree with their declared columns/fields.
    pub fn new(section: Section, entries: Vec<ResourceMapEntry>) -> Result<Self, RegistryError> {
        if !is_url_safe(&section.slug) {
            return Err(RegistryError::InvalidKey(section.slug));
        }

        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if !is_url_safe(&entry.key) {
                return Err(RegistryError::InvalidKey(entry.key.clone()));
            }
            if index.insert(entry.key.clone(), position).is_some() {
                return Err(RegistryError::DuplicateKey(entry.key.clone()));
            }
            if entry.enabled {
                validate_shape(entry)?;
            }
        }

        Ok(Self {
            section,
            entries,
            index,
        })
    }

    /// Parses a registry document (`{ section, resources }`).
    pub fn from_json(document: &str) -> Result<Self, RegistryError> {
        let parsed: RegistryDocument = serde_json::from_str(document)?;
        Self::new(parsed.section, parsed.resources)
    }

    /// Reads a registry document from disk.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let document = fs::read_to_string(path)?;
        Self::from_json(&document)
    }

    /// The registry bundled in `config/resources.json`.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_json(BUILTIN_REGISTRY)
    }

    pub fn section(&self) -> &Section {
        &self.section
    }

    /// lookup
    ///
    /// Case-sensitive exact match on `key`. Returns disabled entries too.
    pub fn lookup(&self, key: &str) -> Result<&ResourceMapEntry, RegistryError> {
        self.index
            .get(key)
            .map(|&position| &self.entries[position])
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    /// routable
    ///
    /// The entry a URL may reach: present and enabled. Disabled and absent keys
    /// both yield `None`.
    pub fn routable(&self, key: &str) -> Option<&ResourceMapEntry> {
        self.lookup(key).ok().filter(|entry| entry.enabled)
    }

    /// Enabled entries in document order. Feeds navigation and view registration.
    pub fn visible(&self) -> impl Iterator<Item = &ResourceMapEntry> {
        self.entries.iter().filter(|entry| entry.enabled)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_url_safe(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn validate_shape(entry: &ResourceMapEntry) -> Result<(), RegistryError> {
    let mismatch = |detail: String| RegistryError::ShapeMismatch {
        key: entry.key.clone(),
        detail,
    };

    if entry.columns.is_empty() {
        return Err(mismatch("enabled resources must declare columns".to_string()));
    }
    if entry.fields.is_empty() {
        return Err(mismatch("enabled resources must declare fields".to_string()));
    }
    if usize::from(entry.skeleton.column_count) != entry.columns.len() {
        return Err(mismatch(format!(
            "skeleton column_count {} does not match {} columns",
            entry.skeleton.column_count,
            entry.columns.len()
        )));
    }
    if usize::from(entry.skeleton.field_count) != entry.fields.len() {
        return Err(mismatch(format!(
            "skeleton field_count {} does not match {} fields",
            entry.skeleton.field_count,
            entry.fields.len()
        )));
    }
    Ok(())
}
