use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Top-level directory every asset locator lives under.
pub const UPLOADS_ROOT: &str = "uploads";

/// A validated, relative asset path such as `uploads/tobaccos/<uuid>.jpg`.
///
/// Locators are what the relational store records; the asset store resolves
/// them against its own root directory.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AssetLocator(String);

impl AssetLocator {
    /// Parse a locator string, rejecting anything that could escape the store root.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StorageError::invalid_locator(s, "is empty"));
        }
        if s.starts_with('/') || s.contains('\\') {
            return Err(StorageError::invalid_locator(
                s,
                "must be a relative '/'-separated path",
            ));
        }
        if s.chars().any(|c| c.is_ascii_control()) {
            return Err(StorageError::invalid_locator(s, "contains control characters"));
        }

        let mut segments = s.split('/');
        if segments.next() != Some(UPLOADS_ROOT) {
            return Err(StorageError::invalid_locator(s, "must start with 'uploads/'"));
        }
        let rest: Vec<&str> = segments.collect();
        if rest.is_empty() {
            return Err(StorageError::invalid_locator(s, "has no file name"));
        }
        for segment in rest {
            if segment.is_empty() || segment == "." || segment == ".." || segment.starts_with('.')
            {
                return Err(StorageError::invalid_locator(s, "has an invalid path segment"));
            }
        }

        Ok(Self(s.to_string()))
    }

    /// Generate a fresh locator `uploads/{namespace}/{uuid}.{extension}`.
    pub fn generate(namespace: &str, extension: &str) -> Result<Self, StorageError> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::invalid_locator(
                &extension,
                "is not a usable file extension",
            ));
        }
        Self::parse(&format!(
            "{UPLOADS_ROOT}/{namespace}/{}.{extension}",
            uuid::Uuid::new_v4()
        ))
    }

    /// Namespace directory directly below [`UPLOADS_ROOT`], if any.
    pub fn namespace(&self) -> Option<&str> {
        let mut parts = self.0.split('/').skip(1);
        let namespace = parts.next()?;
        parts.next().map(|_| namespace)
    }

    /// Lowercased file extension.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.0)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Guessed MIME type from the file extension.
    pub fn content_type(&self) -> Option<String> {
        mime_guess::from_path(&self.0).first().map(|m| m.to_string())
    }

    /// Whether the extension maps to an `image/*` MIME type.
    pub fn is_image(&self) -> bool {
        mime_guess::from_path(&self.0)
            .first()
            .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE)
    }

    /// Resolve against a store root.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |p, s| p.join(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for AssetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetLocator({})", self.0)
    }
}

impl fmt::Display for AssetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for AssetLocator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AssetLocator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
