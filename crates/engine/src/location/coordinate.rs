//! Repository coordinates: `group:artifact:version[:extension[:classifier]]`.

use crate::{Error, Result};

/// Extension used when a coordinate names only group, artifact and version.
const DEFAULT_EXTENSION: &str = "jar";

/// Version token that asks the repository for its newest release.
const LATEST: &str = "latest";

/// A parsed repository coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    /// Group identifier (e.g. `com.acme`).
    pub group: String,
    /// Artifact identifier (e.g. `widget`).
    pub artifact: String,
    /// Version token, possibly `latest`.
    pub version: String,
    /// Packaging extension (e.g. `tgz`).
    pub extension: String,
    /// Optional classifier (e.g. `linux-x86_64`).
    pub classifier: Option<String>,
}

impl Coordinate {
    /// Parse a colon-delimited coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLocation`] for fewer than three or more than
    /// five segments, or when any segment is empty.
    pub fn parse(coordinate: &str) -> Result<Self> {
        let parts: Vec<&str> = coordinate.split(':').collect();
        if !(3..=5).contains(&parts.len()) {
            return Err(Error::invalid_location(
                coordinate,
                format!(
                    "expected group:artifact:version:extension[:classifier], got {} segments",
                    parts.len()
                ),
            ));
        }
        if let Some(idx) = parts.iter().position(|p| p.trim().is_empty()) {
            return Err(Error::invalid_location(
                coordinate,
                format!("segment {} is empty", idx + 1),
            ));
        }

        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: parts[2].to_string(),
            extension: parts
                .get(3)
                .map_or_else(|| DEFAULT_EXTENSION.to_string(), |s| (*s).to_string()),
            classifier: parts.get(4).map(|s| (*s).to_string()),
        })
    }

    /// Whether the version token asks for the newest release.
    #[must_use]
    pub fn is_latest(&self) -> bool {
        self.version.eq_ignore_ascii_case(LATEST)
    }

    /// Copy of this coordinate pinned to `version`.
    #[must_use]
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self.clone()
        }
    }

    /// File name a repository pull produces: `artifact-version[-classifier].extension`.
    #[must_use]
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group, self.artifact, self.version, self.extension
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
