//! Dependency coordinate parsing (`group:name[:version]`).

use std::fmt;

use crate::error::UtilError;

/// A parsed dependency coordinate identifying a module and, optionally, a version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    /// Group identifier, e.g. `"uk.co.real-logic"`.
    pub group: String,
    /// Artifact name, e.g. `"sbe-tool"`.
    pub name: String,
    /// Artifact version, e.g. `"1.31.0"`. `None` for a bare module.
    pub version: Option<String>,
}

impl Coordinate {
    /// Create a coordinate for a module without a version.
    pub fn module(group: &str, name: &str) -> Self {
        Self {
            group: group.to_owned(),
            name: name.to_owned(),
            version: None,
        }
    }

    /// Builder method to attach a version.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_owned());
        self
    }

    /// Parse a coordinate string.
    ///
    /// Accepted formats:
    /// - `"group:name"` (module only)
    /// - `"group:name:version"`
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    /// Returns `UtilError::InvalidCoordinate` when the string does not have
    /// two or three colon-separated parts, or any part is empty.
    pub fn parse(coord: &str) -> Result<Self, UtilError> {
        let trimmed = coord.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();

        if parts.len() < 2 || parts.len() > 3 {
            return Err(UtilError::InvalidCoordinate {
                coordinate: coord.to_owned(),
                reason: format!(
                    "expected 2 or 3 colon-separated parts (group:name[:version]), got {}",
                    parts.len()
                ),
            });
        }

        for (i, part) in parts.iter().enumerate() {
            if part.trim().is_empty() {
                let label = match i {
                    0 => "group",
                    1 => "name",
                    _ => "version",
                };
                return Err(UtilError::InvalidCoordinate {
                    coordinate: coord.to_owned(),
                    reason: format!("{label} is empty"),
                });
            }
        }

        let (Some(group), Some(name)) = (parts.first(), parts.get(1)) else {
            return Err(UtilError::InvalidCoordinate {
                coordinate: coord.to_owned(),
                reason: "expected at least 2 parts".to_owned(),
            });
        };

        let mut result = Self::module(group, name);
        if let Some(version) = parts.get(2) {
            result.version = Some((*version).to_owned());
        }
        Ok(result)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}:{}", self.group, self.name, version),
            None => write!(f, "{}:{}", self.group, self.name),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_versioned() {
        let coord = Coordinate::parse("uk.co.real-logic:sbe-tool:1.31.0").unwrap();
        assert_eq!(coord.group, "uk.co.real-logic");
        assert_eq!(coord.name, "sbe-tool");
        assert_eq!(coord.version.as_deref(), Some("1.31.0"));
    }

    #[test]
    fn parse_module_only() {
        let coord = Coordinate::parse("org.agrona:agrona").unwrap();
        assert_eq!(coord.name, "agrona");
        assert!(coord.version.is_none());
        assert_eq!(coord.to_string(), "org.agrona:agrona");
    }

    #[test]
    fn parse_trims_whitespace() {
        let coord = Coordinate::parse("  junit:junit:4.13.2 \n").unwrap();
        assert_eq!(coord.to_string(), "junit:junit:4.13.2");
    }

    #[test]
    fn parse_rejects_single_part() {
        let err = Coordinate::parse("agrona").unwrap_err().to_string();
        assert!(err.contains("invalid coordinate"), "error was: {err}");
    }

    #[test]
    fn parse_rejects_four_parts() {
        let err = Coordinate::parse("a:b:c:d").unwrap_err().to_string();
        assert!(err.contains("got 4"), "error was: {err}");
    }

    #[test]
    fn parse_rejects_empty_name() {
        let err = Coordinate::parse("org.agrona::1.0").unwrap_err().to_string();
        assert!(err.contains("name is empty"), "error was: {err}");
    }

    #[test]
    fn display_round_trips_versioned() {
        let coord = Coordinate::module("org.agrona", "agrona").with_version("1.21.2");
        assert_eq!(coord.to_string(), "org.agrona:agrona:1.21.2");
        assert_eq!(Coordinate::parse(&coord.to_string()).unwrap(), coord);
    }

    #[test]
    fn ordering_is_by_group_then_name() {
        let mut coords = vec![
            Coordinate::module("org.b", "a").with_version("1"),
            Coordinate::module("org.a", "z").with_version("1"),
            Coordinate::module("org.a", "b").with_version("1"),
        ];
        coords.sort();
        let rendered: Vec<String> = coords.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["org.a:b:1", "org.a:z:1", "org.b:a:1"]);
    }
}
