//! Search engine version handling.
//!
//! Engines report versions in loose formats (`0.90.2`, `1.0.0.RC1`,
//! `7.17.9-SNAPSHOT`). [`EngineVersion`] keeps the numeric
//! `major.minor.patch` part so feature gates compare monotonically.

use std::fmt;

use semver::Version;
use syncdex_core::{Error, Result};

/// Last engine version without completion suggesters.
const LAST_WITHOUT_COMPLETION: Version = Version::new(0, 90, 2);

/// Numeric version of a connected search engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineVersion(Version);

impl EngineVersion {
    /// Create a version from its components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Parse a version string leniently.
    ///
    /// Leading numeric components are kept (missing ones are zero) and any
    /// qualifier after them is dropped.
    ///
    /// ```rust
    /// use syncdex_client::EngineVersion;
    ///
    /// assert_eq!(EngineVersion::parse("1.0.0.RC1").unwrap(), EngineVersion::new(1, 0, 0));
    /// assert_eq!(EngineVersion::parse("7.17.9-SNAPSHOT").unwrap(), EngineVersion::new(7, 17, 9));
    /// assert_eq!(EngineVersion::parse("0.90").unwrap(), EngineVersion::new(0, 90, 0));
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = Vec::with_capacity(3);
        for component in raw.trim().split('.') {
            let digits: String = component.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                break;
            }
            let value = digits
                .parse::<u64>()
                .map_err(|e| Error::config(format!("Invalid engine version '{raw}': {e}")))?;
            parts.push(value);
            if parts.len() == 3 || digits.len() != component.len() {
                break;
            }
        }

        match parts.as_slice() {
            [] => Err(Error::config(format!("Invalid engine version '{raw}'"))),
            [major] => Ok(Self::new(*major, 0, 0)),
            [major, minor] => Ok(Self::new(*major, *minor, 0)),
            [major, minor, patch, ..] => Ok(Self::new(*major, *minor, *patch)),
        }
    }

    /// Whether the engine answers completion-suggester queries.
    pub fn supports_completion(&self) -> bool {
        self.0 > LAST_WITHOUT_COMPLETION
    }

    /// The underlying semantic version.
    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
