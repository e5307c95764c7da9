//! Parsing and rendering of VEXos version identifiers.
//!
//! The catalog publishes versions as underscore-delimited tokens such as
//! `VEXOS_V5_1_1_4_0`, while installed manifests record the dotted form
//! `1.1.4.0`. Both decode into the same [`FirmwareVersion`].

use crate::InstallError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Product family literal, the first field of every token.
pub const PRODUCT: &str = "VEXOS";

/// Platform literal, the second field of every token.
pub const PLATFORM: &str = "V5";

/// Prefix every well-formed catalog response starts with.
pub const TOKEN_PREFIX: &str = "VEXOS_V5_";

const TOKEN_FIELDS: usize = 6;

/// A four-component firmware version.
///
/// Field order matters: the derived `Ord` compares `major`, then `minor`,
/// then `patch`, then `build`, each numerically.
///
/// # Example
///
/// ```rust
/// use vexos_dl::FirmwareVersion;
///
/// let v: FirmwareVersion = "1.1.4.0".parse().unwrap();
/// assert_eq!(v, FirmwareVersion::new(1, 1, 4, 0));
/// assert_eq!(v.to_string(), "1.1.4.0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FirmwareVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
}

impl FirmwareVersion {
    pub const fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }

    /// Render as the dotted `major.minor.patch.build` form.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Render as a catalog token, e.g. `VEXOS_V5_1_1_4_0`.
    pub fn to_token(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}",
            PRODUCT, PLATFORM, self.major, self.minor, self.patch, self.build
        )
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

impl FromStr for FirmwareVersion {
    type Err = InstallError;

    /// Parse the dotted manifest form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static DOTTED: OnceLock<Regex> = OnceLock::new();
        let re = DOTTED.get_or_init(|| {
            Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)\.([0-9]+)$")
                .expect("Invalid regex pattern")
        });

        let caps = re
            .captures(s)
            .ok_or_else(|| malformed(s, "expected four dot-separated numbers"))?;

        let mut parts = [0u32; 4];
        for (slot, i) in parts.iter_mut().zip(1usize..) {
            *slot = parse_component(&caps[i])
                .ok_or_else(|| malformed(s, "component out of range"))?;
        }
        let [major, minor, patch, build] = parts;
        Ok(Self::new(major, minor, patch, build))
    }
}

/// Parse a raw catalog token into a [`FirmwareVersion`].
///
/// Fails with [`InstallError::MalformedVersion`] unless the token has exactly
/// six underscore-separated fields, starts with `VEXOS_V5`, and ends in four
/// non-negative integers.
pub fn parse(token: &str) -> Result<FirmwareVersion, InstallError> {
    let fields: Vec<&str> = token.split('_').collect();
    if fields.len() != TOKEN_FIELDS {
        return Err(malformed(token, "expected 6 underscore-separated fields"));
    }
    if fields[0] != PRODUCT {
        return Err(malformed(token, "unknown product family"));
    }
    if fields[1] != PLATFORM {
        return Err(malformed(token, "unknown platform"));
    }

    let mut parts = [0u32; 4];
    for (slot, field) in parts.iter_mut().zip(&fields[2..]) {
        *slot = parse_component(field).ok_or_else(|| {
            malformed(token, "version components must be non-negative integers")
        })?;
    }
    let [major, minor, patch, build] = parts;
    Ok(FirmwareVersion::new(major, minor, patch, build))
}

/// Render a version in dotted form.
pub fn render(version: &FirmwareVersion) -> String {
    version.render()
}

// `u32::from_str` accepts a leading `+`, so digits are checked first.
fn parse_component(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn malformed(token: &str, reason: &'static str) -> InstallError {
    InstallError::MalformedVersion {
        token: token.to_string(),
        reason,
    }
}

/// A catalog token that has already been validated.
///
/// Keeps the raw text (needed to build download URLs) alongside the parsed
/// version so neither has to be recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken {
    raw: String,
    version: FirmwareVersion,
}

impl VersionToken {
    /// Validate a raw token. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, InstallError> {
        let raw = raw.trim();
        let version = parse(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            version,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn version(&self) -> FirmwareVersion {
        self.version
    }
}

impl From<FirmwareVersion> for VersionToken {
    fn from(version: FirmwareVersion) -> Self {
        Self {
            raw: version.to_token(),
            version,
        }
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
