//! Coordinate reference identifiers and their lookup in WKT strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An EPSG coordinate reference system code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epsg(pub u32);

impl Epsg {
    #[inline]
    pub fn new(code: u32) -> Self {
        Self(code)
    }

    #[inline]
    pub fn code(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Epsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Epsg({})", self.0)
    }
}

impl fmt::Display for Epsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for Epsg {
    type Err = std::num::ParseIntError;

    /// Accepts `2056`, `EPSG:2056` and the OGC URN forms
    /// (`urn:ogc:def:crs:EPSG::2056`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().rsplit(':').next().unwrap_or_default();
        code.trim().parse().map(Epsg)
    }
}

/// Returns the EPSG code attached to the root element of a WKT string.
///
/// Nested elements (datum, spheroid, units, the base geographic system)
/// carry their own authorities; only the one directly under the outermost
/// element identifies the system. Both WKT1 `AUTHORITY["EPSG","2056"]` and
/// WKT2 `ID["EPSG",2056]` are recognised.
pub fn root_epsg(wkt: &str) -> Option<Epsg> {
    let bytes = wkt.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_string = !in_string,
            _ if in_string => {}
            b'[' | b'(' => depth += 1,
            b']' | b')' => depth = depth.saturating_sub(1),
            b',' if depth == 1 => {
                let rest = wkt[i + 1..].trim_start();
                let body = rest
                    .strip_prefix("AUTHORITY[")
                    .or_else(|| rest.strip_prefix("ID["));
                if let Some(body) = body {
                    let end = body.find(']')?;
                    if let Some(epsg) = parse_authority(&body[..end]) {
                        return Some(epsg);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

fn parse_authority(body: &str) -> Option<Epsg> {
    let mut parts = body.split(',').map(|p| p.trim().trim_matches('"'));
    let authority = parts.next()?;
    if !authority.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    parts.next()?.parse().ok().map(Epsg)
}
