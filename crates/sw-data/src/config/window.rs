//! Time window configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Largest boundary offset accepted, one year in seconds
pub const MAX_OFFSET_SECS: f64 = 366.0 * 86_400.0;

/// What a window boundary is measured from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WindowAnchor {
    /// The origin time of the event
    Origin,
    /// The first predicted arrival among these phases
    Phases(Vec<String>),
}

/// One end of the window: an anchor plus an offset in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowBoundary {
    pub phases: WindowAnchor,
    #[serde(default)]
    pub offset: f64,
}

/// Start and end boundaries, each computed independently
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub start: WindowBoundary,
    pub end: WindowBoundary,
}

impl FromStr for WindowAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("origin") {
            return Ok(WindowAnchor::Origin);
        }
        let phases: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if phases.is_empty() {
            return Err(format!("'{}' names no phases", s));
        }
        if phases.iter().any(|p| p.eq_ignore_ascii_case("origin")) {
            return Err(format!("'{}' mixes origin with phase names", s));
        }
        Ok(WindowAnchor::Phases(phases))
    }
}

impl TryFrom<String> for WindowAnchor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WindowAnchor> for String {
    fn from(anchor: WindowAnchor) -> Self {
        anchor.to_string()
    }
}

impl fmt::Display for WindowAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowAnchor::Origin => write!(f, "origin"),
            WindowAnchor::Phases(phases) => write!(f, "{}", phases.join(",")),
        }
    }
}

impl WindowBoundary {
    pub fn origin(offset: f64) -> Self {
        Self {
            phases: WindowAnchor::Origin,
            offset,
        }
    }

    /// Boundary relative to the first arrival of `phases`, e.g. `"P,p"`
    pub fn phases(phases: &str, offset: f64) -> Result<Self, String> {
        Ok(Self {
            phases: phases.parse()?,
            offset,
        })
    }

    pub fn validate(&self, name: &str) -> Result<(), String> {
        if !self.offset.is_finite() {
            return Err(format!("{} offset must be finite, got {}", name, self.offset));
        }
        if self.offset.abs() > MAX_OFFSET_SECS {
            return Err(format!(
                "{} offset {} s exceeds the {} s limit",
                name, self.offset, MAX_OFFSET_SECS
            ));
        }
        if let WindowAnchor::Phases(phases) = &self.phases {
            if phases.is_empty() {
                return Err(format!("{} boundary names no phases", name));
            }
        }
        Ok(())
    }
}

impl WindowConfig {
    /// Fixed offsets from the origin time
    pub fn relative_to_origin(start_offset: f64, end_offset: f64) -> Self {
        Self {
            start: WindowBoundary::origin(start_offset),
            end: WindowBoundary::origin(end_offset),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.start.validate("start")?;
        self.end.validate("end")?;
        // Two origin anchored boundaries can be checked without an event
        if self.start.phases == WindowAnchor::Origin
            && self.end.phases == WindowAnchor::Origin
            && self.end.offset <= self.start.offset
        {
            return Err(format!(
                "window end offset {} is not after start offset {}",
                self.end.offset, self.start.offset
            ));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::relative_to_origin(0.0, 300.0)
    }
}
