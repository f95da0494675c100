//! Resource identifier operator (`fes:ResourceId`).

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{FesError, Result};
use crate::validators::{parse_time_position, validate_resource_identifier, validate_time_position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VersionAction {
    First,
    Last,
    Previous,
    Next,
    All,
}

impl VersionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionAction::First => "FIRST",
            VersionAction::Last => "LAST",
            VersionAction::Previous => "PREVIOUS",
            VersionAction::Next => "NEXT",
            VersionAction::All => "ALL",
        }
    }
}

/// The `version` attribute: an action token, a 1-based index, or a time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Version {
    Action(VersionAction),
    Index(u32),
    Timestamp(String),
}

impl FromStr for Version {
    type Err = FesError;

    fn from_str(value: &str) -> Result<Self> {
        let action = match value {
            "FIRST" => Some(VersionAction::First),
            "LAST" => Some(VersionAction::Last),
            "PREVIOUS" => Some(VersionAction::Previous),
            "NEXT" => Some(VersionAction::Next),
            "ALL" => Some(VersionAction::All),
            _ => None,
        };
        if let Some(action) = action {
            return Ok(Version::Action(action));
        }
        if let Ok(index) = value.parse::<u32>() {
            if index == 0 {
                return Err(FesError::validation("version index starts at 1"));
            }
            return Ok(Version::Index(index));
        }
        validate_time_position(value)?;
        Ok(Version::Timestamp(value.to_string()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Action(action) => f.write_str(action.as_str()),
            Version::Index(index) => write!(f, "{index}"),
            Version::Timestamp(timestamp) => f.write_str(timestamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceId {
    rid: String,
    previous_rid: Option<String>,
    pub version: Option<Version>,
    start_time: Option<String>,
    end_time: Option<String>,
}

impl ResourceId {
    pub fn new(rid: impl Into<String>) -> Result<Self> {
        let rid = rid.into();
        validate_resource_identifier(&rid)?;
        Ok(Self {
            rid,
            previous_rid: None,
            version: None,
            start_time: None,
            end_time: None,
        })
    }

    pub fn with_previous_rid(mut self, previous_rid: impl Into<String>) -> Result<Self> {
        let previous_rid = previous_rid.into();
        validate_resource_identifier(&previous_rid)?;
        self.previous_rid = Some(previous_rid);
        Ok(self)
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Either end may be open.
    pub fn with_time_range(
        mut self,
        start_time: Option<String>,
        end_time: Option<String>,
    ) -> Result<Self> {
        let start = start_time.as_deref().map(parse_time_position).transpose()?;
        let end = end_time.as_deref().map(parse_time_position).transpose()?;
        if start.zip(end).is_some_and(|(start, end)| start > end) {
            return Err(FesError::validation(format!(
                "time range starts after it ends ({} > {})",
                start_time.as_deref().unwrap_or_default(),
                end_time.as_deref().unwrap_or_default()
            )));
        }
        self.start_time = start_time;
        self.end_time = end_time;
        Ok(self)
    }

    pub fn rid(&self) -> &str {
        &self.rid
    }

    pub fn previous_rid(&self) -> Option<&str> {
        self.previous_rid.as_deref()
    }

    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }
}
