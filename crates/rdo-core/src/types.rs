//! Strong type definitions for Rule-Defined Objects.
//!
//! Identifiers are newtypes and every enum has a fixed wire code, so values
//! crossing the registry boundary are checked in one place.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Identifier assigned by the registry. Starts at 1, never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RdoId(pub u64);

impl RdoId {
    /// Create from a raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RdoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RdoId({})", self.0)
    }
}

impl fmt::Display for RdoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RdoId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|e| CoreError::DecodingError(format!("invalid object id {s:?}: {e}")))
    }
}

/// The kind of content an object carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectType {
    Message = 0,
    File = 1,
    Link = 2,
    Permission = 3,
}

impl ObjectType {
    /// Convert from wire code.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Message),
            1 => Some(Self::File),
            2 => Some(Self::Link),
            3 => Some(Self::Permission),
            _ => None,
        }
    }

    /// Convert to wire code.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Canonical tag used in rule serialization.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "MESSAGE",
            Self::File => "FILE",
            Self::Link => "LINK",
            Self::Permission => "PERMISSION",
        }
    }
}

impl TryFrom<u8> for ObjectType {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_u8(code).ok_or(CoreError::UnknownObjectType(code))
    }
}

/// An action a holder can request on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActionType {
    Read = 0,
    Forward = 1,
    Copy = 2,
    Download = 3,
    Execute = 4,
    Export = 5,
}

impl ActionType {
    /// Convert from wire code.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Read),
            1 => Some(Self::Forward),
            2 => Some(Self::Copy),
            3 => Some(Self::Download),
            4 => Some(Self::Execute),
            5 => Some(Self::Export),
            _ => None,
        }
    }

    /// Convert to wire code.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Forward => "FORWARD",
            Self::Copy => "COPY",
            Self::Download => "DOWNLOAD",
            Self::Execute => "EXECUTE",
            Self::Export => "EXPORT",
        }
    }
}

impl TryFrom<u8> for ActionType {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_u8(code).ok_or(CoreError::UnknownActionType(code))
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may act on an object.
///
/// Wire codes follow the deployed registry, where LIST is 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AccessType {
    #[default]
    Any = 0,
    Link = 1,
    CreatorOnly = 2,
    SingleUse = 3,
    List = 4,
}

impl AccessType {
    /// Convert from wire code.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Any),
            1 => Some(Self::Link),
            2 => Some(Self::CreatorOnly),
            3 => Some(Self::SingleUse),
            4 => Some(Self::List),
            _ => None,
        }
    }

    /// Convert to wire code.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Canonical tag used in rule serialization.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::Link => "LINK",
            Self::CreatorOnly => "CREATOR_ONLY",
            Self::SingleUse => "SINGLE_USE",
            Self::List => "LIST",
        }
    }
}

impl TryFrom<u8> for AccessType {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_u8(code).ok_or(CoreError::UnknownAccessType(code))
    }
}
