//! Service error types.

use crate::coord::CoordError;
use crate::elevation::ElevationError;
use crate::format::FormatError;
use crate::store::StoreError;
use crate::strings::StringTableError;
use crate::style::StyleError;
use std::fmt;
use std::io;

/// Errors surfaced by [`MapService`] operations.
///
/// Every lower layer error converts into a variant here, so callers only
/// handle one error type at the service boundary.
///
/// [`MapService`]: crate::service::MapService
#[derive(Debug)]
pub enum ServiceError {
    /// A configuration value failed validation.
    Config(String),
    /// I/O error preparing service directories.
    Io(io::Error),
    /// Invalid coordinate or level of detail input.
    Coord(CoordError),
    /// Element store failure.
    Store(StoreError),
    /// Map data file could not be parsed.
    Format(FormatError),
    /// Stylesheet could not be read or parsed.
    Style(StyleError),
    /// Elevation tile failure.
    Elevation(ElevationError),
    /// String table failure.
    Strings(StringTableError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(message) => write!(f, "invalid configuration: {}", message),
            Self::Io(e) => write!(f, "service i/o: {}", e),
            Self::Coord(e) => write!(f, "coordinate error: {}", e),
            Self::Store(e) => write!(f, "store error: {}", e),
            Self::Format(e) => write!(f, "map data error: {}", e),
            Self::Style(e) => write!(f, "stylesheet error: {}", e),
            Self::Elevation(e) => write!(f, "elevation error: {}", e),
            Self::Strings(e) => write!(f, "string table error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Io(e) => Some(e),
            Self::Coord(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Format(e) => Some(e),
            Self::Style(e) => Some(e),
            Self::Elevation(e) => Some(e),
            Self::Strings(e) => Some(e),
        }
    }
}

impl From<io::Error> for ServiceError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<CoordError> for ServiceError {
    fn from(e: CoordError) -> Self {
        Self::Coord(e)
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<FormatError> for ServiceError {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

impl From<StyleError> for ServiceError {
    fn from(e: StyleError) -> Self {
        Self::Style(e)
    }
}

impl From<ElevationError> for ServiceError {
    fn from(e: ElevationError) -> Self {
        Self::Elevation(e)
    }
}

impl From<StringTableError> for ServiceError {
    fn from(e: StringTableError) -> Self {
        Self::Strings(e)
    }
}
