//! Typed access to the attributes of an opened element.

use std::{
    borrow::Cow,
    num::{ParseFloatError, ParseIntError},
};

use osm2sql_core::{ElementId, MemberType, UnknownMemberType};
use quick_xml::events::BytesStart;
use thiserror::Error;

/// Why a required attribute could not be read.
#[derive(Debug, Error)]
pub enum AttributeError {
    /// The attribute is absent.
    #[error("attribute is missing")]
    Missing,
    /// The attribute list or the escaped value is malformed.
    #[error("attribute is malformed")]
    Malformed(#[source] quick_xml::Error),
    /// The value is not a 64-bit integer.
    #[error("{value:?} is not an integer identifier")]
    Integer {
        value: String,
        #[source]
        source: ParseIntError,
    },
    /// The value is not a floating point number.
    #[error("{value:?} is not a number")]
    Float {
        value: String,
        #[source]
        source: ParseFloatError,
    },
    /// The value is not a known member type.
    #[error(transparent)]
    MemberType(#[from] UnknownMemberType),
}

/// Unescaped text of a required attribute.
pub(super) fn text<'a>(
    element: &'a BytesStart<'_>,
    name: &str,
) -> Result<Cow<'a, str>, AttributeError> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|err| AttributeError::Malformed(err.into()))?;
        if attribute.key.as_ref() == name.as_bytes() {
            return attribute.unescape_value().map_err(AttributeError::Malformed);
        }
    }
    Err(AttributeError::Missing)
}

/// Required identifier attribute.
pub(super) fn identifier(
    element: &BytesStart<'_>,
    name: &str,
) -> Result<ElementId, AttributeError> {
    let raw = text(element, name)?;
    raw.trim()
        .parse()
        .map_err(|source| AttributeError::Integer {
            value: raw.clone().into_owned(),
            source,
        })
}

/// Required floating point attribute.
pub(super) fn number(element: &BytesStart<'_>, name: &str) -> Result<f64, AttributeError> {
    let raw = text(element, name)?;
    raw.trim()
        .parse()
        .map_err(|source| AttributeError::Float {
            value: raw.clone().into_owned(),
            source,
        })
}

/// Required member type attribute.
pub(super) fn member_type(
    element: &BytesStart<'_>,
    name: &str,
) -> Result<MemberType, AttributeError> {
    Ok(text(element, name)?.parse()?)
}
