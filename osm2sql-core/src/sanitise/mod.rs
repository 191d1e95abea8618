//! Normalisation of free-text values before they reach a sink.
//!
//! Tag keys, tag values and relation-member roles are arbitrary user input.
//! Delimited output performs no escaping, so every string passes through a
//! [`Sanitiser`] first. The walker is generic over the sanitiser, which keeps
//! the normalisation policy injectable: [`DefaultSanitiser`] for bulk-load
//! output, [`IdentitySanitiser`] to keep raw values, or any closure.

use thiserror::Error;

/// Maps an arbitrary text value to the form stored by a sink.
///
/// Implementations must be deterministic and total.
pub trait Sanitiser {
    /// Return the normalised form of `raw`.
    fn sanitise(&self, raw: &str) -> String;
}

impl<F> Sanitiser for F
where
    F: Fn(&str) -> String,
{
    fn sanitise(&self, raw: &str) -> String {
        self(raw)
    }
}

/// Leaves values untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentitySanitiser;

impl Sanitiser for IdentitySanitiser {
    fn sanitise(&self, raw: &str) -> String {
        raw.to_owned()
    }
}

/// Default field delimiter of the delimited output.
pub const DEFAULT_DELIMITER: char = ';';
/// Separator that bulk loaders commonly treat as a delimiter as well.
pub const DEFAULT_ALTERNATE: char = ',';
/// Character written in place of either separator.
pub const DEFAULT_SUBSTITUTE: char = ':';

/// Delimiter-safe, lower-cased normalisation.
///
/// The delimiter and the alternate separator become the substitute, every
/// line break becomes a single space (or the substitute when a space is one
/// of the separators), quote characters are removed, and the result is
/// lower-cased and trimmed.
///
/// # Examples
/// ```
/// use osm2sql_core::{DefaultSanitiser, Sanitiser};
///
/// let sanitiser = DefaultSanitiser::default();
/// assert_eq!(sanitiser.sanitise("Café, \"Central\""), "café: central");
/// assert_eq!(sanitiser.sanitise(" A;B\r\nC "), "a:b  c");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultSanitiser {
    delimiter: char,
    alternate: char,
    substitute: char,
    line_break: char,
}

impl Default for DefaultSanitiser {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            alternate: DEFAULT_ALTERNATE,
            substitute: DEFAULT_SUBSTITUTE,
            line_break: ' ',
        }
    }
}

impl DefaultSanitiser {
    /// Build a sanitiser with explicit separator characters.
    ///
    /// The substitute must survive a second pass unchanged, otherwise the
    /// sanitiser would not be idempotent.
    pub fn new(
        delimiter: char,
        alternate: char,
        substitute: char,
    ) -> Result<Self, SanitiserConfigError> {
        for (role, ch) in [("delimiter", delimiter), ("alternate separator", alternate)] {
            if is_line_break(ch) || is_quote(ch) {
                return Err(SanitiserConfigError::ReservedSeparator { role, found: ch });
            }
        }
        if substitute == delimiter
            || substitute == alternate
            || is_line_break(substitute)
            || is_quote(substitute)
            || substitute.is_whitespace()
            || !lowercase_stable(substitute)
        {
            return Err(SanitiserConfigError::UnstableSubstitute { found: substitute });
        }
        let line_break = if delimiter == ' ' || alternate == ' ' {
            substitute
        } else {
            ' '
        };
        Ok(Self {
            delimiter,
            alternate,
            substitute,
            line_break,
        })
    }

    /// Default configuration with a custom field delimiter.
    pub fn with_delimiter(delimiter: char) -> Result<Self, SanitiserConfigError> {
        Self::new(delimiter, DEFAULT_ALTERNATE, DEFAULT_SUBSTITUTE)
    }

    /// Field delimiter removed by this sanitiser.
    #[must_use]
    pub const fn delimiter(&self) -> char {
        self.delimiter
    }
}

impl Sanitiser for DefaultSanitiser {
    fn sanitise(&self, raw: &str) -> String {
        // Lower-case first so a cased delimiter cannot reappear afterwards.
        let lowered = raw.to_lowercase();
        let mut cleaned = String::with_capacity(lowered.len());
        for ch in lowered.chars() {
            if ch == self.delimiter || ch == self.alternate {
                cleaned.push(self.substitute);
            } else if is_line_break(ch) {
                cleaned.push(self.line_break);
            } else if !is_quote(ch) {
                cleaned.push(ch);
            }
        }
        let trimmed = cleaned.trim();
        if trimmed.len() == cleaned.len() {
            cleaned
        } else {
            trimmed.to_owned()
        }
    }
}

/// Errors raised when configuring a [`DefaultSanitiser`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitiserConfigError {
    /// A separator collides with a character the sanitiser already rewrites.
    #[error("{role} {found:?} cannot be a quote or line-break character")]
    ReservedSeparator {
        /// Which separator was rejected.
        role: &'static str,
        /// The rejected character.
        found: char,
    },
    /// The substitute would be rewritten again by a second pass.
    #[error("substitute {found:?} must differ from both separators and be a lower-case, non-space, non-quote character")]
    UnstableSubstitute {
        /// The rejected character.
        found: char,
    },
}

const fn is_quote(ch: char) -> bool {
    matches!(ch, '\'' | '"')
}

const fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\r' | '\n' | '\u{0b}' | '\u{0c}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn lowercase_stable(ch: char) -> bool {
    let mut lowered = ch.to_lowercase();
    lowered.next() == Some(ch) && lowered.next().is_none()
}
