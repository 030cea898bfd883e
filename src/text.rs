//! Literal text utilities: quoted-string un-escaping and numeric conversion.
//!
//! Single- and double-quoted forms share one un-escaping routine; they only
//! differ in which quote character must be escaped. Escapes are a typed
//! failure, never a panic, and flow into the syntax-error channel.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Failure while un-escaping a quoted literal or identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    /// An escape other than the recognized two-character forms or `\uXXXX`
    UnknownEscape { position: usize, found: char },
    /// `\u` not followed by exactly four hexadecimal digits
    InvalidHex { position: usize },
    /// A lone high or low UTF-16 surrogate with no valid partner
    UnpairedSurrogate { position: usize },
    /// Backslash at the end of the input
    UnexpectedEnd,
}

impl std::fmt::Display for EscapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscapeError::UnknownEscape { position, found } => {
                write!(f, "unknown escape sequence '\\{}' at offset {}", found, position)
            }
            EscapeError::InvalidHex { position } => {
                write!(f, "\\u escape requires 4 hex digits at offset {}", position)
            }
            EscapeError::UnpairedSurrogate { position } => {
                write!(f, "unpaired UTF-16 surrogate at offset {}", position)
            }
            EscapeError::UnexpectedEnd => write!(f, "dangling backslash at end of literal"),
        }
    }
}

impl std::error::Error for EscapeError {}

/// Un-escape the content of a quoted literal (the quotes already stripped).
///
/// Recognized escapes are `\\`, the form's own `quote` character, `/`, `b`,
/// `f`, `n`, `r`, `t`, and `\uXXXX`. Two consecutive `\uXXXX` escapes that
/// form a high/low surrogate pair are combined into one scalar value; an
/// unpaired surrogate is rejected rather than emitted.
pub fn unescape(raw: &str, quote: char) -> Result<String, EscapeError> {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }
        let Some(&esc) = chars.get(i + 1) else {
            return Err(EscapeError::UnexpectedEnd);
        };
        match esc {
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let unit = hex4(&chars, i + 2).ok_or(EscapeError::InvalidHex { position: i })?;
                if (0xD800..0xDC00).contains(&unit) {
                    // High surrogate: the low half must follow immediately.
                    if chars.get(i + 6) == Some(&'\\') && chars.get(i + 7) == Some(&'u') {
                        let low =
                            hex4(&chars, i + 8).ok_or(EscapeError::InvalidHex { position: i + 6 })?;
                        if (0xDC00..0xE000).contains(&low) {
                            let scalar =
                                0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                            let c = char::from_u32(scalar)
                                .ok_or(EscapeError::UnpairedSurrogate { position: i })?;
                            out.push(c);
                            i += 12;
                            continue;
                        }
                    }
                    return Err(EscapeError::UnpairedSurrogate { position: i });
                }
                if (0xDC00..0xE000).contains(&unit) {
                    return Err(EscapeError::UnpairedSurrogate { position: i });
                }
                let c = char::from_u32(unit)
                    .ok_or(EscapeError::InvalidHex { position: i })?;
                out.push(c);
                i += 6;
                continue;
            }
            c if c == quote => out.push(quote),
            other => {
                return Err(EscapeError::UnknownEscape {
                    position: i,
                    found: other,
                });
            }
        }
        i += 2;
    }

    Ok(out)
}

fn hex4(chars: &[char], at: usize) -> Option<u32> {
    let mut unit = 0u32;
    for k in 0..4 {
        let digit = chars.get(at + k)?.to_digit(16)?;
        unit = (unit << 4) | digit;
    }
    Some(unit)
}

/// Convert numeric literal text to a decimal token.
///
/// The grammar admits a permissive tail after the digits, so conversion must
/// fail closed: malformed text yields `None`, never a default value.
pub fn parse_number(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

#[test]
fn test_simple_escapes() {
    assert_eq!(unescape(r"a\\b", '"').unwrap(), "a\\b");
    assert_eq!(unescape(r"a\/b", '"').unwrap(), "a/b");
    assert_eq!(unescape(r"\b\f\n\r\t", '"').unwrap(), "\u{8}\u{c}\n\r\t");
    assert_eq!(unescape(r#"say \"hi\""#, '"').unwrap(), "say \"hi\"");
    assert_eq!(unescape(r"it\'s", '\'').unwrap(), "it's");
}

#[test]
fn test_quote_escape_is_form_specific() {
    // `\'` inside a double-quoted literal is not a recognized escape
    assert!(matches!(
        unescape(r"it\'s", '"'),
        Err(EscapeError::UnknownEscape { found: '\'', .. })
    ));
}

#[test]
fn test_surrogate_pair_combines() {
    assert_eq!(unescape(r"\uD834\uDD1E", '"').unwrap(), "\u{1D11E}");
}

#[test]
fn test_unpaired_surrogate_rejected() {
    assert!(matches!(
        unescape(r"\uD834", '"'),
        Err(EscapeError::UnpairedSurrogate { .. })
    ));
    assert!(matches!(
        unescape(r"\uDD1E", '"'),
        Err(EscapeError::UnpairedSurrogate { .. })
    ));
}

#[test]
fn test_bmp_unicode_escape() {
    assert_eq!(unescape(r"\u00e9", '"').unwrap(), "\u{e9}");
    assert!(matches!(
        unescape(r"\u12", '"'),
        Err(EscapeError::InvalidHex { .. })
    ));
}

#[test]
fn test_number_conversion_fails_closed() {
    assert_eq!(parse_number("42"), Some(Decimal::from(42)));
    assert_eq!(parse_number("-1.5"), Some(Decimal::new(-15, 1)));
    assert_eq!(parse_number("1e2"), Some(Decimal::from(100)));
    assert_eq!(parse_number("1.2.3"), None);
    assert_eq!(parse_number("12abc"), None);
}
