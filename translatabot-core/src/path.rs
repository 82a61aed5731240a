//! Flat paths: the address of one string leaf inside a localization document.
//!
//! String form: the first object key bare, later keys as `.key`, array
//! indices as `[n]`, as in `menu.items[2].label`. The characters `\`, `.`,
//! `[` and `]` inside keys are escaped with a backslash, so a key can never
//! be confused with a nested key or an index (`"a.b"` renders as `a\.b`).

use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// One step of a [`FlatPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Address of a string leaf. Always starts with an object key because a
/// localization document root is an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlatPath(Vec<Segment>);

impl FlatPath {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Path of a top-level key.
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![Segment::Key(key.into())])
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Parse the string form; shorthand for `str::parse`.
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        s.parse()
    }
}

impl fmt::Display for FlatPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    for c in key.chars() {
                        if matches!(c, '\\' | '.' | '[' | ']') {
                            f.write_str("\\")?;
                        }
                        write!(f, "{c}")?;
                    }
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FlatPath {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CodecError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut chars = s.chars().peekable();
        let mut expect_key = true;

        loop {
            if expect_key {
                let mut key = String::new();
                while let Some(&c) = chars.peek() {
                    match c {
                        '.' | '[' => break,
                        ']' => return Err(invalid("unescaped ']' in key")),
                        '\\' => {
                            chars.next();
                            match chars.next() {
                                Some(escaped) => key.push(escaped),
                                None => return Err(invalid("dangling escape")),
                            }
                        }
                        _ => {
                            key.push(c);
                            chars.next();
                        }
                    }
                }
                segments.push(Segment::Key(key));
                expect_key = false;
            }

            match chars.next() {
                None => break,
                Some('.') => expect_key = true,
                Some('[') => {
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) if c.is_ascii_digit() => digits.push(c),
                            Some(_) => return Err(invalid("non-digit inside index")),
                            None => return Err(invalid("unterminated index")),
                        }
                    }
                    if digits.is_empty() {
                        return Err(invalid("empty index"));
                    }
                    if digits.len() > 1 && digits.starts_with('0') {
                        return Err(invalid("index with leading zero"));
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| invalid("index out of range"))?;
                    segments.push(Segment::Index(index));
                }
                Some(_) => return Err(invalid("expected '.' or '[' after segment")),
            }
        }

        Ok(Self(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> Segment {
        Segment::Key(k.to_string())
    }

    #[test]
    fn renders_keys_and_indices() {
        let path = FlatPath::new(vec![key("menu"), key("items"), Segment::Index(2), key("label")]);
        assert_eq!(path.to_string(), "menu.items[2].label");
    }

    #[test]
    fn parses_what_it_renders() {
        let path = FlatPath::new(vec![key("a"), Segment::Index(0), Segment::Index(10), key("b")]);
        assert_eq!(FlatPath::parse(&path.to_string()).unwrap(), path);
    }

    #[test]
    fn dotted_key_does_not_collide_with_nested_key() {
        let dotted = FlatPath::key("a.b");
        let nested = FlatPath::new(vec![key("a"), key("b")]);
        assert_ne!(dotted.to_string(), nested.to_string());
        assert_eq!(dotted.to_string(), "a\\.b");
        assert_eq!(FlatPath::parse("a\\.b").unwrap(), dotted);
    }

    #[test]
    fn bracketed_key_does_not_collide_with_index() {
        let bracketed = FlatPath::key("a[0]");
        let indexed = FlatPath::new(vec![key("a"), Segment::Index(0)]);
        assert_ne!(bracketed.to_string(), indexed.to_string());
        assert_eq!(FlatPath::parse(&bracketed.to_string()).unwrap(), bracketed);
    }

    #[test]
    fn empty_keys_are_representable() {
        let path = FlatPath::new(vec![key(""), key("x"), key("")]);
        assert_eq!(path.to_string(), ".x.");
        assert_eq!(FlatPath::parse(".x.").unwrap(), path);
    }

    #[test]
    fn rejects_malformed_indices() {
        for bad in ["a[", "a[]", "a[x]", "a[01]", "a]b", "a[0]b", "a\\"] {
            assert!(FlatPath::parse(bad).is_err(), "{bad} should be rejected");
        }
    }
}
