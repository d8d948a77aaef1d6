//! Fixed-layout binary header parsing.
//!
//! A [`HeaderLayout`] is a named, ordered list of fields at fixed byte offsets.
//! Fields may carry a required literal (magic markers such as `"RIFF"`, or
//! format codes that must hold a specific value); [`HeaderLayout::validate`]
//! checks all of them before anything else is read.

use std::fmt;

use tracing::debug;

use crate::error::{FormatError, Result};

/// How the bytes of a field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Unsigned little-endian integer (up to 8 bytes).
    IntLe,
    /// UTF-8 text.
    Text,
    /// Bytes kept as-is.
    Raw,
}

/// A value a field must decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Int(u64),
    Text(&'static str),
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(u64),
    Text(String),
    Raw(Vec<u8>),
}

impl FieldValue {
    fn matches(&self, literal: &Literal) -> bool {
        match (self, literal) {
            (FieldValue::Int(v), Literal::Int(want)) => v == want,
            (FieldValue::Text(v), Literal::Text(want)) => v == want,
            (FieldValue::Raw(v), Literal::Text(want)) => v == want.as_bytes(),
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "{v:?}"),
            FieldValue::Raw(v) => write!(f, "{v:02x?}"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// One header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub length: usize,
    pub kind: FieldKind,
    pub required: Option<Literal>,
}

impl FieldSpec {
    pub const fn int(name: &'static str, offset: usize, length: usize) -> Self {
        Self {
            name,
            offset,
            length,
            kind: FieldKind::IntLe,
            required: None,
        }
    }

    pub const fn text(name: &'static str, offset: usize, length: usize) -> Self {
        Self {
            name,
            offset,
            length,
            kind: FieldKind::Text,
            required: None,
        }
    }

    pub const fn raw(name: &'static str, offset: usize, length: usize) -> Self {
        Self {
            name,
            offset,
            length,
            kind: FieldKind::Raw,
            required: None,
        }
    }

    /// Require this field to decode to `literal`.
    pub const fn require(mut self, literal: Literal) -> Self {
        self.required = Some(literal);
        self
    }

    fn bytes<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        let end = self.offset + self.length;
        data.get(self.offset..end).ok_or_else(|| {
            FormatError::Truncated {
                field: self.name,
                offset: self.offset,
                end,
                len: data.len(),
            }
            .into()
        })
    }

    /// Decode this field out of `data`.
    pub fn decode(&self, data: &[u8]) -> Result<FieldValue> {
        let bytes = self.bytes(data)?;
        let value = match self.kind {
            FieldKind::IntLe => {
                let mut raw = [0u8; 8];
                let width = bytes.len().min(raw.len());
                raw[..width].copy_from_slice(&bytes[..width]);
                FieldValue::Int(u64::from_le_bytes(raw))
            }
            FieldKind::Text => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| FormatError::InvalidText(self.name))?;
                FieldValue::Text(text.to_owned())
            }
            FieldKind::Raw => FieldValue::Raw(bytes.to_vec()),
        };
        Ok(value)
    }
}

/// An ordered set of header fields.
#[derive(Debug, Clone, Copy)]
pub struct HeaderLayout {
    fields: &'static [FieldSpec],
}

impl HeaderLayout {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn spec(&self, name: &str) -> Result<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FormatError::UnknownField(name.to_owned()).into())
    }

    /// Fields that carry a required literal, in layout order.
    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.required.is_some())
    }

    /// Check every required field; the first mismatch is the error.
    pub fn validate(&self, data: &[u8]) -> Result<()> {
        for spec in self.required_fields() {
            debug!(field = spec.name, "validating header entry");
            let Some(literal) = spec.required else {
                continue;
            };

            let value = spec.decode(data)?;
            if !value.matches(&literal) {
                return Err(FormatError::FieldMismatch {
                    field: spec.name,
                    expected: literal.to_string(),
                    actual: value.to_string(),
                }
                .into());
            }
        }

        debug!("header validated");
        Ok(())
    }

    pub fn value(&self, name: &str, data: &[u8]) -> Result<FieldValue> {
        self.spec(name)?.decode(data)
    }

    /// Read an integer field.
    pub fn int(&self, name: &str, data: &[u8]) -> Result<u64> {
        let spec = self.spec(name)?;
        match spec.decode(data)? {
            FieldValue::Int(v) => Ok(v),
            _ => Err(FormatError::NotAnInteger(spec.name).into()),
        }
    }

    /// Byte just past the last field.
    pub fn len(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.offset + f.length)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const LAYOUT: HeaderLayout = HeaderLayout::new(&[
        FieldSpec::text("magic", 0, 4).require(Literal::Text("TEST")),
        FieldSpec::int("version", 4, 2).require(Literal::Int(3)),
        FieldSpec::int("count", 6, 4),
        FieldSpec::raw("tag", 10, 2),
    ]);

    fn header() -> Vec<u8> {
        let mut data = b"TEST".to_vec();
        data.extend_from_slice(&3u16.to_le_bytes());
        data.extend_from_slice(&70_000u32.to_le_bytes());
        data.extend_from_slice(&[0xAB, 0xCD]);
        data
    }

    #[test]
    fn decodes_fields() {
        let data = header();
        assert_eq!(LAYOUT.int("count", &data).unwrap(), 70_000);
        assert_eq!(
            LAYOUT.value("magic", &data).unwrap(),
            FieldValue::Text("TEST".into())
        );
        assert_eq!(
            LAYOUT.value("tag", &data).unwrap(),
            FieldValue::Raw(vec![0xAB, 0xCD])
        );
        assert_eq!(LAYOUT.len(), 12);
    }

    #[test]
    fn valid_header_passes() {
        assert!(LAYOUT.validate(&header()).is_ok());
    }

    #[test]
    fn mismatched_literal_names_the_field() {
        let mut data = header();
        data[0] = b'X';
        let err = LAYOUT.validate(&data).unwrap_err();
        match err {
            Error::Format(FormatError::FieldMismatch { field, .. }) => assert_eq!(field, "magic"),
            other => panic!("unexpected error: {other}"),
        }

        let mut data = header();
        data[4] = 2;
        assert!(matches!(
            LAYOUT.validate(&data),
            Err(Error::Format(FormatError::FieldMismatch { field: "version", .. }))
        ));
    }

    #[test]
    fn short_buffer_is_truncated() {
        let data = header();
        assert!(matches!(
            LAYOUT.validate(&data[..5]),
            Err(Error::Format(FormatError::Truncated { field: "version", .. }))
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut data = header();
        data[1] = 0xFF;
        assert!(matches!(
            LAYOUT.validate(&data),
            Err(Error::Format(FormatError::InvalidText("magic")))
        ));
    }

    #[test]
    fn unknown_and_non_integer_fields() {
        let data = header();
        assert!(matches!(
            LAYOUT.int("missing", &data),
            Err(Error::Format(FormatError::UnknownField(_)))
        ));
        assert!(matches!(
            LAYOUT.int("magic", &data),
            Err(Error::Format(FormatError::NotAnInteger("magic")))
        ));
    }
}
