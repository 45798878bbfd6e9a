//! Per-call configuration threaded through every pack/unpack.

use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::{errors::Error, value::Value};

/// Text encoding used by `string` and `cstring` at the byte boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8. Any valid UTF-8 byte sequence is accepted.
    #[default]
    Utf8,
    /// ASCII. Every byte must be in 0..=0x7F.
    Ascii,
}

impl Encoding {
    pub fn encode(self, text: &str) -> Result<Vec<u8>, Error> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => {
                if !text.is_ascii() {
                    return Err(Error::InvalidEncoding(self));
                }
                Ok(text.as_bytes().to_vec())
            }
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, Error> {
        if self == Encoding::Ascii && !bytes.is_ascii() {
            return Err(Error::InvalidEncoding(self));
        }

        String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidEncoding(self))
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => f.write_str("utf-8"),
            Encoding::Ascii => f.write_str("ascii"),
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            other => Err(Error::invalid("encoding", format!("unsupported `{other}`"))),
        }
    }
}

/// Options for one pack/unpack call.
///
/// The registry keeps a process-wide default copy; see
/// [`Registry::set_default_options`](crate::registry::Registry::set_default_options).
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Byte order of multi-byte numbers. Defaults to little-endian.
    pub little_endian: bool,
    /// Text encoding for strings.
    pub encoding: Encoding,
    /// Free-form flags read by extension schemas.
    pub flags: BTreeMap<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            little_endian: true,
            encoding: Encoding::Utf8,
            flags: BTreeMap::new(),
        }
    }
}

impl Options {
    pub fn little_endian() -> Self {
        Self::default()
    }

    pub fn big_endian() -> Self {
        Self {
            little_endian: false,
            ..Default::default()
        }
    }

    pub fn set_little_endian(&mut self, little_endian: bool) -> &mut Self {
        self.little_endian = little_endian;
        self
    }

    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.flags.insert(name.into(), value.into());
        self
    }

    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.flags.get(name)
    }

    /// Applies caller overrides on top of these options. Fields left unset in
    /// `overrides` keep their current value; flags are merged key by key.
    pub fn merged(&self, overrides: &OptionsDef) -> Result<Options, Error> {
        let mut options = self.clone();
        if let Some(little_endian) = overrides.little_endian {
            options.little_endian = little_endian;
        }
        if let Some(encoding) = &overrides.encoding {
            options.encoding = encoding.parse()?;
        }
        for (name, value) in &overrides.flags {
            options.flags.insert(name.clone(), value.clone());
        }

        Ok(options)
    }
}

/// Partial options as supplied by a caller or a config file.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default, rename_all = "camelCase")
)]
pub struct OptionsDef {
    /// Overrides [`Options::little_endian`] when set.
    pub little_endian: Option<bool>,
    /// Encoding name such as `"utf-8"` or `"ascii"`.
    pub encoding: Option<String>,
    /// Extra extension flags.
    pub flags: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.little_endian);
        assert_eq!(options.encoding, Encoding::Utf8);
        assert!(options.flags.is_empty());
    }

    #[test]
    fn test_merged_keeps_unset_fields() {
        let base = Options::big_endian();
        let merged = base
            .merged(&OptionsDef {
                encoding: Some("ASCII".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(!merged.little_endian);
        assert_eq!(merged.encoding, Encoding::Ascii);
    }

    #[test]
    fn test_merged_rejects_unknown_encoding() {
        let err = Options::default()
            .merged(&OptionsDef {
                encoding: Some("ebcdic".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_ascii_round() {
        assert_eq!(Encoding::Ascii.encode("abc").unwrap(), b"abc".to_vec());
        assert_eq!(
            Encoding::Ascii.encode("héllo").unwrap_err(),
            Error::InvalidEncoding(Encoding::Ascii)
        );
        assert_eq!(
            Encoding::Ascii.decode(&[0x61, 0xff]).unwrap_err(),
            Error::InvalidEncoding(Encoding::Ascii)
        );
        assert_eq!(Encoding::Utf8.decode("你好".as_bytes()).unwrap(), "你好");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_options_def_from_json() {
        let def: OptionsDef =
            serde_json::from_str(r#"{ "littleEndian": false, "flags": { "browser": 1 } }"#)
                .unwrap();
        let options = Options::default().merged(&def).unwrap();
        assert!(!options.little_endian);
        assert_eq!(options.flag("browser"), Some(&Value::Int(1)));
    }
}
