use alloc::string::String;
use core::fmt;

use crate::error::Error;
use crate::raw::{LABEL_SIZE, SECRET_SIZE};

/// An 8-byte, null-padded UTF-8 account label.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Label([u8; LABEL_SIZE]);

impl Label {
    /// Creates a null-padded label. Fails with [`Error::LabelTooLong`] for more than 8 bytes.
    ///
    /// Usage: `Label::new("mail")`
    pub fn new(s: &str) -> Result<Self, Error> {
        let bytes = s.as_bytes();
        if bytes.len() > LABEL_SIZE {
            return Err(Error::LabelTooLong);
        }
        let mut dst = [0u8; LABEL_SIZE];
        dst[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(dst))
    }

    /// Decodes the stored bytes, trimming the trailing null padding.
    pub(crate) fn from_raw(raw: [u8; LABEL_SIZE]) -> Result<Self, Error> {
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        core::str::from_utf8(&raw[..end]).map_err(|_| Error::LabelMalformed)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        let end = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        // checked on construction
        core::str::from_utf8(&self.0[..end]).unwrap_or("")
    }

    pub const fn as_bytes(&self) -> &[u8; LABEL_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label(b\"")?;
        for &byte in &self.0 {
            // escape_default would escape 0 as \x00, but \0 is more readable
            if byte == 0 {
                write!(f, "\\0")?;
                continue;
            }
            write!(f, "{}", core::ascii::escape_default(byte))?;
        }
        write!(f, "\")")
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw shared secret, zero-padded to 32 bytes.
///
/// Trailing zero bytes cannot be told apart from padding. HMAC pads short keys with zeros to
/// the block size anyway, so the generated codes are identical.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Secret([u8; SECRET_SIZE]);

impl Secret {
    pub fn new(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() > SECRET_SIZE {
            return Err(Error::SecretTooLong);
        }
        let mut dst = [0u8; SECRET_SIZE];
        dst[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(dst))
    }

    pub(crate) const fn from_raw(raw: [u8; SECRET_SIZE]) -> Self {
        Self(raw)
    }

    pub const fn as_bytes(&self) -> &[u8; SECRET_SIZE] {
        &self.0
    }

    /// RFC 4648 base32 without padding, the form the code generator expects.
    pub fn to_base32(&self) -> String {
        data_encoding::BASE32_NOPAD.encode(&self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// Read-only snapshot of an occupied slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountRecord {
    pub slot: u8,
    pub label: Label,
    pub secret: Secret,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn label_is_null_padded() {
        let label = Label::new("mail").unwrap();
        assert_eq!(label.as_bytes(), b"mail\0\0\0\0");
        assert_eq!(label.as_str(), "mail");
        assert_eq!(format!("{label:?}"), "Label(b\"mail\\0\\0\\0\\0\")");
    }

    #[test]
    fn label_counts_utf8_bytes() {
        // four two-byte characters
        assert!(Label::new("éééé").is_ok());
        assert_eq!(Label::new("ééééé"), Err(Error::LabelTooLong));
        assert_eq!(Label::new("123456789"), Err(Error::LabelTooLong));
    }

    #[test]
    fn malformed_label_is_rejected() {
        assert_eq!(
            Label::from_raw([0xC3, 0x28, 0, 0, 0, 0, 0, 0]),
            Err(Error::LabelMalformed)
        );
    }

    #[test]
    fn secret_is_padded_and_redacted() {
        let secret = Secret::new(b"12345678901234567890").unwrap();
        assert_eq!(&secret.as_bytes()[..20], b"12345678901234567890");
        assert!(secret.as_bytes()[20..].iter().all(|&b| b == 0));
        assert_eq!(format!("{secret:?}"), "Secret(..)");
        assert_eq!(Secret::new(&[1u8; 33]), Err(Error::SecretTooLong));
    }

    #[test]
    fn secret_base32_has_no_padding() {
        let secret = Secret::new(&[0xFF; 32]).unwrap();
        let encoded = secret.to_base32();
        assert_eq!(encoded.len(), 52);
        assert!(!encoded.contains('='));
    }
}
