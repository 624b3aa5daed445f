use hmac::{Hmac, Mac};
use sha1::Sha1;
use totp_keeper::CodeGenerator;

use crate::error::Error;

type HmacSha1 = Hmac<Sha1>;

const TOTP_TYPE: &str = "totp";
const URI_SECRET_QUERY: &str = "secret";

/// Decodes an RFC 4648 base32 secret. Case, spaces and `=` padding are ignored, the way
/// authenticator apps print secrets.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, Error> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    Ok(data_encoding::BASE32_NOPAD.decode(normalized.as_bytes())?)
}

/// Extracts and decodes the secret of an `otpauth://totp/...?secret=...` URI.
pub fn secret_from_uri(uri: &str) -> Result<Vec<u8>, Error> {
    let parsed = url::Url::parse(uri)?;
    if parsed.scheme() != "otpauth" || parsed.host_str() != Some(TOTP_TYPE) {
        return Err(Error::NotTotpUri(uri.to_string()));
    }

    let secret = parsed
        .query_pairs()
        .find(|(key, _)| *key == URI_SECRET_QUERY)
        .map(|(_, value)| value.into_owned())
        .ok_or(Error::MissingSecret)?;
    decode_secret(&secret)
}

/// RFC 6238 code with HMAC-SHA1 for `unix_time`.
pub fn totp(secret: &[u8], unix_time: u64, digits: u8, period: u32) -> Result<String, Error> {
    let counter = unix_time / period as u64;

    let mut mac = HmacSha1::new_from_slice(secret).map_err(|_| Error::InvalidKey)?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // the last nibble selects the four bytes that make up the code
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let code = u32::from_be_bytes([
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]) & 0x7fff_ffff;

    let code = code as u64 % 10u64.pow(digits as u32);
    Ok(format!("{code:0width$}", width = digits as usize))
}

/// [`CodeGenerator`] running HMAC-SHA1 on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HmacSha1Generator;

impl CodeGenerator for HmacSha1Generator {
    type Error = Error;

    fn generate(
        &mut self,
        secret_base32: &str,
        unix_time: u64,
        digits: u8,
        period: u32,
    ) -> Result<String, Self::Error> {
        let secret = decode_secret(secret_base32)?;
        totp(&secret, unix_time, digits, period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hotp_counters() {
        // RFC 4226 appendix D
        let secret = b"12345678901234567890";
        let expected = ["755224", "287082", "359152", "969429", "338314"];
        for (counter, code) in expected.iter().enumerate() {
            assert_eq!(totp(secret, counter as u64 * 30, 6, 30).unwrap(), *code);
        }
    }

    #[test]
    fn decode_ignores_case_and_padding() {
        assert_eq!(decode_secret("gezdgnbv").unwrap(), b"12345");
        assert_eq!(decode_secret("GEZD GNBV").unwrap(), b"12345");
        assert_eq!(decode_secret("GEZDGNA=").unwrap(), b"1234");
        assert!(decode_secret("GEZDGNB1").is_err());
    }
}
