//! HMAC-SHA256 request signing.
//!
//! Signed endpoints take the url-encoded parameter string, append
//! `timestamp` (and optionally `recvWindow`), and send
//! `signature = hex(HMAC_SHA256(secret, params))` alongside.

use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{ExchangeError, ExchangeResult};

type HmacSha256 = Hmac<Sha256>;

/// API key pair.
///
/// Security notes:
/// - The secret is zeroized on drop.
/// - `Debug` never prints the secret.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: Zeroizing<String>,
}

impl Credentials {
    /// # Errors
    /// Returns `ExchangeError::Credentials` if either part is empty.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> ExchangeResult<Self> {
        let api_key = api_key.into();
        let api_secret = Zeroizing::new(api_secret.into());

        if api_key.trim().is_empty() {
            return Err(ExchangeError::Credentials("API key is empty".to_string()));
        }
        if api_secret.trim().is_empty() {
            return Err(ExchangeError::Credentials("API secret is empty".to_string()));
        }

        Ok(Self {
            api_key,
            api_secret,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Signs parameter strings with the account secret.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: Credentials,
    recv_window_ms: Option<u64>,
}

impl RequestSigner {
    pub fn new(credentials: Credentials, recv_window_ms: Option<u64>) -> Self {
        Self {
            credentials,
            recv_window_ms,
        }
    }

    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    /// Hex HMAC-SHA256 of `payload`.
    pub fn signature(&self, payload: &str) -> String {
        // HMAC accepts keys of any length, so this cannot fail.
        let mut mac = HmacSha256::new_from_slice(self.credentials.api_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Append `params` and the timing fields to `url`'s query, then the
    /// signature over that encoded query.
    ///
    /// The signature covers exactly the percent-encoded bytes that are sent.
    pub fn sign_url(&self, url: &mut Url, params: &[(&str, String)], timestamp_ms: i64) {
        {
            let mut pairs = url.query_pairs_mut();
            pairs.extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
            if let Some(window) = self.recv_window_ms {
                pairs.append_pair("recvWindow", &window.to_string());
            }
            pairs.append_pair("timestamp", &timestamp_ms.to_string());
        }

        let signature = self.signature(url.query().unwrap_or_default());
        url.query_pairs_mut().append_pair("signature", &signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs_signer() -> RequestSigner {
        // Key pair from the exchange's public signing example.
        let credentials = Credentials::new(
            "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zvsw0MuIgwCIPy6utIco14y7Ju91duEh8A",
            "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j",
        )
        .unwrap();
        RequestSigner::new(credentials, None)
    }

    #[test]
    fn test_signature_matches_documented_example() {
        let signer = docs_signer();
        let payload = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";

        assert_eq!(
            signer.signature(payload),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    fn order_url() -> Url {
        Url::parse("https://api.example.com/api/v3/order").unwrap()
    }

    #[test]
    fn test_signed_query_layout() {
        let credentials = Credentials::new("key", "secret").unwrap();
        let signer = RequestSigner::new(credentials, Some(5000));
        let params = vec![("symbol", "ABCUSDT".to_string()), ("orderId", "42".to_string())];

        let mut url = order_url();
        signer.sign_url(&mut url, &params, 1_700_000_000_000);
        let query = url.query().unwrap();
        let (unsigned, signature) = query.rsplit_once("&signature=").unwrap();

        assert_eq!(
            unsigned,
            "symbol=ABCUSDT&orderId=42&recvWindow=5000&timestamp=1700000000000"
        );
        assert_eq!(signature, signer.signature(unsigned));
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_signed_query_escapes_values() {
        let signer = docs_signer();
        let params = vec![("symbol", "ABC&side=BUY".to_string())];

        let mut url = order_url();
        signer.sign_url(&mut url, &params, 1_700_000_000_000);
        let query = url.query().unwrap();
        let (unsigned, signature) = query.rsplit_once("&signature=").unwrap();

        assert_eq!(unsigned, "symbol=ABC%26side%3DBUY&timestamp=1700000000000");
        assert_eq!(signature, signer.signature(unsigned));

        let symbols: Vec<_> = url
            .query_pairs()
            .filter(|(k, _)| k == "symbol")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(symbols, vec!["ABC&side=BUY".to_string()]);
    }

    #[test]
    fn test_empty_credentials_rejected() {
        assert!(Credentials::new("", "secret").is_err());
        assert!(Credentials::new("key", "  ").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = Credentials::new("key", "super-secret").unwrap();
        let printed = format!("{credentials:?}");
        assert!(!printed.contains("super-secret"));
    }
}
