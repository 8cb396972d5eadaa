//! Shared Key request signing.
//!
//! The canonical string is the verb, twelve line breaks covering the unused
//! standard header slots, the `x-ms-*` headers in name order, the canonical
//! resource and finally one `name:value` line per query parameter in
//! ascending name order. The server rebuilds the same string, so any
//! deviation in order or spacing is rejected as an authentication failure.

use crate::config::AccountCredentials;
use crate::listing::error::ListingResult;
use crate::listing::types::ListingRequest;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

const VERB: &str = "GET";

/// Per-request header values produced by signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub request_id: String,
    pub date: String,
    pub authorization: String,
}

/// Signs requests for exactly one account
#[derive(Clone)]
pub struct RequestSigner {
    account_name: String,
    key: Vec<u8>,
}

impl RequestSigner {
    pub fn new(credentials: &AccountCredentials) -> ListingResult<Self> {
        Ok(Self {
            account_name: credentials.account_name.clone(),
            key: credentials.decoded_key()?,
        })
    }

    pub fn string_to_sign(
        request_id: &str,
        date: &str,
        api_version: &str,
        canonical_resource: &str,
        query: &BTreeMap<String, String>,
    ) -> String {
        let mut out = String::with_capacity(160 + canonical_resource.len());
        out.push_str(VERB);
        out.push_str(&"\n".repeat(12));
        out.push_str(&format!("x-ms-client-request-id:{}\n", request_id));
        out.push_str(&format!("x-ms-date:{}\n", date));
        out.push_str(&format!("x-ms-version:{}\n", api_version));
        out.push_str(canonical_resource);

        // BTreeMap iterates in ascending key order
        for (name, value) in query {
            out.push('\n');
            out.push_str(name);
            out.push(':');
            out.push_str(value);
        }

        out
    }

    /// `SharedKey <account>:<base64 HMAC-SHA256>`
    pub fn authorization(&self, string_to_sign: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(string_to_sign.as_bytes());
        let digest = STANDARD.encode(mac.finalize().into_bytes());

        format!("SharedKey {}:{}", self.account_name, digest)
    }

    /// Sign with an explicit request id and timestamp
    pub fn sign_with(
        &self,
        request: &ListingRequest,
        api_version: &str,
        request_id: &str,
        timestamp: DateTime<Utc>,
    ) -> SignedHeaders {
        let date = format_http_date(timestamp);
        let string_to_sign = Self::string_to_sign(
            request_id,
            &date,
            api_version,
            &request.canonical_resource,
            &request.query,
        );

        SignedHeaders {
            request_id: request_id.to_string(),
            authorization: self.authorization(&string_to_sign),
            date,
        }
    }

    /// Sign with a fresh random request id and the current time
    pub fn sign(&self, request: &ListingRequest, api_version: &str) -> SignedHeaders {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.sign_with(request, api_version, &request_id, Utc::now())
    }
}

/// RFC 1123 date in GMT. chrono's names are English regardless of locale.
pub fn format_http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
