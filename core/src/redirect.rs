//! Signed redirect URLs.
//!
//! When a payment finishes, the customer is sent back to the merchant's
//! return URL with the outcome in the query string. If response hashing is
//! enabled for the merchant, two more parameters are appended: `signature`,
//! the hex HMAC-SHA512 of the other parameters, and `signature_algorithm`.
//!
//! The signed message is every other query pair, decoded, sorted by key then
//! value, rendered as `key=value` and joined with `&`.

use std::borrow::Cow;

use ring::hmac;
use url::Url;

use crate::error::SignatureError;
use crate::status::PaymentStatus;

pub const SIGNATURE_ALGORITHM: &str = "HMAC-SHA512";

const SIGNATURE_PARAM: &str = "signature";
const ALGORITHM_PARAM: &str = "signature_algorithm";

/// The outcome parameters carried by a redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectParams {
    pub status: PaymentStatus,
    pub payment_intent_client_secret: String,
    /// Absent when the merchant is redirected with an HTTP POST.
    pub amount: Option<i64>,
    pub manual_retry_allowed: bool,
    pub signature: Option<String>,
    pub signature_algorithm: Option<String>,
}

impl RedirectParams {
    pub fn from_url(redirect_url: &str) -> Result<Self, SignatureError> {
        let url = parse(redirect_url)?;

        let mut status = None;
        let mut client_secret = None;
        let mut amount = None;
        let mut manual_retry_allowed = false;
        let mut signature = None;
        let mut signature_algorithm = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "status" => {
                    status = Some(value.parse::<PaymentStatus>().map_err(|_| {
                        SignatureError::InvalidRedirect(format!("unknown status {value}"))
                    })?)
                }
                "payment_intent_client_secret" => client_secret = Some(value.into_owned()),
                "amount" => {
                    amount = Some(value.parse::<i64>().map_err(|_| {
                        SignatureError::InvalidRedirect(format!("amount is not an integer: {value}"))
                    })?)
                }
                "manual_retry_allowed" => {
                    manual_retry_allowed = value.parse::<bool>().map_err(|_| {
                        SignatureError::InvalidRedirect(format!(
                            "manual_retry_allowed is not a boolean: {value}"
                        ))
                    })?
                }
                SIGNATURE_PARAM => signature = Some(value.into_owned()),
                ALGORITHM_PARAM => signature_algorithm = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(Self {
            status: status
                .ok_or_else(|| SignatureError::InvalidRedirect("missing status".to_string()))?,
            payment_intent_client_secret: client_secret.ok_or_else(|| {
                SignatureError::InvalidRedirect("missing payment_intent_client_secret".to_string())
            })?,
            amount,
            manual_retry_allowed,
            signature,
            signature_algorithm,
        })
    }

    /// Append the outcome parameters to `return_url`, unsigned.
    pub fn to_url(&self, return_url: &str) -> Result<String, SignatureError> {
        let mut url = parse(return_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("status", self.status.into())
                .append_pair(
                    "payment_intent_client_secret",
                    &self.payment_intent_client_secret,
                );
            if let Some(amount) = self.amount {
                pairs.append_pair("amount", &amount.to_string());
            }
            pairs.append_pair(
                "manual_retry_allowed",
                if self.manual_retry_allowed { "true" } else { "false" },
            );
        }
        Ok(url.to_string())
    }
}

/// Sign every query parameter of `redirect_url` with `key` and append
/// `signature` and `signature_algorithm`.
pub fn sign_redirect_url(redirect_url: &str, key: &str) -> Result<String, SignatureError> {
    let mut url = parse(redirect_url)?;
    let mut params: Vec<(Cow<'_, str>, Cow<'_, str>)> = url
        .query_pairs()
        .map(|(k, v)| (Cow::Owned(k.into_owned()), Cow::Owned(v.into_owned())))
        .collect();
    let signature = hmac_sha512_sorted_query_params(&mut params, key);
    url.query_pairs_mut()
        .append_pair(SIGNATURE_PARAM, &signature)
        .append_pair(ALGORITHM_PARAM, SIGNATURE_ALGORITHM);
    Ok(url.to_string())
}

/// Check the `signature` carried by `redirect_url` against `key`.
///
/// Returns `Ok(false)` for a well-formed URL whose signature does not match.
pub fn verify_redirect_signature(redirect_url: &str, key: &str) -> Result<bool, SignatureError> {
    let url = parse(redirect_url)?;

    let mut signature = None;
    let mut algorithm = None;
    let mut params = Vec::new();
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            SIGNATURE_PARAM => signature = Some(v),
            ALGORITHM_PARAM => algorithm = Some(v),
            _ => params.push((k, v)),
        }
    }

    let signature = signature.ok_or(SignatureError::MissingSignature)?;
    if let Some(algorithm) = algorithm {
        if !algorithm.eq_ignore_ascii_case(SIGNATURE_ALGORITHM) {
            return Err(SignatureError::UnsupportedAlgorithm(algorithm.into_owned()));
        }
    }
    let expected = hex::decode(signature.as_bytes()).map_err(|e| SignatureError::Crypto(e.to_string()))?;

    let message = sorted_message(&mut params);
    let key = hmac::Key::new(hmac::HMAC_SHA512, key.as_bytes());
    Ok(hmac::verify(&key, message.as_bytes(), &expected).is_ok())
}

/// Hex HMAC-SHA512 of the sorted `key=value` pairs.
pub fn hmac_sha512_sorted_query_params(params: &mut [(Cow<'_, str>, Cow<'_, str>)], key: &str) -> String {
    let message = sorted_message(params);
    let key = hmac::Key::new(hmac::HMAC_SHA512, key.as_bytes());
    hex::encode(hmac::sign(&key, message.as_bytes()).as_ref())
}

fn sorted_message(params: &mut [(Cow<'_, str>, Cow<'_, str>)]) -> String {
    params.sort();
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn parse(redirect_url: &str) -> Result<Url, SignatureError> {
    Url::parse(redirect_url).map_err(|e| SignatureError::InvalidRedirect(e.to_string()))
}
