//! Stripe-specific types for webhook handling.
//!
//! These types represent Stripe API objects as they arrive in webhook payloads
//! and API responses. Only the fields Ziq reads are modelled; everything else
//! is ignored by serde.

use std::collections::HashMap;

use serde::Deserialize;

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureParseError {
    #[error("Missing Stripe-Signature header")]
    MissingHeader,
    #[error("Missing timestamp (t=) in signature")]
    MissingTimestamp,
    #[error("Missing v1 signature in header")]
    MissingV1Signature,
    #[error("Invalid timestamp format")]
    InvalidTimestamp,
    #[error("Invalid signature format (not valid hex)")]
    InvalidSignatureFormat,
}

/// Parsed Stripe-Signature header components.
///
/// The header format is `t=timestamp,v1=signature[,v1=signature...]`. Stripe
/// sends several `v1` entries while a signing secret is being rolled.
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp when Stripe signed the payload.
    pub timestamp: i64,

    /// HMAC-SHA256 signatures, hex-decoded.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.trim().is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    let sig = hex_decode(value.trim())
                        .ok_or(SignatureParseError::InvalidSignatureFormat)?;
                    v1_signatures.push(sig);
                }
                // v0 and unknown schemes are ignored
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureParseError::MissingTimestamp)?;
        if v1_signatures.is_empty() {
            return Err(SignatureParseError::MissingV1Signature);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

/// Encode bytes to a lowercase hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Event Envelope
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe webhook event as received.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeWebhookEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    /// The object affected by this event.
    pub object: serde_json::Value,
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Objects
// ════════════════════════════════════════════════════════════════════════════════

/// Checkout Session object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session identifier (cs_...).
    pub id: String,

    /// Hosted checkout page. Absent once the session is completed.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub customer: Option<String>,

    #[serde(default)]
    pub subscription: Option<String>,

    /// Set to the Ziq external user id at creation.
    #[serde(default)]
    pub client_reference_id: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripeCheckoutSession {
    /// The user the session was created for.
    pub fn user_id(&self) -> Option<String> {
        self.client_reference_id
            .clone()
            .or_else(|| self.metadata.get("user_id").cloned())
    }
}

/// Billing Portal session object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePortalSession {
    pub id: String,
    pub url: String,
}

/// Subscription object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    /// Subscription identifier (sub_...).
    pub id: String,

    pub customer: String,

    pub status: String,

    /// Top-level period end; newer API versions only set it per item.
    #[serde(default)]
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub cancel_at_period_end: bool,

    #[serde(default)]
    pub items: StripeList<StripeSubscriptionItem>,

    /// Copied from `subscription_data[metadata]` at checkout.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripeSubscription {
    /// Price of the first item.
    pub fn price_id(&self) -> Option<String> {
        self.items.data.first().map(|item| item.price.id.clone())
    }

    /// Period end from the subscription or, failing that, its first item.
    pub fn period_end(&self) -> Option<i64> {
        self.current_period_end
            .or_else(|| self.items.data.first().and_then(|i| i.current_period_end))
    }

    /// The user the subscription was bought for.
    pub fn user_id(&self) -> Option<String> {
        self.metadata.get("user_id").cloned()
    }
}

/// Generic Stripe list container.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Default for StripeList<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

/// Subscription item.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: StripePrice,

    #[serde(default)]
    pub current_period_end: Option<i64>,
}

/// Price object, embedded in items and invoice lines.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

/// Invoice object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    /// Invoice identifier (in_...).
    pub id: String,

    pub customer: String,

    #[serde(default)]
    pub subscription: Option<String>,

    #[serde(default)]
    pub amount_paid: i64,

    #[serde(default)]
    pub lines: StripeList<StripeInvoiceLine>,

    /// Snapshot of the subscription metadata (API versions before 2025).
    #[serde(default)]
    pub subscription_details: Option<StripeSubscriptionDetails>,

    /// Newer API versions nest the snapshot under `parent`.
    #[serde(default)]
    pub parent: Option<StripeInvoiceParent>,
}

impl StripeInvoice {
    /// Price of the first line that has one.
    pub fn price_id(&self) -> Option<String> {
        self.lines
            .data
            .iter()
            .find_map(|line| line.price.as_ref().map(|p| p.id.clone()))
    }

    /// `user_id` from the subscription metadata snapshot, if any.
    pub fn user_id(&self) -> Option<String> {
        self.subscription_details
            .as_ref()
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|p| p.subscription_details.as_ref())
            })
            .and_then(|d| d.metadata.get("user_id").cloned())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionDetails {
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<StripeSubscriptionDetails>,
}

/// Invoice line item.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoiceLine {
    #[serde(default)]
    pub price: Option<StripePrice>,
}

/// Error envelope of the Stripe REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Header Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn parse_signature_header_valid() {
        let header = SignatureHeader::parse("t=1704067200,v1=abcdef0123").unwrap();
        assert_eq!(header.timestamp, 1704067200);
        assert_eq!(header.v1_signatures, vec![vec![0xab, 0xcd, 0xef, 0x01, 0x23]]);
    }

    #[test]
    fn parse_signature_header_collects_every_v1() {
        let header = SignatureHeader::parse("t=1,v1=aa,v0=bb,v1=cc").unwrap();
        assert_eq!(header.v1_signatures, vec![vec![0xaa], vec![0xcc]]);
    }

    #[test]
    fn parse_signature_header_errors() {
        assert_eq!(
            SignatureHeader::parse("").unwrap_err(),
            SignatureParseError::MissingHeader
        );
        assert_eq!(
            SignatureHeader::parse("v1=aa").unwrap_err(),
            SignatureParseError::MissingTimestamp
        );
        assert_eq!(
            SignatureHeader::parse("t=1").unwrap_err(),
            SignatureParseError::MissingV1Signature
        );
        assert_eq!(
            SignatureHeader::parse("t=abc,v1=aa").unwrap_err(),
            SignatureParseError::InvalidTimestamp
        );
        assert_eq!(
            SignatureHeader::parse("t=1,v1=xyz1").unwrap_err(),
            SignatureParseError::InvalidSignatureFormat
        );
        assert_eq!(
            SignatureHeader::parse("t=1,v1=abc").unwrap_err(),
            SignatureParseError::InvalidSignatureFormat
        );
    }

    #[test]
    fn hex_encode_bytes() {
        assert_eq!(hex_encode(&[0x00, 0x0f, 0xff]), "000fff");
        assert_eq!(hex_encode(&[]), "");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Object Parsing Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn checkout_session_user_id_prefers_client_reference() {
        let session: StripeCheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_1",
            "customer": "cus_1",
            "subscription": "sub_1",
            "client_reference_id": "user_a",
            "metadata": {"user_id": "user_b", "tier_id": "pro"}
        }))
        .unwrap();
        assert_eq!(session.user_id().as_deref(), Some("user_a"));

        let session: StripeCheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_2",
            "metadata": {"user_id": "user_b"}
        }))
        .unwrap();
        assert_eq!(session.user_id().as_deref(), Some("user_b"));
    }

    #[test]
    fn subscription_reads_price_and_period_from_items() {
        let sub: StripeSubscription = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "items": {"object": "list", "data": [
                {"id": "si_1", "price": {"id": "price_pro"}, "current_period_end": 1800000000}
            ]}
        }))
        .unwrap();
        assert_eq!(sub.price_id().as_deref(), Some("price_pro"));
        assert_eq!(sub.period_end(), Some(1800000000));
        assert!(!sub.cancel_at_period_end);
    }

    #[test]
    fn subscription_top_level_period_wins() {
        let sub: StripeSubscription = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "current_period_end": 1700000000,
            "items": {"data": [{"price": {"id": "price_pro"}, "current_period_end": 1800000000}]}
        }))
        .unwrap();
        assert_eq!(sub.period_end(), Some(1700000000));
    }

    #[test]
    fn invoice_price_comes_from_lines() {
        let invoice: StripeInvoice = serde_json::from_value(serde_json::json!({
            "id": "in_1",
            "customer": "cus_1",
            "subscription": "sub_1",
            "amount_paid": 1999,
            "lines": {"data": [{"id": "il_0"}, {"id": "il_1", "price": {"id": "price_basic"}}]}
        }))
        .unwrap();
        assert_eq!(invoice.price_id().as_deref(), Some("price_basic"));
        assert_eq!(invoice.user_id(), None);
    }

    #[test]
    fn invoice_user_id_comes_from_subscription_snapshot() {
        let invoice: StripeInvoice = serde_json::from_value(serde_json::json!({
            "id": "in_1",
            "customer": "cus_1",
            "subscription_details": {"metadata": {"user_id": "user_a"}}
        }))
        .unwrap();
        assert_eq!(invoice.user_id().as_deref(), Some("user_a"));

        let invoice: StripeInvoice = serde_json::from_value(serde_json::json!({
            "id": "in_2",
            "customer": "cus_1",
            "parent": {"type": "subscription_details", "subscription_details": {
                "subscription": "sub_1",
                "metadata": {"user_id": "user_b"}
            }}
        }))
        .unwrap();
        assert_eq!(invoice.user_id().as_deref(), Some("user_b"));
    }

    #[test]
    fn subscription_user_id_comes_from_metadata() {
        let sub: StripeSubscription = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "incomplete",
            "metadata": {"user_id": "user_a"}
        }))
        .unwrap();
        assert_eq!(sub.user_id().as_deref(), Some("user_a"));
        assert_eq!(sub.period_end(), None);
    }

    #[test]
    fn parse_event_envelope() {
        let event: StripeWebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_1",
            "type": "invoice.paid",
            "created": 1704067200,
            "livemode": false,
            "data": {"object": {"id": "in_1"}}
        }))
        .unwrap();
        assert_eq!(event.event_type, "invoice.paid");
        assert_eq!(event.data.object["id"], "in_1");
    }
}
