//! Payment provider webhook events.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};

/// Generic webhook event; `data.object` is interpreted per event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// Event types this service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `checkout.session.completed`
    CheckoutCompleted,
    /// `invoice.payment_succeeded`
    InvoicePaymentSucceeded,
    /// `customer.subscription.deleted`
    SubscriptionDeleted,
    Other(String),
}

impl WebhookEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            "checkout.session.completed" => EventKind::CheckoutCompleted,
            "invoice.payment_succeeded" => EventKind::InvoicePaymentSucceeded,
            "customer.subscription.deleted" => EventKind::SubscriptionDeleted,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Returns the `id` of the event's object, if present.
    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }

    /// Returns a string field of the event's object, if present.
    #[must_use]
    pub fn object_str(&self, field: &str) -> Option<&str> {
        self.data.object.get(field).and_then(|v| v.as_str())
    }
}

// ============ checkout.session.completed ============

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    metadata: Option<CheckoutMetadata>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CheckoutMetadata {
    #[serde(default)]
    product: Option<String>,
    #[serde(default)]
    plan: Option<String>,
    #[serde(default)]
    seats: Option<serde_json::Value>,
}

/// Issuance inputs carried by a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCompletion {
    pub email: String,
    pub product: String,
    pub plan: String,
    pub seats: u32,
}

impl CheckoutCompletion {
    /// Extracts issuance inputs from a `checkout.session.completed` event.
    ///
    /// The email comes from `customer_details.email`, falling back to
    /// `customer_email`. `metadata.seats` is a decimal string (or number); absent,
    /// unparsable or zero values count as one seat.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClaims` for other event types or when the email,
    /// product or plan is missing.
    pub fn from_event(event: &WebhookEvent) -> LicenseResult<Self> {
        if event.kind() != EventKind::CheckoutCompleted {
            return Err(LicenseError::InvalidClaims(format!(
                "not a checkout completion: {}",
                event.event_type
            )));
        }

        let session: CheckoutSession = serde_json::from_value(event.data.object.clone())
            .map_err(|e| LicenseError::InvalidClaims(format!("invalid checkout session: {e}")))?;

        let email = session
            .customer_details
            .and_then(|d| d.email)
            .or(session.customer_email)
            .filter(|e| !e.is_empty());
        let metadata = session.metadata.unwrap_or_default();
        let product = metadata.product.filter(|p| !p.is_empty());
        let plan = metadata.plan.filter(|p| !p.is_empty());

        let (Some(email), Some(product), Some(plan)) = (email, product, plan) else {
            return Err(LicenseError::InvalidClaims("missing metadata".to_string()));
        };

        let seats = metadata
            .seats
            .as_ref()
            .and_then(parse_seats)
            .filter(|&n| n > 0)
            .unwrap_or(1);

        Ok(Self {
            email,
            product,
            plan,
            seats,
        })
    }
}

fn parse_seats(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn event(event_type: &str, object: serde_json::Value) -> WebhookEvent {
        WebhookEvent {
            id: Some("evt_1".to_string()),
            event_type: event_type.to_string(),
            created: None,
            data: EventData { object },
        }
    }

    #[test]
    fn kinds() {
        assert_eq!(
            event("checkout.session.completed", json!({})).kind(),
            EventKind::CheckoutCompleted
        );
        assert_eq!(
            event("invoice.payment_succeeded", json!({})).kind(),
            EventKind::InvoicePaymentSucceeded
        );
        assert_eq!(
            event("customer.subscription.deleted", json!({})).kind(),
            EventKind::SubscriptionDeleted
        );
        assert_eq!(
            event("charge.refunded", json!({})).kind(),
            EventKind::Other("charge.refunded".to_string())
        );
    }

    #[test]
    fn checkout_prefers_customer_details_email() {
        let e = event(
            "checkout.session.completed",
            json!({
                "customer_details": { "email": "details@example.com" },
                "customer_email": "fallback@example.com",
                "metadata": { "product": "depguard", "plan": "team", "seats": "10" }
            }),
        );
        let completion = CheckoutCompletion::from_event(&e).unwrap();
        assert_eq!(
            completion,
            CheckoutCompletion {
                email: "details@example.com".to_string(),
                product: "depguard".to_string(),
                plan: "team".to_string(),
                seats: 10,
            }
        );
    }

    #[test]
    fn checkout_falls_back_to_customer_email() {
        let e = event(
            "checkout.session.completed",
            json!({
                "customer_details": null,
                "customer_email": "fallback@example.com",
                "metadata": { "product": "docsync", "plan": "pro" }
            }),
        );
        let completion = CheckoutCompletion::from_event(&e).unwrap();
        assert_eq!(completion.email, "fallback@example.com");
        assert_eq!(completion.seats, 1);
    }

    #[test]
    fn checkout_bad_seats_default_to_one() {
        for seats in ["abc", "0", "-3", ""] {
            let e = event(
                "checkout.session.completed",
                json!({
                    "customer_email": "a@b.com",
                    "metadata": { "product": "docsync", "plan": "pro", "seats": seats }
                }),
            );
            assert_eq!(CheckoutCompletion::from_event(&e).unwrap().seats, 1, "seats={seats:?}");
        }
    }

    #[test]
    fn checkout_numeric_seats() {
        let e = event(
            "checkout.session.completed",
            json!({
                "customer_email": "a@b.com",
                "metadata": { "product": "docsync", "plan": "team", "seats": 4 }
            }),
        );
        assert_eq!(CheckoutCompletion::from_event(&e).unwrap().seats, 4);
    }

    #[test]
    fn checkout_missing_metadata() {
        let e = event(
            "checkout.session.completed",
            json!({ "customer_email": "a@b.com", "metadata": { "product": "docsync" } }),
        );
        assert!(matches!(
            CheckoutCompletion::from_event(&e),
            Err(LicenseError::InvalidClaims(_))
        ));

        let e = event(
            "checkout.session.completed",
            json!({ "metadata": { "product": "docsync", "plan": "pro" } }),
        );
        assert!(CheckoutCompletion::from_event(&e).is_err());

        let e = event(
            "checkout.session.completed",
            json!({ "customer_email": "a@b.com", "metadata": null }),
        );
        assert!(CheckoutCompletion::from_event(&e).is_err());
    }

    #[test]
    fn checkout_wrong_event_type() {
        let e = event("invoice.payment_succeeded", json!({ "subscription": "sub_1" }));
        assert!(CheckoutCompletion::from_event(&e).is_err());
    }

    #[test]
    fn object_accessors() {
        let e = event(
            "customer.subscription.deleted",
            json!({ "id": "sub_123", "subscription": "sub_9" }),
        );
        assert_eq!(e.object_id(), Some("sub_123"));
        assert_eq!(e.object_str("subscription"), Some("sub_9"));
        assert_eq!(e.object_str("missing"), None);
    }
}
