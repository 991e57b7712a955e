//! HTTP API for license verification and payment webhooks.
//!
//! Thin glue over `license_api_core`: handlers read raw requests, call the
//! core with the wall clock, and map results to JSON responses.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use anyhow::{Result, ensure};
use license_api_core::{
    CheckoutCompletion, EventKind, LicenseError, LicenseIssuer, LicenseVerifier, SigningSecret,
    WebhookAuthenticator,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Header carrying the payment provider's signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Components shared by all handlers; secrets are fixed at construction.
#[derive(Debug, Clone)]
pub struct AppState {
    pub issuer: LicenseIssuer,
    pub verifier: LicenseVerifier,
    pub authenticator: WebhookAuthenticator,
}

impl AppState {
    /// Builds the handler state from the license and webhook secrets.
    ///
    /// Both secrets must be non-empty.
    pub fn from_secrets(
        license_secret: SigningSecret,
        webhook_secret: SigningSecret,
    ) -> Result<Self> {
        ensure!(!license_secret.is_empty(), "JWT_SECRET must not be empty");
        ensure!(
            !webhook_secret.is_empty(),
            "STRIPE_WEBHOOK_SECRET must not be empty"
        );

        Ok(Self {
            issuer: LicenseIssuer::new(license_secret.clone()),
            verifier: LicenseVerifier::new(license_secret),
            authenticator: WebhookAuthenticator::new(webhook_secret),
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct WebhookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    fn error(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn success() -> Self {
        Self {
            success: Some(true),
            ..Self::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Deserialize, Debug)]
pub struct VerifyParams {
    key: Option<String>,
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn rfc3339(secs: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339())
}

async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let authenticated = match state.authenticator.authenticate(&body, signature, now_secs()) {
        Ok(a) => a,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse::error("Invalid signature")),
            );
        }
    };
    let event = authenticated.event;

    match event.kind() {
        EventKind::CheckoutCompleted => {
            let checkout = match CheckoutCompletion::from_event(&event) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Checkout event {:?} rejected: {}", event.id, e);
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(WebhookResponse::error("Missing metadata")),
                    );
                }
            };

            let token = match state.issuer.issue(
                &checkout.email,
                &checkout.product,
                &checkout.plan,
                checkout.seats,
                now_secs(),
            ) {
                Ok(t) => t,
                Err(e) => {
                    warn!("License issuance failed for {}: {}", checkout.email, e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(WebhookResponse::error("License issuance failed")),
                    );
                }
            };
            // Delivered out of band; never echoed in the webhook response
            info!("License key for {}: {}", checkout.email, token);

            (
                StatusCode::OK,
                Json(WebhookResponse {
                    success: Some(true),
                    email: Some(checkout.email),
                    product: Some(checkout.product),
                    plan: Some(checkout.plan),
                    ..WebhookResponse::default()
                }),
            )
        }
        EventKind::InvoicePaymentSucceeded => {
            info!(
                "Subscription {} renewed",
                event.object_str("subscription").unwrap_or("unknown")
            );
            (StatusCode::OK, Json(WebhookResponse::success()))
        }
        EventKind::SubscriptionDeleted => {
            info!(
                "Subscription {} cancelled",
                event.object_id().unwrap_or("unknown")
            );
            (StatusCode::OK, Json(WebhookResponse::success()))
        }
        EventKind::Other(_) => (
            StatusCode::OK,
            Json(WebhookResponse {
                received: Some(true),
                ..WebhookResponse::default()
            }),
        ),
    }
}

async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> (StatusCode, Json<VerifyResponse>) {
    let Some(key) = params.key.filter(|k| !k.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(VerifyResponse {
                error: Some("Missing key parameter".to_string()),
                ..VerifyResponse::default()
            }),
        );
    };

    match state.verifier.verify(&key, now_secs()) {
        Ok(license) => (
            StatusCode::OK,
            Json(VerifyResponse {
                valid: true,
                product: Some(license.product().to_string()),
                tier: Some(license.tier().to_string()),
                seats: Some(license.seats()),
                email: Some(license.subject().to_string()),
                expires: rfc3339(license.expires_at_secs()),
                ..VerifyResponse::default()
            }),
        ),
        Err(LicenseError::Expired { expires_at }) => (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                error: Some("Key expired".to_string()),
                expired_at: rfc3339(expires_at),
                ..VerifyResponse::default()
            }),
        ),
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                error: Some("Invalid or expired key".to_string()),
                ..VerifyResponse::default()
            }),
        ),
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn not_found_handler() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/verify", get(verify_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .with_state(state)
}
