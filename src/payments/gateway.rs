// Payment gateway seam.
//
// The provider is reached through a trait object so the service layer
// never depends on a concrete SDK. The sandbox implementation backs
// non-production deployments and the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a payment intent at the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    Processing,
    Succeeded,
    Canceled,
}

/// A payment intent as reported by the provider. Amounts are in minor
/// units (cents) per provider convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: IntentStatus,
}

/// Metadata attached to an intent so provider records link back to ours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentMetadata {
    pub booking_id: String,
    pub user_id: i32,
}

/// A completed provider refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub id: String,
    pub amount_minor: i64,
}

/// Errors surfaced by the payment provider.
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// The provider rejected the request (bad amount, unknown intent, ...).
    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    /// The provider could not be reached or answered garbage.
    #[error("Provider transport failure: {0}")]
    Transport(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> Result<PaymentIntent, GatewayError>;

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError>;

    async fn create_refund(
        &self,
        intent_id: &str,
        amount_minor: i64,
    ) -> Result<RefundReceipt, GatewayError>;
}

/// In-process gateway for sandbox deployments and tests.
///
/// Intents authorize instantly: every created intent reports `Succeeded`,
/// which lets the confirm and webhook flows run end to end without an
/// external provider.
#[derive(Default)]
pub struct SandboxGateway {
    intents: Mutex<HashMap<String, PaymentIntent>>,
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        _metadata: &IntentMetadata,
    ) -> Result<PaymentIntent, GatewayError> {
        if amount_minor <= 0 {
            return Err(GatewayError::Rejected(
                "Amount must be positive".to_string(),
            ));
        }

        let id = format!("pi_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            client_secret: format!("{}_secret_{}", id, Uuid::new_v4().simple()),
            id: id.clone(),
            amount_minor,
            currency: currency.to_lowercase(),
            status: IntentStatus::Succeeded,
        };

        self.intents
            .lock()
            .map_err(|_| GatewayError::Transport("sandbox store poisoned".to_string()))?
            .insert(id, intent.clone());

        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        self.intents
            .lock()
            .map_err(|_| GatewayError::Transport("sandbox store poisoned".to_string()))?
            .get(intent_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected(format!("No such intent: {}", intent_id)))
    }

    async fn create_refund(
        &self,
        intent_id: &str,
        amount_minor: i64,
    ) -> Result<RefundReceipt, GatewayError> {
        let intents = self
            .intents
            .lock()
            .map_err(|_| GatewayError::Transport("sandbox store poisoned".to_string()))?;
        let intent = intents
            .get(intent_id)
            .ok_or_else(|| GatewayError::Rejected(format!("No such intent: {}", intent_id)))?;

        if amount_minor <= 0 || amount_minor > intent.amount_minor {
            return Err(GatewayError::Rejected(format!(
                "Refund amount {} out of range for intent {}",
                amount_minor, intent_id
            )));
        }

        Ok(RefundReceipt {
            id: format!("re_{}", Uuid::new_v4().simple()),
            amount_minor,
        })
    }
}
