use chrono::{DateTime, Utc};
use parkly_core::payment::{CardError, CardForm, CardRegistration, PaymentGateway, PaymentMethod};
use parkly_core::ApiError;
use parkly_shared::Masked;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// What the payment SDK hands back after tokenizing a card.
#[derive(Debug, Clone)]
pub struct TokenizedCard {
    pub payment_method_id: Masked<String>,
    pub brand: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error(transparent)]
    Invalid(#[from] CardError),

    #[error("Failed to add card: {0}")]
    Registration(#[from] ApiError),

    #[error("Card not found: {0}")]
    NotFound(String),
}

/// Saved payment methods for this device, most recently added last.
pub struct CardWallet {
    gateway: Arc<dyn PaymentGateway>,
    cards: RwLock<Vec<PaymentMethod>>,
}

impl CardWallet {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            gateway,
            cards: RwLock::new(Vec::new()),
        }
    }

    /// Validate the form, register the token with the provider, then remember
    /// the card. Nothing is stored if either step fails.
    pub async fn add_card(
        &self,
        form: &CardForm,
        tokenized: TokenizedCard,
        now: DateTime<Utc>,
    ) -> Result<PaymentMethod, WalletError> {
        let card = form.validate(now)?;

        self.gateway
            .register_card(&CardRegistration {
                payment_method_id: tokenized.payment_method_id.clone(),
                email: card.email.clone(),
            })
            .await
            .map_err(|e| {
                warn!("Card registration failed for ****{}: {}", card.last4, e);
                WalletError::Registration(e)
            })?;

        let method = PaymentMethod {
            id: Uuid::new_v4().to_string(),
            token: tokenized.payment_method_id,
            brand: tokenized.brand,
            last4: card.last4,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
        };
        info!("Saved card {}", method.label());
        self.cards.write().await.push(method.clone());
        Ok(method)
    }

    /// Keep a card that was registered with the provider earlier.
    pub async fn remember(&self, method: PaymentMethod) {
        self.cards.write().await.push(method);
    }

    pub async fn cards(&self) -> Vec<PaymentMethod> {
        self.cards.read().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Result<PaymentMethod, WalletError> {
        self.cards
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| WalletError::NotFound(id.to_string()))
    }

    pub async fn remove(&self, id: &str) -> Result<(), WalletError> {
        let mut cards = self.cards.write().await;
        let before = cards.len();
        cards.retain(|c| c.id != id);
        if cards.len() == before {
            return Err(WalletError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
