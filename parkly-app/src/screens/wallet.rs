use chrono::{DateTime, Utc};
use parkly_core::payment::{CardForm, PaymentMethod};
use parkly_store::TokenizedCard;

use crate::error::{AppError, Notice};
use crate::state::AppState;

pub struct WalletScreen {
    state: AppState,
}

impl WalletScreen {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn cards(&self) -> Vec<PaymentMethod> {
        self.state.wallet.cards().await
    }

    pub async fn add_card(
        &self,
        form: &CardForm,
        tokenized: TokenizedCard,
        now: DateTime<Utc>,
    ) -> Result<Notice, AppError> {
        self.state.wallet.add_card(form, tokenized, now).await?;
        Ok(Notice::new("Success", "Card added!"))
    }
}
