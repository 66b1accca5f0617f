use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use parkly_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// A saved card as the client remembers it: display summary plus the
/// provider token used to charge it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Local identifier, only meaningful on this device.
    pub id: String,
    pub token: Masked<String>,
    pub brand: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: i32,
}

impl PaymentMethod {
    pub fn label(&self) -> String {
        format!("{} •••• {} ({:02}/{})", self.brand, self.last4, self.exp_month, self.exp_year)
    }
}

/// One charge against a saved payment method. `amount_minor` is in cents.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub payment_method_id: Masked<String>,
    pub amount_minor: i64,
    pub customer_id: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRegistration {
    pub payment_method_id: Masked<String>,
    pub email: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge a saved payment method
    async fn charge(&self, request: &ChargeRequest) -> Result<PaymentReceipt, ApiError>;

    /// Attach a tokenized card to the customer on the provider side
    async fn register_card(&self, registration: &CardRegistration) -> Result<(), ApiError>;
}

/// Raw "add card" form input.
#[derive(Debug, Clone)]
pub struct CardForm {
    pub email: String,
    pub name_on_card: String,
    pub card_number: Masked<String>,
    pub exp_month: String,
    pub exp_year: String,
    pub cvc: Masked<String>,
}

/// A card form that passed every local check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCard {
    pub email: String,
    pub name_on_card: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: i32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CardError {
    #[error("Enter a valid email.")]
    InvalidEmail,
    #[error("Enter name on card.")]
    MissingName,
    #[error("Invalid card number.")]
    InvalidNumber,
    #[error("Invalid expiration month.")]
    InvalidMonth,
    #[error("Invalid expiration year.")]
    InvalidYear,
    #[error("Invalid CVC.")]
    InvalidCvc,
    #[error("Expiration date cannot be in the past.")]
    Expired,
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

impl CardForm {
    /// Run the same checks the add-card sheet performs, in the same order.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidatedCard, CardError> {
        let email = self.email.trim();
        if !is_valid_email(&email.to_lowercase()) {
            return Err(CardError::InvalidEmail);
        }
        if self.name_on_card.trim().is_empty() {
            return Err(CardError::MissingName);
        }

        let number = self.card_number.expose();
        if !is_numeric(number) || number.len() < 13 || number.len() > 19 {
            return Err(CardError::InvalidNumber);
        }

        if !is_numeric(&self.exp_month) {
            return Err(CardError::InvalidMonth);
        }
        let month: u32 = self.exp_month.parse().map_err(|_| CardError::InvalidMonth)?;
        if !(1..=12).contains(&month) {
            return Err(CardError::InvalidMonth);
        }

        if !is_numeric(&self.exp_year) || self.exp_year.len() != 4 {
            return Err(CardError::InvalidYear);
        }
        let year: i32 = self.exp_year.parse().map_err(|_| CardError::InvalidYear)?;

        let cvc = self.cvc.expose();
        if !is_numeric(cvc) || (cvc.len() != 3 && cvc.len() != 4) {
            return Err(CardError::InvalidCvc);
        }

        if year < now.year() || (year == now.year() && month < now.month()) {
            return Err(CardError::Expired);
        }

        Ok(ValidatedCard {
            email: email.to_string(),
            name_on_card: self.name_on_card.trim().to_string(),
            last4: number[number.len() - 4..].to_string(),
            exp_month: month,
            exp_year: year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn form() -> CardForm {
        CardForm {
            email: "driver@example.com".to_string(),
            name_on_card: "Sam Driver".to_string(),
            card_number: Masked::new("4242424242424242".to_string()),
            exp_month: "08".to_string(),
            exp_year: "2030".to_string(),
            cvc: Masked::new("123".to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_card_yields_last4() {
        let card = form().validate(now()).unwrap();
        assert_eq!(card.last4, "4242");
        assert_eq!(card.exp_month, 8);
        assert_eq!(card.exp_year, 2030);
    }

    #[test]
    fn test_rejections_in_order() {
        let mut f = form();
        f.email = "not-an-email".into();
        assert_eq!(f.validate(now()).unwrap_err(), CardError::InvalidEmail);

        let mut f = form();
        f.card_number = Masked::new("4242".into());
        assert_eq!(f.validate(now()).unwrap_err(), CardError::InvalidNumber);

        let mut f = form();
        f.exp_month = "13".into();
        assert_eq!(f.validate(now()).unwrap_err(), CardError::InvalidMonth);

        let mut f = form();
        f.exp_year = "30".into();
        assert_eq!(f.validate(now()).unwrap_err(), CardError::InvalidYear);

        let mut f = form();
        f.cvc = Masked::new("12".into());
        assert_eq!(f.validate(now()).unwrap_err(), CardError::InvalidCvc);
    }

    #[test]
    fn test_expired_card() {
        let mut f = form();
        f.exp_year = "2026".into();
        f.exp_month = "09".into();
        assert_eq!(f.validate(now()).unwrap_err(), CardError::Expired);

        // current month is still valid
        f.exp_month = "10".into();
        assert!(f.validate(now()).is_ok());
    }
}
