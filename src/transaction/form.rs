//! The request body for creating and replacing transactions.

use reqwest::Url;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    dates::parse_iso_date,
    transaction::core::{
        Category, NewTransaction, PaymentMethod, TransactionStatus, TransactionType,
    },
    validation::{Validator, normalize_currency_code},
};

/// A transaction as sent by the client.
///
/// Every field is optional so that missing fields are reported together
/// instead of failing on the first one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    pub amount: Option<f64>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
    pub location: Option<String>,
    pub receipt: Option<String>,
}

impl TransactionForm {
    /// Check the form and convert it to a [NewTransaction].
    ///
    /// `today` is used when the client did not send a date.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every invalid field.
    pub fn validate(self, today: Date) -> Result<NewTransaction, Error> {
        let mut validator = Validator::new();

        let amount = validator.require("amount", self.amount);
        if let Some(amount) = amount {
            validator.check(
                amount.is_finite() && amount >= 0.0,
                "amount",
                "amount must be a non-negative number",
            );
        }

        let transaction_type: Option<TransactionType> =
            validator.require_one_of("type", self.transaction_type, TransactionType::NAMES);
        let category: Option<Category> =
            validator.require_one_of("category", self.category, Category::NAMES);
        let description = validator.require_text("description", self.description);

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => Some(today),
            Some(text) => match parse_iso_date(text) {
                Ok(date) => Some(date),
                Err(_) => {
                    validator.push("date", "date must be an ISO 8601 date, e.g. 2025-01-31");
                    None
                }
            },
        };

        let currency = match self.currency {
            None => Some("USD".to_owned()),
            Some(code) => {
                let code = normalize_currency_code(&code);
                validator.check(
                    code.is_some(),
                    "currency",
                    "currency must be a three letter currency code",
                );
                code
            }
        };

        let payment_method: Option<PaymentMethod> =
            validator.require_one_of("paymentMethod", self.payment_method, PaymentMethod::NAMES);
        let status = validator.one_of_or(
            "status",
            self.status,
            TransactionStatus::NAMES,
            TransactionStatus::Completed,
        );

        let tags = self
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|tag| tag.trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect();
        let location = optional_text(self.location);
        let receipt = optional_text(self.receipt);
        if let Some(receipt) = &receipt {
            validator.check(
                is_web_url(receipt),
                "receipt",
                "receipt must be an http or https URL",
            );
        }

        validator.finish()?;

        match (
            amount,
            transaction_type,
            category,
            description,
            date,
            currency,
            payment_method,
            status,
        ) {
            (
                Some(amount),
                Some(transaction_type),
                Some(category),
                Some(description),
                Some(date),
                Some(currency),
                Some(payment_method),
                Some(status),
            ) => Ok(NewTransaction {
                amount,
                transaction_type,
                category,
                description,
                date,
                currency,
                payment_method,
                status,
                external_id: None,
                tags,
                location,
                receipt,
            }),
            _ => Err(Error::MalformedRequest(
                "transaction fields failed validation".to_owned(),
            )),
        }
    }
}

/// Trim `text`, treating blank strings as missing.
fn optional_text(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn is_web_url(text: &str) -> bool {
    Url::parse(text).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
