//! The request body for creating and replacing budgets.

use serde::Deserialize;

use crate::{
    Error,
    budget::core::{AlertSettings, BudgetPeriod, BudgetStatus, NewBudget},
    dates::parse_iso_date,
    transaction::Category,
    validation::{Validator, normalize_currency_code},
};

#[derive(Debug, Default, Deserialize)]
pub struct AlertSettingsForm {
    pub enabled: Option<bool>,
    pub threshold: Option<f64>,
}

/// A budget as sent by the client.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetForm {
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub alerts: Option<AlertSettingsForm>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl BudgetForm {
    /// Check the form and convert it to a [NewBudget].
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every invalid field.
    pub fn validate(self) -> Result<NewBudget, Error> {
        let mut validator = Validator::new();

        let category: Option<Category> =
            validator.require_one_of("category", self.category, Category::NAMES);

        let amount = validator.require("amount", self.amount);
        if let Some(amount) = amount {
            validator.check(
                amount.is_finite() && amount >= 0.0,
                "amount",
                "amount must be a non-negative number",
            );
        }

        let period: Option<BudgetPeriod> =
            validator.require_one_of("period", self.period, BudgetPeriod::NAMES);

        let start_date = validator
            .require_text("startDate", self.start_date)
            .and_then(|text| parse_date_field(&mut validator, "startDate", &text));

        let end_date = match self.end_date.as_deref().map(str::trim) {
            None | Some("") => Some(None),
            Some(text) => parse_date_field(&mut validator, "endDate", text).map(Some),
        };

        if let (Some(start_date), Some(Some(end_date))) = (start_date, end_date) {
            validator.check(
                start_date <= end_date,
                "endDate",
                "endDate must not be before startDate",
            );
        }

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

        let alerts_form = self.alerts.unwrap_or_default();
        let defaults = AlertSettings::default();
        let alerts = AlertSettings {
            enabled: alerts_form.enabled.unwrap_or(defaults.enabled),
            threshold: alerts_form.threshold.unwrap_or(defaults.threshold),
        };
        validator.check(
            (0.0..=100.0).contains(&alerts.threshold),
            "alerts.threshold",
            "alerts.threshold must be between 0 and 100",
        );

        let status = validator.one_of_or(
            "status",
            self.status,
            BudgetStatus::NAMES,
            BudgetStatus::Active,
        );

        validator.finish()?;

        match (category, amount, period, start_date, end_date, currency, status) {
            (
                Some(category),
                Some(amount),
                Some(period),
                Some(start_date),
                Some(end_date),
                Some(currency),
                Some(status),
            ) => Ok(NewBudget {
                category,
                amount,
                period,
                start_date,
                end_date,
                description: non_blank(self.description),
                currency,
                alerts,
                status,
                notes: non_blank(self.notes),
            }),
            _ => Err(Error::MalformedRequest(
                "budget fields failed validation".to_owned(),
            )),
        }
    }
}

fn parse_date_field(validator: &mut Validator, field: &str, text: &str) -> Option<time::Date> {
    match parse_iso_date(text.trim()) {
        Ok(date) => Some(date),
        Err(_) => {
            validator.push(
                field,
                &format!("{field} must be an ISO 8601 date, e.g. 2025-01-31"),
            );
            None
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
