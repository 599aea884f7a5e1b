use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use serde::Deserialize;

use crate::{
    Error,
    auth::AuthUser,
    currency::{
        CurrencyState,
        client::PROVIDER,
        rate::{CurrencyRate, get_cached_rate, save_rate},
    },
    dates,
    validation::{Validator, normalize_currency_code},
};

#[derive(Debug, Deserialize)]
pub struct ExchangeRateQuery {
    base: Option<String>,
}

/// A route handler for getting the exchange rate from `base` (default USD) to the currency in the path.
///
/// Rates are served from the cache while they are younger than the configured
/// lifetime, otherwise they are fetched from the provider and cached.
pub async fn get_exchange_rate_endpoint(
    State(state): State<CurrencyState>,
    AuthUser(_): AuthUser,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<ExchangeRateQuery>, QueryRejection>,
) -> Result<Json<CurrencyRate>, Error> {
    let Path(code) = path?;
    let Query(query) = query?;

    let mut validator = Validator::new();
    let target = normalize_currency_code(&code);
    validator.check(
        target.is_some(),
        "code",
        "code must be a three letter currency code",
    );
    let base = normalize_currency_code(query.base.as_deref().unwrap_or("USD"));
    validator.check(
        base.is_some(),
        "base",
        "base must be a three letter currency code",
    );
    validator.finish()?;
    let (Some(base), Some(target)) = (base, target) else {
        return Err(Error::MalformedRequest(
            "currency codes failed validation".to_owned(),
        ));
    };

    let now = dates::now_utc();

    if base == target {
        return Ok(Json(CurrencyRate {
            base_currency: base,
            target_currency: target,
            exchange_rate: 1.0,
            last_updated: now,
        }));
    }

    {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        if let Some(rate) =
            get_cached_rate(&base, &target, state.exchange_rate_ttl, now, &connection)?
        {
            return Ok(Json(rate));
        }
    }

    let client = state
        .exchange_rate_client
        .as_ref()
        .ok_or(Error::ProviderNotConfigured(PROVIDER))?;

    let exchange_rate = client.live_rate(&base, &target).await?;
    tracing::debug!("Fetched {base}{target} exchange rate {exchange_rate}");

    let rate = CurrencyRate {
        base_currency: base,
        target_currency: target,
        exchange_rate,
        last_updated: now,
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    save_rate(&rate, &connection)?;

    Ok(Json(rate))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        ExchangeRateClient,
        currency::{
            client::test_provider::spawn_provider,
            rate::{CurrencyRate, save_rate},
        },
        dates,
        test_utils::{auth_token_for, create_test_user, get_test_server_with_state, get_test_state},
    };

    #[tokio::test]
    async fn fetches_and_caches_rate() {
        let provider_url = spawn_provider().await;
        let state = get_test_state().with_exchange_rate_client(ExchangeRateClient::with_base_url(
            "test-key",
            &provider_url,
        ));
        let user = create_test_user(&state, "alice@example.com");
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state.clone());

        let response = server
            .get("/api/currency/eur")
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let rate = response.json::<CurrencyRate>();
        assert_eq!(rate.base_currency, "USD");
        assert_eq!(rate.target_currency, "EUR");
        assert_eq!(rate.exchange_rate, 0.9);

        let count: i64 = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM currency_rate", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn fresh_cached_rate_skips_provider() {
        // No client is configured, so any provider call would fail.
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            save_rate(
                &CurrencyRate {
                    base_currency: "GBP".to_owned(),
                    target_currency: "NZD".to_owned(),
                    exchange_rate: 2.1,
                    last_updated: dates::now_utc(),
                },
                &connection,
            )
            .unwrap();
        }
        let user = create_test_user(&state, "alice@example.com");
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .get("/api/currency/NZD")
            .add_query_param("base", "gbp")
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<CurrencyRate>().exchange_rate, 2.1);
    }

    #[tokio::test]
    async fn provider_error_is_generic_server_error() {
        let provider_url = spawn_provider().await;
        let state = get_test_state().with_exchange_rate_client(ExchangeRateClient::with_base_url(
            "wrong-key",
            &provider_url,
        ));
        let user = create_test_user(&state, "alice@example.com");
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .get("/api/currency/EUR")
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({"message": "Currency API error"}));
    }

    #[tokio::test]
    async fn unconfigured_provider_is_server_error() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .get("/api/currency/EUR")
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn rejects_invalid_code() {
        let state = get_test_state();
        let user = create_test_user(&state, "alice@example.com");
        let token = auth_token_for(&state, user.id);
        let server = get_test_server_with_state(state);

        let response = server
            .get("/api/currency/euros")
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["errors"][0]["field"], "code");
    }
}
