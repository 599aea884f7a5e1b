use std::{fs::OpenOptions, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{
    AppState, BankLinkClient, BankLinkEnvironment, ExchangeRateClient, build_router,
    graceful_shutdown, logging_middleware,
};

/// The REST API server for tracking personal finances.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// The canonical timezone used to decide what "today" is, e.g. "Pacific/Auckland".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// The secret used to sign bearer tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// How many hours a bearer token is valid for.
    #[arg(long, env = "TOKEN_DURATION_HOURS", default_value_t = 168)]
    token_duration_hours: i64,

    /// The client ID for the bank-link provider. The bank-link endpoints are
    /// unavailable if this or the secret is missing.
    #[arg(long, env = "PLAID_CLIENT_ID")]
    plaid_client_id: Option<String>,

    /// The secret for the bank-link provider.
    #[arg(long, env = "PLAID_SECRET", hide_env_values = true)]
    plaid_secret: Option<String>,

    /// The bank-link provider environment to connect to.
    #[arg(long, env = "PLAID_ENV", value_enum, default_value_t = BankLinkEnvironment::Sandbox)]
    plaid_env: BankLinkEnvironment,

    /// The access key for the exchange rate provider. Rates are served from
    /// the cache only if this is missing.
    #[arg(long, env = "CURRENCY_LAYER_API_KEY", hide_env_values = true)]
    currency_layer_api_key: Option<String>,

    /// How many minutes a fetched exchange rate is reused for.
    #[arg(long, env = "EXCHANGE_RATE_TTL_MINUTES", default_value_t = 60)]
    exchange_rate_ttl_minutes: i64,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    let mut state = AppState::new(conn, &args.jwt_secret, &args.timezone)
        .expect("Could not create the app state.")
        .with_token_duration(Duration::hours(args.token_duration_hours))
        .with_exchange_rate_ttl(Duration::minutes(args.exchange_rate_ttl_minutes));

    match (&args.plaid_client_id, &args.plaid_secret) {
        (Some(client_id), Some(secret)) => {
            tracing::info!("Bank linking enabled ({:?})", args.plaid_env);
            state =
                state.with_bank_link_client(BankLinkClient::new(client_id, secret, args.plaid_env));
        }
        _ => tracing::warn!("PLAID_CLIENT_ID or PLAID_SECRET is not set, bank linking is disabled"),
    }

    match &args.currency_layer_api_key {
        Some(access_key) => {
            state = state.with_exchange_rate_client(ExchangeRateClient::new(access_key));
        }
        None => tracing::warn!(
            "CURRENCY_LAYER_API_KEY is not set, exchange rates will not be fetched"
        ),
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("Server stopped unexpectedly.");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
