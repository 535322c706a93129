use hotel_booking::{app, config::AppConfig, state::AppState};

const DEFAULT_LOG_FILTER: &str = "hotel_booking=debug,axum=info,tower_http=info";

/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to
/// one JSON object per line.
fn init_telemetry() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.with_target(false).json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_telemetry();

    let config = AppConfig::from_env()?;
    tracing::warn!("passwords are forwarded to the user procedures without hashing");

    let state = AppState::init(&config).await?;
    app::serve(app::build_app(state), &config).await
}
