use socium_api::{build_router, state::AppState};
use socium_config::Settings;
use socium_db::{connect, indexes::ensure_indexes};
use socium_services::DigestService;
use socium_services::mail::{Mailer, SmtpMailer, TracingMailer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "socium_api=debug,socium_services=debug,socium_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!("Starting Socium API on {}:{}", settings.app.host, settings.app.port);

    let db = connect(&settings).await?;
    ensure_indexes(&db).await?;

    let app_state = AppState::new(db, settings.clone());

    if settings.mail.enabled {
        let mailer: Arc<dyn Mailer> = match SmtpMailer::from_settings(&settings.mail)? {
            Some(smtp) => {
                info!(host = ?settings.mail.smtp_host, "Mail digest delivered over SMTP");
                Arc::new(smtp)
            }
            None => {
                warn!("No SMTP host configured; mail digests are only logged");
                Arc::new(TracingMailer)
            }
        };
        let digest = Arc::new(DigestService::new(
            app_state.feed_items.clone(),
            app_state.users.clone(),
            mailer,
            settings.mail.from.clone(),
        ));
        let every = Duration::from_secs(settings.mail.digest_interval_secs.max(1));
        info!(interval_secs = every.as_secs(), "Mail digest enabled");
        digest.spawn(every);
    }

    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
