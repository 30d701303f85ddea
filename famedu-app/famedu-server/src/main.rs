use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use famedu_api::{router, AppState};
use famedu_core::audit::{ActivityLogger, AuditLoggerConfig};
use famedu_core::services::{AuthService, FamilyService, UserService};
use famedu_infrastructure::{
    create_pool, run_migrations, PgActivityLogRepository, PgFamilyRepository, PgUserRepository,
};
use famedu_security::{JwtService, LockoutPolicy, LoginAttemptTracker};
use famedu_shared::config::{AppConfig, CorsSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize telemetry
    let _log_guard = famedu_shared::telemetry::init_telemetry(&config.app.name, config.app.log_dir.as_deref());

    info!("FamEdu server starting ({})...", config.app.env);

    // Connect to Database
    let pool = create_pool(&config.database).await?;
    info!("Database connection established.");

    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    // Repositories
    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let families = Arc::new(PgFamilyRepository::new(pool.clone()));
    let activity_logs = Arc::new(PgActivityLogRepository::new(pool));

    // Security
    let policy = LockoutPolicy::new(
        config.security.max_failed_attempts,
        chrono::Duration::minutes(config.security.lockout_duration_minutes),
    )?;
    let tracker = LoginAttemptTracker::new(policy);
    spawn_lockout_sweeper(
        tracker.clone(),
        Duration::from_secs(config.security.lockout_sweep_interval_secs.max(1)),
    );

    let jwt = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    ));

    let audit = ActivityLogger::new(activity_logs, AuditLoggerConfig::from(&config.audit));

    // Create App State
    let state = AppState {
        auth: Arc::new(AuthService::new(
            users.clone(),
            families.clone(),
            tracker.clone(),
            jwt,
            audit.clone(),
        )),
        users: Arc::new(UserService::new(users.clone(), families.clone(), tracker, audit.clone())),
        families: Arc::new(FamilyService::new(families, users, audit)),
        trust_forwarded_for: config.app.trust_forwarded_for,
    };

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors));

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Periodically drops lockout records whose window has passed.
fn spawn_lockout_sweeper(tracker: LoginAttemptTracker, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = tracker.purge_expired();
            if purged > 0 {
                debug!("Purged {} expired login attempt records", purged);
            }
        }
    });
}

fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
