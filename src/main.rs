use std::process;
use std::sync::Arc;

use clap::Parser;
use plinth::{
    application::{
        analytics::AnalyticsService,
        auth::AuthService,
        blog::BlogService,
        chatbot::ChatService,
        contact::ContactService,
        events::EventBus,
        journey::JourneyService,
        media::MediaService,
        notify::{DisabledMailer, Mailer},
        projects::ProjectService,
        skills::SkillService,
        stats::StatsService,
    },
    config::{CliArgs, Command, ServeArgs, Settings},
    infra::{
        db::PostgresRepositories,
        github::GithubClient,
        http::{self, AppState},
        mailer::HttpMailer,
        telemetry,
        uploads::UploadStorage,
    },
};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] plinth::config::ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] plinth::infra::telemetry::TelemetryError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("upload storage error: {0}")]
    Uploads(#[from] std::io::Error),
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Server(String),
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // The subscriber may not be installed yet when configuration fails.
        eprintln!("plinth: {err}");
        error!(error = %err, "startup failed");
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let args = CliArgs::parse();
    let serve_args = match &args.command {
        Some(Command::Serve(serve)) => serve.clone(),
        _ => ServeArgs::default(),
    };
    let settings = Settings::load(args.config_file.as_ref(), &serve_args)?;

    telemetry::init(&settings.logging)?;

    match args.command.unwrap_or(Command::Serve(serve_args)) {
        Command::Migrate => run_migrate(&settings).await,
        Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_migrate(settings: &Settings) -> Result<(), AppError> {
    let pool =
        PostgresRepositories::connect(&settings.database.url, settings.database.max_connections)
            .await?;
    PostgresRepositories::run_migrations(&pool).await?;
    info!("migrations applied");
    Ok(())
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let pool =
        PostgresRepositories::connect(&settings.database.url, settings.database.max_connections)
            .await?;
    PostgresRepositories::run_migrations(&pool).await?;

    let db = Arc::new(PostgresRepositories::new(pool));
    let storage = Arc::new(UploadStorage::new(
        settings.uploads.dir.clone(),
        &settings.uploads.public_prefix,
    )?);

    let events = EventBus::new();
    let media = Arc::new(MediaService::new(storage.clone()));

    let (mailer, admin_recipient): (Arc<dyn Mailer>, Option<String>) = match &settings.mail {
        Some(mail) => (
            Arc::new(HttpMailer::new(mail)?),
            mail.admin_recipient.clone(),
        ),
        None => (Arc::new(DisabledMailer), None),
    };

    let github = Arc::new(GithubClient::new(&settings.github)?);

    let state = AppState {
        auth: Arc::new(AuthService::new(
            db.clone(),
            &settings.auth.jwt_secret,
            settings.auth.token_ttl,
            settings.auth.admin_email.clone(),
        )),
        projects: Arc::new(ProjectService::new(
            db.clone(),
            media.clone(),
            events.clone(),
        )),
        skills: Arc::new(SkillService::new(db.clone(), media.clone())),
        blog: Arc::new(BlogService::new(db.clone())),
        journey: Arc::new(JourneyService::new(db.clone())),
        contact: Arc::new(ContactService::new(
            db.clone(),
            mailer,
            admin_recipient,
            events.clone(),
        )),
        chat: Arc::new(ChatService::new(db.clone(), events.clone())),
        analytics: Arc::new(AnalyticsService::new(db.clone())),
        stats: Arc::new(StatsService::new(
            db.clone(),
            github,
            settings.github.freshness,
        )),
        stats_username: settings.github.username.clone().into(),
        storage,
        db,
        events,
        allowed_origins: settings.allowed_origins.clone().into(),
    };

    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.bind)
        .await
        .map_err(|err| AppError::Server(format!("bind {} failed: {err}", settings.server.bind)))?;

    info!(addr = %settings.server.bind, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Server(err.to_string()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
