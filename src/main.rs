use std::{process, sync::Arc, time::Duration};

use smitten::{
    application::decisions::DecisionService,
    application::error::AppError,
    application::{counters::LikeCounter, repos::DecisionsRepo},
    config,
    infra::{
        cache::MemoryCounterStore,
        db::{PostgresRepositories, seed_demo_data},
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::Seed(_) => run_seed(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let repo: Arc<dyn DecisionsRepo> = repositories.clone();
    let counters = LikeCounter::new(
        Arc::new(MemoryCounterStore::new()),
        settings.cache.counter_ttl,
    );
    let decisions = Arc::new(DecisionService::new(
        repo,
        counters,
        settings.pagination.default_page_size.get(),
        settings.pagination.max_page_size.get(),
    ));

    let state = HttpState {
        decisions,
        db: repositories,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "smitten::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let graceful = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(graceful))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    // Connecting runs pending migrations as part of startup.
    init_repositories(&settings).await?;
    info!(target = "smitten::migrate", "migrations applied");
    Ok(())
}

async fn run_seed(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    seed_demo_data(repositories.as_ref())
        .await
        .map_err(|err| AppError::unexpected(format!("seed failed: {err}")))?;
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(
        database_url,
        settings.database.max_connections.get(),
        settings.database.statement_timeout,
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn wait_for_shutdown(graceful: Duration) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "smitten::serve", error = %err, "ctrl-c handler failed");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(target = "smitten::serve", error = %err, "sigterm handler failed");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(
        target = "smitten::serve",
        deadline_seconds = graceful.as_secs(),
        "shutdown signal received; draining connections"
    );
}
