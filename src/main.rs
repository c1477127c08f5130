use std::{process, sync::Arc};

use postdesk::{
    application::{
        admin::posts::AdminPostService,
        error::AppError,
        feed::FeedService,
        repos::{PostsRepo, PostsWriteRepo, SessionsRepo},
        sessions::AdminSessionService,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState, RouterState},
        memory::InMemoryRepositories,
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
    }
}

struct Repositories {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    sessions: Arc<dyn SessionsRepo>,
}

async fn init_repositories(settings: &config::Settings) -> Result<Repositories, AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!(
            target = "postdesk::startup",
            "no database url configured; posts and sessions live in memory"
        );
        let memory = Arc::new(InMemoryRepositories::new());
        return Ok(Repositories {
            posts: memory.clone(),
            posts_write: memory.clone(),
            sessions: memory,
        });
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    Ok(Repositories {
        posts: repositories.clone(),
        posts_write: repositories.clone(),
        sessions: repositories,
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let feed = Arc::new(FeedService::new(repositories.posts.clone()));
    let posts = Arc::new(AdminPostService::new(
        repositories.posts,
        repositories.posts_write,
    ));
    let sessions = Arc::new(AdminSessionService::new(
        repositories.sessions,
        settings.admin.password.as_deref(),
        settings.admin.session_ttl,
    ));
    if !sessions.login_enabled() {
        warn!(
            target = "postdesk::startup",
            "admin.password is not set; admin login is disabled"
        );
    }

    let router = http::build_router(RouterState {
        http: HttpState { feed },
        admin: AdminState {
            posts,
            sessions,
            cookie_secure: settings.admin.cookie_secure,
        },
    });

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "postdesk::startup",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "postdesk::startup", "server stopped");
    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or(InfraError::MissingDatabaseUrl { command: "migrate" })?;

    let pool = PostgresRepositories::connect(database_url, 1)
        .await
        .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    info!(target = "postdesk::migrate", "migrations applied");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "postdesk::startup",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
