//! storyhub server entry point.

use std::sync::Arc;

use axum::{Router, middleware};
use storyhub_api::{middleware::AppState, router as api_router};
use storyhub_common::Config;
use storyhub_core::{
    BroadcastEventPublisher, CommentService, EventPublisherService, StoryService, UserService,
    VoteService,
};
use storyhub_db::repositories::{
    CommentRepository, StoryRepository, UserRepository, VoteRepository,
};
use tokio::{signal, sync::broadcast};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyhub=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting storyhub server...");

    let config = Config::load()?;

    let db = Arc::new(storyhub_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    storyhub_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let story_repo = StoryRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));

    // Vote events go to in-process subscribers
    let event_publisher = Arc::new(BroadcastEventPublisher::default());
    let mut vote_service = VoteService::new(Arc::clone(&db), vote_repo);
    vote_service.set_event_publisher(event_publisher.clone() as EventPublisherService);

    let mut events = event_publisher.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::debug!(
                    votable = %event.votable,
                    voter_id = %event.voter_id,
                    action = ?event.action,
                    vote_score = event.stats.vote_score,
                    "Vote changed"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Vote event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let state = AppState {
        user_service: UserService::new(user_repo.clone()),
        story_service: StoryService::new(story_repo.clone(), user_repo.clone()),
        comment_service: CommentService::new(
            comment_repo,
            story_repo,
            user_repo,
            config.content.max_comment_depth,
        ),
        vote_service,
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            storyhub_api::middleware::acting_user_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = config.server.bind_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
