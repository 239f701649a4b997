use axum::{
    routing::{get, post},
    Router,
};
use forum_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let forum_api = Router::new()
        .route(
            "/api/forum/questions",
            get(routes::question_routes::list_questions)
                .post(routes::question_routes::create_question),
        )
        .route(
            "/api/forum/questions/:id",
            get(routes::question_routes::get_question)
                .patch(routes::question_routes::update_question),
        )
        .route(
            "/api/forum/questions/:id/answers",
            post(routes::question_routes::create_answer),
        )
        .route(
            "/api/forum/questions/:id/correct-answer",
            post(routes::question_routes::designate_correct_answer),
        )
        .route(
            "/api/forum/questions/:id/votes",
            post(routes::question_routes::cast_question_vote),
        )
        .route(
            "/api/forum/questions/:id/subscription",
            post(routes::question_routes::subscribe),
        )
        .route(
            "/api/forum/questions/:id/subscriptions",
            get(routes::question_routes::list_subscriptions),
        )
        .route(
            "/api/forum/questions/:id/hide",
            post(routes::question_routes::hide_question),
        )
        .route(
            "/api/forum/questions/:id/unhide",
            post(routes::question_routes::unhide_question),
        )
        .route(
            "/api/forum/answers/:id/votes",
            post(routes::answer_routes::cast_answer_vote),
        )
        .route(
            "/api/forum/answers/:id/hide",
            post(routes::answer_routes::hide_answer),
        )
        .route(
            "/api/forum/answers/:id/unhide",
            post(routes::answer_routes::unhide_answer),
        )
        .layer(axum::middleware::from_fn(
            forum_backend::middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            forum_backend::middleware::rate_limit::new_rps_state(config.forum_rps),
            forum_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(forum_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
