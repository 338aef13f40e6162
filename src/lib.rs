use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    let cors = cors_layer(&app_state.config.cors_origins);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/auth", auth_routes(app_state.clone()))
        .nest("/api", api_routes(app_state.clone()))
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    if parsed.is_empty() {
        layer.allow_origin(tower_http::cors::Any)
    } else {
        layer.allow_origin(parsed)
    }
}

fn auth_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    let public_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::me))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ));

    public_routes.merge(protected_routes)
}

/// Everything under /api. The exam catalog and the leaderboard are readable
/// without a token; the rest requires authentication, with authoring and
/// grading routes behind the staff guard and account administration behind
/// the admin guard.
fn api_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    let staff_guard = middleware::from_fn(middlewares::auth::staff_guard_middleware);
    let admin_guard = middleware::from_fn(middlewares::auth::admin_guard_middleware);

    let public_routes = Router::new()
        .route("/exams", get(handlers::exams::list_exams))
        .route("/exams/{id}", get(handlers::exams::get_exam))
        .route("/leaderboard", get(handlers::leaderboard::get_leaderboard));

    let content_reads = Router::new()
        .route("/classes", get(handlers::content::list_classes))
        .route("/classes/{id}", get(handlers::content::get_class))
        .route("/groups", get(handlers::content::list_groups))
        .route("/groups/{id}", get(handlers::content::get_group))
        .route("/subjects", get(handlers::content::list_subjects))
        .route("/subjects/{id}", get(handlers::content::get_subject))
        .route("/chapters", get(handlers::content::list_chapters))
        .route("/chapters/{id}", get(handlers::content::get_chapter))
        .route("/topics", get(handlers::content::list_topics))
        .route("/topics/{id}", get(handlers::content::get_topic))
        .route("/exam-types", get(handlers::content::list_exam_types));

    let content_writes = Router::new()
        .route("/classes", post(handlers::content::create_class))
        .route(
            "/classes/{id}",
            put(handlers::content::update_class).delete(handlers::content::delete_class),
        )
        .route("/groups", post(handlers::content::create_group))
        .route(
            "/groups/{id}",
            put(handlers::content::update_group).delete(handlers::content::delete_group),
        )
        .route("/subjects", post(handlers::content::create_subject))
        .route(
            "/subjects/{id}",
            put(handlers::content::update_subject).delete(handlers::content::delete_subject),
        )
        .route("/chapters", post(handlers::content::create_chapter))
        .route(
            "/chapters/{id}",
            put(handlers::content::update_chapter).delete(handlers::content::delete_chapter),
        )
        .route("/topics", post(handlers::content::create_topic))
        .route(
            "/topics/{id}",
            put(handlers::content::update_topic).delete(handlers::content::delete_topic),
        )
        .route("/exam-types", post(handlers::content::create_exam_type))
        .route(
            "/exam-types/{id}",
            put(handlers::content::update_exam_type).delete(handlers::content::delete_exam_type),
        )
        .route_layer(staff_guard.clone());

    let question_routes = Router::new()
        .route("/questions", get(handlers::questions::list_questions))
        .route("/questions/{id}", get(handlers::questions::get_question))
        .merge(
            Router::new()
                .route("/questions", post(handlers::questions::create_question))
                .route("/questions/bulk", post(handlers::questions::bulk_import))
                .route(
                    "/questions/{id}",
                    put(handlers::questions::update_question)
                        .delete(handlers::questions::delete_question),
                )
                .route_layer(staff_guard.clone()),
        );

    let exam_routes = Router::new()
        .route("/exams/mine", get(handlers::exams::my_exams))
        .merge(
            Router::new()
                .route("/exams", post(handlers::exams::create_exam))
                .route(
                    "/exams/{id}",
                    put(handlers::exams::update_exam).delete(handlers::exams::delete_exam),
                )
                .route("/exams/{id}/publish", patch(handlers::exams::publish_exam))
                .route(
                    "/exams/{id}/unpublish",
                    patch(handlers::exams::unpublish_exam),
                )
                .route_layer(staff_guard.clone()),
        );

    let result_routes = Router::new()
        .route("/exam-results", post(handlers::results::submit_result))
        .route("/exam-results/mine", get(handlers::results::my_results))
        .merge(
            Router::new()
                .route(
                    "/exam-results/exam/{examId}",
                    get(handlers::results::results_by_exam),
                )
                .route_layer(staff_guard),
        );

    let user_routes = Router::new()
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/users/{id}/role", patch(handlers::users::change_role))
        .route("/users/{id}/status", patch(handlers::users::change_status))
        .route(
            "/users/{id}/reset-password",
            post(handlers::users::reset_password),
        )
        .route_layer(admin_guard);

    let protected_routes = content_reads
        .merge(content_writes)
        .merge(question_routes)
        .merge(exam_routes)
        .merge(result_routes)
        .merge(user_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ));

    public_routes.merge(protected_routes)
}
