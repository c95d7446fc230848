//! HTTP surface. Everything except `/health` lives under `/api`.

use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

pub mod auth;
pub mod expenses;
pub mod fuel;
pub mod notifications;
pub mod reminders;
pub mod vehicles;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/vehicles", get(vehicles::list).post(vehicles::create))
        .route(
            "/vehicles/{id}",
            get(vehicles::get).put(vehicles::update).delete(vehicles::delete),
        )
        .route("/vehicles/{id}/fuel", get(fuel::list).post(fuel::create))
        .route("/vehicles/{id}/fuel-stats", get(fuel::stats))
        .route("/fuel/{id}", put(fuel::update).delete(fuel::delete))
        .route("/vehicles/{id}/expenses", get(expenses::list).post(expenses::create))
        .route("/vehicles/{id}/expense-stats", get(expenses::stats))
        .route("/expenses/{id}", put(expenses::update).delete(expenses::delete))
        .route("/vehicles/{id}/reminders", get(reminders::list).post(reminders::create))
        .route("/vehicles/{id}/reminders/due", get(reminders::vehicle_due))
        .route("/reminders/check", get(reminders::check))
        .route("/reminders/overdue", get(reminders::overdue))
        .route("/reminders/{id}", put(reminders::update).delete(reminders::delete))
        .route("/reminders/{id}/complete", post(reminders::complete))
        .route("/notifications", get(notifications::list))
        .route("/notifications/summary", get(notifications::summary))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/notifications/{id}/dismiss", post(notifications::dismiss));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
