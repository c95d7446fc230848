//! Clarkson backend: vehicles, fill-ups, expenses and maintenance reminders
//! for authenticated users, held in memory.

use axum::Router;
use tokio::net::TcpListener;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod state;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, DueWindow};
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    api::router(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}
