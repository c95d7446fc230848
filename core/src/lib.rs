//! Synchronous client core for the Clarkson vehicle tracker.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host supplies a
//! [`Transport`] to execute round-trips; everything else is deterministic.
//!
//! # Design
//! - `ApiClient` is stateless: it holds only `base_url`. Each REST operation
//!   is a `build_*` / `parse_*` pair and every parse returns
//!   `Result<T, ApiError>`.
//! - `SessionManager` is the only code that reads or writes the persisted
//!   token and user profile.
//! - `RouteGuard` decides client-side navigation from durable storage.
//! - `OfflineCache` is a network-first `Transport` decorator for GETs.
//! - DTOs are defined independently from the server crate; integration tests
//!   catch schema drift.

pub mod cache;
pub mod client;
pub mod error;
pub mod guard;
pub mod http;
pub mod session;
pub mod types;

pub use cache::{CacheError, CacheStorage, MemoryCacheStorage, OfflineCache};
pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use guard::{Navigation, Route, RouteGuard, RouteMatch};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, SessionError, SessionManager, StorageError};
pub use types::{
    CompleteReminder, CreateExpense, CreateFuelEntry, CreateReminder, CreateVehicle, Expense, ExpenseStats,
    FuelEntry, FuelStats, LoginResponse, Notification, NotificationKind, NotificationStatus, NotificationSummary,
    Reminder, ReminderAlert, ReminderStatus, UpdateExpense, UpdateFuelEntry, UpdateReminder, UpdateVehicle, User,
    Vehicle, VehicleAlerts,
};
