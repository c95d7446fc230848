//! Maintenance reminders and the alert views computed from them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Days, NaiveDate};
use tracing::info;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::evaluator::{evaluate, vehicle_alerts};
use crate::model::{
    AlertsOutput, CompleteReminder, CreateReminder, Reminder, ReminderStatus, UpdateReminder, VehicleAlertsOutput,
};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(vehicle_id): Path<u64>,
) -> AppResult<Json<Vec<Reminder>>> {
    let tables = state.db.read().await;
    tables.owned_vehicle(user_id, vehicle_id)?;
    Ok(Json(
        tables
            .reminders
            .values()
            .filter(|r| r.vehicle_id == vehicle_id)
            .cloned()
            .collect(),
    ))
}

/// Missing thresholds are derived from the last service plus the interval.
/// A reminder that ends up with neither threshold is rejected.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(vehicle_id): Path<u64>,
    Json(input): Json<CreateReminder>,
) -> AppResult<(StatusCode, Json<Reminder>)> {
    let kind = input.kind.trim().to_string();
    if kind.is_empty() {
        return Err(AppError::BadRequest("kind is required".to_string()));
    }
    check_intervals(input.interval_days, input.interval_distance)?;

    let due_odometer = input.due_odometer.or_else(|| {
        input
            .last_service_odometer
            .zip(input.interval_distance)
            .map(|(last, every)| last + every)
    });
    let due_date = match input.due_date {
        Some(date) => Some(date),
        None => match input.last_service_date.zip(input.interval_days) {
            Some((last, every)) => Some(add_days(last, every)?),
            None => None,
        },
    };
    if due_odometer.is_none() && due_date.is_none() {
        return Err(AppError::BadRequest(
            "a due date or due odometer is required".to_string(),
        ));
    }

    let mut tables = state.db.write().await;
    tables.owned_vehicle(user_id, vehicle_id)?;
    let reminder = tables.reminders.insert_with(|id| Reminder {
        id,
        vehicle_id,
        kind,
        due_date,
        due_odometer,
        interval_days: input.interval_days,
        interval_distance: input.interval_distance,
        completed_at: None,
        completed_odometer: None,
    });
    info!(reminder_id = reminder.id, vehicle_id, "created reminder");
    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
    Json(input): Json<UpdateReminder>,
) -> AppResult<Json<Reminder>> {
    check_intervals(input.interval_days, input.interval_distance)?;

    let mut tables = state.db.write().await;
    if !tables.owned_reminder(user_id, id)?.is_pending() {
        return Err(AppError::Conflict("reminder already completed".to_string()));
    }
    let reminder = tables.reminders.get_mut(id).ok_or(AppError::NotFound("reminder"))?;
    if let Some(kind) = input.kind {
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(AppError::BadRequest("kind is required".to_string()));
        }
        reminder.kind = kind.to_string();
    }
    if input.due_date.is_some() {
        reminder.due_date = input.due_date;
    }
    if input.due_odometer.is_some() {
        reminder.due_odometer = input.due_odometer;
    }
    if input.interval_days.is_some() {
        reminder.interval_days = input.interval_days;
    }
    if input.interval_distance.is_some() {
        reminder.interval_distance = input.interval_distance;
    }
    Ok(Json(reminder.clone()))
}

/// Mark a reminder done at the given date and reading. A recurring reminder
/// is followed by a fresh one due one interval later.
pub async fn complete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
    Json(input): Json<CompleteReminder>,
) -> AppResult<Json<Reminder>> {
    if !input.service_odometer.is_finite() || input.service_odometer < 0.0 {
        return Err(AppError::BadRequest("service odometer must be a non-negative number".to_string()));
    }

    let mut tables = state.db.write().await;
    let current = tables.owned_reminder(user_id, id)?.clone();
    if !current.is_pending() {
        return Err(AppError::Conflict("reminder already completed".to_string()));
    }

    let next = if current.is_recurring() {
        let due_date = match current.interval_days {
            Some(every) => Some(add_days(input.service_date, every)?),
            None => None,
        };
        Some(Reminder {
            id: 0,
            due_odometer: current.interval_distance.map(|every| input.service_odometer + every),
            due_date,
            completed_at: None,
            completed_odometer: None,
            ..current.clone()
        })
    } else {
        None
    };

    let completed = {
        let reminder = tables.reminders.get_mut(id).ok_or(AppError::NotFound("reminder"))?;
        reminder.completed_at = Some(input.service_date);
        reminder.completed_odometer = Some(input.service_odometer);
        reminder.clone()
    };

    let vehicle = tables.owned_vehicle_mut(user_id, current.vehicle_id)?;
    if input.service_odometer > vehicle.odometer {
        vehicle.odometer = input.service_odometer;
    }

    tables.dismiss_reminder_notifications(id, state.clock.now());

    if let Some(next) = next {
        let next = tables.reminders.insert_with(|id| Reminder { id, ..next });
        info!(reminder_id = id, next_reminder_id = next.id, "completed recurring reminder");
    } else {
        info!(reminder_id = id, "completed reminder");
    }
    Ok(Json(completed))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    let mut tables = state.db.write().await;
    tables.owned_reminder(user_id, id)?;
    tables.remove_reminder(id);
    info!(reminder_id = id, user_id, "deleted reminder");
    Ok(StatusCode::NO_CONTENT)
}

/// Due and overdue alerts across all of the caller's vehicles. New ones are
/// also raised as notifications.
pub async fn check(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Json<AlertsOutput> {
    let today = state.clock.today();
    let alerts: Vec<_> = {
        let tables = state.db.read().await;
        tables
            .vehicles_of(user_id)
            .flat_map(|v| vehicle_alerts(v, tables.reminders.values(), today, &state.config.due_window))
            .collect()
    };
    if !alerts.is_empty() {
        let raised = state.db.write().await.record_alerts(user_id, &alerts, state.clock.now());
        if !raised.is_empty() {
            info!(user_id, count = raised.len(), "raised reminder notifications");
        }
    }
    Json(AlertsOutput { alerts })
}

/// Pending reminders whose odometer or date threshold has been reached.
pub async fn overdue(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Json<Vec<Reminder>> {
    let today = state.clock.today();
    let window = state.config.due_window;
    let tables = state.db.read().await;
    let overdue = tables
        .vehicles_of(user_id)
        .flat_map(|v| {
            tables.reminders.values().filter(move |r| {
                r.vehicle_id == v.id
                    && evaluate(r, v.odometer, today, &window).is_some_and(|e| e.status == ReminderStatus::Overdue)
            })
        })
        .cloned()
        .collect();
    Json(overdue)
}

pub async fn vehicle_due(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(vehicle_id): Path<u64>,
) -> AppResult<Json<VehicleAlertsOutput>> {
    let today = state.clock.today();
    let tables = state.db.read().await;
    let vehicle = tables.owned_vehicle(user_id, vehicle_id)?.clone();
    let alerts = vehicle_alerts(&vehicle, tables.reminders.values(), today, &state.config.due_window);
    Ok(Json(VehicleAlertsOutput { vehicle, alerts }))
}

fn check_intervals(days: Option<u32>, distance: Option<f64>) -> AppResult<()> {
    if days == Some(0) {
        return Err(AppError::BadRequest("interval_days must be positive".to_string()));
    }
    if distance.is_some_and(|d| !d.is_finite() || d <= 0.0) {
        return Err(AppError::BadRequest("interval_distance must be positive".to_string()));
    }
    Ok(())
}

fn add_days(date: NaiveDate, days: u32) -> AppResult<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| AppError::BadRequest("due date is out of range".to_string()))
}
