use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::evaluator::vehicle_alerts;
use crate::model::{CreateVehicle, UpdateVehicle, Vehicle};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Json<Vec<Vehicle>> {
    let tables = state.db.read().await;
    Json(tables.vehicles_of(user_id).cloned().collect())
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(input): Json<CreateVehicle>,
) -> AppResult<(StatusCode, Json<Vehicle>)> {
    let make = required(input.make, "make")?;
    let model = required(input.model, "model")?;
    check_odometer(input.odometer)?;

    let vehicle = state.db.write().await.vehicles.insert_with(|id| Vehicle {
        id,
        user_id,
        make,
        model,
        year: input.year,
        odometer: input.odometer,
        mileage_unit: input.mileage_unit.unwrap_or_else(|| "mi".to_string()),
        fuel_type: input.fuel_type.unwrap_or_default(),
    });
    info!(vehicle_id = vehicle.id, user_id, "created vehicle");
    Ok((StatusCode::CREATED, Json(vehicle)))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
) -> AppResult<Json<Vehicle>> {
    let tables = state.db.read().await;
    tables.owned_vehicle(user_id, id).cloned().map(Json)
}

/// Partial update. Setting the odometer here is how a new reading enters the
/// system outside of a fill-up, and may make reminders overdue. Nothing is
/// written unless every supplied field is valid.
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
    Json(input): Json<UpdateVehicle>,
) -> AppResult<Json<Vehicle>> {
    let make = input.make.map(|m| required(m, "make")).transpose()?;
    let model = input.model.map(|m| required(m, "model")).transpose()?;
    if let Some(odometer) = input.odometer {
        check_odometer(odometer)?;
    }

    let today = state.clock.today();
    let mut tables = state.db.write().await;
    let vehicle = tables.owned_vehicle_mut(user_id, id)?;
    if let Some(make) = make {
        vehicle.make = make;
    }
    if let Some(model) = model {
        vehicle.model = model;
    }
    if let Some(year) = input.year {
        vehicle.year = year;
    }
    if let Some(odometer) = input.odometer {
        vehicle.odometer = odometer;
    }
    if let Some(unit) = input.mileage_unit {
        vehicle.mileage_unit = unit;
    }
    if let Some(fuel_type) = input.fuel_type {
        vehicle.fuel_type = fuel_type;
    }
    let vehicle = vehicle.clone();

    if input.odometer.is_some() {
        let alerts = vehicle_alerts(&vehicle, tables.reminders.values(), today, &state.config.due_window);
        let raised = tables.record_alerts(user_id, &alerts, state.clock.now());
        if !raised.is_empty() {
            info!(vehicle_id = id, count = raised.len(), "raised reminder notifications");
        }
    }
    Ok(Json(vehicle))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    let mut tables = state.db.write().await;
    tables.owned_vehicle(user_id, id)?;
    tables.remove_vehicle(id);
    info!(vehicle_id = id, user_id, "deleted vehicle");
    Ok(StatusCode::NO_CONTENT)
}

fn required(value: String, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn check_odometer(odometer: f64) -> AppResult<()> {
    if !odometer.is_finite() || odometer < 0.0 {
        return Err(AppError::BadRequest("odometer must be a non-negative number".to_string()));
    }
    Ok(())
}
