use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use tracing::{info, warn};

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::evaluator::vehicle_alerts;
use crate::model::{CreateFuelEntry, FuelEntry, FuelStats, MonthlyFuel, UpdateFuelEntry};
use crate::state::AppState;
use crate::store::Tables;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(vehicle_id): Path<u64>,
) -> AppResult<Json<Vec<FuelEntry>>> {
    let tables = state.db.read().await;
    tables.owned_vehicle(user_id, vehicle_id)?;
    let mut entries: Vec<FuelEntry> = tables
        .fuel
        .values()
        .filter(|f| f.vehicle_id == vehicle_id)
        .cloned()
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.odometer.total_cmp(&a.odometer)));
    Ok(Json(entries))
}

/// Record a fill-up. The reading becomes the vehicle's odometer unless the
/// vehicle already shows more, and any reminder it pushes over a threshold
/// lands in the owner's notifications.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(vehicle_id): Path<u64>,
    Json(input): Json<CreateFuelEntry>,
) -> AppResult<(StatusCode, Json<FuelEntry>)> {
    for (field, value) in [("volume", input.volume), ("cost", input.cost), ("odometer", input.odometer)] {
        positive(field, value)?;
    }

    let today = state.clock.today();
    let mut tables = state.db.write().await;
    tables.owned_vehicle(user_id, vehicle_id)?;

    let previous = tables
        .fuel
        .values()
        .filter(|f| f.vehicle_id == vehicle_id)
        .map(|f| f.odometer)
        .fold(None, |max: Option<f64>, o| Some(max.map_or(o, |m| m.max(o))));
    if previous.is_some_and(|last| input.odometer < last) {
        return Err(AppError::BadRequest(
            "odometer cannot be less than the previous entry".to_string(),
        ));
    }

    let entry = tables.fuel.insert_with(|id| FuelEntry {
        id,
        vehicle_id,
        date: input.date,
        odometer: input.odometer,
        volume: input.volume,
        cost: input.cost,
        location: input.location.unwrap_or_default(),
        notes: input.notes.unwrap_or_default(),
    });

    advance_odometer(&state, &mut tables, user_id, vehicle_id, entry.odometer, today)?;
    info!(fuel_id = entry.id, vehicle_id, "recorded fill-up");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Partial update. A changed reading must still sit between the fill-ups
/// dated before and after it.
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
    Json(input): Json<UpdateFuelEntry>,
) -> AppResult<Json<FuelEntry>> {
    for (field, value) in [("volume", input.volume), ("cost", input.cost), ("odometer", input.odometer)] {
        if let Some(value) = value {
            positive(field, value)?;
        }
    }

    let today = state.clock.today();
    let mut tables = state.db.write().await;
    let mut entry = tables.owned_fuel_entry(user_id, id)?.clone();
    if let Some(date) = input.date {
        entry.date = date;
    }
    if let Some(odometer) = input.odometer {
        entry.odometer = odometer;
    }
    if let Some(volume) = input.volume {
        entry.volume = volume;
    }
    if let Some(cost) = input.cost {
        entry.cost = cost;
    }
    if let Some(location) = input.location {
        entry.location = location;
    }
    if let Some(notes) = input.notes {
        entry.notes = notes;
    }

    let out_of_order = tables
        .fuel
        .values()
        .filter(|f| f.vehicle_id == entry.vehicle_id && f.id != id)
        .any(|f| {
            (f.date < entry.date && f.odometer > entry.odometer) || (f.date > entry.date && f.odometer < entry.odometer)
        });
    if out_of_order {
        return Err(AppError::BadRequest(
            "odometer must fit between the surrounding entries".to_string(),
        ));
    }

    let slot = tables.fuel.get_mut(id).ok_or(AppError::NotFound("fuel entry"))?;
    *slot = entry.clone();
    advance_odometer(&state, &mut tables, user_id, entry.vehicle_id, entry.odometer, today)?;
    info!(fuel_id = id, vehicle_id = entry.vehicle_id, "updated fill-up");
    Ok(Json(entry))
}

pub async fn stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(vehicle_id): Path<u64>,
) -> AppResult<Json<FuelStats>> {
    let tables = state.db.read().await;
    tables.owned_vehicle(user_id, vehicle_id)?;
    let entries: Vec<&FuelEntry> = tables.fuel.values().filter(|f| f.vehicle_id == vehicle_id).collect();
    Ok(Json(fuel_stats(&entries)))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    let mut tables = state.db.write().await;
    tables.owned_fuel_entry(user_id, id)?;
    tables.fuel.remove(id);
    info!(fuel_id = id, user_id, "deleted fill-up");
    Ok(StatusCode::NO_CONTENT)
}

fn positive(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::BadRequest(format!("{field} must be greater than zero")));
    }
    Ok(())
}

/// Move the vehicle up to `reading` and notify about reminders it crosses.
fn advance_odometer(
    state: &AppState,
    tables: &mut Tables,
    user_id: u64,
    vehicle_id: u64,
    reading: f64,
    today: NaiveDate,
) -> AppResult<()> {
    let vehicle = tables.owned_vehicle_mut(user_id, vehicle_id)?;
    if reading > vehicle.odometer {
        vehicle.odometer = reading;
    }
    let vehicle = vehicle.clone();

    let alerts = vehicle_alerts(&vehicle, tables.reminders.values(), today, &state.config.due_window);
    for alert in &alerts {
        warn!(
            vehicle_id,
            reminder_id = alert.reminder_id,
            kind = %alert.kind,
            status = ?alert.status,
            "maintenance reminder needs attention"
        );
    }
    tables.record_alerts(user_id, &alerts, state.clock.now());
    Ok(())
}

/// Totals, distance covered between the lowest and highest readings, and
/// per-month spend ordered by month.
pub fn fuel_stats(entries: &[&FuelEntry]) -> FuelStats {
    let Some(last) = entries
        .iter()
        .max_by(|a, b| a.date.cmp(&b.date).then(a.odometer.total_cmp(&b.odometer)))
    else {
        return FuelStats::default();
    };

    let total_cost: f64 = entries.iter().map(|f| f.cost).sum();
    let total_volume: f64 = entries.iter().map(|f| f.volume).sum();
    let lowest = entries.iter().map(|f| f.odometer).fold(f64::INFINITY, f64::min);
    let highest = entries.iter().map(|f| f.odometer).fold(f64::NEG_INFINITY, f64::max);
    let total_distance = highest - lowest;
    let average_economy = if total_volume > 0.0 {
        total_distance / total_volume
    } else {
        0.0
    };

    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for f in entries {
        let slot = months.entry(f.date.format("%Y-%m").to_string()).or_default();
        slot.0 += f.cost;
        slot.1 += f.volume;
    }

    FuelStats {
        fill_ups: entries.len(),
        total_cost,
        total_volume,
        total_distance,
        average_economy,
        last_fillup: Some((*last).clone()),
        monthly_trend: months
            .into_iter()
            .map(|(month, (cost, volume))| MonthlyFuel { month, cost, volume })
            .collect(),
    }
}
