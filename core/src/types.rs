//! Domain DTOs for the Clarkson API.
//!
//! # Design
//! These types mirror the server's schema but are defined independently so
//! the client core never links against axum. The live-server integration
//! test catches any schema drift between the two crates.
//!
//! Update payloads skip `None` fields when serialized: only the fields present
//! in the JSON are applied, omitted fields stay unchanged on the server.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// The signed-in user's public profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Successful login: an opaque bearer token plus the profile it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: u64,
    pub user_id: u64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub odometer: f64,
    pub mileage_unit: String,
    pub fuel_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub odometer: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVehicle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odometer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Fuel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelEntry {
    pub id: u64,
    pub vehicle_id: u64,
    pub date: NaiveDate,
    pub odometer: f64,
    pub volume: f64,
    pub cost: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFuelEntry {
    pub date: NaiveDate,
    pub odometer: f64,
    pub volume: f64,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Correction to a recorded fill-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFuelEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odometer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Fuel totals for one month, `month` formatted as `YYYY-MM`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyFuel {
    pub month: String,
    pub cost: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FuelStats {
    pub fill_ups: usize,
    pub total_cost: f64,
    pub total_volume: f64,
    pub total_distance: f64,
    /// Distance per unit of volume; zero when nothing has been logged.
    pub average_economy: f64,
    pub last_fillup: Option<FuelEntry>,
    #[serde(default)]
    pub monthly_trend: Vec<MonthlyFuel>,
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: u64,
    pub vehicle_id: u64,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpense {
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateExpense {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpenseStats {
    pub total_cost: f64,
    pub expense_count: usize,
    #[serde(default)]
    pub categories: Vec<CategoryTotal>,
}

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

/// A maintenance task due by date and/or odometer reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: u64,
    pub vehicle_id: u64,
    pub kind: String,
    pub due_date: Option<NaiveDate>,
    pub due_odometer: Option<f64>,
    pub interval_days: Option<u32>,
    pub interval_distance: Option<f64>,
    pub completed_at: Option<NaiveDate>,
    pub completed_odometer: Option<f64>,
}

impl Reminder {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Payload for a new reminder. Give explicit thresholds, or an interval plus
/// the last service reading and let the server derive them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateReminder {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_odometer: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_service_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_service_odometer: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReminder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_odometer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_distance: Option<f64>,
}

/// Completion data recorded when a reminder's service has been done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteReminder {
    pub service_date: NaiveDate,
    pub service_odometer: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Upcoming,
    Due,
    Overdue,
}

/// A reminder that needs attention, as reported by the reminder checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderAlert {
    pub reminder_id: u64,
    pub vehicle_id: u64,
    pub vehicle_name: String,
    pub kind: String,
    pub status: ReminderStatus,
    pub distance_remaining: Option<f64>,
    pub days_remaining: Option<i64>,
}

/// Body of `GET /reminders/check`. A missing or null `alerts` field means
/// nothing needs attention.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AlertsEnvelope {
    #[serde(default)]
    pub alerts: Option<Vec<ReminderAlert>>,
}

/// Body of `GET /vehicles/:id/reminders/due`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleAlerts {
    pub vehicle: Vehicle,
    #[serde(default)]
    pub alerts: Vec<ReminderAlert>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ReminderDue,
    ReminderOverdue,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Unread,
    Read,
    Dismissed,
}

/// An inbox entry raised when a reminder first becomes due or overdue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub user_id: u64,
    pub vehicle_id: u64,
    pub reminder_id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub dismissed_at: Option<DateTime<Utc>>,
}

/// Counts behind the inbox badge. Dismissed notifications are not counted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSummary {
    pub unread_count: usize,
    pub overdue_count: usize,
    pub upcoming_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_vehicle_serializes_only_present_fields() {
        let input = UpdateVehicle {
            odometer: Some(51200.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({"odometer": 51200.0}));
    }

    #[test]
    fn reminder_status_uses_lowercase_names() {
        let json = serde_json::to_string(&ReminderStatus::Overdue).unwrap();
        assert_eq!(json, r#""overdue""#);
        assert!(ReminderStatus::Overdue > ReminderStatus::Due);
        assert!(ReminderStatus::Due > ReminderStatus::Upcoming);
    }

    #[test]
    fn alerts_envelope_tolerates_missing_and_null() {
        let missing: AlertsEnvelope = serde_json::from_str("{}").unwrap();
        assert!(missing.alerts.is_none());
        let null: AlertsEnvelope = serde_json::from_str(r#"{"alerts":null}"#).unwrap();
        assert!(null.alerts.is_none());
    }

    #[test]
    fn create_reminder_rejects_missing_kind() {
        let result: Result<CreateReminder, _> = serde_json::from_str(r#"{"due_odometer":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn notification_reads_server_shape() {
        let json = r#"{
            "id": 3, "user_id": 1, "vehicle_id": 2, "reminder_id": 9,
            "kind": "reminder_overdue", "title": "Oil change - OVERDUE",
            "message": "1991 Mazda MX-5: 200 mi past due", "status": "unread",
            "created_at": "2024-01-01T00:00:00Z", "dismissed_at": null
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.kind, NotificationKind::ReminderOverdue);
        assert_eq!(n.status, NotificationStatus::Unread);
        assert_eq!(n.created_at.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(n.dismissed_at.is_none());
    }

    #[test]
    fn update_expense_serializes_only_present_fields() {
        let input = UpdateExpense {
            amount: Some(45.0),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&input).unwrap(), serde_json::json!({"amount": 45.0}));
    }

    #[test]
    fn dates_use_iso_format() {
        let input = CompleteReminder {
            service_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            service_odometer: 51200.0,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["service_date"], "2024-03-09");
    }
}
