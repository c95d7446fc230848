//! Records held by the server and the payloads its handlers accept.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub name: String,
    #[serde(skip)]
    pub password_hash: String,
}

#[derive(Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginOutput {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
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

impl Vehicle {
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

#[derive(Deserialize)]
pub struct CreateVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub odometer: f64,
    pub mileage_unit: Option<String>,
    pub fuel_type: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateVehicle {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub odometer: Option<f64>,
    pub mileage_unit: Option<String>,
    pub fuel_type: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FuelEntry {
    pub id: u64,
    pub vehicle_id: u64,
    pub date: NaiveDate,
    pub odometer: f64,
    pub volume: f64,
    pub cost: f64,
    pub location: String,
    pub notes: String,
}

#[derive(Deserialize)]
pub struct CreateFuelEntry {
    pub date: NaiveDate,
    pub odometer: f64,
    pub volume: f64,
    pub cost: f64,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateFuelEntry {
    pub date: Option<NaiveDate>,
    pub odometer: Option<f64>,
    pub volume: Option<f64>,
    pub cost: Option<f64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MonthlyFuel {
    pub month: String,
    pub cost: f64,
    pub volume: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FuelStats {
    pub fill_ups: usize,
    pub total_cost: f64,
    pub total_volume: f64,
    pub total_distance: f64,
    pub average_economy: f64,
    pub last_fillup: Option<FuelEntry>,
    pub monthly_trend: Vec<MonthlyFuel>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: u64,
    pub vehicle_id: u64,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub notes: String,
}

#[derive(Deserialize)]
pub struct CreateExpense {
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateExpense {
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpenseStats {
    pub total_cost: f64,
    pub expense_count: usize,
    pub categories: Vec<CategoryTotal>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
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
    pub fn is_pending(&self) -> bool {
        self.completed_at.is_none()
    }

    pub fn is_recurring(&self) -> bool {
        self.interval_days.is_some() || self.interval_distance.is_some()
    }
}

#[derive(Deserialize)]
pub struct CreateReminder {
    pub kind: String,
    pub due_date: Option<NaiveDate>,
    pub due_odometer: Option<f64>,
    pub interval_days: Option<u32>,
    pub interval_distance: Option<f64>,
    pub last_service_date: Option<NaiveDate>,
    pub last_service_odometer: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateReminder {
    pub kind: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub due_odometer: Option<f64>,
    pub interval_days: Option<u32>,
    pub interval_distance: Option<f64>,
}

#[derive(Deserialize)]
pub struct CompleteReminder {
    pub service_date: NaiveDate,
    pub service_odometer: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Upcoming,
    Due,
    Overdue,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReminderAlert {
    pub reminder_id: u64,
    pub vehicle_id: u64,
    pub vehicle_name: String,
    pub kind: String,
    pub status: ReminderStatus,
    pub distance_remaining: Option<f64>,
    pub days_remaining: Option<i64>,
}

#[derive(Serialize, Deserialize)]
pub struct AlertsOutput {
    pub alerts: Vec<ReminderAlert>,
}

#[derive(Serialize, Deserialize)]
pub struct VehicleAlertsOutput {
    pub vehicle: Vehicle,
    pub alerts: Vec<ReminderAlert>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ReminderDue,
    ReminderOverdue,
}

impl NotificationKind {
    /// Upcoming reminders never notify.
    pub fn for_status(status: ReminderStatus) -> Option<Self> {
        match status {
            ReminderStatus::Upcoming => None,
            ReminderStatus::Due => Some(Self::ReminderDue),
            ReminderStatus::Overdue => Some(Self::ReminderOverdue),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Unread,
    Read,
    Dismissed,
}

/// A stored alert in a user's inbox. Raised once per reminder and kind.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
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
    pub dismissed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationSummary {
    pub unread_count: usize,
    pub overdue_count: usize,
    pub upcoming_count: usize,
}
