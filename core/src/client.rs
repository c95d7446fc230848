//! Stateless HTTP request builder and response parser for the Clarkson API.
//!
//! # Design
//! `ApiClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`; the host executes the round-trip in between.
//! Authenticated builders take the bearer token as their first argument and
//! send it verbatim in `Authorization` (no scheme prefix).

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AlertsEnvelope, CompleteReminder, CreateExpense, CreateFuelEntry, CreateReminder,
    CreateVehicle, Expense, ExpenseStats, FuelEntry, FuelStats, LoginRequest, LoginResponse,
    Notification, NotificationSummary, RegisterRequest, Reminder, ReminderAlert, UpdateExpense,
    UpdateFuelEntry, UpdateReminder, UpdateVehicle, User, Vehicle, VehicleAlerts,
};

/// Where the backend lives when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Synchronous, stateless client for the Clarkson API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, "/auth/login", None, input)
    }

    pub fn build_register(&self, input: &RegisterRequest) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, "/auth/register", None, input)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response)
    }

    // -----------------------------------------------------------------------
    // Vehicles
    // -----------------------------------------------------------------------

    pub fn build_list_vehicles(&self, token: &str) -> HttpRequest {
        self.without_body(HttpMethod::Get, "/vehicles", token)
    }

    pub fn build_create_vehicle(&self, token: &str, input: &CreateVehicle) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, "/vehicles", Some(token), input)
    }

    pub fn build_get_vehicle(&self, token: &str, id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Get, &format!("/vehicles/{id}"), token)
    }

    pub fn build_update_vehicle(
        &self,
        token: &str,
        id: u64,
        input: &UpdateVehicle,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Put, &format!("/vehicles/{id}"), Some(token), input)
    }

    pub fn build_delete_vehicle(&self, token: &str, id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Delete, &format!("/vehicles/{id}"), token)
    }

    pub fn parse_list_vehicles(&self, response: HttpResponse) -> Result<Vec<Vehicle>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_vehicle(&self, response: HttpResponse) -> Result<Vehicle, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_vehicle(&self, response: HttpResponse) -> Result<Vehicle, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_vehicle(&self, response: HttpResponse) -> Result<Vehicle, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_vehicle(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response)
    }

    // -----------------------------------------------------------------------
    // Fuel
    // -----------------------------------------------------------------------

    pub fn build_list_fuel_entries(&self, token: &str, vehicle_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Get, &format!("/vehicles/{vehicle_id}/fuel"), token)
    }

    pub fn build_create_fuel_entry(
        &self,
        token: &str,
        vehicle_id: u64,
        input: &CreateFuelEntry,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, &format!("/vehicles/{vehicle_id}/fuel"), Some(token), input)
    }

    pub fn build_get_fuel_stats(&self, token: &str, vehicle_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Get, &format!("/vehicles/{vehicle_id}/fuel-stats"), token)
    }

    pub fn build_update_fuel_entry(
        &self,
        token: &str,
        fuel_id: u64,
        input: &UpdateFuelEntry,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Put, &format!("/fuel/{fuel_id}"), Some(token), input)
    }

    pub fn build_delete_fuel_entry(&self, token: &str, fuel_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Delete, &format!("/fuel/{fuel_id}"), token)
    }

    pub fn parse_list_fuel_entries(&self, response: HttpResponse) -> Result<Vec<FuelEntry>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_fuel_entry(&self, response: HttpResponse) -> Result<FuelEntry, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_fuel_stats(&self, response: HttpResponse) -> Result<FuelStats, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_fuel_entry(&self, response: HttpResponse) -> Result<FuelEntry, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_fuel_entry(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response)
    }

    // -----------------------------------------------------------------------
    // Expenses
    // -----------------------------------------------------------------------

    pub fn build_list_expenses(&self, token: &str, vehicle_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Get, &format!("/vehicles/{vehicle_id}/expenses"), token)
    }

    pub fn build_create_expense(
        &self,
        token: &str,
        vehicle_id: u64,
        input: &CreateExpense,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, &format!("/vehicles/{vehicle_id}/expenses"), Some(token), input)
    }

    pub fn build_get_expense_stats(&self, token: &str, vehicle_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Get, &format!("/vehicles/{vehicle_id}/expense-stats"), token)
    }

    pub fn build_update_expense(
        &self,
        token: &str,
        expense_id: u64,
        input: &UpdateExpense,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Put, &format!("/expenses/{expense_id}"), Some(token), input)
    }

    pub fn build_delete_expense(&self, token: &str, expense_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Delete, &format!("/expenses/{expense_id}"), token)
    }

    pub fn parse_list_expenses(&self, response: HttpResponse) -> Result<Vec<Expense>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_expense(&self, response: HttpResponse) -> Result<Expense, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_expense_stats(&self, response: HttpResponse) -> Result<ExpenseStats, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_expense(&self, response: HttpResponse) -> Result<Expense, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_expense(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response)
    }

    // -----------------------------------------------------------------------
    // Reminders
    // -----------------------------------------------------------------------

    pub fn build_list_reminders(&self, token: &str, vehicle_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Get, &format!("/vehicles/{vehicle_id}/reminders"), token)
    }

    pub fn build_create_reminder(
        &self,
        token: &str,
        vehicle_id: u64,
        input: &CreateReminder,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, &format!("/vehicles/{vehicle_id}/reminders"), Some(token), input)
    }

    pub fn build_update_reminder(
        &self,
        token: &str,
        reminder_id: u64,
        input: &UpdateReminder,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Put, &format!("/reminders/{reminder_id}"), Some(token), input)
    }

    pub fn build_complete_reminder(
        &self,
        token: &str,
        reminder_id: u64,
        input: &CompleteReminder,
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, &format!("/reminders/{reminder_id}/complete"), Some(token), input)
    }

    pub fn build_delete_reminder(&self, token: &str, reminder_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Delete, &format!("/reminders/{reminder_id}"), token)
    }

    pub fn build_get_overdue_reminders(&self, token: &str) -> HttpRequest {
        self.without_body(HttpMethod::Get, "/reminders/overdue", token)
    }

    pub fn build_check_reminders(&self, token: &str) -> HttpRequest {
        self.without_body(HttpMethod::Get, "/reminders/check", token)
    }

    pub fn build_vehicle_reminders_due(&self, token: &str, vehicle_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Get, &format!("/vehicles/{vehicle_id}/reminders/due"), token)
    }

    pub fn parse_list_reminders(&self, response: HttpResponse) -> Result<Vec<Reminder>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_reminder(&self, response: HttpResponse) -> Result<Reminder, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_reminder(&self, response: HttpResponse) -> Result<Reminder, ApiError> {
        parse_json(response)
    }

    pub fn parse_complete_reminder(&self, response: HttpResponse) -> Result<Reminder, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_reminder(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response)
    }

    pub fn parse_get_overdue_reminders(&self, response: HttpResponse) -> Result<Vec<Reminder>, ApiError> {
        parse_json(response)
    }

    /// A body without `alerts` (or with `"alerts": null`) means no alerts.
    pub fn parse_check_reminders(&self, response: HttpResponse) -> Result<Vec<ReminderAlert>, ApiError> {
        let envelope: AlertsEnvelope = parse_json(response)?;
        Ok(envelope.alerts.unwrap_or_default())
    }

    pub fn parse_vehicle_reminders_due(&self, response: HttpResponse) -> Result<VehicleAlerts, ApiError> {
        parse_json(response)
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    pub fn build_list_notifications(&self, token: &str) -> HttpRequest {
        self.without_body(HttpMethod::Get, "/notifications", token)
    }

    pub fn build_notification_summary(&self, token: &str) -> HttpRequest {
        self.without_body(HttpMethod::Get, "/notifications/summary", token)
    }

    pub fn build_mark_notification_read(&self, token: &str, notification_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Post, &format!("/notifications/{notification_id}/read"), token)
    }

    pub fn build_dismiss_notification(&self, token: &str, notification_id: u64) -> HttpRequest {
        self.without_body(HttpMethod::Post, &format!("/notifications/{notification_id}/dismiss"), token)
    }

    /// Unread notifications, newest first. A null body means an empty inbox.
    pub fn parse_list_notifications(&self, response: HttpResponse) -> Result<Vec<Notification>, ApiError> {
        parse_json::<Option<Vec<Notification>>>(response).map(Option::unwrap_or_default)
    }

    pub fn parse_notification_summary(&self, response: HttpResponse) -> Result<NotificationSummary, ApiError> {
        parse_json(response)
    }

    pub fn parse_mark_notification_read(&self, response: HttpResponse) -> Result<Notification, ApiError> {
        parse_json(response)
    }

    pub fn parse_dismiss_notification(&self, response: HttpResponse) -> Result<Notification, ApiError> {
        parse_json(response)
    }

    // -----------------------------------------------------------------------
    // Request assembly
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn without_body(&self, method: HttpMethod, path: &str, token: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(path),
            headers: vec![("authorization".to_string(), token.to_string())],
            body: None,
        }
    }

    fn with_body<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        if let Some(token) = token {
            headers.push(("authorization".to_string(), token.to_string()));
        }
        Ok(HttpRequest {
            method,
            path: self.url(path),
            headers,
            body: Some(body),
        })
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    match response.status {
        401 => Err(ApiError::Unauthorized {
            body: response.body.clone(),
        }),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn parse_empty(response: HttpResponse) -> Result<(), ApiError> {
    check_status(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const TOKEN: &str = "tok-123";

    fn client() -> ApiClient {
        ApiClient::default()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn default_base_url_points_at_local_api() {
        let req = client().build_list_vehicles(TOKEN);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/api/vehicles");
        assert!(req.body.is_none());
    }

    #[test]
    fn token_is_sent_verbatim() {
        let req = client().build_get_vehicle(TOKEN, 7);
        assert_eq!(req.header("Authorization"), Some(TOKEN));
        assert_eq!(req.header("Content-Type"), None);
    }

    #[test]
    fn bodies_carry_json_content_type() {
        let input = CreateVehicle {
            make: "Mazda".to_string(),
            model: "MX-5".to_string(),
            year: 1991,
            odometer: 50000.0,
            mileage_unit: None,
            fuel_type: None,
        };
        let req = client().build_create_vehicle(TOKEN, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("authorization"), Some(TOKEN));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["make"], "Mazda");
        assert!(body.get("fuel_type").is_none());
    }

    #[test]
    fn login_sends_no_authorization() {
        let input = LoginRequest {
            email: "a@b.c".to_string(),
            password: "hunter22".to_string(),
        };
        let req = client().build_login(&input).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/auth/login");
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn delete_fuel_entry_targets_fuel_resource() {
        let req = client().build_delete_fuel_entry(TOKEN, 42);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:3000/api/fuel/42");
    }

    #[test]
    fn corrections_put_only_changed_fields() {
        let fuel = UpdateFuelEntry {
            cost: Some(50.0),
            ..Default::default()
        };
        let req = client().build_update_fuel_entry(TOKEN, 42, &fuel).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/api/fuel/42");
        assert_eq!(req.body.as_deref(), Some(r#"{"cost":50.0}"#));

        let expense = UpdateExpense {
            category: Some("tyres".to_string()),
            ..Default::default()
        };
        let req = client().build_update_expense(TOKEN, 8, &expense).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/expenses/8");
        assert_eq!(req.header("authorization"), Some(TOKEN));
    }

    #[test]
    fn notification_actions_post_without_body() {
        let req = client().build_dismiss_notification(TOKEN, 5);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/notifications/5/dismiss");
        assert!(req.body.is_none());
        assert_eq!(req.header("authorization"), Some(TOKEN));
    }

    #[test]
    fn empty_inbox_parses_from_null() {
        let inbox = client().parse_list_notifications(response(200, "null")).unwrap();
        assert!(inbox.is_empty());
        let inbox = client().parse_list_notifications(response(200, "[]")).unwrap();
        assert!(inbox.is_empty());
        assert!(matches!(
            client().parse_dismiss_notification(response(404, r#"{"error":"notification not found"}"#)),
            Err(ApiError::NotFound)
        ));
    }

    #[test]
    fn complete_reminder_posts_completion_data() {
        let input = CompleteReminder {
            service_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            service_odometer: 51200.0,
        };
        let req = client().build_complete_reminder(TOKEN, 3, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/reminders/3/complete");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["service_odometer"], 51200.0);
    }

    #[test]
    fn check_reminders_defaults_to_empty_list() {
        let alerts = client().parse_check_reminders(response(200, "{}")).unwrap();
        assert!(alerts.is_empty());
        let alerts = client().parse_check_reminders(response(200, r#"{"alerts":null}"#)).unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn check_reminders_parses_alerts() {
        let body = r#"{"alerts":[{"reminder_id":1,"vehicle_id":2,"vehicle_name":"1991 Mazda MX-5",
            "kind":"Oil change","status":"overdue","distance_remaining":-200.0,"days_remaining":null}]}"#;
        let alerts = client().parse_check_reminders(response(200, body)).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].status, crate::types::ReminderStatus::Overdue);
        assert_eq!(alerts[0].distance_remaining, Some(-200.0));
    }

    #[test]
    fn unauthorized_is_distinguished() {
        let err = client()
            .parse_list_vehicles(response(401, r#"{"error":"invalid token"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert_eq!(err.server_message().as_deref(), Some("invalid token"));
    }

    #[test]
    fn not_found_is_distinguished() {
        let err = client().parse_get_vehicle(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn other_failures_keep_status_and_body() {
        let err = client()
            .parse_create_fuel_entry(response(400, r#"{"error":"odometer cannot go backwards"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 400, .. }));
    }

    #[test]
    fn deletes_accept_no_content() {
        assert!(client().parse_delete_reminder(response(204, "")).is_ok());
        assert!(client().parse_delete_expense(response(204, "")).is_ok());
    }

    #[test]
    fn bad_json_is_a_deserialization_error() {
        let err = client().parse_list_reminders(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:3000/api/");
        let req = client.build_get_overdue_reminders(TOKEN);
        assert_eq!(req.path, "http://localhost:3000/api/reminders/overdue");
    }
}
