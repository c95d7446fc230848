//! In-memory tables behind a single lock.
//!
//! Handlers take the lock once per request, so each read-modify-write is
//! atomic with respect to other requests. Ownership checks live here so
//! every handler answers "not yours" the same way: 404.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::model::{
    Expense, FuelEntry, Notification, NotificationKind, NotificationStatus, NotificationSummary, Reminder, ReminderAlert,
    User, Vehicle,
};

pub type Db = Arc<RwLock<Tables>>;

/// Rows keyed by an auto-incrementing id, iterated in insertion order.
#[derive(Debug)]
pub struct Table<T> {
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    /// Insert the row built for the next id and return a copy of it.
    pub fn insert_with(&mut self, build: impl FnOnce(u64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.values_mut()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.rows.retain(|_, row| keep(row));
    }
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: u64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Tables {
    pub users: Table<User>,
    pub sessions: HashMap<String, AuthSession>,
    pub vehicles: Table<Vehicle>,
    pub fuel: Table<FuelEntry>,
    pub expenses: Table<Expense>,
    pub reminders: Table<Reminder>,
    pub notifications: Table<Notification>,
}

impl Tables {
    pub fn new_db() -> Db {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// Resolve a token to its user while the session is still live.
    pub fn session_user(&self, token: &str, now: DateTime<Utc>) -> Option<u64> {
        self.sessions
            .get(token)
            .filter(|s| s.expires_at > now)
            .map(|s| s.user_id)
    }

    /// Drop every session that has expired by `now`; returns how many went.
    pub fn purge_expired_sessions(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before - self.sessions.len()
    }

    pub fn owned_vehicle(&self, user_id: u64, vehicle_id: u64) -> AppResult<&Vehicle> {
        self.vehicles
            .get(vehicle_id)
            .filter(|v| v.user_id == user_id)
            .ok_or(AppError::NotFound("vehicle"))
    }

    pub fn owned_vehicle_mut(&mut self, user_id: u64, vehicle_id: u64) -> AppResult<&mut Vehicle> {
        self.vehicles
            .get_mut(vehicle_id)
            .filter(|v| v.user_id == user_id)
            .ok_or(AppError::NotFound("vehicle"))
    }

    pub fn vehicles_of(&self, user_id: u64) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values().filter(move |v| v.user_id == user_id)
    }

    pub fn owned_fuel_entry(&self, user_id: u64, fuel_id: u64) -> AppResult<&FuelEntry> {
        self.fuel
            .get(fuel_id)
            .filter(|f| self.owns_vehicle(user_id, f.vehicle_id))
            .ok_or(AppError::NotFound("fuel entry"))
    }

    pub fn owned_expense(&self, user_id: u64, expense_id: u64) -> AppResult<&Expense> {
        self.expenses
            .get(expense_id)
            .filter(|e| self.owns_vehicle(user_id, e.vehicle_id))
            .ok_or(AppError::NotFound("expense"))
    }

    pub fn owned_reminder(&self, user_id: u64, reminder_id: u64) -> AppResult<&Reminder> {
        self.reminders
            .get(reminder_id)
            .filter(|r| self.owns_vehicle(user_id, r.vehicle_id))
            .ok_or(AppError::NotFound("reminder"))
    }

    pub fn owned_notification_mut(&mut self, user_id: u64, notification_id: u64) -> AppResult<&mut Notification> {
        self.notifications
            .get_mut(notification_id)
            .filter(|n| n.user_id == user_id)
            .ok_or(AppError::NotFound("notification"))
    }

    /// Delete a vehicle together with everything that hangs off it.
    pub fn remove_vehicle(&mut self, vehicle_id: u64) -> Option<Vehicle> {
        let vehicle = self.vehicles.remove(vehicle_id)?;
        self.fuel.retain(|f| f.vehicle_id != vehicle_id);
        self.expenses.retain(|e| e.vehicle_id != vehicle_id);
        self.reminders.retain(|r| r.vehicle_id != vehicle_id);
        self.notifications.retain(|n| n.vehicle_id != vehicle_id);
        Some(vehicle)
    }

    pub fn remove_reminder(&mut self, reminder_id: u64) -> Option<Reminder> {
        let reminder = self.reminders.remove(reminder_id)?;
        self.notifications.retain(|n| n.reminder_id != reminder_id);
        Some(reminder)
    }

    /// Put an alert in the owner's inbox unless one of the same kind was
    /// already raised for that reminder. Returns the notifications created.
    pub fn record_alerts(&mut self, user_id: u64, alerts: &[ReminderAlert], now: DateTime<Utc>) -> Vec<Notification> {
        let mut created = Vec::new();
        for alert in alerts {
            let Some(kind) = NotificationKind::for_status(alert.status) else {
                continue;
            };
            if !self.reminders.get(alert.reminder_id).is_some_and(Reminder::is_pending) {
                continue;
            }
            let seen = self
                .notifications
                .values()
                .any(|n| n.reminder_id == alert.reminder_id && n.kind == kind);
            if seen {
                continue;
            }
            let unit = self
                .vehicles
                .get(alert.vehicle_id)
                .map_or_else(|| "mi".to_string(), |v| v.mileage_unit.clone());
            let (title, message) = describe(alert, kind, &unit);
            created.push(self.notifications.insert_with(|id| Notification {
                id,
                user_id,
                vehicle_id: alert.vehicle_id,
                reminder_id: alert.reminder_id,
                kind,
                title,
                message,
                status: NotificationStatus::Unread,
                created_at: now,
                dismissed_at: None,
            }));
        }
        created
    }

    /// Dismiss whatever is still open for a reminder, e.g. once it is serviced.
    pub fn dismiss_reminder_notifications(&mut self, reminder_id: u64, now: DateTime<Utc>) {
        for n in self.notifications.values_mut() {
            if n.reminder_id == reminder_id && n.status != NotificationStatus::Dismissed {
                n.status = NotificationStatus::Dismissed;
                n.dismissed_at = Some(now);
            }
        }
    }

    /// Unread notifications, newest first.
    pub fn unread_notifications(&self, user_id: u64) -> Vec<Notification> {
        let mut unread: Vec<Notification> = self
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && n.status == NotificationStatus::Unread)
            .cloned()
            .collect();
        unread.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        unread
    }

    pub fn notification_summary(&self, user_id: u64) -> NotificationSummary {
        let mut summary = NotificationSummary::default();
        for n in self.notifications.values().filter(|n| n.user_id == user_id) {
            if n.status == NotificationStatus::Unread {
                summary.unread_count += 1;
            }
            if n.status == NotificationStatus::Dismissed {
                continue;
            }
            match n.kind {
                NotificationKind::ReminderOverdue => summary.overdue_count += 1,
                NotificationKind::ReminderDue => summary.upcoming_count += 1,
            }
        }
        summary
    }

    fn owns_vehicle(&self, user_id: u64, vehicle_id: u64) -> bool {
        self.vehicles.get(vehicle_id).is_some_and(|v| v.user_id == user_id)
    }
}

fn describe(alert: &ReminderAlert, kind: NotificationKind, unit: &str) -> (String, String) {
    let title = match kind {
        NotificationKind::ReminderOverdue => format!("{} - OVERDUE", alert.kind),
        NotificationKind::ReminderDue => format!("{} - DUE SOON", alert.kind),
    };
    let mut parts = Vec::new();
    if let Some(left) = alert.distance_remaining {
        parts.push(if left > 0.0 {
            format!("due in {left:.0} {unit}")
        } else if left < 0.0 {
            format!("{:.0} {unit} past due", -left)
        } else {
            "due now".to_string()
        });
    }
    if let Some(left) = alert.days_remaining {
        parts.push(match left {
            1.. => format!("due in {left} days"),
            0 => "due today".to_string(),
            _ => format!("{} days past due", -left),
        });
    }
    (title, format!("{}: {}", alert.vehicle_name, parts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReminderStatus;
    use chrono::Duration;

    fn vehicle(id: u64, user_id: u64) -> Vehicle {
        Vehicle {
            id,
            user_id,
            make: "Mazda".to_string(),
            model: "MX-5".to_string(),
            year: 1991,
            odometer: 0.0,
            mileage_unit: "mi".to_string(),
            fuel_type: String::new(),
        }
    }

    #[test]
    fn ids_increase_from_one() {
        let mut table: Table<Vehicle> = Table::default();
        let a = table.insert_with(|id| vehicle(id, 1));
        let b = table.insert_with(|id| vehicle(id, 1));
        assert_eq!((a.id, b.id), (1, 2));
        table.remove(2);
        assert_eq!(table.insert_with(|id| vehicle(id, 1)).id, 3);
    }

    #[test]
    fn other_users_vehicles_are_not_found() {
        let mut tables = Tables::default();
        let v = tables.vehicles.insert_with(|id| vehicle(id, 1));
        assert!(tables.owned_vehicle(1, v.id).is_ok());
        assert!(matches!(tables.owned_vehicle(2, v.id), Err(AppError::NotFound("vehicle"))));
    }

    fn session(user_id: u64, expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession { user_id, expires_at }
    }

    #[test]
    fn expired_sessions_stop_resolving() {
        let mut tables = Tables::default();
        let now = Utc::now();
        tables.sessions.insert("t".to_string(), session(1, now + Duration::hours(1)));
        assert_eq!(tables.session_user("t", now), Some(1));
        assert_eq!(tables.session_user("t", now + Duration::hours(1)), None);
        assert_eq!(tables.session_user("missing", now), None);
    }

    #[test]
    fn purge_drops_only_expired_sessions() {
        let mut tables = Tables::default();
        let now = Utc::now();
        tables.sessions.insert("old".to_string(), session(1, now - Duration::hours(1)));
        tables.sessions.insert("edge".to_string(), session(1, now));
        tables.sessions.insert("live".to_string(), session(2, now + Duration::hours(1)));

        assert_eq!(tables.purge_expired_sessions(now), 2);
        assert_eq!(tables.sessions.len(), 1);
        assert_eq!(tables.session_user("live", now), Some(2));
        assert_eq!(tables.purge_expired_sessions(now), 0);
    }

    fn reminder(id: u64, vehicle_id: u64) -> Reminder {
        Reminder {
            id,
            vehicle_id,
            kind: "Oil change".to_string(),
            due_date: None,
            due_odometer: Some(1000.0),
            interval_days: None,
            interval_distance: None,
            completed_at: None,
            completed_odometer: None,
        }
    }

    /// One Mazda owned by user 1 with `count` pending reminders.
    fn garage(count: usize) -> Tables {
        let mut tables = Tables::default();
        let v = tables.vehicles.insert_with(|id| vehicle(id, 1));
        for _ in 0..count {
            tables.reminders.insert_with(|id| reminder(id, v.id));
        }
        tables
    }

    fn alert(reminder_id: u64, status: ReminderStatus, distance: Option<f64>, days: Option<i64>) -> ReminderAlert {
        ReminderAlert {
            reminder_id,
            vehicle_id: 1,
            vehicle_name: "1991 Mazda MX-5".to_string(),
            kind: "Oil change".to_string(),
            status,
            distance_remaining: distance,
            days_remaining: days,
        }
    }

    #[test]
    fn alerts_are_recorded_once_per_kind() {
        let mut tables = garage(1);
        let now = Utc::now();

        let due = [alert(1, ReminderStatus::Due, Some(300.0), None)];
        let first = tables.record_alerts(1, &due, now);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "Oil change - DUE SOON");
        assert_eq!(first[0].message, "1991 Mazda MX-5: due in 300 mi");
        assert!(tables.record_alerts(1, &due, now).is_empty());

        let overdue = [alert(1, ReminderStatus::Overdue, Some(-200.0), Some(-3))];
        let second = tables.record_alerts(1, &overdue, now + Duration::hours(1));
        assert_eq!(second[0].kind, NotificationKind::ReminderOverdue);
        assert_eq!(second[0].message, "1991 Mazda MX-5: 200 mi past due, 3 days past due");

        let unread = tables.unread_notifications(1);
        assert_eq!(unread.iter().map(|n| n.id).collect::<Vec<_>>(), [second[0].id, first[0].id]);
        assert!(tables.unread_notifications(2).is_empty());
    }

    #[test]
    fn only_pending_reminders_notify() {
        let mut tables = garage(2);
        tables.reminders.get_mut(2).unwrap().completed_at = Some(Utc::now().date_naive());
        let created = tables.record_alerts(
            1,
            &[
                alert(1, ReminderStatus::Upcoming, Some(5000.0), None),
                alert(2, ReminderStatus::Overdue, Some(-5.0), None),
                alert(9, ReminderStatus::Overdue, Some(-5.0), None),
            ],
            Utc::now(),
        );
        assert!(created.is_empty());
    }

    #[test]
    fn summary_counts_open_notifications() {
        let mut tables = garage(3);
        let now = Utc::now();
        tables.record_alerts(
            1,
            &[
                alert(1, ReminderStatus::Overdue, None, Some(0)),
                alert(2, ReminderStatus::Due, None, Some(3)),
                alert(3, ReminderStatus::Due, None, Some(5)),
            ],
            now,
        );
        tables.owned_notification_mut(1, 2).unwrap().status = NotificationStatus::Read;
        tables.dismiss_reminder_notifications(3, now);

        let summary = tables.notification_summary(1);
        assert_eq!(
            summary,
            NotificationSummary {
                unread_count: 1,
                overdue_count: 1,
                upcoming_count: 1,
            }
        );
        assert_eq!(tables.notifications.get(3).unwrap().dismissed_at, Some(now));
        assert!(matches!(tables.owned_notification_mut(2, 1), Err(AppError::NotFound("notification"))));
    }

    #[test]
    fn removing_a_vehicle_cascades() {
        let mut tables = garage(1);
        tables.record_alerts(1, &[alert(1, ReminderStatus::Overdue, Some(-1.0), None)], Utc::now());
        tables.remove_vehicle(1).unwrap();
        assert_eq!(tables.reminders.values().count(), 0);
        assert_eq!(tables.notifications.values().count(), 0);
    }

    #[test]
    fn removing_a_reminder_drops_its_notifications() {
        let mut tables = garage(2);
        let now = Utc::now();
        tables.record_alerts(
            1,
            &[
                alert(1, ReminderStatus::Overdue, Some(-1.0), None),
                alert(2, ReminderStatus::Due, Some(10.0), None),
            ],
            now,
        );
        tables.remove_reminder(1).unwrap();
        let left: Vec<u64> = tables.notifications.values().map(|n| n.reminder_id).collect();
        assert_eq!(left, [2]);
    }
}
