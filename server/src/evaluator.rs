//! Maintenance reminder classification.
//!
//! A pending reminder has an odometer threshold, a calendar threshold, or
//! both. Each threshold is classified on its own and the reminder takes the
//! more severe result, so whichever threshold is crossed first decides.
//! Reaching a threshold exactly counts as crossing it.

use chrono::NaiveDate;

use crate::config::DueWindow;
use crate::model::{Reminder, ReminderAlert, ReminderStatus, Vehicle};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub status: ReminderStatus,
    /// `due_odometer - odometer`; negative once passed.
    pub distance_remaining: Option<f64>,
    /// Whole days from today to `due_date`; zero or negative once passed.
    pub days_remaining: Option<i64>,
}

/// Classify one reminder. Completed reminders are never classified.
pub fn evaluate(reminder: &Reminder, odometer: f64, today: NaiveDate, window: &DueWindow) -> Option<Evaluation> {
    if !reminder.is_pending() {
        return None;
    }

    let distance_remaining = reminder.due_odometer.map(|due| due - odometer);
    let days_remaining = reminder.due_date.map(|due| (due - today).num_days());

    let by_distance = distance_remaining.map(|left| {
        if left <= 0.0 {
            ReminderStatus::Overdue
        } else if left < window.distance {
            ReminderStatus::Due
        } else {
            ReminderStatus::Upcoming
        }
    });
    let by_date = days_remaining.map(|left| {
        if left <= 0 {
            ReminderStatus::Overdue
        } else if left < window.days {
            ReminderStatus::Due
        } else {
            ReminderStatus::Upcoming
        }
    });

    let status = by_distance.max(by_date).unwrap_or(ReminderStatus::Upcoming);
    Some(Evaluation {
        status,
        distance_remaining,
        days_remaining,
    })
}

/// Alerts for every reminder of `vehicle` that is due or overdue.
pub fn vehicle_alerts<'a>(
    vehicle: &Vehicle,
    reminders: impl IntoIterator<Item = &'a Reminder>,
    today: NaiveDate,
    window: &DueWindow,
) -> Vec<ReminderAlert> {
    reminders
        .into_iter()
        .filter(|r| r.vehicle_id == vehicle.id)
        .filter_map(|r| {
            let eval = evaluate(r, vehicle.odometer, today, window)?;
            (eval.status != ReminderStatus::Upcoming).then(|| ReminderAlert {
                reminder_id: r.id,
                vehicle_id: vehicle.id,
                vehicle_name: vehicle.display_name(),
                kind: r.kind.clone(),
                status: eval.status,
                distance_remaining: eval.distance_remaining,
                days_remaining: eval.days_remaining,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reminder(due_odometer: Option<f64>, due_date: Option<NaiveDate>) -> Reminder {
        Reminder {
            id: 1,
            vehicle_id: 1,
            kind: "Oil change".to_string(),
            due_date,
            due_odometer,
            interval_days: None,
            interval_distance: None,
            completed_at: None,
            completed_odometer: None,
        }
    }

    fn status(r: &Reminder, odometer: f64, today: NaiveDate) -> ReminderStatus {
        evaluate(r, odometer, today, &DueWindow::default()).unwrap().status
    }

    #[test]
    fn odometer_thresholds() {
        let today = day(2024, 1, 1);
        let r = reminder(Some(51000.0), None);
        assert_eq!(status(&r, 50000.0, today), ReminderStatus::Upcoming);
        assert_eq!(status(&r, 50600.0, today), ReminderStatus::Due);
        assert_eq!(status(&r, 51000.0, today), ReminderStatus::Overdue);
        assert_eq!(status(&r, 51200.0, today), ReminderStatus::Overdue);
    }

    #[test]
    fn date_thresholds() {
        let r = reminder(None, Some(day(2024, 6, 15)));
        assert_eq!(status(&r, 0.0, day(2024, 6, 1)), ReminderStatus::Upcoming);
        assert_eq!(status(&r, 0.0, day(2024, 6, 10)), ReminderStatus::Due);
        assert_eq!(status(&r, 0.0, day(2024, 6, 15)), ReminderStatus::Overdue);
        assert_eq!(status(&r, 0.0, day(2024, 7, 1)), ReminderStatus::Overdue);
    }

    #[test]
    fn first_crossed_threshold_wins() {
        let r = reminder(Some(60000.0), Some(day(2024, 6, 15)));
        assert_eq!(status(&r, 50000.0, day(2024, 6, 20)), ReminderStatus::Overdue);
        assert_eq!(status(&r, 59900.0, day(2024, 1, 1)), ReminderStatus::Due);
        assert_eq!(status(&r, 50000.0, day(2024, 1, 1)), ReminderStatus::Upcoming);
    }

    #[test]
    fn remaining_values_are_reported() {
        let r = reminder(Some(51000.0), Some(day(2024, 1, 11)));
        let eval = evaluate(&r, 51200.0, day(2024, 1, 1), &DueWindow::default()).unwrap();
        assert_eq!(eval.distance_remaining, Some(-200.0));
        assert_eq!(eval.days_remaining, Some(10));
    }

    #[test]
    fn completed_reminders_are_not_classified() {
        let mut r = reminder(Some(51000.0), None);
        r.completed_at = Some(day(2024, 1, 1));
        assert!(evaluate(&r, 99999.0, day(2024, 1, 1), &DueWindow::default()).is_none());
    }

    #[test]
    fn window_is_configurable() {
        let r = reminder(Some(51000.0), None);
        let wide = DueWindow { distance: 2000.0, days: 7 };
        let eval = evaluate(&r, 49500.0, day(2024, 1, 1), &wide).unwrap();
        assert_eq!(eval.status, ReminderStatus::Due);
    }

    #[test]
    fn alerts_skip_upcoming_and_other_vehicles() {
        let vehicle = Vehicle {
            id: 1,
            user_id: 1,
            make: "Mazda".to_string(),
            model: "MX-5".to_string(),
            year: 1991,
            odometer: 51200.0,
            mileage_unit: "mi".to_string(),
            fuel_type: String::new(),
        };
        let overdue = reminder(Some(51000.0), None);
        let upcoming = Reminder {
            id: 2,
            ..reminder(Some(90000.0), None)
        };
        let elsewhere = Reminder {
            id: 3,
            vehicle_id: 2,
            ..reminder(Some(1.0), None)
        };
        let alerts = vehicle_alerts(&vehicle, [&overdue, &upcoming, &elsewhere], day(2024, 1, 1), &DueWindow::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reminder_id, 1);
        assert_eq!(alerts[0].vehicle_name, "1991 Mazda MX-5");
        assert_eq!(alerts[0].status, ReminderStatus::Overdue);
    }
}
