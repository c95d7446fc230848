use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::{CategoryTotal, CreateExpense, Expense, ExpenseStats, UpdateExpense};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(vehicle_id): Path<u64>,
) -> AppResult<Json<Vec<Expense>>> {
    let tables = state.db.read().await;
    tables.owned_vehicle(user_id, vehicle_id)?;
    let mut expenses: Vec<Expense> = tables
        .expenses
        .values()
        .filter(|e| e.vehicle_id == vehicle_id)
        .cloned()
        .collect();
    expenses.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(Json(expenses))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(vehicle_id): Path<u64>,
    Json(input): Json<CreateExpense>,
) -> AppResult<(StatusCode, Json<Expense>)> {
    let category = check_category(input.category)?;
    check_amount(input.amount)?;

    let mut tables = state.db.write().await;
    tables.owned_vehicle(user_id, vehicle_id)?;
    let expense = tables.expenses.insert_with(|id| Expense {
        id,
        vehicle_id,
        category,
        amount: input.amount,
        date: input.date,
        notes: input.notes.unwrap_or_default(),
    });
    info!(expense_id = expense.id, vehicle_id, "recorded expense");
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
    Json(input): Json<UpdateExpense>,
) -> AppResult<Json<Expense>> {
    let category = input.category.map(check_category).transpose()?;
    if let Some(amount) = input.amount {
        check_amount(amount)?;
    }

    let mut tables = state.db.write().await;
    tables.owned_expense(user_id, id)?;
    let expense = tables.expenses.get_mut(id).ok_or(AppError::NotFound("expense"))?;
    if let Some(category) = category {
        expense.category = category;
    }
    if let Some(amount) = input.amount {
        expense.amount = amount;
    }
    if let Some(date) = input.date {
        expense.date = date;
    }
    if let Some(notes) = input.notes {
        expense.notes = notes;
    }
    info!(expense_id = id, user_id, "updated expense");
    Ok(Json(expense.clone()))
}

pub async fn stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(vehicle_id): Path<u64>,
) -> AppResult<Json<ExpenseStats>> {
    let tables = state.db.read().await;
    tables.owned_vehicle(user_id, vehicle_id)?;
    let expenses: Vec<&Expense> = tables.expenses.values().filter(|e| e.vehicle_id == vehicle_id).collect();
    Ok(Json(expense_stats(&expenses)))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    let mut tables = state.db.write().await;
    tables.owned_expense(user_id, id)?;
    tables.expenses.remove(id);
    info!(expense_id = id, user_id, "deleted expense");
    Ok(StatusCode::NO_CONTENT)
}

fn check_category(category: String) -> AppResult<String> {
    let category = category.trim();
    if category.is_empty() {
        return Err(AppError::BadRequest("category is required".to_string()));
    }
    Ok(category.to_string())
}

fn check_amount(amount: f64) -> AppResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::BadRequest("amount must be greater than zero".to_string()));
    }
    Ok(())
}

/// Grand total plus one line per category, categories in name order.
pub fn expense_stats(expenses: &[&Expense]) -> ExpenseStats {
    let mut by_category: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for e in expenses {
        let slot = by_category.entry(e.category.as_str()).or_default();
        slot.0 += e.amount;
        slot.1 += 1;
    }
    ExpenseStats {
        total_cost: expenses.iter().map(|e| e.amount).sum(),
        expense_count: expenses.len(),
        categories: by_category
            .into_iter()
            .map(|(category, (total, count))| CategoryTotal {
                category: category.to_string(),
                total,
                count,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expense(category: &str, amount: f64) -> Expense {
        Expense {
            id: 0,
            vehicle_id: 1,
            category: category.to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            notes: String::new(),
        }
    }

    #[test]
    fn groups_by_category() {
        let tyres = expense("tyres", 400.0);
        let wash = expense("cleaning", 15.0);
        let wash_again = expense("cleaning", 20.0);
        let stats = expense_stats(&[&tyres, &wash, &wash_again]);

        assert_eq!(stats.total_cost, 435.0);
        assert_eq!(stats.expense_count, 3);
        assert_eq!(stats.categories.len(), 2);
        assert_eq!(stats.categories[0].category, "cleaning");
        assert_eq!(stats.categories[0].total, 35.0);
        assert_eq!(stats.categories[0].count, 2);
    }

    #[test]
    fn no_expenses_is_all_zero() {
        assert_eq!(expense_stats(&[]), ExpenseStats::default());
    }
}
