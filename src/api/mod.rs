//! Typed resource APIs layered on the cache synchronizer.

mod auth;
mod budgets;
mod expenses;

pub use auth::AuthApi;
pub use budgets::BudgetsApi;
pub use expenses::{ExpenseFilters, ExpensesApi};
