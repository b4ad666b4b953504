#![deny(clippy::all)]

pub mod auth;
pub mod budgets;
pub mod expenses;
