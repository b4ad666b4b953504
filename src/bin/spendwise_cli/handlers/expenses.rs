#![deny(clippy::all)]

use serde_json::json;
use spendwise::Client;
use spendwise::api::ExpenseFilters;
use spendwise::config::ExpensesCommand;
use spendwise::types::{ExpensePatch, NewExpense};

use crate::error::CliError;
use crate::io::write_output;
use crate::print::print_json;

pub async fn handle(client: &Client, cmd: ExpensesCommand) -> Result<(), CliError> {
    let api = client.expenses();
    match cmd {
        ExpensesCommand::List {
            page,
            from_date,
            to_date,
            category,
            min_amount,
            max_amount,
        } => {
            let filters = ExpenseFilters {
                page,
                from_date,
                to_date,
                category,
                min_amount,
                max_amount,
            };
            print_json(&api.list(&filters).await?)
        }
        ExpensesCommand::Get { id } => print_json(&api.get(id).await?),
        ExpensesCommand::Create {
            title,
            amount,
            currency,
            category,
            date,
            notes,
        } => {
            let expense = NewExpense {
                title,
                amount,
                currency,
                category,
                expense_date: date,
                notes,
            };
            print_json(&api.create(&expense).await?)
        }
        ExpensesCommand::Update {
            id,
            title,
            amount,
            currency,
            category,
            date,
            notes,
        } => {
            let patch = ExpensePatch {
                title,
                amount,
                currency,
                category,
                expense_date: date,
                notes,
            };
            print_json(&api.update(id, &patch).await?)
        }
        ExpensesCommand::Delete { id } => {
            api.delete(id).await?;
            print_json(&json!({ "deleted": id }))
        }
        ExpensesCommand::Summary { month } => print_json(&api.summary(month.as_deref()).await?),
        ExpensesCommand::Export { output } => {
            let csv = api.export().await?;
            write_output(output.as_deref(), &csv)
        }
    }
}
