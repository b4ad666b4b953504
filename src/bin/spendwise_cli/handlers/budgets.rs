#![deny(clippy::all)]

use serde_json::json;
use spendwise::Client;
use spendwise::config::BudgetsCommand;
use spendwise::types::BudgetInput;

use crate::error::CliError;
use crate::print::print_json;

pub async fn handle(client: &Client, cmd: BudgetsCommand) -> Result<(), CliError> {
    let api = client.budgets();
    match cmd {
        BudgetsCommand::List => print_json(&api.list().await?),
        BudgetsCommand::Create { category, amount } => {
            print_json(&api.create(&BudgetInput { category, amount }).await?)
        }
        BudgetsCommand::Update {
            id,
            category,
            amount,
        } => print_json(&api.update(id, &BudgetInput { category, amount }).await?),
        BudgetsCommand::Delete { id } => {
            api.delete(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}
