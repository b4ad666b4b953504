//! Write-to-invalidation map.
//!
//! Every successful write consults this table to learn which resource
//! families it made stale.

use std::fmt;

use super::keys::Resource;

/// A state-changing operation issued through the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    CreateExpense,
    UpdateExpense,
    DeleteExpense,
    CreateBudget,
    UpdateBudget,
    DeleteBudget,
    UpdatePreferences,
}

impl Mutation {
    /// Families whose cached entries must be dropped once this write succeeds.
    pub fn invalidates(self) -> &'static [Resource] {
        match self {
            Mutation::CreateExpense | Mutation::UpdateExpense | Mutation::DeleteExpense => {
                &[Resource::Expenses, Resource::ExpensesSummary]
            }
            Mutation::CreateBudget | Mutation::UpdateBudget | Mutation::DeleteBudget => {
                &[Resource::Budgets]
            }
            // Preferences live on the identity, which is not cached here.
            Mutation::UpdatePreferences => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mutation::CreateExpense => "expense.create",
            Mutation::UpdateExpense => "expense.update",
            Mutation::DeleteExpense => "expense.delete",
            Mutation::CreateBudget => "budget.create",
            Mutation::UpdateBudget => "budget.update",
            Mutation::DeleteBudget => "budget.delete",
            Mutation::UpdatePreferences => "preferences.update",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
