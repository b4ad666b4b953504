use std::num::NonZeroU32;

use bytes::Bytes;
use spendwise_api_types::{Expense, ExpensePatch, ExpenseSummary, NewExpense, Page};
use uuid::Uuid;

use crate::cache::{CacheSynchronizer, Mutation, QueryParams, QueryState, Resource};
use crate::pipeline::{ApiError, ApiRequest};

const EXPENSES_PATH: &str = "expenses/";
const EXPORT_PATH: &str = "expenses/export/";

/// Listing filters. `page` is 1-based; blank filters are omitted from the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseFilters {
    pub page: u32,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub category: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
}

impl Default for ExpenseFilters {
    fn default() -> Self {
        Self {
            page: 1,
            from_date: None,
            to_date: None,
            category: None,
            min_amount: None,
            max_amount: None,
        }
    }
}

impl ExpenseFilters {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Same filters, another page.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Query parameters for a page of `page_size` items.
    pub fn params(&self, page_size: NonZeroU32) -> QueryParams {
        let page = self.page.max(1);
        let offset = u64::from(page - 1) * u64::from(page_size.get());
        QueryParams::new()
            .with("offset", offset.to_string())
            .with("limit", page_size.to_string())
            .with_opt("from_date", self.from_date.clone())
            .with_opt("to_date", self.to_date.clone())
            .with_opt("category", self.category.clone())
            .with_opt("min_amount", self.min_amount.clone())
            .with_opt("max_amount", self.max_amount.clone())
    }
}

pub struct ExpensesApi<'a> {
    sync: &'a CacheSynchronizer,
    page_size: NonZeroU32,
}

impl<'a> ExpensesApi<'a> {
    pub(crate) fn new(sync: &'a CacheSynchronizer, page_size: NonZeroU32) -> Self {
        Self { sync, page_size }
    }

    pub fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    pub async fn list(&self, filters: &ExpenseFilters) -> Result<Page<Expense>, ApiError> {
        self.sync
            .read_as(Resource::Expenses, filters.params(self.page_size))
            .await
    }

    /// Render state for `filters`, using `previous` as placeholder while the
    /// requested page has not arrived yet.
    pub fn snapshot(
        &self,
        filters: &ExpenseFilters,
        previous: Option<&ExpenseFilters>,
    ) -> QueryState {
        let placeholder = previous.map(|prev| prev.params(self.page_size));
        self.sync.snapshot(
            Resource::Expenses,
            &filters.params(self.page_size),
            placeholder.as_ref(),
        )
    }

    pub async fn get(&self, id: Uuid) -> Result<Expense, ApiError> {
        self.sync
            .read_as(Resource::Expenses, QueryParams::record(id))
            .await
    }

    pub async fn create(&self, expense: &NewExpense) -> Result<Expense, ApiError> {
        let request = ApiRequest::post(EXPENSES_PATH).with_json(expense)?;
        self.sync
            .write(Mutation::CreateExpense, &request)
            .await?
            .json()
    }

    pub async fn update(&self, id: Uuid, patch: &ExpensePatch) -> Result<Expense, ApiError> {
        let request = ApiRequest::patch(record_path(id)).with_json(patch)?;
        self.sync
            .write(Mutation::UpdateExpense, &request)
            .await?
            .json()
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.sync
            .write(Mutation::DeleteExpense, &ApiRequest::delete(record_path(id)))
            .await?;
        Ok(())
    }

    /// Aggregation for one month (`YYYY-MM`) or all time.
    pub async fn summary(&self, month: Option<&str>) -> Result<ExpenseSummary, ApiError> {
        self.sync
            .read_as(
                Resource::ExpensesSummary,
                QueryParams::new().with_opt("month", month),
            )
            .await
    }

    /// CSV export. Never cached.
    pub async fn export(&self) -> Result<Bytes, ApiError> {
        Ok(self
            .sync
            .send(&ApiRequest::get(EXPORT_PATH))
            .await?
            .into_bytes())
    }
}

fn record_path(id: Uuid) -> String {
    format!("{EXPENSES_PATH}{id}/")
}
