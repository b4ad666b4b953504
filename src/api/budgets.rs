use serde::Deserialize;
use spendwise_api_types::{Budget, BudgetInput, Page};
use uuid::Uuid;

use crate::cache::{CacheSynchronizer, Mutation, QueryParams, Resource};
use crate::pipeline::{ApiError, ApiRequest};

const BUDGETS_PATH: &str = "budgets/";

/// The listing comes back as a bare array; paginated deployments wrap it.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Plain(Vec<Budget>),
    Paged(Page<Budget>),
}

pub struct BudgetsApi<'a> {
    sync: &'a CacheSynchronizer,
}

impl<'a> BudgetsApi<'a> {
    pub(crate) fn new(sync: &'a CacheSynchronizer) -> Self {
        Self { sync }
    }

    pub async fn list(&self) -> Result<Vec<Budget>, ApiError> {
        let listing: Listing = self
            .sync
            .read_as(Resource::Budgets, QueryParams::new())
            .await?;
        Ok(match listing {
            Listing::Plain(budgets) => budgets,
            Listing::Paged(page) => page.results,
        })
    }

    pub async fn create(&self, budget: &BudgetInput) -> Result<Budget, ApiError> {
        let request = ApiRequest::post(BUDGETS_PATH).with_json(budget)?;
        self.sync
            .write(Mutation::CreateBudget, &request)
            .await?
            .json()
    }

    pub async fn update(&self, id: Uuid, budget: &BudgetInput) -> Result<Budget, ApiError> {
        let request = ApiRequest::patch(format!("{BUDGETS_PATH}{id}/")).with_json(budget)?;
        self.sync
            .write(Mutation::UpdateBudget, &request)
            .await?
            .json()
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let request = ApiRequest::delete(format!("{BUDGETS_PATH}{id}/"));
        self.sync.write(Mutation::DeleteBudget, &request).await?;
        Ok(())
    }
}
