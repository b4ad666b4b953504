//! Cache key definitions.
//!
//! A key is the resource family plus the exact, canonicalized query
//! parameters, so two different filters never share an entry.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::pipeline::ApiRequest;

/// Parameter naming a single record inside a family.
pub const RECORD_PARAM: &str = "id";

/// Resource family. Every entry of a family is invalidated together when any
/// member is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// Expense listings and single expense records.
    Expenses,
    /// Spending aggregation derived from expenses.
    ExpensesSummary,
    /// Budget listing.
    Budgets,
}

impl Resource {
    pub const COUNT: usize = 3;
    pub const ALL: [Resource; Self::COUNT] = [
        Resource::Expenses,
        Resource::ExpensesSummary,
        Resource::Budgets,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Expenses => "expenses",
            Resource::ExpensesSummary => "expenses-summary",
            Resource::Budgets => "budgets",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Resource::Expenses => 0,
            Resource::ExpensesSummary => 1,
            Resource::Budgets => 2,
        }
    }

    fn collection_path(self) -> &'static str {
        match self {
            Resource::Expenses => "expenses/",
            Resource::ExpensesSummary => "expenses/summary/",
            Resource::Budgets => "budgets/",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical query parameters: ordered by name, blank values dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters addressing one record of a family.
    pub fn record(id: impl fmt::Display) -> Self {
        Self::new().with(RECORD_PARAM, id.to_string())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_opt(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.insert(name, value);
        }
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim();
        if !value.is_empty() {
            self.0.insert(name.into(), value.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: Resource,
    pub params: QueryParams,
}

impl CacheKey {
    pub fn new(resource: Resource, params: QueryParams) -> Self {
        Self { resource, params }
    }

    /// Short stable identifier for logs.
    pub fn fingerprint(&self) -> u64 {
        hash_value(self)
    }

    /// The GET request that produces this entry.
    ///
    /// A record key (`id` parameter) maps to `<collection>/<id>/`; any other
    /// key maps to the collection path with the parameters as query string.
    pub fn request(&self) -> ApiRequest {
        match self.params.get(RECORD_PARAM) {
            Some(id) => ApiRequest::get(format!("{}{id}/", self.resource.collection_path()))
                .with_query(self.params.iter().filter(|(name, _)| *name != RECORD_PARAM)),
            None => ApiRequest::get(self.resource.collection_path()).with_query(self.params.iter()),
        }
    }
}

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:8000/api/").expect("base")
    }

    #[test]
    fn params_are_order_independent() {
        let a: QueryParams = [("category", "food"), ("offset", "0")].into_iter().collect();
        let b: QueryParams = [("offset", "0"), ("category", "food")].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(
            CacheKey::new(Resource::Expenses, a).fingerprint(),
            CacheKey::new(Resource::Expenses, b).fingerprint()
        );
    }

    #[test]
    fn blank_values_are_dropped() {
        let params = QueryParams::new()
            .with("category", "  ")
            .with_opt("month", None::<String>)
            .with("limit", "20");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("limit", "20")]);
    }

    #[test]
    fn different_filters_are_different_keys() {
        let food = CacheKey::new(
            Resource::Expenses,
            QueryParams::new().with("category", "food"),
        );
        let travel = CacheKey::new(
            Resource::Expenses,
            QueryParams::new().with("category", "travel"),
        );
        assert_ne!(food, travel);
        assert_ne!(
            food,
            CacheKey::new(Resource::Budgets, QueryParams::new().with("category", "food"))
        );
    }

    #[test]
    fn collection_key_builds_listing_request() {
        let key = CacheKey::new(
            Resource::Expenses,
            QueryParams::new().with("offset", "20").with("limit", "20"),
        );
        let url = key.request().url(&base()).expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/expenses/?limit=20&offset=20"
        );
    }

    #[test]
    fn record_key_builds_detail_request() {
        let key = CacheKey::new(Resource::Expenses, QueryParams::record("abc"));
        let url = key.request().url(&base()).expect("url");
        assert_eq!(url.as_str(), "http://localhost:8000/api/expenses/abc/");
    }

    #[test]
    fn summary_key_targets_summary_endpoint() {
        let key = CacheKey::new(
            Resource::ExpensesSummary,
            QueryParams::new().with("month", "2024-05"),
        );
        let url = key.request().url(&base()).expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/expenses/summary/?month=2024-05"
        );
    }
}
