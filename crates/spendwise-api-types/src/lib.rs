//! Request and response shapes shared by the Spendwise client library and CLI.
//!
//! Field names follow the backend's JSON contract (snake_case). Monetary
//! amounts are transported as decimal strings and are never parsed into
//! floating point on the client.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// UI colour scheme stored on the user's profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// The opposite scheme, used by "toggle theme" actions.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme `{other}` (expected light|dark)")),
        }
    }
}

/// Authenticated user profile as returned by `auth/me/` and `auth/login/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub theme_preference: Theme,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_joined: Option<OffsetDateTime>,
}

impl Identity {
    /// Full name when the profile has one, otherwise the email address.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

/// Credential pair plus profile issued by `auth/login/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// Body of `auth/token/refresh/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Response of `auth/token/refresh/`. Servers that rotate refresh tokens
/// also return a new `refresh` value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Partial profile update for `auth/preferences/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_preference: Option<Theme>,
}

/// Free-form acknowledgement returned by signup and email verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub title: String,
    pub amount: String,
    pub currency: String,
    pub category: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub expense_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: String,
    pub currency: String,
    pub category: String,
    pub expense_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update for `expenses/{id}/`; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpensePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Offset-paginated listing (`count` is the total across all pages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Number of pages needed to show `count` items at `page_size` per page.
    pub fn total_pages(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.count.div_ceil(u64::from(page_size))
    }

    /// Whether a 1-based `page` has a successor.
    pub fn has_next(&self, page: u32, page_size: u32) -> bool {
        u64::from(page) < self.total_pages(page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total_spend: f64,
    pub currency: String,
    pub count: u64,
    #[serde(default)]
    pub breakdown: Vec<CategoryTotal>,
}

impl ExpenseSummary {
    /// Category with the largest total, as shown on the dashboard.
    pub fn top_category(&self) -> Option<&CategoryTotal> {
        self.breakdown
            .iter()
            .max_by(|a, b| a.total.total_cmp(&b.total))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub category: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetInput {
    pub category: String,
    pub amount: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_deserializes_backend_payload() {
        let json = r#"{
            "id": "7d9f0c1e-2a6b-4e59-9f55-1c1d4c6a0b11",
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "is_email_verified": true,
            "theme_preference": "dark",
            "date_joined": "2024-03-01T09:30:00.123456Z"
        }"#;
        let identity: Identity = serde_json::from_str(json).expect("identity");
        assert_eq!(identity.theme_preference, Theme::Dark);
        assert_eq!(identity.display_name(), "Ada Lovelace");
        assert!(identity.date_joined.is_some());
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let identity: Identity =
            serde_json::from_str(r#"{"id":"1","email":"x@example.com"}"#).expect("identity");
        assert_eq!(identity.display_name(), "x@example.com");
        assert_eq!(identity.theme_preference, Theme::Light);
    }

    #[test]
    fn theme_parses_case_insensitively() {
        assert_eq!("Dark".parse::<Theme>(), Ok(Theme::Dark));
        assert!("blue".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    #[test]
    fn page_arithmetic() {
        let page: Page<u8> = Page {
            count: 41,
            results: vec![],
        };
        assert_eq!(page.total_pages(20), 3);
        assert!(page.has_next(2, 20));
        assert!(!page.has_next(3, 20));
        assert_eq!(page.total_pages(0), 0);
    }

    #[test]
    fn expense_patch_skips_absent_fields() {
        let patch = ExpensePatch {
            amount: Some("12.50".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).expect("json");
        assert_eq!(json, serde_json::json!({"amount": "12.50"}));
        assert!(ExpensePatch::default().is_empty());
    }

    #[test]
    fn summary_top_category_picks_largest_total() {
        let summary = ExpenseSummary {
            total_spend: 30.0,
            currency: "USD".into(),
            count: 3,
            breakdown: vec![
                CategoryTotal {
                    category: "food".into(),
                    total: 10.0,
                    count: 2,
                },
                CategoryTotal {
                    category: "rent".into(),
                    total: 20.0,
                    count: 1,
                },
            ],
        };
        assert_eq!(
            summary.top_category().map(|c| c.category.as_str()),
            Some("rent")
        );
    }
}
