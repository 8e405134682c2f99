//! Pagination and sorting utilities for list endpoints.
//!
//! Supports both offset-based (`limit` + `offset`) and page-based (`limit` +
//! `page`) pagination. When `page` is provided it takes precedence over
//! `offset`. `limit` is clamped to 1..=100 and defaults to 10.
//!
//! # Example
//!
//! ```ignore
//! async fn list_classes(
//!     Query(params): Query<PaginationParams>,
//! ) -> Result<Json<PaginatedClassesResponse>, AppError> {
//!     let classes = fetch_classes(params.limit(), params.offset()).await?;
//!     let total = count_classes().await?;
//!     Ok(Json(PaginatedClassesResponse { data: classes, meta: params.meta(total) }))
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// Query parameters arrive as strings, and empty strings mean "not set".
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Metadata about a paginated response.
///
/// ```json
/// { "total": 100, "limit": 10, "offset": 20, "page": 3, "has_more": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Maximum items per page (the limit that was applied)
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Whether there are more items after this page
    pub has_more: bool,
}

#[derive(Debug, Clone, Hash, Deserialize)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: Some(10),
            offset: Some(0),
            page: None,
        }
    }
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        if let Some(page) = self.page {
            (page.max(1) - 1).saturating_mul(self.limit())
        } else {
            self.offset.unwrap_or(0).max(0)
        }
    }

    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }

    /// Builds the response metadata for a query that matched `total` rows.
    pub fn meta(&self, total: i64) -> PaginationMeta {
        let limit = self.limit();
        let offset = self.offset();
        PaginationMeta {
            total,
            limit,
            offset: Some(offset),
            page: self.page(),
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params_default() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.page(), None);
    }

    #[test]
    fn test_pagination_params_limit_boundaries() {
        let low = PaginationParams {
            limit: Some(0),
            offset: None,
            page: None,
        };
        let high = PaginationParams {
            limit: Some(150),
            offset: None,
            page: None,
        };
        assert_eq!(low.limit(), 1);
        assert_eq!(high.limit(), 100);
    }

    #[test]
    fn test_page_takes_precedence_over_offset() {
        let params = PaginationParams {
            limit: Some(20),
            offset: Some(5),
            page: Some(3),
        };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_negative_offset_clamped() {
        let params = PaginationParams {
            limit: None,
            offset: Some(-10),
            page: None,
        };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_meta_has_more() {
        let params = PaginationParams {
            limit: Some(10),
            offset: Some(0),
            page: None,
        };
        assert!(params.meta(25).has_more);
        assert!(!params.meta(10).has_more);
        assert_eq!(params.meta(0).total, 0);
    }

    #[test]
    fn test_huge_page_and_offset_saturate() {
        let json = r#"{"limit":"100","page":"9223372036854775807"}"#;
        let params: PaginationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.offset(), i64::MAX);
        assert!(!params.meta(5).has_more);

        let json = r#"{"offset":"9223372036854775807"}"#;
        let params: PaginationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.offset(), i64::MAX);
        let meta = params.meta(5);
        assert_eq!(meta.offset, Some(i64::MAX));
        assert!(!meta.has_more);
    }

    #[test]
    fn test_pagination_params_deserialize_empty_strings() {
        let json = r#"{"limit":"","offset":"","page":""}"#;
        let params: PaginationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.limit, None);
        assert_eq!(params.offset, None);
        assert_eq!(params.page, None);
    }

    #[test]
    fn test_pagination_meta_skips_missing_page() {
        let meta = PaginationMeta {
            total: 5,
            limit: 10,
            offset: Some(0),
            page: None,
            has_more: false,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(!json.contains("page"));
        assert!(json.contains(r#""has_more":false"#));
    }

    #[test]
    fn test_sort_order_sql() {
        assert_eq!(SortOrder::default().as_sql(), "DESC");
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
    }
}
