/// Pagination calculation shared by every listing endpoint.
///
/// Raw `page`/`limit`/`sortBy`/`sortOrder` query parameters become a safe
/// offset/limit/order triple; listing responses carry a `meta` block with the
/// total row count and page count.

use serde::{Deserialize, Serialize};

/// Raw pagination parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
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

/// Resolved pagination parameters, safe to splice into a query.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl Pagination {
    /// `ORDER BY ... LIMIT ... OFFSET ...` tail for a listing query. All
    /// parts are either allow-listed identifiers or clamped integers.
    pub fn order_limit_clause(&self) -> String {
        format!(
            "ORDER BY {} {} LIMIT {} OFFSET {}",
            self.sort_by,
            self.sort_order.as_sql(),
            self.limit,
            self.offset
        )
    }
}

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_SORT_FIELD: &str = "created_at";

/// Resolve raw pagination parameters.
///
/// Page and limit below 1 clamp to 1, so the offset is never negative.
/// `sort_by` must name a column in `sortable` because it is interpolated
/// into `ORDER BY`; anything else falls back to the default sort, newest
/// first.
pub fn calculate(query: &PaginationQuery, sortable: &[&str]) -> Pagination {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(1);

    let sort_by = match &query.sort_by {
        Some(field) if sortable.contains(&field.as_str()) => field.clone(),
        _ => DEFAULT_SORT_FIELD.to_string(),
    };

    let sort_order = match query.sort_order.as_deref() {
        Some(order) if order.eq_ignore_ascii_case("asc") => SortOrder::Asc,
        Some(order) if order.eq_ignore_ascii_case("desc") => SortOrder::Desc,
        _ => SortOrder::Desc,
    };

    Pagination {
        page,
        limit,
        offset: (page - 1) * limit,
        sort_by,
        sort_order,
    }
}

/// Listing metadata returned alongside the rows.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ListMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPage")]
    pub total_page: i64,
}

impl ListMeta {
    /// `limit` is already clamped to at least 1, so the ceiling division
    /// cannot divide by zero.
    pub fn new(pagination: &Pagination, total: i64) -> Self {
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_page: (total + pagination.limit - 1) / pagination.limit,
        }
    }
}

/// Uniform `{meta, data}` body for every listing endpoint.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub meta: ListMeta,
    pub data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, limit: Option<i64>) -> PaginationQuery {
        PaginationQuery {
            page,
            limit,
            sort_by: None,
            sort_order: None,
        }
    }

    #[test]
    fn test_defaults() {
        let p = calculate(&PaginationQuery::default(), &["created_at", "name"]);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, DEFAULT_LIMIT);
        assert_eq!(p.offset, 0);
        assert_eq!(p.sort_by, "created_at");
        assert_eq!(p.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_offset_computation() {
        let p = calculate(&query(Some(3), Some(20)), &["created_at"]);
        assert_eq!(p.offset, 40);
        assert_eq!(p.limit, 20);
    }

    #[test]
    fn test_zero_and_negative_inputs_never_yield_negative_offset() {
        for (page, limit) in [(Some(0), Some(0)), (Some(-5), Some(-10)), (None, Some(-1))] {
            let p = calculate(&query(page, limit), &["created_at"]);
            assert!(p.offset >= 0, "page={:?} limit={:?}", page, limit);
            assert!(p.page >= 1);
            assert!(p.limit >= 1);
        }
    }

    #[test]
    fn test_sort_field_outside_allow_list_falls_back() {
        let q = PaginationQuery {
            sort_by: Some("password_hash; DROP TABLE users".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        };
        let p = calculate(&q, &["created_at", "name"]);
        assert_eq!(p.sort_by, "created_at");
        assert_eq!(p.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_sort_field_inside_allow_list_used() {
        let q = PaginationQuery {
            sort_by: Some("name".to_string()),
            sort_order: Some("ASC".to_string()),
            ..Default::default()
        };
        let p = calculate(&q, &["created_at", "name"]);
        assert_eq!(p.sort_by, "name");
        assert_eq!(p.sort_order, SortOrder::Asc);
        assert_eq!(p.order_limit_clause(), "ORDER BY name ASC LIMIT 10 OFFSET 0");
    }

    #[test]
    fn test_total_page_is_ceiling() {
        let p = calculate(&query(Some(1), Some(10)), &["created_at"]);
        assert_eq!(ListMeta::new(&p, 25).total_page, 3);
        assert_eq!(ListMeta::new(&p, 30).total_page, 3);
        assert_eq!(ListMeta::new(&p, 31).total_page, 4);
        assert_eq!(ListMeta::new(&p, 0).total_page, 0);
    }

    #[test]
    fn test_meta_serializes_with_total_page_key() {
        let p = calculate(&query(Some(2), Some(10)), &["created_at"]);
        let json = serde_json::to_value(ListMeta::new(&p, 25)).unwrap();
        assert_eq!(json["page"], 2);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["total"], 25);
        assert_eq!(json["totalPage"], 3);
    }
}
