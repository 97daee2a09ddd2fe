//! Properties of the filter builder and pagination calculator as the
//! listing endpoints use them together.

use std::collections::HashMap;

use uuid::Uuid;

use skillbridge::query::{calculate, FilterSpec, ListMeta, PaginationQuery};

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn search_plus_exact_match_builds_an_and_of_or_and_equalities() {
    let filter = FilterSpec::from_params(
        &params(&[("searchTerm", "abc"), ("category", "x")]),
        &["category"],
        &["name", "description"],
    );
    let (clause, binds) = filter.where_clause();

    assert_eq!(
        clause,
        "WHERE (name::text ILIKE $1 OR description::text ILIKE $2) AND (category::text = $3)"
    );
    assert_eq!(binds, vec!["%abc%", "%abc%", "x"]);
}

#[test]
fn no_parameters_matches_everything() {
    let filter = FilterSpec::from_params(&params(&[]), &["category"], &["name"]);
    let (clause, binds) = filter.where_clause();
    assert_eq!(clause, "");
    assert!(binds.is_empty());
}

#[test]
fn non_privileged_listing_always_carries_the_owner_predicate() {
    let caller = Uuid::new_v4();
    // What a LEARNER listing does: scope after building the caller's filters.
    let filter = FilterSpec::from_params(&params(&[("status", "BOOKED")]), &["status"], &[])
        .scope_to_owner("learner_id", &caller);
    let (clause, binds) = filter.where_clause();

    assert!(clause.contains("learner_id::text ="));
    assert!(binds.contains(&caller.to_string()));
}

#[test]
fn privileged_listing_never_carries_the_owner_predicate() {
    // What an ADMIN listing does: no scoping call at all.
    let filter = FilterSpec::from_params(&params(&[("status", "BOOKED")]), &["status"], &[]);
    let (clause, _) = filter.where_clause();

    assert!(!clause.contains("learner_id"));
    assert!(!clause.contains("teacher_id"));
}

#[test]
fn scoping_applies_even_without_caller_filters() {
    let caller = Uuid::new_v4();
    let filter =
        FilterSpec::from_params(&params(&[]), &["status"], &[]).scope_to_owner("teacher_id", &caller);
    let (clause, binds) = filter.where_clause();

    assert_eq!(clause, "WHERE teacher_id::text = $1");
    assert_eq!(binds, vec![caller.to_string()]);
}

#[test]
fn pagination_never_produces_a_negative_offset() {
    for (page, limit) in [(0, 0), (-3, -7), (0, 10), (5, 0)] {
        let query = PaginationQuery {
            page: Some(page),
            limit: Some(limit),
            sort_by: None,
            sort_order: None,
        };
        let pagination = calculate(&query, &["created_at"]);
        assert!(pagination.offset >= 0, "page={} limit={}", page, limit);
    }
}

#[test]
fn total_pages_is_the_ceiling_of_total_over_limit() {
    let query = PaginationQuery {
        page: Some(1),
        limit: Some(10),
        sort_by: None,
        sort_order: None,
    };
    let pagination = calculate(&query, &["created_at"]);

    assert_eq!(ListMeta::new(&pagination, 25).total_page, 3);
    assert_eq!(ListMeta::new(&pagination, 100).total_page, 10);
    assert_eq!(ListMeta::new(&pagination, 101).total_page, 11);
    assert_eq!(ListMeta::new(&pagination, 0).total_page, 0);
}

#[test]
fn default_ordering_is_newest_first() {
    let pagination = calculate(&PaginationQuery::default(), &["created_at", "name"]);
    assert_eq!(
        pagination.order_limit_clause(),
        "ORDER BY created_at DESC LIMIT 10 OFFSET 0"
    );
}
