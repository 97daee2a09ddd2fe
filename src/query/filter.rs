/// Dynamic filter construction for listing endpoints.
///
/// Request parameters become a small predicate tree (equality, substring,
/// conjunction, disjunction) built from a declared allow-list of filterable
/// fields per entity, then rendered to a parameterized SQL `WHERE` clause.
/// Only allow-listed identifiers reach the SQL text; every value travels as
/// a bind parameter.

use std::collections::HashMap;

use uuid::Uuid;

/// Reserved query-string key for the free-text search term.
pub const SEARCH_TERM_KEY: &str = "searchTerm";

/// One node of the filter tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `field = value`, value compared as provided.
    Eq(String, String),
    /// Case-insensitive substring match on a text field.
    Contains(String, String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Render this node, appending bind values in placeholder order.
    ///
    /// Columns are cast to text so one rendering works across uuid, enum,
    /// and timestamp columns while values stay bind parameters. An empty
    /// disjunction is unsatisfiable (a search term with no searchable
    /// fields matches nothing); an empty conjunction matches everything.
    fn render(&self, binds: &mut Vec<String>) -> String {
        match self {
            Predicate::Eq(field, value) => {
                binds.push(value.clone());
                format!("{}::text = ${}", field, binds.len())
            }
            Predicate::Contains(field, value) => {
                binds.push(format!("%{}%", value));
                format!("{}::text ILIKE ${}", field, binds.len())
            }
            Predicate::And(parts) if parts.is_empty() => "TRUE".to_string(),
            Predicate::And(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| p.render(binds)).collect();
                format!("({})", rendered.join(" AND "))
            }
            Predicate::Or(parts) if parts.is_empty() => "FALSE".to_string(),
            Predicate::Or(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| p.render(binds)).collect();
                format!("({})", rendered.join(" OR "))
            }
        }
    }
}

/// AND-combined predicate groups for one listing query.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    groups: Vec<Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from raw query parameters.
    ///
    /// The reserved search term becomes a disjunction of substring matches
    /// over `searchable`; every other parameter is accepted only if named in
    /// `filterable` and becomes an exact-match conjunction. Unknown keys are
    /// dropped.
    pub fn from_params(
        params: &HashMap<String, String>,
        filterable: &[&str],
        searchable: &[&str],
    ) -> Self {
        let mut spec = Self::new();

        if let Some(term) = params.get(SEARCH_TERM_KEY) {
            if !term.is_empty() {
                spec.groups.push(Predicate::Or(
                    searchable
                        .iter()
                        .map(|field| Predicate::Contains(field.to_string(), term.clone()))
                        .collect(),
                ));
            }
        }

        let exact: Vec<Predicate> = filterable
            .iter()
            .filter_map(|field| {
                params
                    .get(*field)
                    .map(|value| Predicate::Eq(field.to_string(), value.clone()))
            })
            .collect();
        if !exact.is_empty() {
            spec.groups.push(Predicate::And(exact));
        }

        spec
    }

    /// Pin a field to a fixed value, e.g. `role = TEACHER` for the public
    /// teachers listing.
    pub fn pin(mut self, field: &str, value: &str) -> Self {
        self.groups
            .push(Predicate::Eq(field.to_string(), value.to_string()));
        self
    }

    /// Ownership scoping: restrict the listing to rows owned by the caller.
    /// Privileged roles skip this call and see all records.
    pub fn scope_to_owner(self, field: &str, subject: &Uuid) -> Self {
        self.pin(field, &subject.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Render to a `WHERE ...` fragment plus its bind values, `$1`-indexed.
    /// No groups means no `WHERE` at all: the query matches everything.
    pub fn where_clause(&self) -> (String, Vec<String>) {
        if self.groups.is_empty() {
            return (String::new(), Vec::new());
        }

        let mut binds = Vec::new();
        let rendered: Vec<String> = self.groups.iter().map(|p| p.render(&mut binds)).collect();
        (format!("WHERE {}", rendered.join(" AND ")), binds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_params_matches_everything() {
        let spec = FilterSpec::from_params(&params(&[]), &["email", "role"], &["name"]);
        assert!(spec.is_empty());
        let (clause, binds) = spec.where_clause();
        assert_eq!(clause, "");
        assert!(binds.is_empty());
    }

    #[test]
    fn test_search_and_exact_match_combine_with_and() {
        let spec = FilterSpec::from_params(
            &params(&[("searchTerm", "abc"), ("category", "x")]),
            &["category"],
            &["name", "email"],
        );
        let (clause, binds) = spec.where_clause();

        assert_eq!(
            clause,
            "WHERE (name::text ILIKE $1 OR email::text ILIKE $2) AND (category::text = $3)"
        );
        assert_eq!(binds, vec!["%abc%", "%abc%", "x"]);
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let spec = FilterSpec::from_params(
            &params(&[("category", "x"), ("password_hash", "sneaky"), ("page", "2")]),
            &["category"],
            &["name"],
        );
        let (clause, binds) = spec.where_clause();
        assert_eq!(clause, "WHERE (category::text = $1)");
        assert_eq!(binds, vec!["x"]);
    }

    #[test]
    fn test_search_with_no_searchable_fields_matches_nothing() {
        let spec = FilterSpec::from_params(&params(&[("searchTerm", "abc")]), &["status"], &[]);
        let (clause, binds) = spec.where_clause();
        assert_eq!(clause, "WHERE FALSE");
        assert!(binds.is_empty());
    }

    #[test]
    fn test_empty_search_term_ignored() {
        let spec = FilterSpec::from_params(&params(&[("searchTerm", "")]), &[], &["name"]);
        assert!(spec.is_empty());
    }

    #[test]
    fn test_ownership_scoping_appends_owner_equality() {
        let owner = Uuid::new_v4();
        let spec = FilterSpec::from_params(&params(&[("status", "BOOKED")]), &["status"], &[])
            .scope_to_owner("learner_id", &owner);
        let (clause, binds) = spec.where_clause();

        assert_eq!(
            clause,
            "WHERE (status::text = $1) AND learner_id::text = $2"
        );
        assert_eq!(binds, vec!["BOOKED".to_string(), owner.to_string()]);
    }

    #[test]
    fn test_unscoped_filter_has_no_owner_predicate() {
        let spec = FilterSpec::from_params(&params(&[("status", "BOOKED")]), &["status"], &[]);
        let (clause, _) = spec.where_clause();
        assert!(!clause.contains("learner_id"));
    }

    #[test]
    fn test_pinned_field_renders_first_class_equality() {
        let spec = FilterSpec::new().pin("role", "TEACHER");
        let (clause, binds) = spec.where_clause();
        assert_eq!(clause, "WHERE role::text = $1");
        assert_eq!(binds, vec!["TEACHER"]);
    }

    #[test]
    fn test_values_bind_as_provided_without_coercion() {
        let spec =
            FilterSpec::from_params(&params(&[("rating", "5"), ("flagged", "true")]), &["rating", "flagged"], &[]);
        let (_, binds) = spec.where_clause();
        assert_eq!(binds, vec!["5", "true"]);
    }
}
