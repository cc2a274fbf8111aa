use sqlx::{Postgres, QueryBuilder};

use super::{Entity, Value};

/// Typed predicate over entity columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, Value),
    Ne(&'static str, Value),
    /// Text equality ignoring case.
    EqIgnoreCase(&'static str, String),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(column, value.into())
    }

    pub fn ne(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Ne(column, value.into())
    }

    pub fn eq_ignore_case(column: &'static str, text: impl Into<String>) -> Self {
        Filter::EqIgnoreCase(column, text.into())
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn matches<T: Entity>(&self, entity: &T) -> bool {
        match self {
            Filter::Eq(column, expected) => entity.column(column).as_ref() == Some(expected),
            Filter::Ne(column, unexpected) => {
                matches!(entity.column(column), Some(actual) if actual != *unexpected)
            }
            Filter::EqIgnoreCase(column, expected) => match entity.column(column) {
                Some(Value::Text(actual)) => actual.to_lowercase() == expected.to_lowercase(),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(entity)),
        }
    }

    pub(crate) fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Filter::Eq(column, value) => {
                qb.push(*column).push(" = ");
                push_bind_value(qb, value.clone());
            }
            Filter::Ne(column, value) => {
                qb.push(*column).push(" <> ");
                push_bind_value(qb, value.clone());
            }
            Filter::EqIgnoreCase(column, text) => {
                qb.push("LOWER(").push(*column).push(") = LOWER(");
                qb.push_bind(text.clone());
                qb.push(")");
            }
            Filter::And(filters) if filters.is_empty() => {
                qb.push("TRUE");
            }
            Filter::And(filters) => {
                for (i, filter) in filters.iter().enumerate() {
                    if i > 0 {
                        qb.push(" AND ");
                    }
                    qb.push("(");
                    filter.push_sql(qb);
                    qb.push(")");
                }
            }
        }
    }
}

pub(crate) fn push_bind_value(qb: &mut QueryBuilder<'_, Postgres>, value: Value) {
    match value {
        Value::Int(v) => {
            qb.push_bind(v);
        }
        Value::Float(v) => {
            qb.push_bind(v);
        }
        Value::Text(v) => {
            qb.push_bind(v);
        }
        Value::Timestamp(v) => {
            qb.push_bind(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Villa;
    use chrono::Utc;

    fn villa(id: i32, name: &str) -> Villa {
        Villa {
            id,
            name: name.to_string(),
            details: String::new(),
            rate: 200.0,
            sqft: 550,
            occupancy: 4,
            image_url: String::new(),
            amenity: String::new(),
            created_date: Utc::now(),
            updated_date: None,
        }
    }

    #[test]
    fn test_eq_matches_column() {
        let filter = Filter::eq(Villa::ID, 7);
        assert!(filter.matches(&villa(7, "Royal")));
        assert!(!filter.matches(&villa(8, "Royal")));
    }

    #[test]
    fn test_eq_ignore_case_matches_text_only() {
        let filter = Filter::eq_ignore_case(Villa::NAME, "royal VILLA");
        assert!(filter.matches(&villa(1, "Royal Villa")));
        assert!(!filter.matches(&villa(1, "Royal Villas")));

        let on_number = Filter::eq_ignore_case(Villa::ID, "1");
        assert!(!on_number.matches(&villa(1, "Royal Villa")));
    }

    #[test]
    fn test_unknown_column_never_matches() {
        let filter = Filter::eq("no_such_column", 1);
        assert!(!filter.matches(&villa(1, "Royal")));
    }

    #[test]
    fn test_and_requires_every_filter() {
        let filter = Filter::eq(Villa::ID, 3).and(Filter::eq_ignore_case(Villa::NAME, "pool view"));
        assert!(filter.matches(&villa(3, "Pool View")));
        assert!(!filter.matches(&villa(3, "Beach View")));
        assert!(!filter.matches(&villa(4, "Pool View")));
    }

    #[test]
    fn test_ne_excludes_value_and_unknown_columns() {
        let filter = Filter::ne(Villa::ID, 2);
        assert!(filter.matches(&villa(1, "Royal")));
        assert!(!filter.matches(&villa(2, "Royal")));
        assert!(!Filter::ne("no_such_column", 2).matches(&villa(1, "Royal")));
    }

    #[test]
    fn test_renders_not_equal() {
        let filter = Filter::eq_ignore_case(Villa::NAME, "royal").and(Filter::ne(Villa::ID, 4));
        let mut qb = QueryBuilder::<Postgres>::new("");
        filter.push_sql(&mut qb);
        assert_eq!(qb.sql(), "(LOWER(name) = LOWER($1)) AND (id <> $2)");
    }

    #[test]
    fn test_and_flattens() {
        let filter = Filter::eq(Villa::ID, 1)
            .and(Filter::eq(Villa::SQFT, 2))
            .and(Filter::eq(Villa::OCCUPANCY, 3));
        match filter {
            Filter::And(filters) => assert_eq!(filters.len(), 3),
            other => panic!("expected conjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_renders_sql_with_placeholders() {
        let filter = Filter::eq(Villa::ID, 3).and(Filter::eq_ignore_case(Villa::NAME, "pool view"));
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM villas WHERE ");
        filter.push_sql(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM villas WHERE (id = $1) AND (LOWER(name) = LOWER($2))"
        );
    }

    #[test]
    fn test_empty_conjunction_renders_true() {
        let mut qb = QueryBuilder::<Postgres>::new("");
        Filter::And(Vec::new()).push_sql(&mut qb);
        assert_eq!(qb.sql(), "TRUE");
        assert!(Filter::And(Vec::new()).matches(&villa(1, "Any")));
    }
}
