//! Translation of constraint lists into a single SQL expression.
//!
//! The formatter never emits a value into the SQL text: every value
//! becomes a `?` placeholder with a parallel entry in the ordered
//! parameter list. Tag groups/elements and level discriminants are
//! integers under our control and are emitted as literals.

use stratum_core::dicom::normalize_identifier;
use stratum_core::models::{ConstraintOp, DatabaseConstraint, ResourceLevel};
use stratum_core::{StratumError, StratumResult};

/// Collects the positional parameters while the SQL text is built.
#[derive(Default)]
pub struct LookupFormatter {
    parameters: Vec<String>,
}

impl LookupFormatter {
    pub fn new() -> Self {
        LookupFormatter::default()
    }

    /// Register a value and return its placeholder.
    fn parameter(&mut self, value: String) -> &'static str {
        self.parameters.push(value);
        "?"
    }

    /// The values to bind, in placeholder order.
    pub fn into_parameters(self) -> Vec<String> {
        self.parameters
    }
}

/// Convert a DICOM wildcard pattern into a SQL LIKE pattern: `*` becomes
/// `%`, `?` becomes `_`, and literal `%`, `_`, `\` are escaped with `\`.
/// The emitted comparison appends `ESCAPE '\'`.
fn wildcard_to_like(pattern: &str) -> String {
    let mut like = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '*' => like.push('%'),
            '?' => like.push('_'),
            '%' => like.push_str("\\%"),
            '_' => like.push_str("\\_"),
            '\\' => like.push_str("\\\\"),
            other => like.push(other),
        }
    }
    like
}

fn comparison(
    formatter: &mut LookupFormatter,
    alias: &str,
    constraint: &DatabaseConstraint,
) -> StratumResult<String> {
    let field = if constraint.case_sensitive {
        format!("{alias}.value")
    } else {
        format!("lower({alias}.value)")
    };

    let bind = |formatter: &mut LookupFormatter, value: &str| -> String {
        let normalized = normalize_identifier(value);
        let normalized = if constraint.case_sensitive {
            normalized
        } else {
            normalized.to_lowercase()
        };
        formatter.parameter(normalized).to_owned()
    };

    let expression = match constraint.op {
        ConstraintOp::Equal => {
            let [value] = constraint.values.as_slice() else {
                return Err(malformed(constraint, "equality expects one value"));
            };
            let placeholder = bind(formatter, value);
            format!("{field} = {placeholder}")
        }

        ConstraintOp::Range => {
            let [lower, upper] = constraint.values.as_slice() else {
                return Err(malformed(constraint, "range expects two values"));
            };
            let low = bind(formatter, lower);
            let high = bind(formatter, upper);
            format!("{field} >= {low} AND {field} <= {high}")
        }

        ConstraintOp::Wildcard => {
            let [pattern] = constraint.values.as_slice() else {
                return Err(malformed(constraint, "wildcard expects one value"));
            };
            let placeholder = bind(formatter, &wildcard_to_like(pattern));
            format!("{field} LIKE {placeholder} ESCAPE '\\'")
        }

        ConstraintOp::List => {
            if constraint.values.is_empty() {
                return Err(malformed(constraint, "list expects at least one value"));
            }
            let placeholders: Vec<String> = constraint
                .values
                .iter()
                .map(|value| bind(formatter, value))
                .collect();
            format!("{field} IN ({})", placeholders.join(", "))
        }
    };

    if constraint.mandatory {
        Ok(expression)
    } else {
        // A LEFT JOIN produced the row; absence of the tag also matches.
        Ok(format!("({expression} OR {alias}.value IS NULL)"))
    }
}

fn malformed(constraint: &DatabaseConstraint, reason: &str) -> StratumError {
    StratumError::BadSequenceOfCalls {
        details: format!("constraint on {}: {reason}", constraint.tag),
    }
}

/// Build the SELECT materialized into the `Lookup` temporary table:
/// `publicId, internalId` of every resource at `query_level` satisfying
/// the conjunction of constraints.
pub fn build_lookup_sql(
    formatter: &mut LookupFormatter,
    constraints: &[DatabaseConstraint],
    query_level: ResourceLevel,
    limit: usize,
) -> StratumResult<String> {
    let upper_level = constraints
        .iter()
        .map(|c| c.level)
        .min()
        .map_or(query_level, |level| level.min(query_level));
    let lower_level = constraints
        .iter()
        .map(|c| c.level)
        .max()
        .map_or(query_level, |level| level.max(query_level));

    let target = query_level.sql_alias();
    let mut sql = format!(
        "SELECT {target}.publicId, {target}.internalId FROM Resources AS {target}"
    );

    // Ascend from the query level to the highest constrained level.
    let mut level = query_level;
    while level > upper_level {
        let parent = level.parent().expect("upper_level is a valid ancestor");
        sql += &format!(
            " INNER JOIN Resources {} ON {}.internalId = {}.parentId",
            parent.sql_alias(),
            parent.sql_alias(),
            level.sql_alias()
        );
        level = parent;
    }

    // Descend from the query level to the lowest constrained level.
    let mut level = query_level;
    while level < lower_level {
        let child = level.child().expect("lower_level is a valid descendant");
        sql += &format!(
            " INNER JOIN Resources {} ON {}.parentId = {}.internalId",
            child.sql_alias(),
            child.sql_alias(),
            level.sql_alias()
        );
        level = child;
    }

    let mut comparisons = Vec::with_capacity(constraints.len() + 1);
    for (index, constraint) in constraints.iter().enumerate() {
        let alias = format!("t{index}");
        let join = if constraint.mandatory { "INNER" } else { "LEFT" };

        sql += &format!(
            " {join} JOIN DicomIdentifiers {alias} ON {alias}.id = {}.internalId \
             AND {alias}.tagGroup = {} AND {alias}.tagElement = {}",
            constraint.level.sql_alias(),
            constraint.tag.group,
            constraint.tag.element
        );

        comparisons.push(comparison(formatter, &alias, constraint)?);
    }

    comparisons.push(format!("{target}.resourceType = {}", query_level.to_db()));
    sql += &format!(" WHERE {}", comparisons.join(" AND "));

    if limit != 0 {
        sql += &format!(" LIMIT {limit}");
    }

    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::dicom::tag::TAG_STUDY_INSTANCE_UID;

    #[test]
    fn wildcard_conversion_escapes_like_metacharacters() {
        assert_eq!(wildcard_to_like("1.2.*"), "1.2.%");
        assert_eq!(wildcard_to_like("a?c"), "a_c");
        assert_eq!(wildcard_to_like("50%_\\"), "50\\%\\_\\\\");
    }

    #[test]
    fn only_placeholders_reach_the_sql_text() {
        let constraint = DatabaseConstraint::equal(
            ResourceLevel::Study,
            TAG_STUDY_INSTANCE_UID,
            "1.2.3'; DROP TABLE Resources; --",
        );

        let mut formatter = LookupFormatter::new();
        let sql =
            build_lookup_sql(&mut formatter, &[constraint], ResourceLevel::Study, 0).unwrap();

        assert!(!sql.contains("DROP"));
        assert_eq!(formatter.into_parameters().len(), 1);
    }

    #[test]
    fn joins_span_constraint_levels() {
        let constraint =
            DatabaseConstraint::equal(ResourceLevel::Study, TAG_STUDY_INSTANCE_UID, "1.2.3");

        let mut formatter = LookupFormatter::new();
        let sql =
            build_lookup_sql(&mut formatter, &[constraint], ResourceLevel::Series, 10).unwrap();

        assert!(sql.starts_with("SELECT series.publicId, series.internalId"));
        assert!(sql.contains("INNER JOIN Resources studies"));
        assert!(sql.contains("studies.internalId = series.parentId"));
        assert!(sql.ends_with("LIMIT 10"));
    }
}
