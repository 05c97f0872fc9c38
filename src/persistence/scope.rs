//! Query filters over stored state values.

use super::Record;
use crate::core::StateValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Selects subjects whose attribute holds (or does not hold) one of a set
/// of stored values.
///
/// Usually built by `Machine::with_states` / `Machine::without_states`,
/// which translate state names into values.
///
/// # Example
///
/// ```rust
/// use statebound::persistence::StateFilter;
/// use serde_json::json;
///
/// let filter = StateFilter::including("state", vec![json!("parked"), json!(null)]);
/// assert_eq!(
///     filter.to_sql("vehicles"),
///     r#"("vehicles"."state" IN ('parked') OR "vehicles"."state" IS NULL)"#
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateFilter {
    attribute: String,
    values: Vec<StateValue>,
    negated: bool,
}

impl StateFilter {
    pub fn including(attribute: impl Into<String>, values: Vec<StateValue>) -> Self {
        Self {
            attribute: attribute.into(),
            values,
            negated: false,
        }
    }

    pub fn excluding(attribute: impl Into<String>, values: Vec<StateValue>) -> Self {
        Self {
            attribute: attribute.into(),
            values,
            negated: true,
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn values(&self) -> &[StateValue] {
        &self.values
    }

    pub fn matches_value(&self, value: &StateValue) -> bool {
        self.values.contains(value) != self.negated
    }

    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.matches_value(&record.read_attribute(&self.attribute))
    }

    /// Keep the records this filter selects.
    pub fn apply<'a, R, I>(&'a self, records: I) -> impl Iterator<Item = &'a R> + 'a
    where
        R: Record + 'a,
        I: IntoIterator<Item = &'a R>,
        I::IntoIter: 'a,
    {
        records.into_iter().filter(move |r| self.matches(*r))
    }

    /// Render as a SQL condition on `table`.
    pub fn to_sql(&self, table: &str) -> String {
        let column = format!("{}.{}", quote_ident(table), quote_ident(&self.attribute));
        let includes_null = self.values.iter().any(Value::is_null);
        let literals: Vec<String> = self
            .values
            .iter()
            .filter(|v| !v.is_null())
            .map(literal)
            .collect();

        let list = literals.join(", ");

        // NULL never satisfies IN / NOT IN, so it is always spelled out.
        match (self.negated, literals.is_empty(), includes_null) {
            (false, true, false) => "1=0".to_string(),
            (false, true, true) => format!("{column} IS NULL"),
            (false, false, false) => format!("{column} IN ({list})"),
            (false, false, true) => format!("({column} IN ({list}) OR {column} IS NULL)"),
            (true, true, false) => "1=1".to_string(),
            (true, true, true) => format!("{column} IS NOT NULL"),
            (true, false, false) => format!("({column} NOT IN ({list}) OR {column} IS NULL)"),
            (true, false, true) => {
                format!("({column} NOT IN ({list}) AND {column} IS NOT NULL)")
            }
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(text) => format!("'{}'", text.replace('\'', "''")),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(number) => number.to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
