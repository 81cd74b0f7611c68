//! Aggregation of one attribute's stored values.
//!
//! Numeric kinds (number, percentage, duration) aggregate their canonical
//! stored form with exact decimals, so `3.55 + 3.67 + 2` is exactly `9.22`.
//! Other kinds aggregate what parses as a number and order the rest through
//! their typed values.

use crate::constraint::Constraint;
use crate::decimal::{decimal_from_json, decimal_to_json, zero};
use crate::value::DataValue;
use bigdecimal::BigDecimal;
use lumio_model::{ConstraintData, ConstraintType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataAggregationType {
    #[default]
    Sum,
    Min,
    Max,
    Avg,
    Median,
    Count,
    Unique,
    Join,
}

impl DataAggregationType {
    pub const ALL: [DataAggregationType; 8] = [
        DataAggregationType::Sum,
        DataAggregationType::Min,
        DataAggregationType::Max,
        DataAggregationType::Avg,
        DataAggregationType::Median,
        DataAggregationType::Count,
        DataAggregationType::Unique,
        DataAggregationType::Join,
    ];
}

/// Whether the result is a value of the attribute's own kind. Counts are
/// plain numbers.
pub fn is_value_aggregation(aggregation: DataAggregationType) -> bool {
    !matches!(aggregation, DataAggregationType::Count | DataAggregationType::Unique)
}

/// Aggregates raw stored values. Attributes without a constraint aggregate as
/// `Unknown`.
///
/// `only_numeric` restricts min, max and median to values that read as
/// numbers; sums and averages always skip non-numeric values. An aggregation
/// over no usable value is `null`.
pub fn aggregate_data_values(
    aggregation: DataAggregationType,
    values: &[Value],
    constraint: Option<&Constraint>,
    only_numeric: bool,
    data: &ConstraintData,
) -> Value {
    let unknown = Constraint::Unknown;
    let constraint = constraint.unwrap_or(&unknown);
    let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    let aggregator = Aggregator {
        constraint,
        data,
        only_numeric,
    };

    match aggregation {
        DataAggregationType::Sum => aggregator.sum(&non_null),
        DataAggregationType::Avg => aggregator.avg(&non_null),
        DataAggregationType::Min => aggregator.extreme(&non_null, false),
        DataAggregationType::Max => aggregator.extreme(&non_null, true),
        DataAggregationType::Median => aggregator.median(&non_null),
        DataAggregationType::Count => Value::from(values.len()),
        DataAggregationType::Unique => Value::from(unique_count(&non_null)),
        DataAggregationType::Join => aggregator.join(values),
    }
}

fn is_numeric_kind(kind: ConstraintType) -> bool {
    matches!(
        kind,
        ConstraintType::Number | ConstraintType::Percentage | ConstraintType::Duration
    )
}

fn unique_count(values: &[&Value]) -> usize {
    let mut seen: Vec<&Value> = Vec::with_capacity(values.len());
    for value in values {
        if !seen.contains(value) {
            seen.push(value);
        }
    }
    seen.len()
}

struct Aggregator<'a> {
    constraint: &'a Constraint,
    data: &'a ConstraintData,
    only_numeric: bool,
}

impl<'a> Aggregator<'a> {
    fn typed(&self, raw: &Value) -> DataValue<'a> {
        self.constraint.create_data_value(raw.clone(), self.data)
    }

    /// The number a value aggregates as: the canonical stored form for numeric
    /// kinds, the raw value read as a decimal for the rest.
    fn number(&self, raw: &Value) -> Option<BigDecimal> {
        if is_numeric_kind(self.constraint.kind()) {
            decimal_from_json(&self.typed(raw).serialize())
        } else {
            decimal_from_json(raw)
        }
    }

    fn numbers(&self, values: &[&Value]) -> Vec<BigDecimal> {
        values.iter().filter_map(|v| self.number(v)).collect()
    }

    fn sum(&self, values: &[&Value]) -> Value {
        let numbers = self.numbers(values);
        if numbers.is_empty() {
            return Value::Null;
        }
        decimal_to_json(&numbers.into_iter().fold(zero(), |acc, n| acc + n))
    }

    fn avg(&self, values: &[&Value]) -> Value {
        let numbers = self.numbers(values);
        if numbers.is_empty() {
            return Value::Null;
        }
        let count = BigDecimal::from(numbers.len() as u64);
        let sum = numbers.into_iter().fold(zero(), |acc, n| acc + n);
        decimal_to_json(&(sum / count).normalized())
    }

    fn extreme(&self, values: &[&Value], max: bool) -> Value {
        if is_numeric_kind(self.constraint.kind()) || self.only_numeric {
            let numbers = self.numbers(values);
            let found = if max {
                numbers.into_iter().max()
            } else {
                numbers.into_iter().min()
            };
            return found.map_or(Value::Null, |n| decimal_to_json(&n));
        }
        let sorted = self.sorted(values);
        let found = if max { sorted.last() } else { sorted.first() };
        found.map_or(Value::Null, DataValue::serialize)
    }

    fn median(&self, values: &[&Value]) -> Value {
        if is_numeric_kind(self.constraint.kind()) || self.only_numeric {
            let mut numbers = self.numbers(values);
            numbers.sort();
            let middle = numbers.len() / 2;
            return match numbers.len() {
                0 => Value::Null,
                len if len % 2 == 1 => decimal_to_json(&numbers[middle]),
                _ => {
                    let pair = numbers[middle - 1].clone() + numbers[middle].clone();
                    decimal_to_json(&(pair / BigDecimal::from(2)).normalized())
                }
            };
        }
        let sorted = self.sorted(values);
        sorted
            .get(sorted.len().saturating_sub(1) / 2)
            .map_or(Value::Null, DataValue::serialize)
    }

    fn sorted(&self, values: &[&Value]) -> Vec<DataValue<'a>> {
        let mut typed: Vec<DataValue<'a>> = values.iter().map(|v| self.typed(v)).collect();
        typed.sort_by(|a, b| a.compare_to(b));
        typed
    }

    fn join(&self, values: &[Value]) -> Value {
        let mut formatted: Vec<String> = Vec::new();
        for text in values.iter().map(|v| self.typed(v).format()) {
            if !text.is_empty() && !formatted.contains(&text) {
                formatted.push(text);
            }
        }
        Value::String(formatted.join(", "))
    }
}
