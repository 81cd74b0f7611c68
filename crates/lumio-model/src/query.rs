//! Queries, attribute filters and condition values.

use crate::de::null_default;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Conditions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    #[serde(rename = "eq")]
    Equals,
    #[serde(rename = "neq")]
    NotEquals,
    #[serde(rename = "lt")]
    LowerThan,
    #[serde(rename = "lte")]
    LowerThanEquals,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "gte")]
    GreaterThanEquals,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "hasSome")]
    HasSome,
    #[serde(rename = "hasAll")]
    HasAll,
    #[serde(rename = "hasNoneOf")]
    HasNoneOf,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "notBetween")]
    NotBetween,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "notContains")]
    NotContains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    #[serde(rename = "empty")]
    IsEmpty,
    #[serde(rename = "notEmpty")]
    NotEmpty,
    #[serde(rename = "enabled")]
    Enabled,
    #[serde(rename = "disabled")]
    Disabled,
}

impl ConditionType {
    /// How many condition values the condition reads.
    pub fn num_inputs(&self) -> usize {
        match self {
            ConditionType::IsEmpty
            | ConditionType::NotEmpty
            | ConditionType::Enabled
            | ConditionType::Disabled => 0,
            ConditionType::Between | ConditionType::NotBetween => 2,
            _ => 1,
        }
    }
}

pub fn condition_num_inputs(condition: ConditionType) -> usize {
    condition.num_inputs()
}

/// Symbolic placeholders resolved against the evaluation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintConditionValue {
    CurrentUser,
    CurrentTeams,
    Today,
    Yesterday,
    Tomorrow,
    ThisWeek,
    LastWeek,
    NextWeek,
    ThisMonth,
    LastMonth,
    NextMonth,
}

impl ConstraintConditionValue {
    pub fn is_date(&self) -> bool {
        !matches!(
            self,
            ConstraintConditionValue::CurrentUser | ConstraintConditionValue::CurrentTeams
        )
    }
}

/// One condition operand: a literal value, a symbolic placeholder, or both.
///
/// When both are present the placeholder wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionValue {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ConstraintConditionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ConditionValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            kind: None,
            value: Some(value.into()),
        }
    }

    pub fn symbolic(kind: ConstraintConditionValue) -> Self {
        Self {
            kind: Some(kind),
            value: None,
        }
    }

    /// The literal value, `Null` when absent.
    pub fn raw(&self) -> &Value {
        self.value.as_ref().unwrap_or(&Value::Null)
    }
}

// ============================================================================
// Filters and equations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    pub attribute_id: String,
    pub condition: ConditionType,
    #[serde(default, deserialize_with = "null_default")]
    pub condition_values: Vec<ConditionValue>,
}

impl AttributeFilter {
    pub fn new(
        attribute_id: impl Into<String>,
        condition: ConditionType,
        condition_values: Vec<ConditionValue>,
    ) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            condition,
            condition_values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionAttributeFilter {
    pub collection_id: String,
    #[serde(flatten)]
    pub filter: AttributeFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAttributeFilter {
    pub link_type_id: String,
    #[serde(flatten)]
    pub filter: AttributeFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquationOperator {
    #[default]
    And,
    Or,
}

/// A tree of filters; the operator of the first child governs its siblings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilterEquation {
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub equations: Vec<AttributeFilterEquation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<AttributeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<EquationOperator>,
}

impl AttributeFilterEquation {
    /// A flat equation joining `filters` with `operator`.
    pub fn of(filters: Vec<AttributeFilter>, operator: EquationOperator) -> Self {
        Self {
            equations: filters
                .into_iter()
                .map(|filter| AttributeFilterEquation {
                    equations: Vec::new(),
                    filter: Some(filter),
                    operator: Some(operator),
                })
                .collect(),
            filter: None,
            operator: None,
        }
    }

    /// Filters of the direct children.
    pub fn filters(&self) -> Vec<&AttributeFilter> {
        self.equations.iter().filter_map(|e| e.filter.as_ref()).collect()
    }

    pub fn operator(&self) -> EquationOperator {
        self.equations
            .first()
            .and_then(|e| e.operator)
            .unwrap_or_default()
    }
}

// ============================================================================
// Query
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryStem {
    pub id: Option<String>,
    pub collection_id: String,
    #[serde(deserialize_with = "null_default")]
    pub link_type_ids: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub filters: Vec<CollectionAttributeFilter>,
    #[serde(deserialize_with = "null_default")]
    pub link_filters: Vec<LinkAttributeFilter>,
    #[serde(deserialize_with = "null_default")]
    pub document_ids: Vec<String>,
}

impl QueryStem {
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            ..Default::default()
        }
    }

    pub fn with_link_types(mut self, link_type_ids: &[&str]) -> Self {
        self.link_type_ids = link_type_ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_filter(mut self, collection_id: &str, filter: AttributeFilter) -> Self {
        self.filters.push(CollectionAttributeFilter {
            collection_id: collection_id.to_string(),
            filter,
        });
        self
    }

    pub fn with_link_filter(mut self, link_type_id: &str, filter: AttributeFilter) -> Self {
        self.link_filters.push(LinkAttributeFilter {
            link_type_id: link_type_id.to_string(),
            filter,
        });
        self
    }

    pub fn with_document_ids(mut self, document_ids: &[&str]) -> Self {
        self.document_ids = document_ids.iter().map(|s| s.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Query {
    #[serde(deserialize_with = "null_default")]
    pub stems: Vec<QueryStem>,
    #[serde(deserialize_with = "null_default")]
    pub fulltexts: Vec<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl Query {
    pub fn with_stems(stems: Vec<QueryStem>) -> Self {
        Self {
            stems,
            ..Default::default()
        }
    }

    pub fn with_fulltexts(fulltexts: &[&str]) -> Self {
        Self {
            fulltexts: fulltexts.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// No stems and no fulltexts; pagination is ignored.
    pub fn is_empty_except_pagination(&self) -> bool {
        self.stems.is_empty() && self.fulltexts.is_empty()
    }

    pub fn is_paginated(&self) -> bool {
        matches!((self.page, self.page_size), (Some(page), Some(size)) if page != 0 || size != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_stem_filters_with_scope() {
        let query: Query = serde_json::from_value(json!({
            "stems": [{
                "collectionId": "c1",
                "linkTypeIds": ["lt1"],
                "filters": [{
                    "collectionId": "c1",
                    "attributeId": "a1",
                    "condition": "eq",
                    "conditionValues": [{"value": "IBM"}]
                }],
                "linkFilters": null
            }],
            "fulltexts": ["red"]
        }))
        .unwrap();
        let stem = &query.stems[0];
        assert_eq!(stem.filters[0].collection_id, "c1");
        assert_eq!(stem.filters[0].filter.condition, ConditionType::Equals);
        assert_eq!(stem.filters[0].filter.condition_values[0].raw(), &json!("IBM"));
        assert!(stem.link_filters.is_empty());
        assert!(!query.is_empty_except_pagination());
    }

    #[test]
    fn input_counts_per_condition() {
        assert_eq!(condition_num_inputs(ConditionType::IsEmpty), 0);
        assert_eq!(condition_num_inputs(ConditionType::Disabled), 0);
        assert_eq!(condition_num_inputs(ConditionType::NotBetween), 2);
        assert_eq!(condition_num_inputs(ConditionType::HasSome), 1);
    }

    #[test]
    fn decodes_symbolic_condition_values() {
        let value: ConditionValue = serde_json::from_value(json!({"type": "currentUser"})).unwrap();
        assert_eq!(value.kind, Some(ConstraintConditionValue::CurrentUser));
        assert!(value.raw().is_null());
        assert!(ConstraintConditionValue::ThisWeek.is_date());
    }

    #[test]
    fn equation_operator_comes_from_first_child() {
        let equation = AttributeFilterEquation::of(
            vec![
                AttributeFilter::new("a1", ConditionType::IsEmpty, vec![]),
                AttributeFilter::new("a2", ConditionType::NotEmpty, vec![]),
            ],
            EquationOperator::Or,
        );
        assert_eq!(equation.operator(), EquationOperator::Or);
        assert_eq!(equation.filters().len(), 2);
        assert_eq!(AttributeFilterEquation::default().operator(), EquationOperator::And);
    }

    #[test]
    fn pagination_needs_both_fields() {
        let mut query = Query::default();
        assert!(!query.is_paginated());
        query.page = Some(0);
        assert!(!query.is_paginated());
        query.page_size = Some(0);
        assert!(!query.is_paginated());
        query.page_size = Some(2);
        assert!(query.is_paginated());
    }
}
