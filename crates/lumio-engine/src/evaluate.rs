//! Typed views of one record.
//!
//! A [`ResourceSchema`] builds the constraints of a collection or link type
//! once; a [`RecordEvaluator`] binds one document or link instance to that
//! schema and answers filter, equation, fulltext and lock questions about it.
//! Typed values are created on demand and dropped after each answer.

use crate::lock::{AttributeLockFilterStats, AttributeLockGroupStats, AttributeLockStats};
use crate::permissions::has_role_by_permissions;
use lumio_model::{
    ActionConstraintConfig, AllowedPermissions, Attribute, AttributeFilter, AttributeFilterEquation,
    AttributeLock, AttributeLockExceptionGroup, AttributeLockGroupType, AttributesResource,
    ConditionType, ConditionValue, ConstraintConditionValue, ConstraintData, DataResource,
    EquationOperator, LanguageTag, RoleType, UserConstraintConfig, UserConstraintType,
};
use lumio_values::{Constraint, DataValue};
use serde_json::Value;
use tracing::trace;

/// Nesting limit for action attributes whose locks reference other actions.
const MAX_ACTION_DEPTH: usize = 16;

// ============================================================================
// Schema
// ============================================================================

/// A collection or link type with one constraint per attribute.
#[derive(Debug, Clone)]
pub struct ResourceSchema<'r> {
    resource: AttributesResource<'r>,
    constraints: Vec<Constraint>,
}

impl<'r> ResourceSchema<'r> {
    pub fn new(resource: AttributesResource<'r>, language: LanguageTag) -> Self {
        let constraints = resource
            .attributes()
            .iter()
            .map(|attribute| Constraint::from_spec(attribute.constraint.as_ref(), language))
            .collect();
        Self {
            resource,
            constraints,
        }
    }

    pub fn resource(&self) -> AttributesResource<'r> {
        self.resource
    }

    pub fn attributes(&self) -> &'r [Attribute] {
        self.resource.attributes()
    }

    /// The attribute with `attribute_id` and its constraint.
    pub fn attribute(&self, attribute_id: &str) -> Option<(&'r Attribute, &Constraint)> {
        self.resource
            .attributes()
            .iter()
            .zip(self.constraints.iter())
            .find(|(attribute, _)| attribute.id == attribute_id)
    }

    pub fn has_attribute(&self, attribute_id: &str) -> bool {
        self.resource.find_attribute(attribute_id).is_some()
    }

    /// Pairs of attribute and constraint in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'r Attribute, &Constraint)> + '_ {
        self.resource.attributes().iter().zip(self.constraints.iter())
    }
}

// ============================================================================
// Record evaluator
// ============================================================================

/// One record seen through its schema.
#[derive(Debug, Clone, Copy)]
pub struct RecordEvaluator<'a> {
    schema: &'a ResourceSchema<'a>,
    record: DataResource<'a>,
    data: &'a ConstraintData,
    permissions: Option<&'a AllowedPermissions>,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(schema: &'a ResourceSchema<'a>, record: DataResource<'a>, data: &'a ConstraintData) -> Self {
        Self {
            schema,
            record,
            data,
            permissions: None,
        }
    }

    /// Permissions consulted when an action button decides whether it is enabled.
    pub fn with_permissions(mut self, permissions: Option<&'a AllowedPermissions>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn record(&self) -> DataResource<'a> {
        self.record
    }

    pub fn schema(&self) -> &'a ResourceSchema<'a> {
        self.schema
    }

    fn raw(&self, attribute: &Attribute) -> Value {
        self.record.data().get(&attribute.id).cloned().unwrap_or(Value::Null)
    }

    /// The typed value stored under `attribute_id`, if the attribute exists.
    pub fn data_value(&self, attribute_id: &str) -> Option<DataValue<'a>> {
        let (attribute, constraint) = self.schema.attribute(attribute_id)?;
        Some(constraint.create_data_value(self.raw(attribute), self.data))
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    /// Evaluates one filter; `None` when its attribute is not in the schema.
    pub fn meets_filter(&self, filter: &AttributeFilter) -> Option<bool> {
        self.meets_filter_at(filter, 0)
    }

    fn meets_filter_at(&self, filter: &AttributeFilter, depth: usize) -> Option<bool> {
        let (attribute, constraint) = self.schema.attribute(&filter.attribute_id)?;
        if let Constraint::Action(config) = constraint {
            let enabled = || self.is_action_enabled_at(attribute, config, depth + 1);
            return Some(match filter.condition {
                ConditionType::Enabled => enabled(),
                ConditionType::Disabled => !enabled(),
                _ => false,
            });
        }
        let value = constraint.create_data_value(self.raw(attribute), self.data);
        Some(value.meet_condition(filter.condition, &filter.condition_values))
    }

    /// Every filter whose attribute exists must hold; the others are ignored.
    pub fn meets_filters<'f, I>(&self, filters: I) -> bool
    where
        I: IntoIterator<Item = &'f AttributeFilter>,
    {
        filters.into_iter().all(|filter| match self.meets_filter(filter) {
            Some(satisfied) => satisfied,
            None => {
                trace!(
                    attribute = %filter.attribute_id,
                    resource = %self.schema.resource().id(),
                    "filter on unknown attribute dropped"
                );
                true
            }
        })
    }

    /// Evaluates an equation's direct filters with its operator. An equation
    /// without applicable filters holds.
    pub fn meets_equation(&self, equation: &AttributeFilterEquation) -> bool {
        self.filters_stats(&equation.filters(), equation.operator(), 0).1
    }

    fn filters_stats(
        &self,
        filters: &[&AttributeFilter],
        operator: EquationOperator,
        depth: usize,
    ) -> (Vec<AttributeLockFilterStats>, bool) {
        let stats: Vec<AttributeLockFilterStats> = filters
            .iter()
            .filter_map(|filter| {
                self.meets_filter_at(filter, depth).map(|satisfy| AttributeLockFilterStats {
                    filter: (*filter).clone(),
                    satisfy,
                })
            })
            .collect();
        let satisfy = stats.is_empty()
            || match operator {
                EquationOperator::Or => stats.iter().any(|s| s.satisfy),
                EquationOperator::And => stats.iter().all(|s| s.satisfy),
            };
        (stats, satisfy)
    }

    /// Any term found in any attribute's typed value. Terms are expected
    /// already folded; an empty list matches.
    pub fn meets_fulltexts(&self, terms: &[String]) -> bool {
        if terms.is_empty() {
            return true;
        }
        let values: Vec<DataValue<'_>> = self
            .schema
            .iter()
            .map(|(attribute, constraint)| constraint.create_data_value(self.raw(attribute), self.data))
            .collect();
        terms.iter().any(|term| {
            let term = std::slice::from_ref(term);
            values.iter().any(|value| value.meet_full_texts(term))
        })
    }

    // ------------------------------------------------------------------------
    // Locks and actions
    // ------------------------------------------------------------------------

    /// Statistics of every exception group of `lock` that applies to the
    /// current user. Groups are joined with OR.
    pub fn lock_stats(&self, lock: Option<&AttributeLock>) -> AttributeLockStats {
        self.lock_stats_at(lock, 0)
    }

    fn lock_stats_at(&self, lock: Option<&AttributeLock>, depth: usize) -> AttributeLockStats {
        let mut stats = AttributeLockStats::default();
        for group in lock.map_or(&[][..], |l| l.exception_groups.as_slice()) {
            if !group_applies(group, self.data) {
                continue;
            }
            let (filters_stats, satisfy) = match &group.equation {
                Some(equation) => self.filters_stats(&equation.filters(), equation.operator(), depth),
                None => (Vec::new(), true),
            };
            stats.satisfy |= satisfy;
            stats.groups.push(AttributeLockGroupStats {
                exception_group: group.clone(),
                filters_stats,
                satisfy,
            });
        }
        stats
    }

    /// Whether the action button `attribute` is enabled on this record.
    pub fn is_action_enabled(&self, attribute: &Attribute) -> bool {
        match self.schema.attribute(&attribute.id) {
            Some((attribute, Constraint::Action(config))) => self.is_action_enabled_at(attribute, config, 0),
            _ => false,
        }
    }

    fn is_action_enabled_at(&self, attribute: &Attribute, config: &ActionConstraintConfig, depth: usize) -> bool {
        if depth > MAX_ACTION_DEPTH {
            trace!(attribute = %attribute.id, "action lock nesting too deep");
            return false;
        }
        if !self.lock_stats_at(attribute.lock.as_ref(), depth).satisfy {
            return false;
        }
        self.permissions.map_or(true, |permissions| {
            has_role_by_permissions(
                config.role.unwrap_or(RoleType::Write),
                self.record,
                self.schema.resource(),
                permissions,
                self.data.current_user.as_ref(),
                self.data,
            )
        })
    }
}

/// Everyone groups always apply; user and team groups apply when the
/// current user is listed directly or through a team.
pub(crate) fn group_applies(group: &AttributeLockExceptionGroup, data: &ConstraintData) -> bool {
    match group.kind {
        Some(AttributeLockGroupType::Everyone) => true,
        Some(AttributeLockGroupType::UsersAndTeams) => {
            let config = UserConstraintConfig {
                multi: true,
                kind: Some(UserConstraintType::UsersAndTeams),
                ..Default::default()
            };
            let members = Constraint::User(config);
            let raw = Value::Array(group.type_value.iter().cloned().map(Value::String).collect());
            let value = members.create_data_value(raw, data);
            [ConstraintConditionValue::CurrentUser, ConstraintConditionValue::CurrentTeams]
                .into_iter()
                .any(|kind| value.meet_condition(ConditionType::HasSome, &[ConditionValue::symbolic(kind)]))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumio_model::{Collection, ConstraintSpec, ConstraintType, DataMap, Document, Team, User};
    use serde_json::json;

    fn collection() -> Collection {
        Collection::new(
            "c1",
            vec![
                Attribute::new("a1", "Name"),
                Attribute::new("a2", "Amount")
                    .with_constraint(ConstraintSpec::new(ConstraintType::Number, Value::Null)),
            ],
        )
    }

    fn document(name: &str, amount: Value) -> Document {
        let mut data = DataMap::new();
        data.insert("a1".to_string(), json!(name));
        data.insert("a2".to_string(), amount);
        Document::new("d1", "c1", data)
    }

    fn eq(attribute: &str, value: Value) -> AttributeFilter {
        AttributeFilter::new(attribute, ConditionType::Equals, vec![ConditionValue::literal(value)])
    }

    #[test]
    fn unknown_attributes_are_dropped() {
        let collection = collection();
        let schema = ResourceSchema::new(AttributesResource::Collection(&collection), LanguageTag::default());
        let doc = document("IBM", json!("40"));
        let data = ConstraintData::default();
        let evaluator = RecordEvaluator::new(&schema, DataResource::Document(&doc), &data);

        assert_eq!(evaluator.meets_filter(&eq("a9", json!("x"))), None);
        assert!(evaluator.meets_filters([&eq("a9", json!("x")), &eq("a1", json!("IBM"))]));
        assert!(!evaluator.meets_filters([&eq("a2", json!("41"))]));
    }

    #[test]
    fn equation_operator_from_first_child() {
        let collection = collection();
        let schema = ResourceSchema::new(AttributesResource::Collection(&collection), LanguageTag::default());
        let doc = document("IBM", json!("40"));
        let data = ConstraintData::default();
        let evaluator = RecordEvaluator::new(&schema, DataResource::Document(&doc), &data);

        let filters = vec![eq("a1", json!("IBM")), eq("a2", json!("41"))];
        let or = AttributeFilterEquation::of(filters.clone(), EquationOperator::Or);
        let and = AttributeFilterEquation::of(filters, EquationOperator::And);
        assert!(evaluator.meets_equation(&or));
        assert!(!evaluator.meets_equation(&and));
        assert!(evaluator.meets_equation(&AttributeFilterEquation::default()));
    }

    #[test]
    fn fulltext_any_term_any_value() {
        let collection = collection();
        let schema = ResourceSchema::new(AttributesResource::Collection(&collection), LanguageTag::default());
        let doc = document("Red Hat", json!("100"));
        let data = ConstraintData::default();
        let evaluator = RecordEvaluator::new(&schema, DataResource::Document(&doc), &data);

        assert!(evaluator.meets_fulltexts(&["zzz".to_string(), "hat".to_string()]));
        assert!(evaluator.meets_fulltexts(&["100".to_string()]));
        assert!(!evaluator.meets_fulltexts(&["ibm".to_string()]));
        assert!(evaluator.meets_fulltexts(&[]));
    }

    #[test]
    fn user_groups_apply_through_teams() {
        let data = ConstraintData {
            users: vec![User::new("u1", "Ann", "ann@lumio.io"), User::new("u2", "Bob", "bob@lumio.io")],
            teams: vec![Team::new("t1", "Ops", &["u2"])],
            current_user: Some(User::new("u2", "Bob", "bob@lumio.io")),
            ..Default::default()
        };
        let direct = AttributeLockExceptionGroup {
            kind: Some(AttributeLockGroupType::UsersAndTeams),
            type_value: vec!["ann@lumio.io".to_string()],
            equation: None,
        };
        let team = AttributeLockExceptionGroup {
            type_value: vec!["@t1".to_string()],
            ..direct.clone()
        };
        assert!(!group_applies(&direct, &data));
        assert!(group_applies(&team, &data));
        assert!(!group_applies(&AttributeLockExceptionGroup::default(), &data));
    }
}
