use super::{
    format_unknown, is_truthy, lacks_current_user, meets_condition_by_ids, meets_fulltexts,
    raw_text, value_by_condition_ids, TypedValue,
};
use lumio_model::{
    ConditionType, ConditionValue, ConstraintConditionValue, ConstraintData, Team,
    TeamConstraintConfig,
};
use serde_json::Value;
use std::cmp::Ordering;

/// Teams referenced by id. Ids unknown to the context are dropped.
#[derive(Debug, Clone)]
pub struct TeamDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a TeamConstraintConfig,
    data: &'a ConstraintData,
    teams: Vec<&'a Team>,
}

impl<'a> TeamDataValue<'a> {
    pub fn new(
        raw: Value,
        config: &'a TeamConstraintConfig,
        data: &'a ConstraintData,
        input: Option<&str>,
    ) -> Self {
        let ids: Vec<String> = match &raw {
            Value::Array(items) => items.iter().map(raw_text).collect(),
            other => vec![raw_text(other)],
        };
        let teams = ids
            .iter()
            .filter(|id| !id.trim().is_empty())
            .filter_map(|id| data.find_team(id))
            .collect();
        Self {
            raw,
            input: input.map(str::to_string),
            config,
            data,
            teams,
        }
    }

    pub fn teams(&self) -> &[&'a Team] {
        &self.teams
    }

    fn ids(&self) -> Vec<String> {
        self.teams.iter().map(|t| t.id.clone()).collect()
    }

    fn operand_ids(&self, values: &[ConditionValue]) -> Vec<String> {
        match values.first() {
            Some(value) if value.kind == Some(ConstraintConditionValue::CurrentTeams) => self
                .data
                .current_user_teams()
                .into_iter()
                .map(|t| t.id.clone())
                .collect(),
            Some(value) => self.copy_with(value.raw().clone()).ids(),
            None => Vec::new(),
        }
    }
}

impl<'a> TypedValue for TeamDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        if self.teams.is_empty() {
            return format_unknown(&self.raw);
        }
        self.teams
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn serialize(&self) -> Value {
        if self.config.multi {
            return Value::Array(self.ids().into_iter().map(Value::String).collect());
        }
        self.teams
            .first()
            .map_or(Value::Null, |t| Value::String(t.id.clone()))
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        // unknown ids never make it into `teams`
        self.input.is_some() || !is_truthy(&self.raw) || !self.teams.is_empty()
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        self.format().cmp(&other.format())
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, self.config, self.data, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), self.config, self.data, Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        if lacks_current_user(values, self.data) {
            return false;
        }
        meets_condition_by_ids(condition, &self.ids(), &self.operand_ids(values), &self.format())
    }

    fn meet_full_texts(&self, fulltexts: &[String]) -> bool {
        meets_fulltexts(&self.format(), fulltexts) || meets_fulltexts(&self.ids().join(", "), fulltexts)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        let known: Vec<String> = self.data.teams.iter().map(|t| t.id.clone()).collect();
        value_by_condition_ids(condition, values, &self.operand_ids(values), &known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumio_model::User;
    use serde_json::json;

    fn data() -> ConstraintData {
        ConstraintData {
            teams: vec![
                Team::new("t1", "Sales", &["u1"]),
                Team::new("t2", "Ops", &["u2"]),
            ],
            current_user: Some(User::new("u1", "Ann", "ann@lumio.io")),
            ..Default::default()
        }
    }

    #[test]
    fn drops_unknown_teams() {
        let data = data();
        let config = TeamConstraintConfig { multi: true };
        let v = TeamDataValue::new(json!(["t2", "zz", "t1"]), &config, &data, None);
        assert_eq!(v.format(), "Ops, Sales");
        assert_eq!(v.serialize(), json!(["t2", "t1"]));
        assert!(!TeamDataValue::new(json!("zz"), &config, &data, None).is_valid(false));
    }

    #[test]
    fn current_teams_condition() {
        let data = data();
        let config = TeamConstraintConfig::default();
        let current = [ConditionValue::symbolic(ConstraintConditionValue::CurrentTeams)];
        assert!(TeamDataValue::new(json!("t1"), &config, &data, None)
            .meet_condition(ConditionType::HasSome, &current));
        assert!(TeamDataValue::new(json!("t2"), &config, &data, None)
            .meet_condition(ConditionType::HasNoneOf, &current));
    }

    #[test]
    fn current_teams_without_user_match_nothing() {
        let data = ConstraintData {
            current_user: None,
            ..data()
        };
        let config = TeamConstraintConfig::default();
        let current = [ConditionValue::symbolic(ConstraintConditionValue::CurrentTeams)];
        let v = TeamDataValue::new(json!("t2"), &config, &data, None);
        for condition in [
            ConditionType::HasSome,
            ConditionType::HasNoneOf,
            ConditionType::NotEquals,
            ConditionType::HasAll,
        ] {
            assert!(!v.meet_condition(condition, &current), "{condition:?}");
        }
        assert!(v.meet_condition(ConditionType::NotEquals, &[ConditionValue::literal("t1")]));
    }

    #[test]
    fn fulltext_matches_names_and_ids() {
        let data = ConstraintData {
            teams: vec![Team::new("ops7", "Operations", &["u2"])],
            ..Default::default()
        };
        let config = TeamConstraintConfig::default();
        let v = TeamDataValue::new(json!("ops7"), &config, &data, None);
        assert!(v.meet_full_texts(&["operations".to_string()]));
        assert!(v.meet_full_texts(&["OPS7".to_string()]));
        assert!(!v.meet_full_texts(&["sales".to_string()]));
    }

    #[test]
    fn suggests_other_team() {
        let data = data();
        let config = TeamConstraintConfig::default();
        let v = TeamDataValue::new(Value::Null, &config, &data, None);
        let t1 = [ConditionValue::literal("t1")];
        assert_eq!(v.value_by_condition(ConditionType::NotEquals, &t1), json!("t2"));
        assert_eq!(v.value_by_condition(ConditionType::NotEmpty, &[]), json!("t1"));
    }
}
