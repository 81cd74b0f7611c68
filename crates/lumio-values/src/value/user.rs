use super::{
    format_unknown, is_truthy, lacks_current_user, meets_fulltexts, raw_text, TypedValue,
};
use crate::text::is_email_valid;
use lumio_model::{
    ConditionType, ConditionValue, ConstraintConditionValue, ConstraintData, Team, User,
    UserConstraintConfig,
};
use serde_json::Value;
use std::cmp::Ordering;

const TEAM_PREFIX: char = '@';

/// Users referenced by e-mail and teams referenced by `@teamId`.
#[derive(Debug, Clone)]
pub struct UserDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a UserConstraintConfig,
    data: &'a ConstraintData,
    users: Vec<User>,
    teams: Vec<&'a Team>,
    users_ids: Vec<String>,
    teams_users_ids: Vec<String>,
    all_users_ids: Vec<String>,
}

pub fn is_team_value(value: &str) -> bool {
    value.starts_with(TEAM_PREFIX)
}

pub fn team_value(team_id: &str) -> String {
    format!("{TEAM_PREFIX}{team_id}")
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|i| i == id) {
        ids.push(id.to_string());
    }
}

fn intersects(a: &[String], b: &[String]) -> bool {
    a.iter().any(|x| b.contains(x))
}

fn intersection_len(a: &[String], b: &[String]) -> usize {
    a.iter().filter(|x| b.contains(x)).count()
}

/// The user's id; users unknown to the context are identified by e-mail.
fn identity(user: &User) -> &str {
    user.id.as_deref().unwrap_or(&user.email)
}

impl<'a> UserDataValue<'a> {
    pub fn new(
        raw: Value,
        config: &'a UserConstraintConfig,
        data: &'a ConstraintData,
        input: Option<&str>,
    ) -> Self {
        let current = match input {
            Some(text) => Value::String(text.to_string()),
            None => raw.clone(),
        };
        let (users, teams) = resolve(&current, config, data, input.is_none());

        let users_ids: Vec<String> = users.iter().map(|u| identity(u).to_string()).collect();
        let mut teams_users_ids = Vec::new();
        for id in teams.iter().flat_map(|t| t.users.iter()) {
            push_unique(&mut teams_users_ids, id);
        }
        let mut all_users_ids = Vec::new();
        for id in users_ids.iter().chain(teams_users_ids.iter()) {
            push_unique(&mut all_users_ids, id);
        }

        Self {
            raw,
            input: input.map(str::to_string),
            config,
            data,
            users,
            teams,
            users_ids,
            teams_users_ids,
            all_users_ids,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn teams(&self) -> &[&'a Team] {
        &self.teams
    }

    /// Ids of the referenced users and of every member of the referenced teams.
    pub fn all_users_ids(&self) -> &[String] {
        &self.all_users_ids
    }

    pub fn teams_ids(&self) -> Vec<String> {
        self.teams.iter().map(|t| t.id.clone()).collect()
    }

    /// Names (or e-mails) of the teams followed by the users.
    pub fn format_preferring(&self, prefer_email: bool) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        if self.users.is_empty() && self.teams.is_empty() {
            return format_unknown(&self.raw);
        }
        self.teams
            .iter()
            .map(|t| t.name.clone())
            .chain(self.users.iter().map(|u| {
                if prefer_email && !u.email.is_empty() {
                    u.email.clone()
                } else {
                    u.display_name().to_string()
                }
            }))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Resolves the symbolic operands `currentUser` and `currentTeams`.
    fn condition_operand(&self, value: &ConditionValue) -> Self {
        match value.kind {
            Some(ConstraintConditionValue::CurrentUser) => {
                let email = self
                    .data
                    .current_user
                    .as_ref()
                    .map_or(Value::Null, |u| Value::String(u.email.clone()));
                self.copy_with(email)
            }
            Some(ConstraintConditionValue::CurrentTeams) if self.data.current_user.is_some() => {
                let teams = self
                    .data
                    .current_user_teams()
                    .into_iter()
                    .map(|t| Value::String(team_value(&t.id)))
                    .collect();
                self.copy_with(Value::Array(teams))
            }
            _ => self.copy_with(value.raw().clone()),
        }
    }

    fn shares_any(&self, other: &Self) -> bool {
        intersects(&other.teams_ids(), &self.teams_ids())
            || intersects(&other.teams_users_ids, &self.users_ids)
            || intersects(&other.users_ids, &self.all_users_ids)
    }

    fn is_user_valid(&self, user: &User) -> bool {
        self.data.find_user_by_email(&user.email).is_some()
            || (self.config.external_users && is_email_valid(&user.email))
    }
}

fn resolve<'a>(
    value: &Value,
    config: &UserConstraintConfig,
    data: &'a ConstraintData,
    show_invalid: bool,
) -> (Vec<User>, Vec<&'a Team>) {
    let values: Vec<String> = match value {
        Value::Array(items) => items.iter().map(raw_text).collect(),
        other => vec![raw_text(other)],
    };
    let mut users = Vec::new();
    let mut teams = Vec::new();
    for value in values.into_iter().filter(|v| !v.trim().is_empty()) {
        if is_team_value(&value) {
            if let Some(team) = data.find_team(&value[TEAM_PREFIX.len_utf8()..]) {
                teams.push(team);
            }
            continue;
        }
        let known = data.find_user_by_email(&value);
        let keep = show_invalid
            || known.is_some_and(|u| u.id.is_some())
            || (config.external_users && is_email_valid(&value));
        if keep {
            let mut user = known.cloned().unwrap_or_else(|| User {
                id: None,
                name: Some(value.clone()),
                email: value.clone(),
            });
            if user.id.is_none() {
                user.id = Some(user.email.clone());
            }
            users.push(user);
        }
    }
    (users, teams)
}

impl<'a> TypedValue for UserDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        self.format_preferring(false)
    }

    fn edit_value(&self) -> String {
        match self.serialize() {
            Value::Array(values) => values.iter().map(raw_text).collect::<Vec<_>>().join(","),
            other => raw_text(&other),
        }
    }

    fn serialize(&self) -> Value {
        let teams = self.teams.iter().map(|t| team_value(&t.id));
        let users = self.users.iter().map(|u| u.email.clone());
        if self.config.multi {
            return Value::Array(teams.chain(users).map(Value::String).collect());
        }
        teams.chain(users).next().map_or(Value::Null, Value::String)
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        if self.input.is_some() || !is_truthy(&self.raw) {
            return true;
        }
        self.users.iter().all(|u| self.is_user_valid(u))
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
        let other = values.first().map(|v| self.condition_operand(v));
        let empty = Self::new(Value::Null, self.config, self.data, None);
        let other = other.as_ref().unwrap_or(&empty);
        let own_teams = self.teams_ids();
        let other_teams = other.teams_ids();

        match condition {
            ConditionType::HasSome | ConditionType::Equals => self.shares_any(other),
            ConditionType::HasNoneOf | ConditionType::NotEquals => !self.shares_any(other),
            ConditionType::In => {
                (!self.users_ids.is_empty() || !own_teams.is_empty())
                    && own_teams.iter().all(|t| other_teams.contains(t))
                    && self.users_ids.iter().all(|u| other.users_ids.contains(u))
            }
            ConditionType::HasAll => {
                intersection_len(&other_teams, &own_teams) == other_teams.len()
                    && intersection_len(&other.users_ids, &self.all_users_ids)
                        == other.users_ids.len()
            }
            ConditionType::IsEmpty => {
                self.users.is_empty() && self.teams.is_empty() && self.format().trim().is_empty()
            }
            ConditionType::NotEmpty => {
                !self.users.is_empty() || !self.teams.is_empty() || !self.format().trim().is_empty()
            }
            _ => false,
        }
    }

    fn meet_full_texts(&self, fulltexts: &[String]) -> bool {
        meets_fulltexts(&self.format_preferring(false), fulltexts)
            || meets_fulltexts(&self.format_preferring(true), fulltexts)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        let other = values.first().map(|v| self.condition_operand(v));
        let other_users = other.as_ref().map_or(&[][..], |o| o.users.as_slice());
        let other_teams = other.as_ref().map_or(&[][..], |o| o.teams.as_slice());
        match condition {
            ConditionType::HasSome | ConditionType::Equals | ConditionType::In => other_teams
                .first()
                .map(|t| team_value(&t.id))
                .or_else(|| other_users.first().map(|u| u.email.clone()))
                .map_or(Value::Null, Value::String),
            ConditionType::HasAll => values.first().map_or(Value::Null, |v| v.raw().clone()),
            ConditionType::HasNoneOf | ConditionType::NotEquals => self
                .data
                .users
                .iter()
                .find(|u| !other_users.iter().any(|o| o.email == u.email))
                .map_or(Value::Null, |u| Value::String(u.email.clone())),
            ConditionType::IsEmpty => Value::String(String::new()),
            ConditionType::NotEmpty => self
                .data
                .current_user
                .as_ref()
                .map_or(Value::Null, |u| Value::String(u.email.clone())),
            _ => Value::Null,
        }
    }
}
