use lumio_model::{
    ConditionType, ConditionValue, ConstraintData, ConstraintType, LanguageTag, SelectOption,
    Team, User,
};
use lumio_values::{aggregate_data_values, create_constraint, Constraint, DataAggregationType};
use serde_json::{json, Value};

fn constraint(kind: ConstraintType, config: Value) -> Constraint {
    create_constraint(kind, &config, LanguageTag::default())
}

fn literal(value: Value) -> Vec<ConditionValue> {
    vec![ConditionValue::literal(value)]
}

// ============================================================================
// Numeric kinds
// ============================================================================

#[test]
fn work_duration_formats_negative_millis() {
    let duration = constraint(ConstraintType::Duration, json!({"type": "Work"}));
    let data = ConstraintData::default();
    let value = duration.create_data_value(json!("-93214124"), &data);
    assert_eq!(value.format(), "-3d1h53m34s");
    assert_eq!(value.serialize(), json!(-93214124));
}

#[test]
fn percentage_reads_signed_text_and_rounds_display() {
    let data = ConstraintData::default();
    let plain = constraint(ConstraintType::Percentage, Value::Null);
    assert_eq!(plain.create_data_value(json!("66.66%"), &data).serialize(), json!("0.6666"));

    let rounded = constraint(ConstraintType::Percentage, json!({"decimals": 0}));
    assert_eq!(rounded.create_data_value(json!(0.666), &data).format(), "67%");
}

#[test]
fn exact_sum_across_representations() {
    let number = constraint(ConstraintType::Number, Value::Null);
    let values = [json!(3.55), json!(3.67), json!(2)];
    let sum = aggregate_data_values(
        DataAggregationType::Sum,
        &values,
        Some(&number),
        true,
        &ConstraintData::default(),
    );
    assert_eq!(sum, json!(9.22));
}

// ============================================================================
// Dates
// ============================================================================

#[test]
fn year_format_compares_whole_years() {
    let date = constraint(ConstraintType::DateTime, json!({"format": "YYYY", "asUtc": true}));
    let data = ConstraintData::default();
    let march = date.create_data_value(json!("2021-03-12T08:00:00.000Z"), &data);
    let october = date.create_data_value(json!("2021-10-01T00:00:00.000Z"), &data);
    assert_eq!(march.compare_to(&october), std::cmp::Ordering::Equal);
    assert!(march.meet_condition(ConditionType::Equals, &literal(json!("2021-10-01T00:00:00.000Z"))));
    assert!(!march.meet_condition(ConditionType::Equals, &literal(json!("2022-03-12T08:00:00.000Z"))));
}

// ============================================================================
// Sets
// ============================================================================

#[test]
fn select_has_all_needs_every_operand() {
    let options: Vec<SelectOption> = ["A", "B", "C"].iter().map(|v| SelectOption::new(*v, None)).collect();
    let select = Constraint::Select(lumio_model::SelectConstraintConfig {
        multi: true,
        options,
        ..Default::default()
    });
    let data = ConstraintData::default();
    let operand = literal(json!(["A", "B"]));
    assert!(select
        .create_data_value(json!(["A", "B", "C"]), &data)
        .meet_condition(ConditionType::HasAll, &operand));
    assert!(!select
        .create_data_value(json!(["A"]), &data)
        .meet_condition(ConditionType::HasAll, &operand));
}

#[test]
fn user_matches_team_by_membership() {
    let data = ConstraintData {
        users: vec![User::new("u1", "Ann", "ann@lumio.io"), User::new("u2", "Bob", "bob@lumio.io")],
        teams: vec![Team::new("t1", "Sales", &["u1"])],
        ..Default::default()
    };
    let user = constraint(ConstraintType::User, Value::Null);
    let team = literal(json!("@t1"));
    assert!(user.create_data_value(json!("ann@lumio.io"), &data).meet_condition(ConditionType::HasSome, &team));
    assert!(!user.create_data_value(json!("bob@lumio.io"), &data).meet_condition(ConditionType::HasSome, &team));
}

#[test]
fn missing_operands_never_match() {
    let data = ConstraintData::default();
    let number = constraint(ConstraintType::Number, Value::Null);
    let value = number.create_data_value(json!(5), &data);
    assert!(!value.meet_condition(ConditionType::Between, &literal(json!(1))));
    assert!(!value.meet_condition(ConditionType::Equals, &[]));
    assert!(value.meet_condition(ConditionType::NotEmpty, &[]));
}

// ============================================================================
// Live input
// ============================================================================

#[test]
fn input_values_keep_typed_text() {
    let data = ConstraintData::default();
    for kind in [ConstraintType::Number, ConstraintType::Text, ConstraintType::Color] {
        let constraint = constraint(kind, Value::Null);
        let typed = constraint.create_input_data_value("12", &data);
        assert_eq!(typed.format(), "12", "{kind:?}");
    }
}

#[test]
fn value_by_condition_fallbacks() {
    let data = ConstraintData::default();
    let number = constraint(ConstraintType::Number, Value::Null);
    let value = number.create_data_value(Value::Null, &data);
    assert_eq!(value.value_by_condition(ConditionType::NotEmpty, &[]), json!("19"));
    let text = constraint(ConstraintType::Text, Value::Null);
    let value = text.create_data_value(Value::Null, &data);
    assert_eq!(value.value_by_condition(ConditionType::NotEmpty, &[]), json!("a"));
}

// ============================================================================
// Coordinates
// ============================================================================

#[test]
fn coordinates_read_degrees_minutes_seconds() {
    use approx::assert_abs_diff_eq;
    use lumio_values::value::parse_coordinates;

    let dms = parse_coordinates("49°12'7.1\"N 16°26'16.4\"E").unwrap();
    assert_abs_diff_eq!(dms.lat, 49.201_972, epsilon = 1e-5);
    assert_abs_diff_eq!(dms.lng, 16.437_889, epsilon = 1e-5);

    let west = parse_coordinates("16°26'16.4\"W 49°12'7.1\"S").unwrap();
    assert_abs_diff_eq!(west.lat, -dms.lat, epsilon = 1e-9);
    assert_abs_diff_eq!(west.lng, -dms.lng, epsilon = 1e-9);

    assert!(parse_coordinates("91, 10").is_none());
}
