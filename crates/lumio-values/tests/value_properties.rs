use lumio_model::{ConstraintData, ConstraintType, LanguageTag};
use lumio_values::decimal::{parse_decimal, plain_string};
use lumio_values::{aggregate_data_values, create_constraint, DataAggregationType};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Decimal text with up to two fractional digits, stored as a string.
fn cents() -> impl Strategy<Value = (i64, String)> {
    (-1_000_000i64..1_000_000).prop_map(|cents| {
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        (cents, format!("{sign}{}.{:02}", abs / 100, abs % 100))
    })
}

fn raw_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i32>().prop_map(Value::from),
        "[a-z0-9 @#.,:%-]{0,12}".prop_map(Value::String),
        prop::collection::vec("[a-z]{1,4}", 0..3).prop_map(|items| json!(items)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn sums_of_cents_are_exact(values in prop::collection::vec(cents(), 1..40)) {
        let number = create_constraint(ConstraintType::Number, &Value::Null, LanguageTag::default());
        let expected_cents: i64 = values.iter().map(|(c, _)| *c).sum();
        let raws: Vec<Value> = values.into_iter().map(|(_, text)| Value::String(text)).collect();
        let sum = aggregate_data_values(
            DataAggregationType::Sum,
            &raws,
            Some(&number),
            true,
            &ConstraintData::default(),
        );
        let text = match &sum {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let expected = parse_decimal(&expected_cents.to_string()).map(|d| d / bigdecimal::BigDecimal::from(100));
        prop_assert_eq!(parse_decimal(&text), expected);
    }

    #[test]
    fn copies_serialize_identically(raw in raw_value()) {
        let data = ConstraintData::default();
        for kind in ConstraintType::ALL {
            let constraint = create_constraint(kind, &Value::Null, LanguageTag::default());
            let value = constraint.create_data_value(raw.clone(), &data);
            prop_assert_eq!(value.copy().serialize(), value.serialize(), "{:?}", kind);
        }
    }

    #[test]
    fn duration_format_is_stable(millis in 0i64..10_000_000_000) {
        let duration = create_constraint(ConstraintType::Duration, &Value::Null, LanguageTag::default());
        let data = ConstraintData::default();
        let value = duration.create_data_value(Value::String(millis.to_string()), &data);
        let formatted = value.format();
        let reparsed = duration.create_data_value(Value::String(formatted.clone()), &data);
        prop_assert_eq!(reparsed.format(), formatted);
    }

    #[test]
    fn plain_rendering_reparses(cents in cents()) {
        let (_, text) = cents;
        let parsed = parse_decimal(&text);
        prop_assert!(parsed.is_some());
        let rendered = parsed.as_ref().map(plain_string);
        prop_assert_eq!(rendered.as_deref().and_then(parse_decimal), parsed);
    }
}
