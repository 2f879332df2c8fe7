use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("bad input: {0}")]
struct BadInput(String);

#[derive(Debug, Clone, PartialEq)]
struct Celsius(f64);

fn text(s: &str) -> Value {
	Value::new(s.to_string())
}

fn parse_celsius(s: &String) -> Result<Celsius, BadInput> {
	s.trim_end_matches('C')
		.parse()
		.map(Celsius)
		.map_err(|_| BadInput(s.clone()))
}

fn sealed(build: impl FnOnce(&mut ConversionRegistry)) -> ConversionRegistry {
	let mut registry = ConversionRegistry::new();
	build(&mut registry);
	registry.sealed()
}

/// A registered rule converts a matching value.
#[test]
fn test_register_then_convert() {
	let registry = sealed(|r| r.register(None, parse_celsius).unwrap());

	let temp: Celsius = registry.convert(text("21.5C"), None).unwrap();
	assert_eq!(temp, Celsius(21.5));
}

/// A value already of the destination type skips every rule, whatever the format.
#[test]
fn test_fast_path_skips_rules() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	let registry = sealed(|r| {
		r.register(Some(FormatPattern::regex(".*").unwrap()), move |c: &Celsius| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok::<_, BadInput>(Celsius(c.0 + 1.0))
		})
		.unwrap();
	});

	for format in [None, Some("anything"), Some("")] {
		let temp: Celsius = registry.convert(Value::new(Celsius(3.0)), format).unwrap();
		assert_eq!(temp, Celsius(3.0));
	}
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// The most recently registered matching rule wins.
#[test]
fn test_last_registered_wins() {
	let registry = sealed(|r| {
		r.register(None, |s: &String| Ok::<_, BadInput>(s.len())).unwrap();
		r.register(None, |_: &String| Ok::<_, BadInput>(usize::MAX)).unwrap();
	});

	let n: usize = registry.convert(text("abc"), None).unwrap();
	assert_eq!(n, usize::MAX);
}

/// An override for one format leaves older rules in charge of other formats.
#[test]
fn test_override_is_scoped_to_format() {
	let registry = sealed(|r| {
		r.register(Some("a".into()), |_: &String| Ok::<_, BadInput>(1_u8)).unwrap();
		r.register(Some("b".into()), |_: &String| Ok::<_, BadInput>(2_u8)).unwrap();
		r.register(Some("a".into()), |_: &String| Ok::<_, BadInput>(3_u8)).unwrap();
	});

	assert_eq!(registry.convert::<u8>(text("x"), Some("a")).unwrap(), 3);
	assert_eq!(registry.convert::<u8>(text("x"), Some("b")).unwrap(), 2);
}

/// A newer rule for another source type does not hide an older one.
#[test]
fn test_source_type_filters_rules() {
	let registry = sealed(|r| {
		r.register(None, |s: &String| Ok::<_, BadInput>(s.len() as u64)).unwrap();
		r.register(None, |n: &u32| Ok::<_, BadInput>(u64::from(*n) * 10)).unwrap();
	});

	assert_eq!(registry.convert::<u64>(text("four"), None).unwrap(), 4);
	assert_eq!(registry.convert::<u64>(Value::new(7_u32), None).unwrap(), 70);
}

#[rstest]
#[case::exact_same(FormatPattern::exact("iso"), "iso", true)]
#[case::exact_longer(FormatPattern::exact("iso"), "isox", false)]
#[case::exact_suffix_digit(FormatPattern::exact("iso"), "iso2", false)]
#[case::exact_shorter(FormatPattern::exact("iso"), "is", false)]
#[case::exact_empty(FormatPattern::exact(""), "", true)]
#[case::regex_full(FormatPattern::regex(r"radix:\d+").unwrap(), "radix:16", true)]
#[case::regex_trailing(FormatPattern::regex(r"radix:\d+").unwrap(), "radix:16x", false)]
#[case::regex_leading(FormatPattern::regex(r"radix:\d+").unwrap(), "xradix:16", false)]
#[case::regex_prefix_only(FormatPattern::regex("iso").unwrap(), "iso8601", false)]
#[case::regex_alternation(FormatPattern::regex("a|ab").unwrap(), "ab", true)]
#[case::regex_newline(FormatPattern::regex("iso").unwrap(), "iso\n", false)]
#[case::regex_catch_all(FormatPattern::regex(".+").unwrap(), "%Y-%m-%d", true)]
#[case::regex_catch_all_empty(FormatPattern::regex(".+").unwrap(), "", false)]
fn test_format_matches_fully(
	#[case] pattern: FormatPattern,
	#[case] candidate: &str,
	#[case] expected: bool,
) {
	assert_eq!(pattern.matches_fully(candidate), expected);
}

/// A regex that does not compile on its own is rejected rather than wrapped.
#[test]
fn test_unbalanced_regex_rejected() {
	assert!(FormatPattern::regex("a)|(b").is_err());
	assert!(FormatPattern::regex("(").is_err());
}

#[rstest]
#[case::both_absent(None, None, true)]
#[case::rule_absent(None, Some("iso"), false)]
#[case::request_absent(Some("iso"), None, false)]
#[case::both_present(Some("iso"), Some("iso"), true)]
fn test_null_format_policy(
	#[case] rule_format: Option<&str>,
	#[case] requested: Option<&str>,
	#[case] expected: bool,
) {
	let rule = ConversionRule::simple(rule_format.map(FormatPattern::from), parse_celsius);
	assert_eq!(rule.matches_format(requested), expected);
	assert_eq!(rule.matches(&text("1C"), requested), expected);
}

/// Registration after sealing fails with an invalid-state error.
#[test]
fn test_register_on_sealed_registry_fails() {
	let mut registry = ConversionRegistry::new().sealed();

	let err = registry.register(None, parse_celsius).unwrap_err();
	assert!(err.is_invalid_state());
	assert!(matches!(
		err,
		ConvertError::InvalidState {
			operation: "register",
			state: RegistryState::Sealed,
		}
	));

	let err = registry
		.register_formatted(None, |s: &String, _: Option<&str>| parse_celsius(s))
		.unwrap_err();
	assert!(err.is_invalid_state());
	assert!(registry.is_empty());
}

/// Converting before sealing fails with an invalid-state error, even on the fast path.
#[test]
fn test_convert_on_open_registry_fails() {
	let mut registry = ConversionRegistry::new();
	registry.register(None, parse_celsius).unwrap();

	let err = registry.convert::<Celsius>(text("1C"), None).unwrap_err();
	assert!(matches!(
		err,
		ConvertError::InvalidState {
			operation: "convert",
			state: RegistryState::Open,
		}
	));
	assert!(registry.convert::<String>(text("1C"), None).unwrap_err().is_invalid_state());
}

/// Sealing twice is harmless.
#[test]
fn test_seal_is_idempotent() {
	let mut registry = ConversionRegistry::new();
	registry.register(None, parse_celsius).unwrap();
	registry.seal();
	registry.seal();

	assert_eq!(registry.state(), RegistryState::Sealed);
	assert_eq!(registry.convert::<Celsius>(text("2C"), None).unwrap(), Celsius(2.0));
}

/// Without an eligible rule the value comes back inside the error.
#[test]
fn test_no_applicable_converter_returns_value() {
	let registry = sealed(|r| r.register(Some("c".into()), parse_celsius).unwrap());

	let err = registry.convert::<Celsius>(text("5C"), Some("f")).unwrap_err();
	let message = err.to_string();
	let ConvertError::NoApplicableConverter {
		value,
		destination,
		format,
	} = err
	else {
		panic!("expected NoApplicableConverter, got {message}");
	};
	assert_eq!(destination, TypeKey::of::<Celsius>());
	assert_eq!(format.as_deref(), Some("f"));
	assert_eq!(value.downcast::<String>().unwrap(), "5C");
	assert!(message.contains("alloc::string::String"), "{message}");
	assert!(message.contains("Celsius"), "{message}");
	assert!(message.contains("\"f\""), "{message}");
}

/// Destinations nobody registered for report NoApplicableConverter.
#[test]
fn test_unregistered_destination() {
	let registry = ConversionRegistry::new().sealed();

	let err = registry.convert::<Celsius>(text("5C"), None).unwrap_err();
	assert!(matches!(err, ConvertError::NoApplicableConverter { .. }));
}

/// Converter errors reach the caller untouched.
#[test]
fn test_converter_error_propagates() {
	let registry = sealed(|r| r.register(None, parse_celsius).unwrap());

	let err = registry.convert::<Celsius>(text("warm"), None).unwrap_err();
	assert_eq!(err.to_string(), "bad input: warm");
	let source = err.conversion_source().expect("converter failure");
	let bad = source.downcast_ref::<BadInput>().expect("original error type");
	assert_eq!(bad.0, "warm");
}

/// Format-aware converters receive the requested format.
#[test]
fn test_formatted_converter_sees_format() {
	let registry = sealed(|r| {
		r.register_formatted(
			Some(FormatPattern::regex(r"repeat:\d").unwrap()),
			|s: &String, format: Option<&str>| {
				let times = format
					.and_then(|f| f.strip_prefix("repeat:"))
					.and_then(|n| n.parse().ok())
					.ok_or_else(|| BadInput(format.unwrap_or_default().to_string()))?;
				Ok::<_, BadInput>(s.repeat(times).into_bytes())
			},
		)
		.unwrap();
	});

	let bytes: Vec<u8> = registry.convert(text("ab"), Some("repeat:3")).unwrap();
	assert_eq!(bytes, b"ababab".to_vec());
}

/// Dynamic conversion by type key follows the same rules as the typed entry point.
#[test]
fn test_convert_value_by_type_key() {
	let registry = sealed(|r| r.register(None, parse_celsius).unwrap());

	let out = registry
		.convert_value(text("4C"), TypeKey::of::<Celsius>(), None)
		.unwrap();
	assert_eq!(out.type_key(), TypeKey::of::<Celsius>());
	assert_eq!(out.downcast_ref::<Celsius>(), Some(&Celsius(4.0)));

	let same = registry
		.convert_value(text("4C"), TypeKey::of::<String>(), Some("ignored"))
		.unwrap();
	assert_eq!(same.downcast::<String>().unwrap(), "4C");
}

/// A copy is an open snapshot; later registrations stay on their own side.
#[test]
fn test_from_registry_is_independent_snapshot() {
	let original = sealed(|r| r.register(None, parse_celsius).unwrap());

	let mut copy = ConversionRegistry::from_registry(&original);
	assert!(!copy.is_sealed());
	copy.register(None, |_: &String| Ok::<_, BadInput>(Celsius(-1.0)))
		.unwrap();
	copy.seal();

	assert_eq!(original.len(), 1);
	assert_eq!(copy.len(), 2);
	assert_eq!(original.convert::<Celsius>(text("9C"), None).unwrap(), Celsius(9.0));
	assert_eq!(copy.convert::<Celsius>(text("9C"), None).unwrap(), Celsius(-1.0));
}

/// Rules are listed per destination in registration order.
#[test]
fn test_rules_for_preserves_order() {
	let registry = sealed(|r| {
		r.register(Some("first".into()), parse_celsius).unwrap();
		r.register(None, |n: &i32| Ok::<_, BadInput>(Celsius(f64::from(*n))))
			.unwrap();
		r.register(Some(FormatPattern::regex("th.*").unwrap()), parse_celsius)
			.unwrap();
		r.register(None, |s: &String| Ok::<_, BadInput>(s.len())).unwrap();
	});

	let formats: Vec<Option<String>> = registry
		.rules_for(TypeKey::of::<Celsius>())
		.map(|rule| rule.format().map(|f| f.to_string()))
		.collect();
	assert_eq!(
		formats,
		vec![Some("\"first\"".to_string()), None, Some("/th.*/".to_string())]
	);
	assert_eq!(registry.rules_for(TypeKey::of::<u16>()).count(), 0);
	assert_eq!(registry.len(), 4);
}

/// `find_rule` and `can_convert` agree with `convert`.
#[test]
fn test_find_rule_and_can_convert() {
	let registry = sealed(|r| {
		r.register(Some(FormatPattern::regex("c|celsius").unwrap()), parse_celsius)
			.unwrap();
	});
	let celsius = TypeKey::of::<Celsius>();

	let rule = registry
		.find_rule(&text("1C"), celsius, Some("celsius"))
		.expect("rule");
	assert_eq!(rule.source().key(), TypeKey::of::<String>());
	assert!(registry.find_rule(&text("1C"), celsius, Some("cels")).is_none());
	assert!(registry.find_rule(&Value::new(1_i32), celsius, Some("c")).is_none());

	assert!(registry.can_convert(&text("1C"), celsius, Some("c")));
	assert!(registry.can_convert(&Value::new(Celsius(0.0)), celsius, None));
	assert!(!registry.can_convert(&text("1C"), celsius, None));
}

/// Equivalent registrations are recorded as conflicts without changing selection.
#[test]
fn test_conflicts_recorded() {
	let registry = sealed(|r| {
		r.register(Some("c".into()), parse_celsius).unwrap();
		r.register(Some(FormatPattern::regex("c").unwrap()), parse_celsius)
			.unwrap();
		r.register(None, |n: &i32| Ok::<_, BadInput>(Celsius(f64::from(*n))))
			.unwrap();
		r.register(Some("c".into()), |_: &String| Ok::<_, BadInput>(Celsius(0.0)))
			.unwrap();
	});

	let conflicts = registry.conflicts();
	assert_eq!(conflicts.len(), 1);
	let conflict = &conflicts[0];
	assert_eq!(
		(conflict.shadowed, conflict.winner),
		(0, 3),
		"exact \"c\" and /c/ are different patterns"
	);
	assert_eq!(conflict.destination, TypeKey::of::<Celsius>());
	assert_eq!(conflict.source, TypeKey::of::<String>());
	assert_eq!(registry.convert::<Celsius>(text("5C"), Some("c")).unwrap(), Celsius(0.0));
}

/// Copies carry the conflicts recorded so far.
#[test]
fn test_from_registry_keeps_conflicts() {
	let mut original = ConversionRegistry::new();
	original.register(None, parse_celsius).unwrap();
	original.register(None, parse_celsius).unwrap();

	let copy = ConversionRegistry::from_registry(&original);
	assert_eq!(copy.conflicts().len(), 1);
}

/// Values remember the type they were created from.
#[test]
fn test_value_round_trips_type() {
	let value = Value::new(Celsius(1.5));
	assert!(value.is::<Celsius>());
	assert!(!value.is::<f64>());
	assert!(value.type_name().ends_with("Celsius"));
	assert_eq!(format!("{value:?}"), format!("Value<{}>", value.type_name()));

	let value = value.downcast::<f64>().unwrap_err();
	assert_eq!(value.downcast::<Celsius>().unwrap(), Celsius(1.5));
}

fn counting_registry(outputs: &[i64]) -> ConversionRegistry {
	let mut registry = ConversionRegistry::new();
	for &out in outputs {
		registry
			.register(None, move |_: &String| Ok::<_, BadInput>(out))
			.unwrap();
		registry
			.register(Some(FormatPattern::regex(".*").unwrap()), move |n: &i64| {
				Ok::<_, BadInput>(n.wrapping_add(out))
			})
			.unwrap();
	}
	registry.sealed()
}

proptest! {
	/// Already-typed inputs come back unchanged regardless of rules or format.
	#[test]
	fn prop_fast_path_is_identity(
		value in any::<i64>(),
		format in proptest::option::of(".*"),
		outputs in proptest::collection::vec(any::<i64>(), 0..4),
	) {
		let registry = counting_registry(&outputs);
		let out: i64 = registry.convert(Value::new(value), format.as_deref()).unwrap();
		prop_assert_eq!(out, value);
	}

	/// The newest of several equivalent rules always wins.
	#[test]
	fn prop_newest_rule_wins(outputs in proptest::collection::vec(any::<i64>(), 1..8)) {
		let registry = counting_registry(&outputs);
		let out: i64 = registry.convert(Value::new(String::from("x")), None).unwrap();
		prop_assert_eq!(Some(&out), outputs.last());
		prop_assert_eq!(registry.conflicts().len(), 2 * (outputs.len() - 1));
	}
}
