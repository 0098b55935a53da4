//! Property tests: a value encodes the same way as a parameter default and
//! as a step argument, and opaque values survive the hex round trip.

use argo_dsl::argo_types::ValueFrom;
use argo_dsl::{
    build_parameters, decode_opaque, encode_argument, encode_default, ArgValue, Complex,
    EncodedArgument, ParameterDecl, TypeTag,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn arb_type_tag() -> impl Strategy<Value = TypeTag> {
    prop_oneof![
        Just(TypeTag::String),
        Just(TypeTag::Integer),
        Just(TypeTag::Float),
        Just(TypeTag::Boolean),
        Just(TypeTag::Complex),
        Just(TypeTag::Reference),
        prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(TypeTag::Choice),
        "[A-Za-z]{1,8}".prop_map(TypeTag::Opaque),
    ]
}

fn arb_json() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        "[ -~]{0,12}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
            prop::collection::btree_map("[a-z]{1,5}", inner, 0..4)
                .prop_map(|map| serde_json::Value::Object(map.into_iter().collect())),
        ]
    })
}

fn arb_arg_value() -> impl Strategy<Value = ArgValue> {
    prop_oneof![
        "[ -~]{0,20}".prop_map(ArgValue::String),
        any::<i64>().prop_map(ArgValue::Integer),
        (-1.0e9f64..1.0e9).prop_map(ArgValue::Float),
        any::<bool>().prop_map(ArgValue::Boolean),
        (-1.0e3f64..1.0e3, -1.0e3f64..1.0e3).prop_map(|(re, im)| ArgValue::Complex(Complex::new(re, im))),
        "/tmp/[a-z]{1,8}".prop_map(|path| ArgValue::Reference(ValueFrom::from_path(path))),
        arb_json().prop_map(ArgValue::Opaque),
    ]
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Declaration-time and call-time encoding agree, including on failure.
    #[test]
    fn default_and_call_encoding_agree(
        name in "[a-z][a-z0-9_]{0,8}",
        declared in arb_type_tag(),
        value in arb_arg_value(),
    ) {
        let decl = ParameterDecl::new(&name, declared.clone()).with_default(value.clone());
        let default = encode_default(&decl).map(|encoded| encoded.expect("default is set"));
        let argument = encode_argument(&name, &value, Some(&declared));

        match (default, argument) {
            (Ok(d), Ok(a)) => prop_assert_eq!(d, a),
            (Err(d), Err(a)) => prop_assert_eq!(d.to_string(), a.to_string()),
            (d, a) => prop_assert!(false, "default {:?} but argument {:?}", d, a),
        }
    }

    /// A reference default becomes `valueFrom` and never a literal default.
    #[test]
    fn reference_defaults_never_become_literals(
        declared in arb_type_tag(),
        path in "/tmp/[a-z]{1,8}",
    ) {
        let decl = ParameterDecl::new("p", declared).with_default(ValueFrom::from_path(&path));
        let params = build_parameters(&[decl]).unwrap();

        prop_assert_eq!(params[0].default.as_ref(), None);
        prop_assert_eq!(params[0].value_from.as_ref(), Some(&ValueFrom::from_path(&path)));
    }

    /// Opaque values decode back to the JSON they were encoded from.
    #[test]
    fn opaque_values_round_trip(value in arb_json()) {
        let encoded = encode_argument("f", &ArgValue::Opaque(value.clone()), Some(&TypeTag::opaque("dict")))
            .unwrap();
        match encoded {
            EncodedArgument::Literal(text) => {
                prop_assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
                prop_assert_eq!(decode_opaque(&text), Some(value));
            }
            other => prop_assert!(false, "expected a literal, got {:?}", other),
        }
    }

    /// Text values are never altered.
    #[test]
    fn text_is_verbatim(text in "[ -~]{0,40}") {
        let encoded = encode_argument("s", &ArgValue::String(text.clone()), Some(&TypeTag::String)).unwrap();
        prop_assert_eq!(encoded, EncodedArgument::Literal(text));
    }
}
