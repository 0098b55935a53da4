//! Property tests: script sources are the user text plus one prologue line
//! per parameter, and introspected bodies keep their relative indentation.

use argo_dsl::script::assemble_source;
use argo_dsl::{introspect, ParameterDecl, ScriptFlavor, TypeTag};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn arb_flavor() -> impl Strategy<Value = ScriptFlavor> {
    prop_oneof![
        Just(ScriptFlavor::Plain),
        Just(ScriptFlavor::Bash),
        Just(ScriptFlavor::Python),
    ]
}

fn arb_declared_type() -> impl Strategy<Value = TypeTag> {
    prop_oneof![
        Just(TypeTag::String),
        Just(TypeTag::Integer),
        Just(TypeTag::Boolean),
        Just(TypeTag::Reference),
        Just(TypeTag::choice(["a", "b"])),
        Just(TypeTag::opaque("dict")),
        Just(TypeTag::opaque("list")),
    ]
}

/// Parameters with distinct names
fn arb_parameters() -> impl Strategy<Value = Vec<ParameterDecl>> {
    prop::collection::vec(arb_declared_type(), 0..6).prop_map(|types| {
        types
            .into_iter()
            .enumerate()
            .map(|(i, t)| ParameterDecl::new(format!("p{}", i), t))
            .collect()
    })
}

fn arb_body() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z =()]{0,15}", 1..5).prop_map(|lines| lines.join("\n"))
}

/// Statement lines with a relative indentation level each; the first is at level 0
fn arb_indented_lines() -> impl Strategy<Value = Vec<(usize, String)>> {
    prop::collection::vec((0usize..3, "x[a-z0-9]{0,6} = [0-9]{1,3}"), 1..6).prop_map(|mut lines| {
        lines[0].0 = 0;
        lines
    })
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Without parameters the source is the user text, byte for byte.
    #[test]
    fn no_parameters_means_raw_text(flavor in arb_flavor(), body in arb_body()) {
        prop_assert_eq!(assemble_source(flavor, &[], &body), body);
    }

    /// Bash binds every parameter on its own quoted line, in order.
    #[test]
    fn bash_prologue_has_one_line_per_parameter(params in arb_parameters(), body in arb_body()) {
        let source = assemble_source(ScriptFlavor::Bash, &params, &body);
        let lines: Vec<&str> = source.lines().collect();

        for (i, param) in params.iter().enumerate() {
            prop_assert_eq!(
                lines[i].to_string(),
                format!("{}=\"{{{{inputs.parameters.{}}}}}\"", param.name, param.name)
            );
        }
        if params.is_empty() {
            prop_assert_eq!(source, body);
        } else {
            let suffix = format!("\n{}", body);
            prop_assert!(source.ends_with(&suffix));
        }
    }

    /// Python imports json once, before the first opaque parameter, and only if needed.
    #[test]
    fn python_imports_json_once(params in arb_parameters(), body in arb_body()) {
        let source = assemble_source(ScriptFlavor::Python, &params, &body);
        let lines: Vec<&str> = source.lines().collect();

        let imports = lines.iter().filter(|l| **l == "import json").count();
        let first_opaque = lines.iter().position(|l| l.contains("json.loads(bytes.fromhex("));
        match first_opaque {
            Some(index) => {
                prop_assert_eq!(imports, 1);
                prop_assert_eq!(lines[index - 1], "import json");
            }
            None => prop_assert_eq!(imports, 0),
        }

        let assignments = lines.iter().filter(|l| l.contains("{{inputs.parameters.")).count();
        prop_assert_eq!(assignments, params.len());
    }

    /// The body loses the signature and the common indentation, nothing else.
    #[test]
    fn introspected_body_is_dedented(
        base in 1usize..9,
        lines in arb_indented_lines(),
        split_signature in any::<bool>(),
    ) {
        let signature = if split_signature {
            "def f(a,\n      b: int = 1):\n"
        } else {
            "def f(a, b: int = 1):\n"
        };
        let mut source = signature.to_string();
        let mut expected = String::new();
        for (level, text) in &lines {
            source.push_str(&format!("{}{}\n", " ".repeat(base + level * 4), text));
            expected.push_str(&format!("{}{}\n", " ".repeat(level * 4), text));
        }

        let function = introspect(&source).unwrap();
        prop_assert_eq!(function.name, "f");
        prop_assert_eq!(function.body, expected);
        prop_assert_eq!(function.parameters.len(), 2);
    }
}
