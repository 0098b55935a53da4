//! Property tests: sequential adds get a stage each, and every non-empty
//! parallel scope becomes exactly one stage holding its steps in order.

use argo_dsl::{TaskStep, TaskSteps};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Add,
    Parallel(usize),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![Just(Op::Add), (0usize..4).prop_map(Op::Parallel)],
        0..12,
    )
}

proptest! {
    #[test]
    fn stages_follow_scopes(ops in arb_ops()) {
        let mut steps = TaskSteps::new();
        let mut expected: Vec<Vec<String>> = Vec::new();
        let mut counter = 0;
        let mut next_name = || {
            counter += 1;
            format!("s{}", counter)
        };

        for op in &ops {
            match op {
                Op::Add => {
                    let name = next_name();
                    steps.add(TaskStep::new(&name, "t"));
                    expected.push(vec![name]);
                }
                Op::Parallel(n) => {
                    let names: Vec<String> = (0..*n).map(|_| next_name()).collect();
                    steps.parallel(|p| {
                        for name in &names {
                            p.add(TaskStep::new(name, "t"));
                        }
                    });
                    if !names.is_empty() {
                        expected.push(names);
                    }
                }
            }
        }

        let actual: Vec<Vec<String>> = steps
            .stages()
            .iter()
            .map(|stage| stage.iter().map(|s| s.name().to_string()).collect())
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
