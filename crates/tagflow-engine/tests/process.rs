//! End-to-end tests for sequential process orchestration.

use serde_json::{Value, json};
use tagflow_engine::{
    AllChain, AnyChain, Mutable, OutputContract, Process, Selector, Transformer,
};
use tagflow_model::{Element, Level, ValueKind};

/// Meta record threaded through the special-case pipelines.
struct RuleMeta {
    id_variable: &'static str,
    separator: &'static str,
}

const META: RuleMeta = RuleMeta {
    id_variable: "#id",
    separator: "__",
};

// ============================================================================
// Tag Routing Over a Batch
// ============================================================================

#[test]
fn tags_can_be_fixed_or_derived() {
    let elements = vec![
        Element::new(json!({"tag_attr": "zero"})).with_tag_fn(|e| {
            Ok(e.input
                .get("tag_attr")
                .and_then(Value::as_str)
                .map(str::to_string))
        }),
        Element::new(json!({})).with_tag("zero"),
        // Infected: resolver reads a missing attribute.
        Element::new(json!({})).with_tag_fn(|e| {
            e.input
                .get("tag_attr")
                .and_then(Value::as_str)
                .map(|tag| Some(tag.to_string()))
                .ok_or_else(|| anyhow::anyhow!("missing attribute 'tag_attr'"))
        }),
        // Infected: no chain registered for this tag and no default exists.
        Element::new(json!({"tag_attr": "zero"})).with_tag("other"),
    ];

    let process = Process::new(
        Selector::new().with_chain(
            AllChain::tagged("zero").step(Mutable::new("noop", |_element, _meta: &()| Ok(()))),
        ),
        (),
    );
    let result = process.run(elements);

    assert_eq!(result.elements.len(), 4);
    assert_eq!(result.filter(|e| e.notices().is_empty()).len(), 2);
    assert_eq!(result.elements_with(&[Level::Error]).len(), 2);
}

// ============================================================================
// Multi-Stage Pipelines
// ============================================================================

#[test]
fn two_stage_pipeline_produces_clean_output() {
    let stage_one = Process::new(
        Selector::new().with_chain(AllChain::new().step(Mutable::new(
            "seed",
            |element: &mut Element<Value>, _meta: &()| {
                element.input = json!({"a": 1});
                Ok(())
            },
        ))),
        (),
    )
    .with_id("seed-stage");

    let stage_two = Process::new(
        Selector::new().with_chain(AllChain::new().step(Transformer::new(
            "identity",
            OutputContract::Exactly(ValueKind::Object),
            |input: &Value, _previous: Option<&Value>, _meta: &()| Ok(input.clone()),
        ))),
        (),
    )
    .with_id("copy-stage");

    let result = stage_one
        .with_stage(stage_two)
        .run(vec![Element::new(json!({}))]);

    assert_eq!(result.elements.len(), 1);
    assert_eq!(result.elements[0].output, Some(json!({"a": 1})));
    assert!(result.notices.is_empty());
    assert!(result.elements[0].notices().is_empty());
}

#[test]
fn meta_is_forwarded_to_every_step() {
    let process = Process::new(
        Selector::new().with_chain(
            AllChain::new()
                .step(Mutable::new(
                    "join-components",
                    |element: &mut Element<Value>, meta: &RuleMeta| {
                        let joined = element
                            .input
                            .get("components")
                            .and_then(Value::as_array)
                            .map(|parts| {
                                parts
                                    .iter()
                                    .filter_map(Value::as_str)
                                    .collect::<Vec<_>>()
                                    .join(meta.separator)
                            })
                            .unwrap_or_default();
                        element.input["components"] = json!(joined);
                        Ok(())
                    },
                ))
                .step(Transformer::new(
                    "to-constraint",
                    OutputContract::Exactly(ValueKind::Object),
                    |input: &Value, _previous: Option<&Value>, meta: &RuleMeta| {
                        Ok(json!({
                            (meta.id_variable): input["components"].clone(),
                        }))
                    },
                )),
        ),
        META,
    );

    let result = process.run(vec![Element::new(json!({"components": ["type", "code"]}))]);
    assert_eq!(
        result.elements[0].output,
        Some(json!({"#id": "type__code"}))
    );
}

// ============================================================================
// Nested Composition
// ============================================================================

#[test]
fn selectors_nest_inside_chains() {
    let inner_front: Selector<Value, ()> = Selector::new()
        .with_chain(
            AllChain::new()
                .step(Mutable::new("noop", |_element, _meta: &()| Ok(())))
                .step(Transformer::new(
                    "empty-list",
                    OutputContract::Exactly(ValueKind::Array),
                    |_input: &Value, _previous: Option<&Value>, _meta: &()| Ok(json!([])),
                )),
        )
        .with_chain(
            AllChain::tagged("0").step(Mutable::new("fail", |_element, _meta: &()| {
                anyhow::bail!("oops")
            })),
        );

    let inner_back: Selector<Value, ()> = Selector::new().with_chain(
        AnyChain::new()
            .step(Transformer::new(
                "fail",
                OutputContract::Exactly(ValueKind::Array),
                |_input: &Value, _previous: Option<&Value>, _meta: &()| anyhow::bail!("oops"),
            ))
            .step(Transformer::new(
                "empty-list",
                OutputContract::Exactly(ValueKind::Array),
                |_input: &Value, _previous: Option<&Value>, _meta: &()| Ok(json!([])),
            )),
    );

    let process = Process::new(
        Selector::new()
            .with_chain(AllChain::new().step(inner_front))
            .with_chain(AllChain::tagged("99").step(inner_back)),
        (),
    );

    let result = process.run(vec![
        Element::new(json!({})).with_tag("99"),
        // Routed to the failing inner chain; failure degrades to a notice.
        Element::new(json!({})).with_tag("0"),
        Element::new(json!({})),
    ]);

    assert_eq!(result.elements.len(), 3);
    assert_eq!(result.outputs(|o| o.is_none()).len(), 1);
    assert_eq!(result.outputs(|o| o.is_some()).len(), 2);
}

// ============================================================================
// Stage Failure
// ============================================================================

#[test]
fn panicking_stage_empties_the_batch_and_records_one_notice() {
    let process = Process::new(
        Selector::new().with_chain(AllChain::new().step(Transformer::new(
            "panics",
            OutputContract::Any,
            |_input: &Value, _previous: Option<&Value>, _meta: &()| panic!("boom"),
        ))),
        (),
    )
    .with_id("stage-a");

    let result = process.run(vec![Element::new(json!({})), Element::new(json!({}))]);

    assert!(result.elements.is_empty());
    assert_eq!(result.notices.len(), 1);
    let notice = result.notices.iter().next().unwrap();
    assert_eq!(notice.level, Level::Error);
    assert!(notice.message.contains("stage-a"));
    assert!(notice.message.contains("boom"));
}

#[test]
fn stage_failure_truncates_downstream_stages_but_keeps_the_notice() {
    let failing = Process::new(
        Selector::new().with_chain(AllChain::new().step(Transformer::new(
            "panics",
            OutputContract::Any,
            |_input: &Value, _previous: Option<&Value>, _meta: &()| panic!("boom"),
        ))),
        (),
    )
    .with_id("stage-a");

    let downstream = Process::new(
        Selector::new().with_chain(AllChain::new().step(Mutable::new(
            "noop",
            |_element: &mut Element<Value>, _meta: &()| Ok(()),
        ))),
        (),
    )
    .with_id("stage-b");

    let result = failing.with_stage(downstream).run(vec![
        Element::new(json!({})),
        Element::new(json!({})),
        Element::new(json!({})),
    ]);

    // Downstream ran on zero elements; the stage-failure notice survives.
    assert!(result.elements.is_empty());
    assert_eq!(result.notices.len(), 1);
    assert!(
        result
            .notices
            .iter()
            .any(|n| n.message.contains("stage-a"))
    );
}
