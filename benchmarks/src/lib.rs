//! Shared helpers for the checkpoint benchmark suites.

use std::collections::BTreeMap;

use checkpoint_harness::fixtures::FixtureRegistry;
use checkpoint_harness::suite::{Suite, TestDef};
use checkpoint_kernel::checkpoint::registry::CheckpointCall;
use checkpoint_kernel::inputs::graph::{graph_of, InputDef, CHECKPOINTS_INPUT};
use checkpoint_kernel::value::Value;

/// A linear chain `link_0 ← link_1 ← … ← link_{depth-1}` whose root
/// `link_0` depends on the checkpoints input, so every link is
/// materialized during discovery.
#[must_use]
pub fn recorder_chain(depth: usize) -> BTreeMap<String, InputDef> {
    let defs = (0..depth)
        .map(|i| {
            let name = format!("link_{i}");
            let dep = if i == 0 {
                CHECKPOINTS_INPUT.to_string()
            } else {
                format!("link_{}", i - 1)
            };
            InputDef::new(name, &[dep.as_str()], move |_| {
                Ok(Value::data(serde_json::json!({ "link": i })))
            })
        })
        .collect();
    graph_of(defs)
}

/// A root input over `width` unrelated leaves plus the checkpoints input.
/// Discovery computes only the root.
#[must_use]
pub fn unrelated_fanout(width: usize) -> BTreeMap<String, InputDef> {
    let leaf_names: Vec<String> = (0..width).map(|i| format!("leaf_{i}")).collect();
    let mut defs: Vec<InputDef> = leaf_names
        .iter()
        .map(|name| InputDef::new(name.as_str(), &[], |_| Ok(Value::from(1_i64))))
        .collect();

    let mut root_deps: Vec<&str> = leaf_names.iter().map(String::as_str).collect();
    root_deps.push(CHECKPOINTS_INPUT);
    defs.push(InputDef::new("root", &root_deps, |inputs| {
        Ok(Value::from(inputs.len()))
    }));
    graph_of(defs)
}

/// A suite with one test making `calls` checkpoint calls over `bodies`
/// distinct bodies (round-robin).
#[must_use]
pub fn checkpoint_suite(calls: usize, bodies: usize) -> Suite {
    let mut suite = Suite::new(FixtureRegistry::new());
    suite.add(TestDef::new("bench", &[CHECKPOINTS_INPUT], move |inputs| {
        let cp = inputs.checkpoints()?;
        let wrapped: Vec<_> = (0..bodies.max(1)).map(|_| cp.wrap(|_| Ok(()))).collect();
        for i in 0..calls {
            wrapped[i % wrapped.len()].call(CheckpointCall::new().arg(i).id(format!("c{i}")))?;
        }
        Ok(())
    }));
    suite
}
