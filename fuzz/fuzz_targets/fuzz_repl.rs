//! Fuzz the shell
//!
//! Every line goes through `process_line` and whatever it yields is executed
//! against a fresh state. Nothing here should panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use varql::repl::{CategoryKind, InputResult, MetaCommand, ReplState};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut state = ReplState::new();
        for line in input.lines() {
            match state.process_line(line) {
                InputResult::Expression(expr) => {
                    let _ = state.evaluate(&expr);
                    let _ = state.bitwise(CategoryKind::Role, &expr);
                }
                InputResult::MetaCommand(MetaCommand::Inheritance(q)) => {
                    let _ = state.inheritance(&q);
                }
                InputResult::MetaCommand(MetaCommand::Match { query, values }) => {
                    let _ = state.match_values(&query, &values);
                }
                InputResult::MetaCommand(MetaCommand::Query { study, kind, filters }) => {
                    let _ = state.build_query(&study, &kind, &filters);
                }
                _ => {}
            }
        }
        if let Some(rest) = state.force_submit() {
            let _ = state.evaluate(&rest);
        }
    }
});
