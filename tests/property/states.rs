use proptest::prelude::*;

use actorscript::compile_states;
use actorscript::states::CompiledStates;
use actorscript::symbols::Registry;

fn compile(block: &str) -> CompiledStates {
    compile_states(block, "PropActor", &Registry::with_actor_defaults())
        .expect("block should compile")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Stored durations always land in [-1, 32767], whatever the script says.
    #[test]
    fn duration_clamp(tics in any::<i32>()) {
        let out = compile(&format!("{{\nSpawn:\n    TNT1 A {tics}\n}}"));
        let stored = out.states[0].tics;
        prop_assert!((-1..=32767).contains(&stored));
        prop_assert_eq!(stored, tics.clamp(-1, 32767));
    }

    // RANDOM bounds are order-independent: min stored, range nonnegative.
    #[test]
    fn random_bounds_commute(a in -5i32..40000, b in -5i32..40000) {
        let fwd = compile(&format!("{{\nSpawn:\n    TNT1 A random({a}, {b})\n}}"));
        let rev = compile(&format!("{{\nSpawn:\n    TNT1 A random({b}, {a})\n}}"));
        prop_assert_eq!(fwd.states[0].tics, rev.states[0].tics);
        prop_assert_eq!(fwd.states[0].tic_range, rev.states[0].tic_range);
        prop_assert!(fwd.states[0].tic_range >= 0);
        let lo = a.clamp(-1, 32767).min(b.clamp(-1, 32767));
        prop_assert_eq!(fwd.states[0].tics, lo);
    }

    // A K-letter frame string emits exactly K states, and exactly one temp
    // call covering all of them when an action follows.
    #[test]
    fn frame_expansion_count(frames in "[A-Z]{1,8}") {
        let out = compile(&format!("{{\nSpawn:\n    TNT1 {frames} 1 A_Look\n}}"));
        prop_assert_eq!(out.states.len(), frames.len());
        prop_assert_eq!(out.temp_calls.len(), 1);
        prop_assert_eq!(out.temp_calls[0].first_state, 0);
        prop_assert_eq!(out.temp_calls[0].num_states, frames.len());
        for (i, state) in out.states.iter().enumerate() {
            prop_assert_eq!(state.frame, frames.as_bytes()[i] - b'A');
        }
    }

    // Without an action the same line emits no temp calls at all.
    #[test]
    fn frame_expansion_without_action(frames in "[A-Z]{1,8}") {
        let out = compile(&format!("{{\nSpawn:\n    TNT1 {frames} 1\n}}"));
        prop_assert_eq!(out.states.len(), frames.len());
        prop_assert!(out.temp_calls.is_empty());
    }

    // Any label name binds to the index of the next emitted state.
    #[test]
    fn labels_bind_to_next_state(label in "[A-Za-z_][A-Za-z0-9_]{0,11}") {
        // skip words the block grammar claims for itself
        prop_assume!(!["goto", "stop", "wait", "fail", "loop"]
            .contains(&label.to_ascii_lowercase().as_str()));
        let out = compile(&format!("{{\nSpawn:\n    TNT1 A 1\n{label}:\n    TNT1 B 1\n}}"));
        prop_assert_eq!(out.labels.len(), 2);
        prop_assert_eq!(out.labels[1].name.as_str(), label.as_str());
        prop_assert_eq!(out.labels[1].index, 1);
    }

    // Compilation of the same block is deterministic.
    #[test]
    fn compilation_is_deterministic(tics in 0i32..100, frames in "[A-Z]{1,4}") {
        let block = format!("{{\nSpawn:\n    TNT1 {frames} {tics} A_Scream\n    Loop\n}}");
        let a = compile(&block);
        let b = compile(&block);
        prop_assert_eq!(a.states, b.states);
        prop_assert_eq!(a.labels, b.labels);
        prop_assert_eq!(a.temp_calls.len(), b.temp_calls.len());
    }
}
