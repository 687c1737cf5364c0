use actorscript::compile_states;
use actorscript::lexer::{lex, TokenStream};
use actorscript::parser::ast::{Constant, Node, NodeId};
use actorscript::states::{CompiledStates, NextState, StateCompiler};
use actorscript::symbols::Registry;

fn compile(block: &str) -> CompiledStates {
    compile_states(block, "TestActor", &Registry::with_actor_defaults())
        .expect("block should compile")
}

fn compile_err(block: &str) -> String {
    compile_states(block, "TestActor", &Registry::with_actor_defaults())
        .expect_err("block should fail")
        .to_string()
}

fn call_target(out: &CompiledStates, code: NodeId) -> String {
    let Node::ExprFuncCall { function, .. } = out.ast.get(code) else {
        panic!("expected a call node");
    };
    let Node::Identifier { name } = out.ast.get(function.unwrap()) else {
        panic!("expected an identifier");
    };
    name.clone()
}

// ============================================================
// The Spawn/Death scenario from the design discussions
// ============================================================

#[test]
fn spawn_death_scenario() {
    let out = compile(
        "{\nSpawn:\n    TNT1 A 0 NODELAY\n    TNT1 A -1\nDeath:\n    TNT1 \"AB\" 4 BRIGHT A_Scream\n}",
    );
    assert_eq!(out.states.len(), 4);
    assert_eq!(out.labels.len(), 2);
    assert_eq!(out.labels[0].name, "Spawn");
    assert_eq!(out.labels[0].index, 0);
    assert_eq!(out.labels[1].name, "Death");
    assert_eq!(out.labels[1].index, 2);

    assert_eq!(out.states[0].tics, 0);
    assert!(out.states[0].no_delay);
    assert_eq!(out.states[1].tics, -1);
    assert!(!out.states[1].no_delay);

    for state in &out.states[2..4] {
        assert_eq!(state.tics, 4);
        assert!(state.fullbright);
    }
    assert_eq!(out.states[2].frame, 0);
    assert_eq!(out.states[3].frame, 1);

    assert_eq!(out.temp_calls.len(), 1);
    assert_eq!(out.temp_calls[0].first_state, 2);
    assert_eq!(out.temp_calls[0].num_states, 2);
    assert_eq!(out.temp_calls[0].class, "TestActor");
    assert_eq!(call_target(&out, out.temp_calls[0].code), "A_Scream");

    assert!(out.warnings.is_empty());
    assert!(out.errors.is_empty());
}

// ============================================================
// Directive placement
// ============================================================

#[test]
fn goto_before_first_state_fails() {
    let err = compile_err("{ GOTO Death+1 }");
    assert!(err.contains("GOTO before first state"), "{err}");
}

#[test]
fn stop_wait_fail_loop_before_first_state_fail() {
    assert!(compile_err("{ STOP }").contains("STOP before first state"));
    assert!(compile_err("{ WAIT }").contains("WAIT before first state"));
    assert!(compile_err("{ fail }").contains("fail before first state"));
    assert!(compile_err("{ Loop }").contains("LOOP before first state"));
}

#[test]
fn directives_after_a_state_succeed() {
    let out = compile("{\nSpawn:\n    TNT1 A 1\n    Loop\n}");
    assert_eq!(out.states[0].next, NextState::Loop { to: 0 });

    let out = compile("{\nSpawn:\n    TNT1 A 1\n    Wait\n}");
    assert_eq!(out.states[0].next, NextState::Wait);

    let out = compile("{\nSpawn:\n    TNT1 A 1\n    Stop\n}");
    assert_eq!(out.states[0].next, NextState::Stop);

    let out = compile("{\nSpawn:\n    TNT1 A 1\n    Goto See+2\n}");
    assert_eq!(
        out.states[0].next,
        NextState::Goto { label: "See".into(), offset: 2 }
    );
}

#[test]
fn goto_label_keeps_qualifiers() {
    let out = compile("{\nSpawn:\n    TNT1 A 1\n    Goto Super::Spawn.Fire+1\n}");
    assert_eq!(
        out.states[0].next,
        NextState::Goto { label: "Super::Spawn.Fire".into(), offset: 1 }
    );
}

#[test]
fn goto_negative_offset_fails() {
    let err = compile_err("{\nSpawn:\n    TNT1 A 1\n    Goto See+-2\n}");
    assert!(err.contains("Negative jump offsets"), "{err}");
}

#[test]
fn label_followed_by_goto_binds_and_redirects() {
    let out = compile("{\nSpawn:\n    TNT1 A 0\nPain:\n    Goto Spawn\n}");
    assert_eq!(out.labels[1].name, "Pain");
    assert_eq!(out.labels[1].index, 1);
    assert_eq!(
        out.states[0].next,
        NextState::Goto { label: "Spawn".into(), offset: 0 }
    );
}

#[test]
fn consecutive_labels_share_an_index() {
    let out = compile("{\nSee:\nMissile:\n    TNT1 A 1\n}");
    assert_eq!(out.labels.len(), 2);
    assert_eq!(out.labels[0].index, 0);
    assert_eq!(out.labels[1].index, 0);
}

#[test]
fn dotted_label_definition() {
    let out = compile("{\nDeath.Fire:\n    TNT1 A 1\n}");
    assert_eq!(out.labels[0].name, "Death.Fire");
}

// ============================================================
// Frame lines
// ============================================================

#[test]
fn sprite_length_is_checked() {
    let err = compile_err("{\nSpawn:\n    TOOLONG A 1\n}");
    assert!(err.contains("exactly 4 characters"), "{err}");
    let err = compile_err("{\nSpawn:\n    TNT A 1\n}");
    assert!(err.contains("exactly 4 characters"), "{err}");
}

#[test]
fn quoted_sprite_names_accept_any_bytes() {
    let out = compile("{\nSpawn:\n    \"AB\\C\" A 1\n}");
    assert_eq!(out.sprites[0], "AB\\C");
}

#[test]
fn duration_is_clamped() {
    let out = compile("{\nSpawn:\n    TNT1 A 99999\n}");
    assert_eq!(out.states[0].tics, 32767);
    let out = compile("{\nSpawn:\n    TNT1 A -5\n}");
    assert_eq!(out.states[0].tics, -1);
}

#[test]
fn random_duration_swaps_descending_bounds() {
    let a = compile("{\nSpawn:\n    TNT1 A random(5, 2)\n}");
    let b = compile("{\nSpawn:\n    TNT1 A random(2, 5)\n}");
    assert_eq!(a.states[0].tics, 2);
    assert_eq!(a.states[0].tic_range, 3);
    assert_eq!(a.states[0].tics, b.states[0].tics);
    assert_eq!(a.states[0].tic_range, b.states[0].tic_range);
}

#[test]
fn random_duration_is_clamped() {
    let out = compile("{\nSpawn:\n    TNT1 A random(-10, 99999)\n}");
    assert_eq!(out.states[0].tics, -1);
    assert_eq!(out.states[0].tic_range, 32768);
}

#[test]
fn multi_frame_expansion_shares_one_temp_call() {
    let out = compile("{\nSpawn:\n    TNT1 ABCD 2 A_Look\n}");
    assert_eq!(out.states.len(), 4);
    assert_eq!(out.temp_calls.len(), 1);
    assert_eq!(out.temp_calls[0].first_state, 0);
    assert_eq!(out.temp_calls[0].num_states, 4);
    for (i, state) in out.states.iter().enumerate() {
        assert_eq!(state.frame, i as u8);
        assert_eq!(state.tics, 2);
    }
}

#[test]
fn no_action_means_no_temp_call() {
    let out = compile("{\nSpawn:\n    TNT1 ABCD 2\n}");
    assert_eq!(out.states.len(), 4);
    assert!(out.temp_calls.is_empty());
}

#[test]
fn invalid_frame_characters_report_but_continue() {
    let out = compile("{\nSpawn:\n    TNT1 A0C 1\n    TNT1 A -1\n}");
    assert_eq!(out.errors.len(), 1);
    assert!(out.errors[0].to_string().contains("Invalid frame character string"));
    // all three states were still emitted so the next line lands at index 3
    assert_eq!(out.states.len(), 4);
    assert_eq!(out.states[3].tics, -1);
}

#[test]
fn modifier_flags_are_set() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 FAST SLOW CANRAISE BRIGHT\n}");
    let state = &out.states[0];
    assert!(state.fast);
    assert!(state.slow);
    assert!(state.can_raise);
    assert!(state.fullbright);
}

#[test]
fn offset_modifier_sets_misc_fields() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 Offset(5, -3)\n}");
    assert_eq!(out.states[0].misc1, 5);
    assert_eq!(out.states[0].misc2, -3);
}

#[test]
fn light_modifier_is_parsed_and_discarded() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 Light(\"TORCH\", \"GLOW\") A_Look\n}");
    assert_eq!(out.temp_calls.len(), 1);
    assert_eq!(call_target(&out, out.temp_calls[0].code), "A_Look");
}

#[test]
fn nodelay_outside_spawn_warns_but_compiles() {
    let out = compile("{\nDeath:\n    TNT1 A 0 NODELAY\n}");
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].msg.contains("NODELAY"));
    assert!(!out.states[0].no_delay);
}

#[test]
fn nodelay_on_later_spawn_state_warns() {
    let out = compile("{\nSpawn:\n    TNT1 A 0\n    TNT1 A 0 NODELAY\n}");
    assert_eq!(out.warnings.len(), 1);
    assert!(!out.states[1].no_delay);
}

#[test]
fn sprites_are_interned_once() {
    let out = compile("{\nSpawn:\n    TNT1 A 1\n    TNT1 B 1\n    BOSF A 1\n}");
    assert_eq!(out.sprites, vec!["TNT1".to_string(), "BOSF".to_string()]);
    assert_eq!(out.states[0].sprite, 0);
    assert_eq!(out.states[2].sprite, 1);
}

// ============================================================
// Actions
// ============================================================

#[test]
fn unknown_action_is_a_hard_error() {
    let err = compile_err("{\nSpawn:\n    TNT1 A 1 A_Bogus\n}");
    assert!(err.contains("Invalid state parameter A_Bogus"), "{err}");
}

#[test]
fn parameterless_call_without_parens() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_FaceTarget\n}");
    assert_eq!(call_target(&out, out.temp_calls[0].code), "A_FaceTarget");
}

#[test]
fn parameterless_call_with_empty_parens() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_Scream()\n}");
    assert_eq!(call_target(&out, out.temp_calls[0].code), "A_Scream");
}

#[test]
fn zero_parameter_call_rejects_arguments() {
    let err = compile_err("{\nSpawn:\n    TNT1 A 1 A_Scream(1)\n}");
    assert!(err.contains("You cannot pass parameters to 'A_Scream'"), "{err}");
}

#[test]
fn optional_parameters_may_be_omitted() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_Explode\n}");
    assert_eq!(out.temp_calls.len(), 1);
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_Explode(128)\n}");
    let Node::ExprFuncCall { params, .. } = out.ast.get(out.temp_calls[0].code) else {
        panic!("expected call");
    };
    assert_eq!(params.len(), 1);
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_Explode(128, 64, true)\n}");
    let Node::ExprFuncCall { params, .. } = out.ast.get(out.temp_calls[0].code) else {
        panic!("expected call");
    };
    assert_eq!(params.len(), 3);
}

#[test]
fn required_parameter_needs_parens() {
    let err = compile_err("{\nSpawn:\n    TNT1 A 1 A_PlaySound\n}");
    assert!(err.contains("expected '('"), "{err}");
}

#[test]
fn sound_parameter_takes_a_name() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_PlaySound(\"grunt/sight\")\n}");
    let Node::ExprFuncCall { params, .. } = out.ast.get(out.temp_calls[0].code) else {
        panic!("expected call");
    };
    let Node::FuncParam { value, .. } = out.ast.get(params[0]) else {
        panic!("expected parameter");
    };
    assert!(matches!(
        out.ast.get(value.unwrap()),
        Node::ExprConstant { value: Constant::Name(n) } if n == "grunt/sight"
    ));
}

// ============================================================
// State-reference jump offsets
// ============================================================

fn jump_state_arg(out: &CompiledStates) -> Constant {
    let Node::ExprFuncCall { params, .. } = out.ast.get(out.temp_calls[0].code) else {
        panic!("expected call");
    };
    let Node::FuncParam { value, .. } = out.ast.get(params[1]) else {
        panic!("expected parameter");
    };
    let Node::ExprConstant { value } = out.ast.get(value.unwrap()) else {
        panic!("expected constant");
    };
    value.clone()
}

#[test]
fn zero_offset_is_the_null_state() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_Jump(128, 0)\n}");
    assert_eq!(jump_state_arg(&out), Constant::State(None));
}

#[test]
fn positive_offset_is_relative_to_emission_cursor() {
    let out = compile("{\nSpawn:\n    TNT1 A 1\n    TNT1 A 1 A_Jump(128, 2)\n}");
    // one state emitted before the line, so offset 2 lands at index 3
    assert_eq!(jump_state_arg(&out), Constant::State(Some(3)));
}

#[test]
fn negative_offset_is_rejected() {
    let err = compile_err("{\nSpawn:\n    TNT1 A 1 A_Jump(128, -1)\n}");
    assert!(err.contains("Negative jump offsets"), "{err}");
}

#[test]
fn offset_on_multistate_line_is_rejected() {
    let err = compile_err("{\nSpawn:\n    TNT1 AB 1 A_Jump(128, 1)\n}");
    assert!(err.contains("multistate definitions"), "{err}");
}

#[test]
fn label_arguments_pass_through() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_Jump(128, \"See\")\n}");
    assert_eq!(jump_state_arg(&out), Constant::Name("See".into()));
}

#[test]
fn variadic_tail_accepts_more_labels() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_Jump(128, \"See\", \"Pain\", \"Death\")\n}");
    let Node::ExprFuncCall { params, .. } = out.ast.get(out.temp_calls[0].code) else {
        panic!("expected call");
    };
    assert_eq!(params.len(), 4);
}

// ============================================================
// Legacy numeric specials
// ============================================================

#[test]
fn special_compiles_to_dispatcher_call() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 Door_Open(0, 16)\n}");
    assert_eq!(call_target(&out, out.temp_calls[0].code), "A_CallSpecial");
    let Node::ExprFuncCall { params, .. } = out.ast.get(out.temp_calls[0].code) else {
        panic!("expected call");
    };
    // the special number plus the two written arguments
    assert_eq!(params.len(), 3);
    let Node::FuncParam { value, .. } = out.ast.get(params[0]) else {
        panic!("expected parameter");
    };
    assert!(matches!(
        out.ast.get(value.unwrap()),
        Node::ExprConstant { value: Constant::Int(11) }
    ));
}

#[test]
fn special_with_no_required_args_may_be_bare() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 Exit_Normal\n}");
    assert_eq!(call_target(&out, out.temp_calls[0].code), "A_CallSpecial");
}

#[test]
fn special_argument_bounds_are_enforced() {
    let err = compile_err("{\nSpawn:\n    TNT1 A 1 ACS_LockedExecute\n}");
    assert!(err.contains("Too few arguments to ACS_LockedExecute"), "{err}");
    let err = compile_err("{\nSpawn:\n    TNT1 A 1 Teleport(1, 2, 3, 4)\n}");
    assert!(err.contains("Too many arguments to Teleport"), "{err}");
}

// ============================================================
// Action sequences
// ============================================================

#[test]
fn braced_sequence_with_if_else_and_return() {
    let out = compile(
        "{\nSpawn:\n    TNT1 A 1 {\n        if (health < 10) { A_Scream; } else { A_Look; }\n        return;\n        A_FaceTarget;\n    }\n    TNT1 A -1\n}",
    );
    assert_eq!(out.temp_calls.len(), 1);
    let Node::CompoundStmt { content } = out.ast.get(out.temp_calls[0].code) else {
        panic!("expected sequence");
    };
    assert_eq!(content.len(), 3);
    assert!(matches!(out.ast.get(content[0]), Node::IfStmt { .. }));
    assert!(matches!(out.ast.get(content[1]), Node::ReturnStmt { .. }));
    assert!(matches!(out.ast.get(content[2]), Node::ExprFuncCall { .. }));
}

#[test]
fn empty_sequence_compiles_to_no_action() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 { }\n}");
    assert!(out.temp_calls.is_empty());
}

#[test]
fn nested_sequences() {
    let out = compile(
        "{\nSpawn:\n    TNT1 A 1 {\n        if (counter > 0) {\n            if (counter > 5) { A_Scream; }\n        }\n    }\n}",
    );
    assert_eq!(out.temp_calls.len(), 1);
}

// ============================================================
// Raw string mode
// ============================================================

#[test]
fn escape_mode_is_restored_after_errors() {
    let src = "{\nSpawn:\n    BAD A 1\n}\n\"a\\tb\"";
    let tokens = lex(src).unwrap();
    let mut sc = TokenStream::new(&tokens, src);
    let registry = Registry::with_actor_defaults();
    let mut compiler = StateCompiler::new("TestActor", &registry);
    assert!(compiler.parse_block(&mut sc).is_err());
    // the stream is back in escaped mode despite the error exit
    let tok = loop {
        let tok = sc.get().expect("reached end without a string token");
        if matches!(tok.node, actorscript::lexer::token::Token::StringLit(_)) {
            break tok;
        }
    };
    assert_eq!(sc.text(&tok), "a\tb");
}

// ============================================================
// Whole-file compilation
// ============================================================

#[test]
fn compile_file_walks_every_class() {
    let src = "actor ZombieMan 3004\n{\n    Health 20\n    states {\n    Spawn:\n        POSS A 10 A_Look\n        Loop\n    }\n}\n\nclass Imp : Monster\n{\n    int health;\n    states {\n    Spawn:\n        TROO AB 8\n        Loop\n    }\n}\n";
    let registry = Registry::with_actor_defaults();
    let classes = actorscript::compile_file(src, &registry).unwrap();
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0].class, "ZombieMan");
    assert_eq!(classes[0].states.states.len(), 1);
    assert_eq!(classes[0].states.temp_calls.len(), 1);
    assert_eq!(classes[1].class, "Imp");
    assert_eq!(classes[1].states.states.len(), 2);
    assert!(classes[1].states.temp_calls.is_empty());
}

#[test]
fn summary_json_is_valid() {
    let out = compile("{\nSpawn:\n    TNT1 A 1 A_Look\n    Loop\n}");
    let json = out.summary_json("TestActor");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["class"], "TestActor");
    assert_eq!(value["states"].as_array().unwrap().len(), 1);
    assert_eq!(value["temp_calls"].as_array().unwrap().len(), 1);
}
