use actorscript::dump_ast;
use actorscript::parse_source;
use actorscript::parser::ast::{Ast, Constant, Node, NodeId};
use actorscript::parser::printer::print_ast;

#[test]
fn constant_def_prints_exactly() {
    let printed = dump_ast("const X = 5;").unwrap();
    assert_eq!(printed, "((constant-def 'X' (expr-const 5)))");
}

#[test]
fn empty_class_prints_nil_children() {
    let printed = dump_ast("class Imp { }").unwrap();
    assert_eq!(printed, "((class 'Imp' nil nil 00000000 nil))");
}

#[test]
fn class_with_parent_prints_identifier_chain() {
    let printed = dump_ast("class Imp : Monster { }").unwrap();
    assert_eq!(
        printed,
        "((class 'Imp' ((identifier 'Monster')) nil 00000000 nil))"
    );
}

#[test]
fn states_render_with_their_node_labels() {
    let printed = dump_ast(
        "class Imp { states {\nSpawn:\n TROO A 10 Bright A_Look\n Loop\n Goto See+2\n Wait\n Fail\n Stop\n} }",
    )
    .unwrap();
    assert!(printed.contains("(states"), "{printed}");
    assert!(printed.contains("(state-label 'Spawn')"), "{printed}");
    assert!(printed.contains("(state-line TROO bright A"), "{printed}");
    assert!(printed.contains("(state-loop)"), "{printed}");
    assert!(printed.contains("(state-goto ((identifier 'See')) ((expr-const 2)))"), "{printed}");
    assert!(printed.contains("(state-wait)"), "{printed}");
    assert!(printed.contains("(state-fail)"), "{printed}");
    assert!(printed.contains("(state-stop)"), "{printed}");
}

#[test]
fn enum_elements_abbreviate() {
    let printed = dump_ast("enum E { A, B }").unwrap();
    assert_eq!(printed, "((enum 'E' intauto ...))");

    let printed = dump_ast("enum E { }").unwrap();
    assert_eq!(printed, "((enum 'E' intauto nil))");
}

#[test]
fn print_is_idempotent_for_a_large_tree() {
    let src = "class CacoDemon : Monster replaces Shade {\n int a, b, c;\n float speed;\n void Tick() { if (a > b) { a = b; } else { b = a; } }\n states {\nSpawn:\n HEAD ABCDEFGH 4 Bright A_Chase\n Loop\n}\n}";
    let first = dump_ast(src).unwrap();
    let second = dump_ast(src).unwrap();
    assert_eq!(first, second);

    // printing the same arena twice gives the same bytes
    let (ast, roots) = parse_source(src).unwrap();
    assert_eq!(print_ast(&ast, &roots), print_ast(&ast, &roots));
}

#[test]
fn wrapped_lines_stay_within_width() {
    let src = "class LongNames {\n int alpha_counter, beta_counter, gamma_counter, delta_counter, epsilon_counter, zeta_counter;\n}";
    let printed = dump_ast(src).unwrap();
    assert!(printed.lines().count() > 1, "{printed}");
    // closers never wrap, so a line may only exceed the width by its
    // trailing close-parens
    for line in printed.lines() {
        let content = line.trim_end_matches(')');
        assert!(content.len() <= 72, "line too long: {line:?}");
    }
}

#[test]
fn wrapping_preserves_token_stream() {
    // The same tree printed flat (short names) and wrapped (long names)
    // must carry the same structure: strip whitespace and compare shapes.
    let mut ast = Ast::new();
    let short: Vec<NodeId> = (0..4)
        .map(|i| ast.add(Node::Identifier { name: format!("s{i}") }))
        .collect();
    let flat = print_ast(&ast, &short);
    assert!(!flat.contains('\n'));

    let mut ast = Ast::new();
    let long: Vec<NodeId> = (0..4)
        .map(|i| ast.add(Node::Identifier { name: format!("extremely_long_identifier_number_{i}") }))
        .collect();
    let wrapped = print_ast(&ast, &long);
    assert!(wrapped.contains('\n'));
    let opens = wrapped.matches('(').count();
    let closes = wrapped.matches(')').count();
    assert_eq!(opens, closes);
    assert_eq!(opens, flat.matches('(').count());
}

#[test]
fn string_constants_escape_specials() {
    let mut ast = Ast::new();
    let node = ast.add(Node::ExprConstant {
        value: Constant::String("say \"hi\"\\now\u{2}".into()),
    });
    let printed = print_ast(&ast, &[node]);
    assert_eq!(printed, "((expr-const \"say \\\"hi\\\"\\\\now\\x02\"))");
}

#[test]
fn nil_for_null_roots() {
    let ast = Ast::new();
    assert_eq!(print_ast(&ast, &[]), "nil");
}
