pub mod span;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod states;
pub mod specials;
pub mod symbols;

use diagnostics::CompileError;
use lexer::TokenStream;
use lexer::token::Token;
use parser::ast::{Ast, NodeId};
use states::{CompiledStates, StateCompiler};
use symbols::Registry;

/// Parse a source file into an AST arena plus its root declarations.
pub fn parse_source(source: &str) -> Result<(Ast, Vec<NodeId>), CompileError> {
    let tokens = lexer::lex(source)?;
    parser::parse(&tokens, source)
}

/// Parse a source file and render its AST as an s-expression.
pub fn dump_ast(source: &str) -> Result<String, CompileError> {
    let (ast, roots) = parse_source(source)?;
    Ok(parser::printer::print_ast(&ast, &roots))
}

/// Compile a bare `{ ... }` states block on behalf of one class.
pub fn compile_states(
    source: &str,
    class_name: &str,
    registry: &Registry,
) -> Result<CompiledStates, CompileError> {
    let tokens = lexer::lex(source)?;
    let mut sc = TokenStream::new(&tokens, source);
    let mut compiler = StateCompiler::new(class_name, registry);
    compiler.parse_block(&mut sc)?;
    Ok(compiler.finish())
}

/// The compiled states of one class in a file.
pub struct ClassStates {
    pub class: String,
    pub states: CompiledStates,
}

/// Scan a file for class definitions and compile each `states` block,
/// skipping everything else the way the definition loader does.
pub fn compile_file(
    source: &str,
    registry: &Registry,
) -> Result<Vec<ClassStates>, CompileError> {
    let tokens = lexer::lex(source)?;
    let mut sc = TokenStream::new(&tokens, source);
    let mut out = Vec::new();
    while let Some(tok) = sc.get() {
        let text = sc.text(&tok);
        if !text.eq_ignore_ascii_case("class") && !text.eq_ignore_ascii_case("actor") {
            continue;
        }
        let name = sc.expect_ident()?;
        loop {
            match sc.get() {
                Some(t) if matches!(t.node, Token::LBrace) => break,
                Some(_) => {}
                None => return Err(sc.error("unexpected end of file in class header")),
            }
        }
        let mut compiler = StateCompiler::new(name.node.clone(), registry);
        let mut saw_states = false;
        let mut depth = 1usize;
        while depth > 0 {
            let Some(t) = sc.get() else {
                return Err(sc.error("unexpected end of file in class body"));
            };
            match t.node {
                Token::LBrace => depth += 1,
                Token::RBrace => depth -= 1,
                Token::Ident if depth == 1 && sc.text(&t).eq_ignore_ascii_case("states") => {
                    compiler.parse_block(&mut sc)?;
                    saw_states = true;
                }
                _ => {}
            }
        }
        if saw_states {
            out.push(ClassStates { class: name.node, states: compiler.finish() });
        }
    }
    Ok(out)
}
