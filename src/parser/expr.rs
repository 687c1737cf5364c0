//! Expression parsing by precedence climbing, producing arena nodes.
//!
//! This is the general single-value parser: the declaration parser uses it
//! for initializers and statement expressions, and the state compiler uses
//! it for action-call arguments.

use crate::diagnostics::CompileError;
use crate::lexer::TokenStream;
use crate::lexer::token::Token;
use super::ast::{Ast, Constant, ExprOp, Node, NodeId};

pub fn parse_expression(sc: &mut TokenStream, ast: &mut Ast) -> Result<NodeId, CompileError> {
    parse_ternary(sc, ast)
}

fn parse_ternary(sc: &mut TokenStream, ast: &mut Ast) -> Result<NodeId, CompileError> {
    let test = parse_binary(sc, ast, 0)?;
    let mark = sc.mark();
    match sc.get() {
        Some(tok) if matches!(tok.node, Token::Question) => {
            let left = parse_expression(sc, ast)?;
            sc.expect(":")?;
            let right = parse_ternary(sc, ast)?;
            Ok(ast.add(Node::ExprTrinary {
                test: Some(test),
                left: Some(left),
                right: Some(right),
            }))
        }
        _ => {
            sc.reset(mark);
            Ok(test)
        }
    }
}

fn binary_op(tok: &Token) -> Option<(ExprOp, u8)> {
    Some(match tok {
        Token::PipePipe => (ExprOp::BoolOr, 1),
        Token::AmpAmp => (ExprOp::BoolAnd, 2),
        Token::Pipe => (ExprOp::BitOr, 3),
        Token::Caret => (ExprOp::BitXor, 4),
        Token::Amp => (ExprOp::BitAnd, 5),
        Token::EqEq => (ExprOp::Eq, 6),
        Token::BangEq => (ExprOp::Neq, 6),
        Token::Lt => (ExprOp::Lt, 7),
        Token::Gt => (ExprOp::Gt, 7),
        Token::LtEq => (ExprOp::LtEq, 7),
        Token::GtEq => (ExprOp::GtEq, 7),
        Token::Shl => (ExprOp::LeftShift, 8),
        Token::Shr => (ExprOp::RightShift, 8),
        Token::Plus => (ExprOp::Add, 9),
        Token::Minus => (ExprOp::Sub, 9),
        Token::Star => (ExprOp::Mul, 10),
        Token::Slash => (ExprOp::Div, 10),
        Token::Percent => (ExprOp::Mod, 10),
        _ => return None,
    })
}

fn parse_binary(
    sc: &mut TokenStream,
    ast: &mut Ast,
    min_prec: u8,
) -> Result<NodeId, CompileError> {
    let mut lhs = parse_unary(sc, ast)?;
    loop {
        let mark = sc.mark();
        let Some(tok) = sc.get() else { break };
        let Some((op, prec)) = binary_op(&tok.node) else {
            sc.reset(mark);
            break;
        };
        if prec < min_prec {
            sc.reset(mark);
            break;
        }
        let rhs = parse_binary(sc, ast, prec + 1)?;
        lhs = ast.add(Node::ExprBinary { op, left: Some(lhs), right: Some(rhs) });
    }
    Ok(lhs)
}

fn parse_unary(sc: &mut TokenStream, ast: &mut Ast) -> Result<NodeId, CompileError> {
    let mark = sc.mark();
    match sc.get() {
        Some(tok) => {
            let op = match tok.node {
                Token::Minus => Some(ExprOp::Negate),
                Token::Bang => Some(ExprOp::BoolNot),
                Token::Tilde => Some(ExprOp::BitNot),
                _ => None,
            };
            match op {
                Some(op) => {
                    let operand = parse_unary(sc, ast)?;
                    Ok(ast.add(Node::ExprUnary { op, operand: Some(operand) }))
                }
                None => {
                    sc.reset(mark);
                    parse_postfix(sc, ast)
                }
            }
        }
        None => Err(CompileError::syntax("expected expression, found end of file", sc.eof_span())),
    }
}

fn parse_postfix(sc: &mut TokenStream, ast: &mut Ast) -> Result<NodeId, CompileError> {
    let mut expr = parse_primary(sc, ast)?;
    loop {
        let mark = sc.mark();
        let Some(tok) = sc.get() else { break };
        match tok.node {
            Token::LParen => {
                let mut params = Vec::new();
                if !sc.check(")") {
                    loop {
                        let value = parse_expression(sc, ast)?;
                        params.push(ast.add(Node::FuncParam {
                            label: "none".into(),
                            value: Some(value),
                        }));
                        if !sc.check(",") {
                            break;
                        }
                    }
                    sc.expect(")")?;
                }
                expr = ast.add(Node::ExprFuncCall { function: Some(expr), params });
            }
            Token::Dot => {
                let field = sc.expect_ident()?;
                expr = ast.add(Node::ExprMemberAccess { left: Some(expr), right: field.node });
            }
            Token::LBracket => {
                let index = parse_expression(sc, ast)?;
                sc.expect("]")?;
                expr = ast.add(Node::ExprBinary {
                    op: ExprOp::ArrayAccess,
                    left: Some(expr),
                    right: Some(index),
                });
            }
            _ => {
                sc.reset(mark);
                break;
            }
        }
    }
    Ok(expr)
}

fn parse_primary(sc: &mut TokenStream, ast: &mut Ast) -> Result<NodeId, CompileError> {
    match sc.get() {
        Some(tok) => match &tok.node {
            Token::IntLit(v) => Ok(ast.add(Node::ExprConstant { value: Constant::Int(*v) })),
            Token::FloatLit(v) => Ok(ast.add(Node::ExprConstant { value: Constant::Float64(*v) })),
            Token::StringLit(_) => {
                let text = sc.text(&tok);
                Ok(ast.add(Node::ExprConstant { value: Constant::String(text) }))
            }
            Token::Ident => {
                let name = sc.text(&tok);
                if name.eq_ignore_ascii_case("true") {
                    Ok(ast.add(Node::ExprConstant { value: Constant::Int(1) }))
                } else if name.eq_ignore_ascii_case("false") {
                    Ok(ast.add(Node::ExprConstant { value: Constant::Int(0) }))
                } else {
                    Ok(ast.add(Node::ExprId { name }))
                }
            }
            Token::LParen => {
                let inner = parse_expression(sc, ast)?;
                sc.expect(")")?;
                Ok(inner)
            }
            _ => Err(CompileError::syntax(
                format!("expected expression, found '{}'", sc.text(&tok)),
                tok.span,
            )),
        },
        None => Err(CompileError::syntax("expected expression, found end of file", sc.eof_span())),
    }
}
