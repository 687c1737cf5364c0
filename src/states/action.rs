//! Trailing-action compilation: single calls, braced action sequences, the
//! legacy numeric special path, and declared-parameter matching.

use crate::diagnostics::CompileError;
use crate::lexer::TokenStream;
use crate::parser::ast::{Constant, Node, NodeId};
use crate::parser::expr::parse_expression;
use crate::span::Span;
use crate::specials::find_line_special;
use crate::symbols::{FuncSig, ParamType};
use super::{parse_state_string, StateCompiler};

impl StateCompiler<'_> {
    /// A frame line's trailing action. `cur` is the already-consumed first
    /// action token: either a call name, or `{` opening a sequence of
    /// `if (...) { ... } [else { ... }]`, `return;`, and `call;` items.
    /// An empty sequence compiles to no action at all.
    pub(super) fn parse_actions(
        &mut self,
        sc: &mut TokenStream,
        frames: &str,
        cur: &str,
        span: Span,
    ) -> Result<Option<NodeId>, CompileError> {
        if cur != "{" {
            return Ok(Some(self.parse_action(sc, cur, span, frames)?));
        }
        let mut seq = Vec::new();
        let (mut tok, mut tok_span) = sc.get_string()?;
        while tok != "}" {
            if tok.eq_ignore_ascii_case("if") {
                sc.expect("(")?;
                let condition = parse_expression(sc, &mut self.ast)?;
                sc.expect(")")?;
                sc.expect("{")?; // braces are mandatory
                let true_path = self.parse_actions(sc, frames, "{", tok_span)?;
                let (mut next, mut next_span) = sc.get_string()?;
                let mut false_path = None;
                if next.eq_ignore_ascii_case("else") {
                    sc.expect("{")?; // braces are still mandatory
                    false_path = self.parse_actions(sc, frames, "{", next_span)?;
                    (next, next_span) = sc.get_string()?;
                }
                seq.push(self.ast.add(Node::IfStmt {
                    condition: Some(condition),
                    true_path,
                    false_path,
                }));
                (tok, tok_span) = (next, next_span);
            } else if tok.eq_ignore_ascii_case("return") {
                sc.expect(";")?;
                seq.push(self.ast.add(Node::ReturnStmt { values: Vec::new() }));
                (tok, tok_span) = sc.get_string()?;
            } else {
                let call = self.parse_action(sc, &tok, tok_span, frames)?;
                sc.expect(";")?;
                seq.push(call);
                (tok, tok_span) = sc.get_string()?;
            }
        }
        // Only return a sequence if it has actual content.
        if seq.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.ast.add(Node::CompoundStmt { content: seq })))
        }
    }

    /// One action call: the legacy special table first, then the class's
    /// function symbols. An unknown name is a hard error.
    fn parse_action(
        &mut self,
        sc: &mut TokenStream,
        name: &str,
        span: Span,
        frames: &str,
    ) -> Result<NodeId, CompileError> {
        if let Some(call) = self.do_action_specials(sc, name, span)? {
            return Ok(call);
        }
        let registry = self.registry;
        if let Some(sig) = registry.find(&name.to_ascii_lowercase()) {
            let params = self.parse_function_parameters(sc, sig, frames)?;
            let function = self.ast.add(Node::Identifier { name: sig.name.clone() });
            return Ok(self.ast.add(Node::ExprFuncCall { function: Some(function), params }));
        }
        Err(CompileError::state(format!("Invalid state parameter {name}"), span))
    }

    /// Legacy numeric specials used as action names compile to a call to
    /// the internal dispatcher with the special number prepended as the
    /// first argument.
    fn do_action_specials(
        &mut self,
        sc: &mut TokenStream,
        name: &str,
        span: Span,
    ) -> Result<Option<NodeId>, CompileError> {
        let Some((special, min_args, max_args)) = find_line_special(name) else {
            return Ok(None);
        };
        let number = self.ast.add(Node::ExprConstant { value: Constant::Int(special as i64) });
        let mut params = vec![self.ast.add(Node::FuncParam {
            label: "none".into(),
            value: Some(number),
        })];
        let mut count = 0u8;
        // Make this consistent with all other parameter parsing
        if sc.check("(") {
            while count < 5 {
                let arg = parse_expression(sc, &mut self.ast)?;
                params.push(self.ast.add(Node::FuncParam {
                    label: "none".into(),
                    value: Some(arg),
                }));
                count += 1;
                if !sc.check(",") {
                    break;
                }
            }
            sc.expect(")")?;
        }
        if count < min_args {
            return Err(CompileError::state(format!("Too few arguments to {name}"), span));
        }
        if count > max_args {
            return Err(CompileError::state(format!("Too many arguments to {name}"), span));
        }
        let function = self.ast.add(Node::Identifier { name: "A_CallSpecial".into() });
        Ok(Some(self.ast.add(Node::ExprFuncCall { function: Some(function), params })))
    }

    /// Match a call's arguments against the callable's declared parameter
    /// list. Implicit leading parameters (the calling actor and the state
    /// context) are skipped; a `none`-typed slot marks a variadic tail.
    fn parse_function_parameters(
        &mut self,
        sc: &mut TokenStream,
        sig: &FuncSig,
        frames: &str,
    ) -> Result<Vec<NodeId>, CompileError> {
        let params = &sig.params;
        let mut pnum = 0usize;
        if sig.is_method {
            pnum += 1;
        }
        if sig.is_action {
            pnum += 2;
        }
        debug_assert!(params.len() >= pnum);
        let mut numparams = params.len() - pnum;
        let zeroparm = numparams == 0;
        let mut out = Vec::new();
        if numparams > 0 && !params[pnum].optional {
            sc.expect("(")?;
        } else if !sc.check("(") {
            return Ok(out);
        }
        while numparams > 0 {
            let value = if params[pnum].ty == ParamType::State {
                match sc.check_number() {
                    Some(v) => self.state_offset_arg(sc, v, frames)?,
                    None => self.parse_param_value(sc, params[pnum].ty)?,
                }
            } else {
                self.parse_param_value(sc, params[pnum].ty)?
            };
            out.push(self.ast.add(Node::FuncParam { label: "none".into(), value: Some(value) }));
            pnum += 1;
            numparams -= 1;
            if numparams > 0 {
                if params[pnum].ty == ParamType::None {
                    // variadic tail: a premature ')' ends the list, anything
                    // else repeats the previous slot
                    if sc.check(")") {
                        return Ok(out);
                    }
                    pnum -= 1;
                    numparams += 1;
                } else if params[pnum].optional && sc.check(")") {
                    return Ok(out);
                }
                sc.expect(",")?;
            }
        }
        if zeroparm {
            if !sc.check(")") {
                return Err(CompileError::state(
                    format!("You cannot pass parameters to '{}'", sig.name),
                    sc.last_span(),
                ));
            }
        } else {
            sc.expect(")")?;
        }
        Ok(out)
    }

    /// A bare number in a state-reference slot is a jump offset relative to
    /// the block being emitted: 0 is the null state, positive v the state
    /// at (current count + v).
    fn state_offset_arg(
        &mut self,
        sc: &TokenStream,
        value: i64,
        frames: &str,
    ) -> Result<NodeId, CompileError> {
        if value > 0 && frames.chars().count() > 1 {
            return Err(CompileError::state(
                "You cannot use state jump commands with a jump offset on multistate definitions",
                sc.last_span(),
            ));
        }
        if value < 0 {
            return Err(CompileError::state(
                "Negative jump offsets are not allowed",
                sc.last_span(),
            ));
        }
        let constant = if value > 0 {
            Constant::State(Some((self.statedef.state_count() as i64 + value) as u32))
        } else {
            Constant::State(None)
        };
        Ok(self.ast.add(Node::ExprConstant { value: constant }))
    }

    fn parse_param_value(
        &mut self,
        sc: &mut TokenStream,
        ty: ParamType,
    ) -> Result<NodeId, CompileError> {
        match ty {
            ParamType::State => {
                let (label, _) = parse_state_string(sc)?;
                Ok(self.ast.add(Node::ExprConstant { value: Constant::Name(label) }))
            }
            ParamType::Name | ParamType::Sound | ParamType::Color | ParamType::Class => {
                let (text, _) = sc.get_string()?;
                Ok(self.ast.add(Node::ExprConstant { value: Constant::Name(text) }))
            }
            ParamType::String => {
                let (text, _) = sc.get_string()?;
                Ok(self.ast.add(Node::ExprConstant { value: Constant::String(text) }))
            }
            ParamType::Int | ParamType::Float | ParamType::Bool | ParamType::None => {
                parse_expression(sc, &mut self.ast)
            }
        }
    }
}
