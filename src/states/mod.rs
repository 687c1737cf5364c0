//! The state-sequence compiler: turns a `states { ... }` block into a flat
//! state array, label bindings, and a queue of deferred action-call records
//! for the linking pass.

pub mod statedef;
mod action;

pub use statedef::{frame_index, NextState, State, StateDef, StateLabel};

use serde::Serialize;

use crate::diagnostics::{CompileError, Warning};
use crate::lexer::TokenStream;
use crate::lexer::token::Token;
use crate::parser::ast::{Ast, NodeId};
use crate::span::Span;
use crate::symbols::Registry;

/// Interned sprite names. One table per compilation session.
#[derive(Debug, Default)]
pub struct SpriteTable {
    names: Vec<String>,
}

impl SpriteTable {
    pub fn find_or_insert(&mut self, name: &str) -> usize {
        let upper = name.to_ascii_uppercase();
        match self.names.iter().position(|n| *n == upper) {
            Some(index) => index,
            None => {
                self.names.push(upper);
                self.names.len() - 1
            }
        }
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Deferred binding of compiled action code to a contiguous run of states.
/// Consumed exactly once by the linker, which assigns the code to every
/// state in `[first_state, first_state + num_states)`.
#[derive(Debug, Clone, Serialize)]
pub struct TempCall {
    pub class: String,
    pub first_state: usize,
    pub num_states: usize,
    pub code: NodeId,
}

/// Everything one class's states compilation produced.
#[derive(Debug)]
pub struct CompiledStates {
    pub states: Vec<State>,
    pub labels: Vec<StateLabel>,
    pub temp_calls: Vec<TempCall>,
    /// Arena holding the compiled action-call trees the temp calls refer to.
    pub ast: Ast,
    pub sprites: Vec<String>,
    pub warnings: Vec<Warning>,
    /// Recoverable reports (bad frame characters); nonempty means the class
    /// must be discarded even though parsing continued.
    pub errors: Vec<CompileError>,
}

impl CompiledStates {
    pub fn summary_json(&self, class: &str) -> String {
        serde_json::json!({
            "class": class,
            "sprites": self.sprites,
            "states": self.states,
            "labels": self.labels,
            "temp_calls": self.temp_calls,
        })
        .to_string()
    }
}

/// Compilation session for one class's state block. Owns the state table,
/// the temp-call queue, and the arena for compiled action code, so nothing
/// leaks across classes.
pub struct StateCompiler<'a> {
    class_name: String,
    registry: &'a Registry,
    pub statedef: StateDef,
    pub temp_calls: Vec<TempCall>,
    pub ast: Ast,
    pub sprites: SpriteTable,
    pub warnings: Vec<Warning>,
    pub errors: Vec<CompileError>,
}

impl<'a> StateCompiler<'a> {
    pub fn new(class_name: impl Into<String>, registry: &'a Registry) -> Self {
        Self {
            class_name: class_name.into(),
            registry,
            statedef: StateDef::new(),
            temp_calls: Vec::new(),
            ast: Ast::new(),
            sprites: SpriteTable::default(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn finish(self) -> CompiledStates {
        let (states, labels) = self.statedef.into_parts();
        CompiledStates {
            states,
            labels,
            temp_calls: self.temp_calls,
            ast: self.ast,
            sprites: self.sprites.into_names(),
            warnings: self.warnings,
            errors: self.errors,
        }
    }

    /// Parse a `{ ... }` state block. Frame strings contain backslashes, so
    /// escape interpretation is suspended for the whole block and restored
    /// on every exit path, error returns included.
    pub fn parse_block(&mut self, sc: &mut TokenStream) -> Result<(), CompileError> {
        sc.expect("{")?;
        let mut sc = sc.raw_strings();
        self.parse_block_body(&mut sc)
    }

    fn parse_block_body(&mut self, sc: &mut TokenStream) -> Result<(), CompileError> {
        'block: loop {
            if sc.check("}") {
                return Ok(());
            }
            if sc.at_end() {
                return Err(sc.error("unterminated states block"));
            }
            let (mut statestring, mut span) = parse_state_string(sc)?;
            if statestring.eq_ignore_ascii_case("goto") {
                self.do_goto(sc)?;
                continue;
            }
            if statestring.eq_ignore_ascii_case("stop") {
                self.do_stop(span)?;
                continue;
            }
            if statestring.eq_ignore_ascii_case("wait") || statestring.eq_ignore_ascii_case("fail")
            {
                if !self.statedef.set_wait() {
                    return Err(CompileError::state(
                        format!("{statestring} before first state"),
                        span,
                    ));
                }
                continue;
            }
            if statestring.eq_ignore_ascii_case("loop") {
                if !self.statedef.set_loop() {
                    return Err(CompileError::state("LOOP before first state", span));
                }
                continue;
            }
            // Consecutive `name:` pairs all bind to the same future state.
            loop {
                let mark = sc.mark();
                match sc.get() {
                    Some(tok) if matches!(tok.node, Token::Colon) => {}
                    _ => {
                        sc.reset(mark);
                        break;
                    }
                }
                self.statedef.add_state_label(statestring.as_str());
                let (next, next_span) = parse_state_string(sc)?;
                statestring = next;
                span = next_span;
                // Only these two directives may follow a label directly;
                // the others are valid sprite names here.
                if statestring.eq_ignore_ascii_case("goto") {
                    self.do_goto(sc)?;
                    continue 'block;
                }
                if statestring.eq_ignore_ascii_case("stop") {
                    self.do_stop(span)?;
                    continue 'block;
                }
            }
            self.parse_frame_line(sc, statestring, span)?;
        }
    }

    fn do_goto(&mut self, sc: &mut TokenStream) -> Result<(), CompileError> {
        let (target, target_span) = parse_state_string(sc)?;
        let mut offset = 0u32;
        if sc.check("+") {
            let (value, value_span) = sc.expect_number()?;
            if value < 0 {
                return Err(CompileError::state(
                    "Negative jump offsets are not allowed",
                    value_span,
                ));
            }
            offset = value as u32;
        }
        if !self.statedef.set_goto(&target, offset) {
            return Err(CompileError::state("GOTO before first state", target_span));
        }
        Ok(())
    }

    fn do_stop(&mut self, span: Span) -> Result<(), CompileError> {
        if !self.statedef.set_stop() {
            return Err(CompileError::state("STOP before first state", span));
        }
        Ok(())
    }

    fn parse_frame_line(
        &mut self,
        sc: &mut TokenStream,
        sprite: String,
        span: Span,
    ) -> Result<(), CompileError> {
        if sprite.len() != 4 {
            return Err(CompileError::state(
                "Sprite names must be exactly 4 characters",
                span,
            ));
        }
        let mut state = State::new(self.sprites.find_or_insert(&sprite));
        let (frames, frames_span) = sc.get_string()?;

        if sc.check("random") {
            sc.expect("(")?;
            let (a, _) = sc.expect_number()?;
            sc.expect(",")?;
            let (b, _) = sc.expect_number()?;
            sc.expect(")")?;
            let mut min = clamp_tics(a);
            let mut max = clamp_tics(b);
            if min > max {
                std::mem::swap(&mut min, &mut max);
            }
            state.tics = min;
            state.tic_range = max - min;
        } else {
            let (value, _) = sc.expect_number()?;
            state.tics = clamp_tics(value);
            state.tic_range = 0;
        }

        // Modifier keywords, then an optional trailing action. The line
        // ends at the first token on a new line, unless that token opens
        // an action sequence.
        let mut action = None;
        loop {
            let Some(tok) = sc.get() else { break };
            let text = sc.text(&tok);
            if sc.crossed() && text != "{" {
                sc.unget();
                break;
            }
            if text.eq_ignore_ascii_case("bright") {
                state.fullbright = true;
                continue;
            }
            if text.eq_ignore_ascii_case("fast") {
                state.fast = true;
                continue;
            }
            if text.eq_ignore_ascii_case("slow") {
                state.slow = true;
                continue;
            }
            if text.eq_ignore_ascii_case("canraise") {
                state.can_raise = true;
                continue;
            }
            if text.eq_ignore_ascii_case("nodelay") {
                if self.statedef.label_index("Spawn") == Some(self.statedef.state_count()) {
                    state.no_delay = true;
                } else {
                    self.warnings.push(Warning {
                        msg: "NODELAY may only be used immediately after Spawn:".to_string(),
                        span: tok.span,
                    });
                }
                continue;
            }
            if text.eq_ignore_ascii_case("offset") {
                // weapon sprite offset
                sc.expect("(")?;
                let (x, _) = sc.expect_number()?;
                sc.expect(",")?;
                let (y, _) = sc.expect_number()?;
                sc.expect(")")?;
                state.misc1 = x as i32;
                state.misc2 = y as i32;
                continue;
            }
            if text.eq_ignore_ascii_case("light") {
                sc.expect("(")?;
                loop {
                    sc.get_string()?;
                    if !sc.check(",") {
                        break;
                    }
                }
                sc.expect(")")?;
                continue;
            }
            action = self.parse_actions(sc, &frames, &text, tok.span)?;
            break;
        }

        let raw_count = self.statedef.add_states(&state, &frames);
        let count = if raw_count <= 0 {
            self.errors.push(CompileError::state(
                format!("Invalid frame character string '{frames}'"),
                frames_span,
            ));
            -raw_count
        } else {
            raw_count
        };
        if let Some(code) = action {
            if count > 0 {
                self.temp_calls.push(TempCall {
                    class: self.class_name.clone(),
                    first_state: self.statedef.state_count() - count as usize,
                    num_states: count as usize,
                    code,
                });
            }
        }
        Ok(())
    }
}

fn clamp_tics(value: i64) -> i32 {
    value.clamp(-1, 32767) as i32
}

/// Read a state name that may carry `::scope` and `.sub` qualifiers,
/// concatenated verbatim for later lookup.
pub(crate) fn parse_state_string(
    sc: &mut TokenStream,
) -> Result<(String, Span), CompileError> {
    let (mut text, span) = sc.get_string()?;
    if sc.check("::") {
        let (next, _) = sc.get_string()?;
        text.push_str("::");
        text.push_str(&next);
    }
    while sc.check(".") {
        let (next, _) = sc.get_string()?;
        text.push('.');
        text.push_str(&next);
    }
    Ok((text, span))
}
