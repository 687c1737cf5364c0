//! The per-class state table under construction: the flat state array, the
//! label table, and the next-state disposition of each emitted state.

use serde::Serialize;
use crate::parser::ast::NodeId;

/// One animation frame of an actor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub sprite: usize,
    pub frame: u8,
    /// `-1` holds the frame forever, `0` advances immediately.
    pub tics: i32,
    /// Nonzero for `RANDOM(min, max)` durations: actual tics are drawn from
    /// `[tics, tics + tic_range]` at run time.
    pub tic_range: i32,
    pub fullbright: bool,
    pub fast: bool,
    pub slow: bool,
    pub no_delay: bool,
    pub can_raise: bool,
    pub misc1: i32,
    pub misc2: i32,
    pub next: NextState,
    /// Patched in by the linking pass that consumes the temp-call queue.
    pub action: Option<NodeId>,
}

impl State {
    pub fn new(sprite: usize) -> Self {
        Self {
            sprite,
            frame: 0,
            tics: 0,
            tic_range: 0,
            fullbright: false,
            fast: false,
            slow: false,
            no_delay: false,
            can_raise: false,
            misc1: 0,
            misc2: 0,
            next: NextState::Advance,
            action: None,
        }
    }
}

/// How control leaves a state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NextState {
    /// Fall through to the following state in the array.
    Advance,
    Stop,
    /// Stay on this state until something jumps away.
    Wait,
    /// Back to the first state of the most recent label.
    Loop { to: usize },
    /// Resolved by the linker against the label table.
    Goto { label: String, offset: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateLabel {
    pub name: String,
    pub index: usize,
}

/// Builder for one class's state definitions. Labels bind to the *future*
/// state index, so consecutive labels before a frame line all share it.
#[derive(Debug, Default)]
pub struct StateDef {
    labels: Vec<StateLabel>,
    states: Vec<State>,
    last_label_start: Option<usize>,
}

impl StateDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state_label(&mut self, name: impl Into<String>) {
        let index = self.states.len();
        self.labels.push(StateLabel { name: name.into(), index });
        self.last_label_start = Some(index);
    }

    /// Latest binding of a label, case-insensitively.
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.labels
            .iter()
            .rev()
            .find(|l| l.name.eq_ignore_ascii_case(name))
            .map(|l| l.index)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn labels(&self) -> &[StateLabel] {
        &self.labels
    }

    /// All of the directive setters return false when no state has been
    /// emitted yet; the directives are illegal before the first state.
    pub fn set_goto(&mut self, label: &str, offset: u32) -> bool {
        match self.states.last_mut() {
            Some(state) => {
                state.next = NextState::Goto { label: label.to_string(), offset };
                true
            }
            None => false,
        }
    }

    pub fn set_stop(&mut self) -> bool {
        match self.states.last_mut() {
            Some(state) => {
                state.next = NextState::Stop;
                true
            }
            None => false,
        }
    }

    pub fn set_wait(&mut self) -> bool {
        match self.states.last_mut() {
            Some(state) => {
                state.next = NextState::Wait;
                true
            }
            None => false,
        }
    }

    pub fn set_loop(&mut self) -> bool {
        let target = self.last_label_start;
        match self.states.last_mut() {
            Some(state) => {
                state.next = match target {
                    Some(to) => NextState::Loop { to },
                    None => NextState::Wait,
                };
                true
            }
            None => false,
        }
    }

    /// Append one state per frame character. Returns the emission count,
    /// negated if any character was invalid (the states are still emitted
    /// with frame 0 so index bookkeeping stays consistent).
    pub fn add_states(&mut self, proto: &State, frames: &str) -> i32 {
        let mut error = false;
        let mut count = 0i32;
        for ch in frames.chars() {
            let mut state = proto.clone();
            match frame_index(ch) {
                Some(frame) => state.frame = frame,
                None => error = true,
            }
            self.states.push(state);
            count += 1;
        }
        if error { -count } else { count }
    }

    pub fn into_parts(self) -> (Vec<State>, Vec<StateLabel>) {
        (self.states, self.labels)
    }
}

/// Frame letter to frame index: `A`-`Z` then `[`, `\`, `]`, in either case.
pub fn frame_index(ch: char) -> Option<u8> {
    let up = ch.to_ascii_uppercase();
    if ('A'..=']').contains(&up) {
        Some(up as u8 - b'A')
    } else {
        None
    }
}
