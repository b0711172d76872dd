//! Game state machine
//!
//! The game is in exactly one state at a time (menu, playing, ...); each
//! state gets the frame delta and may request a transition by returning the
//! id of the next state.

/// A single game state
pub trait State {
    /// Numeric id distinguishing this state
    fn state_id(&self) -> i32;

    /// Advance the state; return `Some(next_id)` to request a transition
    fn update(&mut self, delta_time: f32) -> Option<i32>;

    /// Called when the machine switches into this state
    fn on_enter(&mut self) {}

    /// Called when the machine switches away from this state
    fn on_exit(&mut self) {}
}

/// Holds all registered states and runs the single active one
pub struct StateMachine {
    states: Vec<Box<dyn State>>,
    active: Option<usize>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create an empty state machine
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            active: None,
        }
    }

    /// Register a state; the first registered state becomes active
    pub fn add_state(&mut self, state: Box<dyn State>) {
        self.states.push(state);
        if self.active.is_none() {
            self.active = Some(0);
            self.states[0].on_enter();
        }
    }

    /// Id of the active state, if any
    pub fn active_state_id(&self) -> Option<i32> {
        self.active.map(|i| self.states[i].state_id())
    }

    /// Switch to the state with the given id
    ///
    /// Unknown ids are ignored with a log warning rather than aborting the
    /// frame.
    pub fn transition_to(&mut self, state_id: i32) {
        let Some(next) = self.states.iter().position(|s| s.state_id() == state_id) else {
            log::warn!("state machine: no state with id {state_id}");
            return;
        };
        if self.active == Some(next) {
            return;
        }
        if let Some(current) = self.active {
            self.states[current].on_exit();
        }
        self.active = Some(next);
        self.states[next].on_enter();
    }

    /// Update the active state, applying any requested transition
    pub fn update(&mut self, delta_time: f32) {
        let Some(current) = self.active else {
            return;
        };
        if let Some(next_id) = self.states[current].update(delta_time) {
            self.transition_to(next_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        id: i32,
        updates: u32,
        switch_after: u32,
        next: i32,
    }

    impl State for Counting {
        fn state_id(&self) -> i32 {
            self.id
        }

        fn update(&mut self, _dt: f32) -> Option<i32> {
            self.updates += 1;
            (self.updates >= self.switch_after).then_some(self.next)
        }
    }

    #[test]
    fn first_state_becomes_active() {
        let mut machine = StateMachine::new();
        machine.add_state(Box::new(Counting { id: 0, updates: 0, switch_after: 99, next: 1 }));
        machine.add_state(Box::new(Counting { id: 1, updates: 0, switch_after: 99, next: 0 }));
        assert_eq!(machine.active_state_id(), Some(0));
    }

    #[test]
    fn update_follows_requested_transition() {
        let mut machine = StateMachine::new();
        machine.add_state(Box::new(Counting { id: 0, updates: 0, switch_after: 2, next: 1 }));
        machine.add_state(Box::new(Counting { id: 1, updates: 0, switch_after: 99, next: 0 }));
        machine.update(0.016);
        assert_eq!(machine.active_state_id(), Some(0));
        machine.update(0.016);
        assert_eq!(machine.active_state_id(), Some(1));
    }

    #[test]
    fn transition_to_unknown_id_is_ignored() {
        let mut machine = StateMachine::new();
        machine.add_state(Box::new(Counting { id: 0, updates: 0, switch_after: 9, next: 1 }));
        machine.transition_to(42);
        assert_eq!(machine.active_state_id(), Some(0));
    }
}
