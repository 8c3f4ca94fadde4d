//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌───────────┬───────────┬──────────┬──────────────────────┐ │
//! │  │ StateId   │ on_enter  │ on_exit  │ on_event             │ │
//! │  ├───────────┼───────────┼──────────┼──────────────────────┤ │
//! │  │ Idle      │ fn(ctx)   │ -        │ fn(ctx,ev)->Option<> │ │
//! │  │ MotionLit │ fn(ctx)   │ -        │ fn(ctx,ev)->Option<> │ │
//! │  │ ForcedOn  │ fn(ctx)   │ -        │ fn(ctx,ev)->Option<> │ │
//! │  │ ForcedOff │ fn(ctx)   │ -        │ fn(ctx,ev)->Option<> │ │
//! │  └───────────┴───────────┴──────────┴──────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The light has nothing to do between events, so the engine is driven by
//! [`Fsm::dispatch`] rather than a periodic tick.  `on_event` for the
//! current state returns `Some(next)` to transition.  Returning the
//! current state re-enters it: `on_exit` and `on_enter` both run again,
//! which is how a second motion re-applies the colour and re-arms the
//! timer.

pub mod context;
pub mod states;

use context::LightContext;
use log::{debug, info};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all controller states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Status `None`, latch clear, dark.
    Idle = 0,
    /// Status `None`, latch set, lit until the timer expires.
    MotionLit = 1,
    /// Status `On`.
    ForcedOn = 2,
    /// Status `Off`.
    ForcedOff = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Asserts in debug builds;
    /// falls back to `Idle` (dark, sensor-driven) in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::MotionLit,
            2 => Self::ForcedOn,
            3 => Self::ForcedOff,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// Whether the policy wants the light on in this state.
    pub fn is_lit(self) -> bool {
        matches!(self, Self::MotionLit | Self::ForcedOn)
    }
}

/// Inputs to the light policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightEvent {
    /// One PIR edge.
    Motion,
    /// The auto-off timer fired.
    TimeoutExpired,
    /// The permanent status resource was written.
    StatusWritten,
    /// The colour resource was written.
    ColorWritten,
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut LightContext);

/// Signature for the event handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateEventFn = fn(&mut LightContext, LightEvent) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `dispatch()`.
    pub fn start(&mut self, ctx: &mut LightContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Feed one event through the current state's handler.
    ///
    /// Returns the state the FSM is in afterwards.
    pub fn dispatch(&mut self, event: LightEvent, ctx: &mut LightContext) -> StateId {
        let next = (self.table[self.current].on_event)(ctx, event);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
        self.current_state()
    }

    /// Jump to `next` regardless of events.  No-op if already there.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut LightContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut LightContext) {
        let next_idx = next_id as usize;

        if next_idx == self.current {
            debug!("FSM re-enter: {}", self.table[next_idx].name);
        } else {
            info!(
                "FSM transition: {} -> {}",
                self.table[self.current].name, self.table[next_idx].name
            );
        }

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
