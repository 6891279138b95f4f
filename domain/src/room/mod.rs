//! Debate room state machine.
//!
//! Elm-style: [`transition`] maps `(state, event)` to a new state plus the
//! [`Effect`]s the caller must perform. It never does I/O, so two replicas
//! fed the same events always agree.
//!
//! ```text
//! Idle ─join─▶ Joining ─baseline─▶ Active ─finalize─▶ Finalizing ─debate-finalized─▶ Finalized
//! ```
//!
//! A baseline that is already finalized jumps straight to `Finalized`, and
//! `debate-status-updated` moves any joined room to `Active` or `Finalized`.
//!
//! Connection status is orthogonal to the phase: losing the connection keeps
//! the phase, and reconnecting re-joins and refreshes the snapshot.

pub mod effect;
pub mod event;
pub mod state;
pub mod transition;

pub use effect::Effect;
pub use event::RoomEvent;
pub use state::{FailureReason, RoomPhase, RoomState};
pub use transition::{MIN_ARGUMENTS_TO_FINALIZE, Transition, apply, transition};
