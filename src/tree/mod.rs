//! Multi-phase tournament trees.
//!
//! A [`TreeLayout`] is an immutable blueprint: ordered named phases, each
//! declaring parallel competition groups, a dispatch method splitting the
//! phase roster across groups, and player selectors describing where the
//! roster of a later phase comes from. Starting an iteration binds the
//! blueprint to a concrete roster and yields an isolated runtime
//! [`Tree`]; phase rosters past the first are computed lazily, the first
//! time the phase is reached.

mod builder;
mod phase;
mod runtime;

pub use builder::{
    DispatchMethod, PhaseLayout, PickupMethod, PlayerPack, PlayerSelector, TreeLayout,
};
pub use phase::{Phase, SpotKind};
pub use runtime::Tree;
