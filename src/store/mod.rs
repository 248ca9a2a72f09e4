//! The mutable point table and its session owner.
//!
//! [`PatternStore`] is the single owner of the working pattern and its undo
//! history; every other component receives an immutable snapshot for the
//! duration of one computation. [`SessionState`] bundles the store with the
//! session's design parameters, replacing the implicit shared context the
//! workflow previously relied on.

pub mod history;
pub mod session;
pub mod store;

pub use history::History;
pub use session::{DesignParams, SessionState};
pub use store::{PatternStore, PointEdit, StoreState};
