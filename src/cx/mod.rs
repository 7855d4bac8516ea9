//! Capability context.
//!
//! [`Cx`] is the explicit handle a task body uses to reach the scheduler:
//! its own identity, the clock, suspension points, spawning, cancellation,
//! and deadline-bounded regions.

#[allow(clippy::module_inception)]
mod cx;

pub use cx::Cx;
