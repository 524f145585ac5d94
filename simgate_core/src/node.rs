//! Node lifecycle trait
//!
//! Periodic components implement [`Node`]: `init` once, `tick` repeatedly
//! from whatever drives the component (a scheduler, a timer, a test), and
//! `shutdown` once at the end. A tick must never block indefinitely; retry
//! loops belong in `init`, where blocking on an initializing simulator is a
//! deliberate policy.

use crate::error::GateResult;

pub trait Node {
    /// Stable name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// One-time setup. Called before the first tick.
    fn init(&mut self) -> GateResult<()> {
        Ok(())
    }

    /// One cycle of work.
    fn tick(&mut self);

    /// One-time teardown. Called after the last tick.
    fn shutdown(&mut self) -> GateResult<()> {
        Ok(())
    }
}
