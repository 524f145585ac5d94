// Timing message types

use serde::{Deserialize, Serialize};

/// Simulated clock tick.
///
/// The bridge models simulated rather than wall-clock time; downstream
/// consumers slave their clocks to this topic. The carried value is already
/// divided by the configured speedup factor.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Clock {
    /// Simulated seconds
    pub clock: f64,
}

impl Clock {
    pub fn new(clock: f64) -> Self {
        Self { clock }
    }
}

unsafe impl bytemuck::Pod for Clock {}
unsafe impl bytemuck::Zeroable for Clock {}
