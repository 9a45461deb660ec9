//! Process-wide kernel state.

use std::sync::atomic::{AtomicBool, Ordering};

/// Kernel-wide switches shared by every session. Maintenance mode
/// suppresses all commands except those explicitly marked exempt.
#[derive(Debug, Default)]
pub struct KernelState {
    maintenance: AtomicBool,
}

impl KernelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_maintenance(&self) -> bool {
        self.maintenance.load(Ordering::Acquire)
    }

    pub fn set_maintenance(&self, on: bool) {
        self.maintenance.store(on, Ordering::Release);
        log::info!("kernel maintenance mode {}", if on { "on" } else { "off" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maintenance_toggles() {
        let kernel = KernelState::new();
        assert!(!kernel.in_maintenance());
        kernel.set_maintenance(true);
        assert!(kernel.in_maintenance());
        kernel.set_maintenance(false);
        assert!(!kernel.in_maintenance());
    }
}
