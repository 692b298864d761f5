use std::cell::Cell;

use bitflags::bitflags;

/// What the embedding application must provide to the engine.
///
/// Methods take `&self`: hosts are shared between the piano and its listeners, so any
/// bookkeeping lives behind interior mutability.
pub trait HostCallbacks {
    /// The pressed state or the unlock hint changed; the next frame should be painted.
    fn request_redraw(&self);
    /// The unlock sequence completed; open the settings screen.
    fn request_config(&self);
    /// The user keeps failing the unlock sequence; show how it works.
    fn show_config_tooltip(&self);
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct HostRequests: u32 {
        const REDRAW = 1 << 0;
        const OPEN_CONFIG = 1 << 1;
        const SHOW_TOOLTIP = 1 << 2;
    }
}

/// Accumulates callbacks into a [`HostRequests`] mask, for hosts that poll.
#[derive(Debug, Default)]
pub struct PendingRequests {
    mask: Cell<HostRequests>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self) -> HostRequests {
        self.mask.get()
    }

    /// Returns everything requested since the last call, and clears it.
    pub fn take(&self) -> HostRequests {
        self.mask.replace(HostRequests::empty())
    }

    fn set(&self, r: HostRequests) {
        self.mask.set(self.mask.get() | r);
    }
}

impl HostCallbacks for PendingRequests {
    fn request_redraw(&self) {
        self.set(HostRequests::REDRAW);
    }

    fn request_config(&self) {
        self.set(HostRequests::OPEN_CONFIG);
    }

    fn show_config_tooltip(&self) {
        self.set(HostRequests::SHOW_TOOLTIP);
    }
}
