//! Per-domain reset sequencing.
//!
//! Each domain owns one [`ResetCoordinator`]. It samples that domain's
//! reset input once per tick and reports edges. On an active edge (see
//! [`ResetEdge::is_active`]) the queues compute reset values instead of
//! the normal update, never both.
//!
//! A coordinator also tracks the peer domain's reset level as last seen
//! across the bridge, so ports can report `receiver_in_reset` /
//! `sender_in_reset` without reaching into the other domain's state.

use sluice_core::{DomainId, TickId};
use tracing::debug;

/// How the reset input changed on the sampled tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetEdge {
    /// Not in reset, and was not last tick.
    Idle,
    /// Reset asserted this tick.
    Entered,
    /// Reset still asserted.
    Held,
    /// Reset deasserted this tick; normal operation resumes.
    Released,
}

impl ResetEdge {
    /// Whether this tick applies reset values.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Entered | Self::Held)
    }
}

/// Tracks one domain's reset level and its view of the peer's.
#[derive(Clone, Debug)]
pub struct ResetCoordinator {
    domain: DomainId,
    asserted: bool,
    peer_asserted: bool,
    resets: u64,
}

impl ResetCoordinator {
    /// A coordinator for `domain`, initially out of reset.
    pub fn new(domain: DomainId) -> Self {
        Self {
            domain,
            asserted: false,
            peer_asserted: false,
            resets: 0,
        }
    }

    /// Sample this tick's reset input.
    pub fn sample(&mut self, reset: bool, tick: TickId) -> ResetEdge {
        let edge = match (self.asserted, reset) {
            (false, false) => ResetEdge::Idle,
            (false, true) => ResetEdge::Entered,
            (true, true) => ResetEdge::Held,
            (true, false) => ResetEdge::Released,
        };
        self.asserted = reset;
        match edge {
            ResetEdge::Entered => {
                self.resets += 1;
                debug!(domain = %self.domain, tick = tick.0, "reset asserted");
            }
            ResetEdge::Released => {
                debug!(domain = %self.domain, tick = tick.0, "reset released");
            }
            ResetEdge::Idle | ResetEdge::Held => {}
        }
        edge
    }

    /// Record the peer's reset level as observed through its bridge.
    ///
    /// Returns `true` when the observed level changed.
    pub fn observe_peer(&mut self, in_reset: bool) -> bool {
        let changed = self.peer_asserted != in_reset;
        if changed {
            debug!(domain = %self.domain, peer_in_reset = in_reset, "peer reset level changed");
        }
        self.peer_asserted = in_reset;
        changed
    }

    /// Whether this domain is in reset.
    pub fn in_reset(&self) -> bool {
        self.asserted
    }

    /// Whether the peer domain was last seen in reset.
    pub fn peer_in_reset(&self) -> bool {
        self.peer_asserted
    }

    /// Number of reset assertions seen.
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// The domain this coordinator belongs to.
    pub fn domain(&self) -> DomainId {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_follow_input_level() {
        let mut r = ResetCoordinator::new(DomainId::Push);
        let levels = [false, true, true, false, false, true];
        let edges: Vec<_> = levels
            .iter()
            .enumerate()
            .map(|(i, &l)| r.sample(l, TickId(i as u64)))
            .collect();
        assert_eq!(
            edges,
            vec![
                ResetEdge::Idle,
                ResetEdge::Entered,
                ResetEdge::Held,
                ResetEdge::Released,
                ResetEdge::Idle,
                ResetEdge::Entered,
            ]
        );
        assert_eq!(r.resets(), 2);
        assert!(r.in_reset());
    }

    #[test]
    fn peer_level_reports_changes_only() {
        let mut r = ResetCoordinator::new(DomainId::Pop);
        assert!(!r.observe_peer(false));
        assert!(r.observe_peer(true));
        assert!(r.peer_in_reset());
        assert!(!r.observe_peer(true));
        assert!(r.observe_peer(false));
        assert!(!r.in_reset(), "peer reset never asserts local reset");
    }

    #[test]
    fn active_edges() {
        assert!(ResetEdge::Entered.is_active());
        assert!(ResetEdge::Held.is_active());
        assert!(!ResetEdge::Released.is_active());
        assert!(!ResetEdge::Idle.is_active());
    }
}
