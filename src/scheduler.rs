//! Round scheduling.
//!
//! A round glitches every matched element that is fully inside the
//! viewport. Each overlay gets its own removal timer; once every overlay
//! spawned by the round has been torn down, the next round is armed after a
//! random pause. All state changes happen inside timer callbacks, which the
//! host serializes.

use std::time::Duration;

use crate::decompose::{self, Overlay};
use crate::entropy::Entropy;
use crate::error::GlitchError;
use crate::options::GlitchOptions;
use crate::scan::{ActiveOverlay, MatchedElement};
use crate::tree::{px, VisualTree};

/// How long one overlay stays up: `[600, 1500)` ms.
pub const OVERLAY_MIN_MS: u32 = 600;
pub const OVERLAY_SPAN_MS: f64 = 900.0;
/// Pause between rounds: `[1800, 7200)` ms.
pub const PAUSE_MIN_MS: u32 = 1800;
pub const PAUSE_SPAN_MS: f64 = 5400.0;

/// Identifies a one-shot timer armed through a [`TimerHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub(crate) u64);

impl TimerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// One-shot timers provided by the host event loop.
///
/// When a timer fires the host must call back into the effect with the same
/// id. Cancelled ids must never be delivered.
pub trait TimerHost {
    fn arm(&mut self, id: TimerId, delay: Duration);
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No overlay is up. A round-start timer may be armed.
    Idle,
    /// At least one overlay from the current round is still up.
    RoundActive,
}

/// Completion tracking for the round in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundLedger {
    pub round: u64,
    pub expected: usize,
    pub completed: usize,
}

impl RoundLedger {
    pub fn outstanding(&self) -> usize {
        self.expected - self.completed
    }
}

/// The borrowed environment a scheduler step runs in.
pub struct Context<'a, T: VisualTree, E: Entropy + ?Sized> {
    pub tree: &'a mut T,
    pub entropy: &'a mut E,
    pub options: &'a GlitchOptions,
    pub timers: &'a mut dyn TimerHost,
}

#[derive(Debug)]
pub struct Scheduler<N> {
    registry: Vec<MatchedElement<N>>,
    round_timer: Option<TimerId>,
    ledger: RoundLedger,
    next_timer: u64,
}

impl<N: Clone + PartialEq + std::fmt::Debug> Scheduler<N> {
    pub fn new(registry: Vec<MatchedElement<N>>) -> Self {
        Self { registry, round_timer: None, ledger: RoundLedger::default(), next_timer: 0 }
    }

    pub fn registry(&self) -> &[MatchedElement<N>] {
        &self.registry
    }

    pub fn ledger(&self) -> RoundLedger {
        self.ledger
    }

    pub fn phase(&self) -> Phase {
        if self.registry.iter().any(MatchedElement::is_glitching) {
            Phase::RoundActive
        } else {
            Phase::Idle
        }
    }

    /// Whether a round-start timer is pending.
    pub fn is_armed(&self) -> bool {
        self.round_timer.is_some()
    }

    /// Every timer this scheduler currently owns.
    pub fn live_timers(&self) -> Vec<TimerId> {
        self.round_timer
            .into_iter()
            .chain(self.registry.iter().filter_map(|m| m.active.as_ref().map(|a| a.removal_timer)))
            .collect()
    }

    fn allocate(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }

    /// Re-arms the round-start timer, replacing any pending one.
    pub fn start(&mut self, delay: Duration, timers: &mut dyn TimerHost) {
        if let Some(id) = self.round_timer.take() {
            timers.cancel(id);
        }
        let id = self.allocate();
        timers.arm(id, delay);
        self.round_timer = Some(id);
        tracing::debug!(delay_ms = delay.as_millis() as u64, "next glitch round scheduled");
    }

    /// Routes a fired timer. Unknown ids are ignored.
    pub fn on_timer<T, E>(&mut self, id: TimerId, cx: &mut Context<'_, T, E>)
    where
        T: VisualTree<Node = N>,
        E: Entropy + ?Sized,
    {
        if self.round_timer == Some(id) {
            self.round_timer = None;
            self.perform_round(cx);
            return;
        }
        let owner = self
            .registry
            .iter()
            .position(|m| m.active.as_ref().is_some_and(|a| a.removal_timer == id));
        match owner {
            Some(index) => self.remove_overlay(index, cx),
            None => tracing::trace!(timer = id.0, "stale timer ignored"),
        }
    }

    /// Glitches every eligible element.
    pub fn perform_round<T, E>(&mut self, cx: &mut Context<'_, T, E>)
    where
        T: VisualTree<Node = N>,
        E: Entropy + ?Sized,
    {
        self.ledger = RoundLedger { round: self.ledger.round + 1, expected: 0, completed: 0 };

        for index in 0..self.registry.len() {
            if self.registry[index].disabled {
                continue;
            }
            if self.registry[index].active.is_some() {
                // Left over from an earlier round; it does not count toward this one.
                self.tear_down(index, cx.tree, cx.timers);
            }

            let handle = self.registry[index].handle.clone();
            if !cx.tree.is_connected(&handle) {
                tracing::warn!(element = ?handle, "element left the tree, skipping from now on");
                self.registry[index].disabled = true;
                continue;
            }
            if !cx.tree.client_rect(&handle).within(cx.tree.viewport()) {
                continue;
            }

            match self.glitch_element(index, cx) {
                Ok(()) => self.ledger.expected += 1,
                Err(err) => {
                    tracing::warn!(element = ?handle, %err, "glitch failed, skipping element from now on");
                    self.registry[index].disabled = true;
                }
            }
        }

        tracing::debug!(round = self.ledger.round, overlays = self.ledger.expected, "glitch round");
        if self.ledger.expected == 0 {
            self.schedule_pause(cx);
        }
    }

    fn glitch_element<T, E>(&mut self, index: usize, cx: &mut Context<'_, T, E>) -> Result<(), GlitchError>
    where
        T: VisualTree<Node = N>,
        E: Entropy + ?Sized,
    {
        let element = &self.registry[index];
        let handle = element.handle.clone();
        let parent = cx
            .tree
            .parent(&handle)
            .ok_or_else(|| GlitchError::InvalidTreeOperation(format!("{handle:?} has no parent")))?;

        let origin = decompose::parent_origin(&*cx.tree, &parent);
        let plan = decompose::plan(element.placement, origin, cx.options, cx.entropy);
        let overlay = decompose::materialize(cx.tree, &handle, &element.matches, plan)?;

        cx.tree.set_style(&parent, "overflow", "visible")?;
        cx.tree.append_child(&parent, &overlay.root)?;
        if let Err(err) = cx.tree.set_style(&handle, "opacity", "0") {
            let _ = cx.tree.detach(&overlay.root);
            return Err(err);
        }

        let duration = cx.entropy.draw(OVERLAY_MIN_MS, OVERLAY_SPAN_MS);
        let removal_timer = self.allocate();
        cx.timers.arm(removal_timer, Duration::from_millis(u64::from(duration)));
        self.registry[index].active = Some(ActiveOverlay { overlay, removal_timer, round: self.ledger.round });
        Ok(())
    }

    /// Timer-driven removal of one overlay; arms the next round when it was
    /// the last one of the current round.
    fn remove_overlay<T, E>(&mut self, index: usize, cx: &mut Context<'_, T, E>)
    where
        T: VisualTree<Node = N>,
        E: Entropy + ?Sized,
    {
        let Some(active) = self.registry[index].active.take() else {
            return;
        };
        self.restore(index, &active.overlay, cx.tree);
        tracing::trace!(round = active.round, "overlay removed");

        if active.round == self.ledger.round {
            self.ledger.completed += 1;
            if self.ledger.completed == self.ledger.expected {
                self.schedule_pause(cx);
            }
        }
    }

    fn schedule_pause<T, E>(&mut self, cx: &mut Context<'_, T, E>)
    where
        T: VisualTree<Node = N>,
        E: Entropy + ?Sized,
    {
        let pause = cx.entropy.draw(PAUSE_MIN_MS, PAUSE_SPAN_MS);
        self.start(Duration::from_millis(u64::from(pause)), cx.timers);
    }

    /// Cancels the element's removal timer and takes its overlay down.
    fn tear_down<T: VisualTree<Node = N>>(&mut self, index: usize, tree: &mut T, timers: &mut dyn TimerHost) {
        if let Some(active) = self.registry[index].active.take() {
            timers.cancel(active.removal_timer);
            self.restore(index, &active.overlay, tree);
        }
    }

    fn restore<T: VisualTree<Node = N>>(&mut self, index: usize, overlay: &Overlay<N>, tree: &mut T) {
        let element = &mut self.registry[index];
        if let Err(err) = tree.set_style(&element.handle, "opacity", "1") {
            tracing::warn!(element = ?element.handle, %err, "could not restore opacity");
            element.disabled = true;
        }
        if let Err(err) = tree.detach(&overlay.root) {
            tracing::warn!(element = ?element.handle, %err, "could not detach overlay");
        }
    }

    /// Cancels every timer and removes every overlay, restoring opacity.
    pub fn stop<T: VisualTree<Node = N>>(&mut self, tree: &mut T, timers: &mut dyn TimerHost) {
        if let Some(id) = self.round_timer.take() {
            timers.cancel(id);
        }
        for index in 0..self.registry.len() {
            self.tear_down(index, tree, timers);
        }
        self.ledger.expected = self.ledger.completed;
    }

    /// Re-reads every element's placement and moves active overlays along.
    pub fn refresh_placement<T: VisualTree<Node = N>>(&mut self, tree: &mut T) {
        for element in self.registry.iter_mut().filter(|m| !m.disabled) {
            if !tree.is_connected(&element.handle) {
                continue;
            }
            element.placement = tree.placement(&element.handle);
            let Some(active) = element.active.as_mut() else {
                continue;
            };
            let origin = tree
                .parent(&element.handle)
                .map(|parent| decompose::parent_origin(&*tree, &parent))
                .unwrap_or_default();
            let top = element.placement.top + origin.top.unwrap_or(0.0);
            let left = element.placement.left + origin.left.unwrap_or(0.0);
            let moved = tree.apply_css(&active.overlay.root, &[("top", px(top).as_str()), ("left", px(left).as_str())]);
            if let Err(err) = moved {
                tracing::warn!(element = ?element.handle, %err, "could not move overlay");
            } else {
                active.overlay.plan.top = top;
                active.overlay.plan.left = left;
            }
        }
    }
}
