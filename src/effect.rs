use std::time::Duration;

use crate::entropy::Entropy;
use crate::error::GlitchError;
use crate::options::GlitchOptions;
use crate::scan::{self, MatchedElement};
use crate::scheduler::{Context, Phase, RoundLedger, Scheduler, TimerHost, TimerId};
use crate::tree::VisualTree;

/// A glitch effect attached to one layer of a tree.
///
/// The effect owns the tree handle and its randomness source; timers are
/// lent in on every call so the host can route fired timers back through
/// [`Glitch::on_timer`].
pub struct Glitch<T: VisualTree, E: Entropy> {
    tree: T,
    entropy: E,
    options: GlitchOptions,
    layer: T::Node,
    scheduler: Scheduler<T::Node>,
}

impl<T: VisualTree, E: Entropy> Glitch<T, E> {
    /// Scans `layer` for the target color and arms the first round after
    /// `options.delay`.
    pub fn attach(
        mut tree: T,
        entropy: E,
        layer: T::Node,
        options: GlitchOptions,
        timers: &mut dyn TimerHost,
    ) -> Result<Self, GlitchError> {
        let options = options.resolve()?;
        tree.set_style(&layer, "overflow", "visible")?;
        let registry = scan::collect(&tree, &layer, &options.target);
        tracing::info!(target_hex = %options.target, matched = registry.len(), "glitch attached");

        let mut glitch = Self { tree, entropy, layer, scheduler: Scheduler::new(registry), options };
        glitch.scheduler.start(glitch.options.delay, timers);
        Ok(glitch)
    }

    /// Re-arms the round-start timer.
    pub fn start(&mut self, delay: Duration, timers: &mut dyn TimerHost) {
        self.scheduler.start(delay, timers);
    }

    /// Cancels all timers and takes every overlay down.
    pub fn stop(&mut self, timers: &mut dyn TimerHost) {
        self.scheduler.stop(&mut self.tree, timers);
    }

    /// Stops the effect and hands the tree back.
    pub fn destroy(mut self, timers: &mut dyn TimerHost) -> T {
        self.stop(timers);
        tracing::info!("glitch destroyed");
        self.tree
    }

    /// Must be called by the host for every timer it fires.
    pub fn on_timer(&mut self, id: TimerId, timers: &mut dyn TimerHost) {
        let mut cx = Context {
            tree: &mut self.tree,
            entropy: &mut self.entropy,
            options: &self.options,
            timers,
        };
        self.scheduler.on_timer(id, &mut cx);
    }

    /// Re-reads element geometry. Never called implicitly.
    pub fn refresh_placement(&mut self) {
        self.scheduler.refresh_placement(&mut self.tree);
    }

    pub fn registry(&self) -> &[MatchedElement<T::Node>] {
        self.scheduler.registry()
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    pub fn ledger(&self) -> RoundLedger {
        self.scheduler.ledger()
    }

    pub fn is_armed(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn live_timers(&self) -> Vec<TimerId> {
        self.scheduler.live_timers()
    }

    pub fn options(&self) -> &GlitchOptions {
        &self.options
    }

    pub fn layer(&self) -> &T::Node {
        &self.layer
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Direct access for the host, e.g. to simulate page changes.
    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }
}
