//! Routes `tracing` events to a line sink.
//!
//! In the browser the sink is `console.error`/`warn`/`log`; see
//! `wasm::attach`, which installs it as the global subscriber.

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Message plus structured fields of one event.
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.push((field.name(), rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.fields.push((field.name(), value.to_owned()));
        }
    }
}

/// `target: message key=value ...`
pub fn format_event(event: &Event<'_>) -> String {
    let mut visitor = EventVisitor::default();
    event.record(&mut visitor);
    let mut line = format!("{}: {}", event.metadata().target(), visitor.message.unwrap_or_default());
    for (name, value) in visitor.fields {
        line.push(' ');
        line.push_str(name);
        line.push('=');
        line.push_str(&value);
    }
    line
}

/// A `tracing_subscriber::Layer` handing every event at or above
/// `max_level` to `sink` as one formatted line.
pub struct ConsoleLayer<W> {
    sink: W,
    max_level: Level,
}

impl<W> ConsoleLayer<W>
where
    W: Fn(Level, &str) + Send + Sync + 'static,
{
    /// Keeps `INFO`, `WARN` and `ERROR`.
    pub fn new(sink: W) -> Self {
        Self { sink, max_level: Level::INFO }
    }

    #[must_use]
    pub fn with_max_level(mut self, level: Level) -> Self {
        self.max_level = level;
        self
    }
}

impl<S, W> Layer<S> for ConsoleLayer<W>
where
    S: Subscriber,
    W: Fn(Level, &str) + Send + Sync + 'static,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        *metadata.level() <= self.max_level
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        (self.sink)(*event.metadata().level(), &format_event(event));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tracing_subscriber::prelude::*;

    use super::*;
    use crate::entropy::SeededEntropy;
    use crate::headless::{HeadlessTree, ManualTimers};
    use crate::options::GlitchOptions;
    use crate::tree::Placement;
    use crate::Glitch;

    type Lines = Arc<Mutex<Vec<(Level, String)>>>;

    fn capture(max_level: Level) -> (ConsoleLayer<impl Fn(Level, &str) + Send + Sync + 'static>, Lines) {
        let lines = Lines::default();
        let sink = Arc::clone(&lines);
        let layer = ConsoleLayer::new(move |level: Level, line: &str| {
            sink.lock().expect("sink lock").push((level, line.to_owned()));
        })
        .with_max_level(max_level);
        (layer, lines)
    }

    #[test]
    fn lines_carry_target_message_and_fields() {
        let (layer, lines) = capture(Level::INFO);
        tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
            tracing::warn!(element = 7, err = "boom", "could not restore opacity");
        });
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::WARN);
        assert!(lines[0].1.ends_with(": could not restore opacity element=7 err=boom"), "{}", lines[0].1);
        assert!(lines[0].1.starts_with("glitch_wasm::logging"));
    }

    #[test]
    fn verbose_levels_are_dropped() {
        let (layer, lines) = capture(Level::INFO);
        tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
            tracing::debug!("round");
            tracing::trace!("stale timer");
            tracing::info!("attached");
        });
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::INFO);
    }

    #[test]
    fn element_failures_reach_the_sink() {
        let (layer, lines) = capture(Level::INFO);
        let mut tree = HeadlessTree::new(800.0, 600.0);
        let root = tree.root();
        let holder = tree.insert(root, "div");
        let el = tree.insert(holder, "h1");
        tree.set_computed(el, "color", "rgb(255, 255, 255)");
        tree.set_geometry(el, Placement { width: 10.0, height: 10.0, left: 0.0, top: 0.0 });
        let mut timers = ManualTimers::new();

        tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
            let mut glitch =
                Glitch::attach(tree, SeededEntropy::new(5), root, GlitchOptions::default(), &mut timers).unwrap();
            glitch.tree_mut().remove(holder);
            let id = timers.pop_due(Duration::ZERO).unwrap();
            glitch.on_timer(id, &mut timers);
        });

        let lines = lines.lock().unwrap();
        assert!(lines.iter().any(|(level, line)| *level == Level::INFO && line.contains("glitch attached")));
        assert!(lines
            .iter()
            .any(|(level, line)| *level == Level::WARN && line.contains("element left the tree")));
    }
}
