use std::collections::HashMap;
use std::rc::Weak;
use std::time::Duration;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::Window;

use super::Shared;
use crate::scheduler::{TimerHost, TimerId};

/// `setTimeout`-backed timers that call back into the shared effect.
pub struct DomTimers {
    window: Window,
    owner: Weak<Shared>,
    live: HashMap<TimerId, (i32, Closure<dyn FnMut()>)>,
    // A closure can't be dropped while it runs; fired ones wait here until
    // the next callback.
    retired: Vec<Closure<dyn FnMut()>>,
}

impl DomTimers {
    pub fn new(window: Window, owner: Weak<Shared>) -> Self {
        Self { window, owner, live: HashMap::new(), retired: Vec::new() }
    }

    fn retire(&mut self, id: TimerId) {
        self.retired.clear();
        if let Some((_, closure)) = self.live.remove(&id) {
            self.retired.push(closure);
        }
    }
}

impl TimerHost for DomTimers {
    fn arm(&mut self, id: TimerId, delay: Duration) {
        let owner = self.owner.clone();
        let closure = Closure::wrap(Box::new(move || fire(&owner, id)) as Box<dyn FnMut()>);
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), millis)
        {
            Ok(handle) => {
                self.live.insert(id, (handle, closure));
            }
            Err(err) => tracing::warn!(timer = id.get(), ?err, "setTimeout failed"),
        }
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some((handle, _closure)) = self.live.remove(&id) {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

impl Drop for DomTimers {
    fn drop(&mut self) {
        for (handle, _) in self.live.values() {
            self.window.clear_timeout_with_handle(*handle);
        }
    }
}

fn fire(owner: &Weak<Shared>, id: TimerId) {
    let Some(shared) = owner.upgrade() else {
        return;
    };
    let (Ok(mut timers), Ok(mut effect)) = (shared.timers.try_borrow_mut(), shared.effect.try_borrow_mut()) else {
        tracing::warn!(timer = id.get(), "effect busy, timer dropped");
        return;
    };
    timers.retire(id);
    if let Some(effect) = effect.as_mut() {
        effect.on_timer(id, &mut *timers);
    }
}
