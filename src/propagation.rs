/*!

  The propagation walk.

  A state change is carried downstream depth-first, one listener at a time in
  registration order, the same order a recursive call chain would visit them.
  The walk keeps its own stack of pending listener lists rather than nesting
  calls, so neither a long chain nor a feedback loop can exhaust the call stack.

  An acyclic circuit settles with every pin changing a bounded number of times.
  A pin that changes more than [max_changes] times in one walk sits on a loop
  that does not settle, and the walk is abandoned with [Error::Unsettled].

*/

use crate::{
    error::{Error, Result},
    instance::Instantiable,
    pin::{Listener, Pin},
};
use std::{cell::Cell, collections::HashMap};
use tracing::{trace, warn};

/// The number of times one pin may change within a single walk, per thread, by default
pub const DEFAULT_MAX_CHANGES: usize = 1024;

thread_local! {
    static MAX_CHANGES: Cell<usize> = const { Cell::new(DEFAULT_MAX_CHANGES) };
}

/// Returns how many times one pin may change within a single walk on the current thread
pub fn max_changes() -> usize {
    MAX_CHANGES.with(|m| m.get())
}

/// Sets how many times one pin may change within a single walk on the current thread,
/// returning the previous limit. A limit below one is treated as one.
pub fn set_max_changes(limit: usize) -> usize {
    MAX_CHANGES.with(|m| m.replace(limit.max(1)))
}

/// The listeners of one changed pin that are still to be notified
struct Frame<I>
where
    I: Instantiable,
{
    listeners: Vec<Listener<I>>,
    next: usize,
    value: bool,
}

/// One synchronous propagation walk
pub(crate) struct Walk<I>
where
    I: Instantiable,
{
    stack: Vec<Frame<I>>,
    /// How often each pin changed during this walk
    changes: HashMap<Pin<I>, usize>,
    limit: usize,
}

impl<I> Walk<I>
where
    I: Instantiable,
{
    /// Applies `changes` in order and walks everything downstream of them before returning
    pub(crate) fn drive(changes: Vec<(Pin<I>, bool)>) -> Result<()> {
        let mut walk = Self {
            stack: Vec::new(),
            changes: HashMap::new(),
            limit: max_changes(),
        };
        walk.apply(changes)?;
        walk.run()
    }

    /// Sets each pin whose state differs and schedules its listeners.
    /// A pin at the limit is left untouched.
    fn apply(&mut self, changes: Vec<(Pin<I>, bool)>) -> Result<()> {
        let mut frames = Vec::new();
        for (pin, value) in changes {
            if pin.state() == value {
                continue;
            }
            let count = self.changes.entry(pin.clone()).or_insert(0);
            if *count >= self.limit {
                warn!(pin = %pin.full_name(), limit = self.limit, "pin does not settle, abandoning walk");
                return Err(Error::Unsettled {
                    pin: pin.full_name(),
                    limit: self.limit,
                });
            }
            *count += 1;
            pin.replace_state(value);
            trace!(pin = %pin.full_name(), value, "state changed");

            let listeners = pin.listeners();
            if !listeners.is_empty() {
                frames.push(Frame {
                    listeners,
                    next: 0,
                    value,
                });
            }
        }
        // The first change is walked first
        self.stack.extend(frames.into_iter().rev());
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        while let Some(frame) = self.stack.last_mut() {
            let Some(listener) = frame.listeners.get(frame.next).cloned() else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;
            let value = frame.value;
            if frame.next == frame.listeners.len() {
                self.stack.pop();
            }
            let downstream = listener.notify(value);
            self.apply(downstream)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_per_thread() {
        let previous = set_max_changes(4);
        assert_eq!(previous, DEFAULT_MAX_CHANGES);
        assert_eq!(max_changes(), 4);

        let other = std::thread::spawn(max_changes).join().unwrap();
        assert_eq!(other, DEFAULT_MAX_CHANGES);

        set_max_changes(previous);
        assert_eq!(max_changes(), DEFAULT_MAX_CHANGES);
    }

    #[test]
    fn limit_is_at_least_one() {
        let previous = set_max_changes(0);
        assert_eq!(max_changes(), 1);
        set_max_changes(previous);
    }
}
