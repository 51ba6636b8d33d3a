/*!

  Pins: the directed connection points of a gate, and the listener records they notify.

*/

use crate::{
    error::{Error, Result},
    gate::{Gate, GateCell},
    instance::{Direction, Identifier, Instantiable},
    propagation::Walk,
};
use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};
use tracing::debug;

/// Identifies a listener registered on one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// What a listener does when the pin it is registered on changes state
enum Handler<I>
where
    I: Instantiable,
{
    /// Updates input `index` of the owning gate, which re-evaluates and drives its outputs
    GateInput { gate: Weak<GateCell<I>>, index: usize },
    /// Forwards the new state to a downstream input pin
    Wire { target: Weak<PinCell<I>> },
    /// Any other observer, such as a rendering update
    Observer(Rc<dyn Fn(bool)>),
}

impl<I> Clone for Handler<I>
where
    I: Instantiable,
{
    fn clone(&self) -> Self {
        match self {
            Handler::GateInput { gate, index } => Handler::GateInput {
                gate: gate.clone(),
                index: *index,
            },
            Handler::Wire { target } => Handler::Wire {
                target: target.clone(),
            },
            Handler::Observer(f) => Handler::Observer(f.clone()),
        }
    }
}

/// A registered state-change callback
pub(crate) struct Listener<I>
where
    I: Instantiable,
{
    id: ListenerId,
    handler: Handler<I>,
}

impl<I> Clone for Listener<I>
where
    I: Instantiable,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: self.handler.clone(),
        }
    }
}

impl<I> Listener<I>
where
    I: Instantiable,
{
    /// Delivers `value` and returns the pin states it drives downstream.
    /// Listeners whose gate or pin is gone do nothing.
    pub(crate) fn notify(&self, value: bool) -> Vec<(Pin<I>, bool)> {
        match &self.handler {
            Handler::GateInput { gate, index } => gate
                .upgrade()
                .map(|gate| gate.on_input(*index, value))
                .unwrap_or_default(),
            Handler::Wire { target } => target
                .upgrade()
                .map(|target| vec![(Pin::wrap(target), value)])
                .unwrap_or_default(),
            Handler::Observer(f) => {
                f(value);
                Vec::new()
            }
        }
    }
}

/// The shared state behind a [Pin]
pub(crate) struct PinCell<I>
where
    I: Instantiable,
{
    /// The gate that exclusively owns this pin
    owner: Weak<GateCell<I>>,
    /// Position among the owner's pins of the same direction
    index: usize,
    /// The port name, e.g. `A` or `Y`
    name: Identifier,
    direction: Direction,
    state: Cell<bool>,
    /// Invoked in insertion order
    listeners: RefCell<Vec<Listener<I>>>,
    next_listener: Cell<u64>,
}

/// A directed connection point owned by exactly one gate.
///
/// A pin holds a boolean state, false until driven. Setting it to a new value
/// synchronously notifies every listener in registration order, which is how
/// signals propagate from gate to gate. [Pin] is a cheap handle: clones refer
/// to the same pin and compare equal.
pub struct Pin<I>
where
    I: Instantiable,
{
    cell: Rc<PinCell<I>>,
}

impl<I> Clone for Pin<I>
where
    I: Instantiable,
{
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<I> PartialEq for Pin<I>
where
    I: Instantiable,
{
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<I> Eq for Pin<I> where I: Instantiable {}

impl<I> std::hash::Hash for Pin<I>
where
    I: Instantiable,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.cell).hash(state);
    }
}

impl<I> Pin<I>
where
    I: Instantiable,
{
    /// Creates a pin for the gate behind `owner`
    pub(crate) fn new(
        owner: Weak<GateCell<I>>,
        index: usize,
        name: Identifier,
        direction: Direction,
    ) -> Self {
        Self::wrap(Rc::new(PinCell {
            owner,
            index,
            name,
            direction,
            state: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        }))
    }

    fn wrap(cell: Rc<PinCell<I>>) -> Self {
        Self { cell }
    }

    /// Returns the current state
    pub fn state(&self) -> bool {
        self.cell.state.get()
    }

    /// Sets the state and, if it changed, notifies every listener in registration order.
    ///
    /// Returns `Ok(true)` if the state changed. Setting the current value again is a no-op.
    /// Downstream recomputation happens before this returns. If some pin changes more than
    /// [max_changes](crate::propagation::max_changes) times on the way, the loop it sits on
    /// does not settle: the remaining notifications are abandoned and [Error::Unsettled] is returned.
    pub fn set_state(&self, value: bool) -> Result<bool> {
        if self.cell.state.get() == value {
            return Ok(false);
        }
        Walk::drive(vec![(self.clone(), value)])?;
        Ok(true)
    }

    /// Sets the state without notifying anyone
    pub(crate) fn replace_state(&self, value: bool) {
        self.cell.state.set(value);
    }

    /// Returns a copy of the listeners, so they may rewire this pin while being walked
    pub(crate) fn listeners(&self) -> Vec<Listener<I>> {
        self.cell.listeners.borrow().clone()
    }

    /// Returns the direction of the pin
    pub fn direction(&self) -> Direction {
        self.cell.direction
    }

    /// Returns `true` if this is an input pin
    pub fn is_input(&self) -> bool {
        self.cell.direction == Direction::In
    }

    /// Returns `true` if this is an output pin
    pub fn is_output(&self) -> bool {
        self.cell.direction == Direction::Out
    }

    /// Returns the port name of the pin
    pub fn get_name(&self) -> &Identifier {
        &self.cell.name
    }

    /// Returns the position of the pin among its gate's inputs or outputs
    pub fn get_index(&self) -> usize {
        self.cell.index
    }

    /// Returns the gate owning this pin, unless it has been dropped
    pub fn owner(&self) -> Option<Gate<I>> {
        self.cell.owner.upgrade().map(Gate::wrap)
    }

    /// Returns `true` if `gate` owns this pin
    pub fn is_owned_by(&self, gate: &Gate<I>) -> bool {
        std::ptr::eq(self.cell.owner.as_ptr(), gate.as_ptr())
    }

    /// Returns the name as `gate.port`
    pub fn full_name(&self) -> Identifier {
        match self.owner() {
            Some(gate) => gate.get_name().join(&self.cell.name),
            None => self.cell.name.clone(),
        }
    }

    fn push_listener(&self, handler: Handler<I>) -> ListenerId {
        let id = ListenerId(self.cell.next_listener.get());
        self.cell.next_listener.set(id.0 + 1);
        self.cell
            .listeners
            .borrow_mut()
            .push(Listener { id, handler });
        id
    }

    /// Registers `callback` to be invoked with every new state.
    /// The same callback may be registered more than once.
    pub fn add_listener<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(bool) + 'static,
    {
        self.push_listener(Handler::Observer(Rc::new(callback)))
    }

    /// Registers the input handling of the gate behind `gate` on this pin
    pub(crate) fn add_gate_listener(&self, gate: Weak<GateCell<I>>) -> ListenerId {
        self.push_listener(Handler::GateInput {
            gate,
            index: self.cell.index,
        })
    }

    /// Removes a listener, returning `true` if it was registered on this pin
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.cell.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Returns the number of registered listeners
    pub fn num_listeners(&self) -> usize {
        self.cell.listeners.borrow().len()
    }

    /// Wires this output pin to the input pin `target`, then drives `target` with the current state.
    ///
    /// Returns the id of the wire listener, which [Pin::disconnect] takes to undo the connection.
    /// The pin layer does not stop several outputs from driving one input; the last state set wins.
    pub fn connect(&self, target: &Pin<I>) -> Result<ListenerId> {
        if !self.is_output() || !target.is_input() {
            return Err(Error::DirectionMismatch {
                from: self.full_name(),
                to: target.full_name(),
            });
        }
        let id = self.push_listener(Handler::Wire {
            target: Rc::downgrade(&target.cell),
        });
        debug!(from = %self.full_name(), to = %target.full_name(), "connected");
        if let Err(e) = target.set_state(self.state()) {
            self.remove_listener(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Removes the wire listener `id`. The previously driven pin keeps its state.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let removed = self.remove_listener(id);
        if removed {
            debug!(from = %self.full_name(), listener = %id, "disconnected");
        }
        removed
    }

    /// Returns `true` if this pin has a wire to `target`
    pub fn drives(&self, target: &Pin<I>) -> bool {
        self.cell.listeners.borrow().iter().any(|l| match &l.handler {
            Handler::Wire { target: t } => std::ptr::eq(t.as_ptr(), Rc::as_ptr(&target.cell)),
            _ => false,
        })
    }

    /// Returns the input pins this pin is wired to, in wiring order
    pub fn fan_out(&self) -> Vec<Pin<I>> {
        self.cell
            .listeners
            .borrow()
            .iter()
            .filter_map(|l| match &l.handler {
                Handler::Wire { target } => target.upgrade().map(Pin::wrap),
                _ => None,
            })
            .collect()
    }
}

impl<I> std::fmt::Debug for Pin<I>
where
    I: Instantiable,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pin")
            .field("name", &self.full_name())
            .field("direction", &self.cell.direction)
            .field("state", &self.cell.state.get())
            .field("listeners", &self.num_listeners())
            .finish()
    }
}

impl<I> std::fmt::Display for Pin<I>
where
    I: Instantiable,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.full_name(), u8::from(self.state()))
    }
}
