/*!

  Gates: reactive nodes that evaluate a boolean primitive over their input pins.

*/

use crate::{
    error::{Error, Result},
    instance::{Direction, Identifier, Instantiable},
    pin::{ListenerId, Pin},
    propagation::Walk,
};
use bitvec::vec::BitVec;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};
use tracing::{debug, trace, warn};

/// The lifecycle of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Pins exist but nothing listens to them yet
    Constructed,
    /// Input listeners are registered; no input has changed since
    Initialized,
    /// At least one input change has been processed
    Active,
    /// Input listeners are detached; the gate no longer reacts
    Destroyed,
}

/// The shared state behind a [Gate]
pub(crate) struct GateCell<I>
where
    I: Instantiable,
{
    /// The instance name
    name: Identifier,
    /// The primitive this gate evaluates
    kind: I,
    /// Input pins, order matters
    inputs: Vec<Pin<I>>,
    /// Output pins, order matters
    outputs: Vec<Pin<I>>,
    /// Last-known state of every input
    cache: RefCell<BitVec>,
    /// Listeners this gate registered on its own inputs, one per input
    wiring: RefCell<Vec<ListenerId>>,
    status: Cell<Lifecycle>,
}

impl<I> GateCell<I>
where
    I: Instantiable,
{
    /// Handles a state change of input `index`, returning the new output states
    pub(crate) fn on_input(&self, index: usize, value: bool) -> Vec<(Pin<I>, bool)> {
        if self.status.get() == Lifecycle::Destroyed {
            return Vec::new();
        }
        self.cache.borrow_mut().set(index, value);
        self.status.set(Lifecycle::Active);
        trace!(gate = %self.name, index, value, "input changed");
        self.output_values()
    }

    fn evaluate(&self) -> BitVec {
        let cache = self.cache.borrow();
        self.kind.evaluate(cache.as_bitslice())
    }

    /// Re-evaluates, pairing each output pin with its new state
    fn output_values(&self) -> Vec<(Pin<I>, bool)> {
        let values = self.evaluate();
        assert_eq!(
            values.len(),
            self.outputs.len(),
            "{} produced {} outputs for {} output pins",
            self.kind.get_name(),
            values.len(),
            self.outputs.len()
        );
        self.outputs
            .iter()
            .cloned()
            .zip(values.iter().by_vals())
            .collect()
    }
}

/// A gate instance: a boolean primitive with its own input and output pins.
///
/// A gate is built in two steps. [Gate::new] allocates the pins, which are inert
/// until [Gate::initialize] subscribes the gate to its inputs. From then on, every
/// input change updates the cached input states, re-evaluates the primitive and
/// drives the output pins, which carries the change downstream. [Gate::build]
/// does both steps at once.
///
/// [Gate] is a cheap handle: clones refer to the same gate and compare equal.
pub struct Gate<I>
where
    I: Instantiable,
{
    cell: Rc<GateCell<I>>,
}

impl<I> Clone for Gate<I>
where
    I: Instantiable,
{
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<I> PartialEq for Gate<I>
where
    I: Instantiable,
{
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<I> Eq for Gate<I> where I: Instantiable {}

impl<I> std::hash::Hash for Gate<I>
where
    I: Instantiable,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.cell).hash(state);
    }
}

impl<I> Gate<I>
where
    I: Instantiable,
{
    /// Constructs a gate of type `kind` named `name`. Its pins exist but it does not react to them yet.
    pub fn new(kind: I, name: Identifier) -> Self {
        let cell = Rc::new_cyclic(|owner| {
            let inputs = kind
                .get_input_ports()
                .into_iter()
                .enumerate()
                .map(|(i, port)| Pin::new(owner.clone(), i, port, Direction::In))
                .collect::<Vec<_>>();
            let outputs = kind
                .get_output_ports()
                .into_iter()
                .enumerate()
                .map(|(i, port)| Pin::new(owner.clone(), i, port, Direction::Out))
                .collect::<Vec<_>>();
            let cache = BitVec::repeat(false, inputs.len());
            GateCell {
                name,
                kind,
                inputs,
                outputs,
                cache: RefCell::new(cache),
                wiring: RefCell::new(Vec::new()),
                status: Cell::new(Lifecycle::Constructed),
            }
        });
        Self { cell }
    }

    /// Constructs and initializes a gate
    pub fn build(kind: I, name: Identifier) -> Result<Self> {
        let gate = Self::new(kind, name);
        gate.initialize()?;
        Ok(gate)
    }

    pub(crate) fn wrap(cell: Rc<GateCell<I>>) -> Self {
        Self { cell }
    }

    pub(crate) fn as_ptr(&self) -> *const GateCell<I> {
        Rc::as_ptr(&self.cell)
    }

    /// Subscribes the gate to its input pins and drives the outputs from the current inputs.
    ///
    /// Input pins driven while the gate was inert are picked up here. Fails with
    /// [Error::AlreadyInitialized] on a second call, leaving the existing wiring untouched.
    pub fn initialize(&self) -> Result<()> {
        match self.cell.status.get() {
            Lifecycle::Constructed => {}
            Lifecycle::Destroyed => return Err(Error::Destroyed(self.cell.name.clone())),
            Lifecycle::Initialized | Lifecycle::Active => {
                warn!(gate = %self.cell.name, "gate initialized twice");
                return Err(Error::AlreadyInitialized(self.cell.name.clone()));
            }
        }

        let owner = Rc::downgrade(&self.cell);
        let wiring = self
            .cell
            .inputs
            .iter()
            .map(|pin| pin.add_gate_listener(owner.clone()))
            .collect::<Vec<_>>();
        *self.cell.wiring.borrow_mut() = wiring;

        {
            let mut cache = self.cell.cache.borrow_mut();
            for (i, pin) in self.cell.inputs.iter().enumerate() {
                cache.set(i, pin.state());
            }
        }
        self.cell.status.set(Lifecycle::Initialized);
        debug!(gate = %self.cell.name, kind = %self.cell.kind.get_name(), "initialized");
        Walk::drive(self.cell.output_values())
    }

    /// Detaches the listeners this gate registered on its own input pins.
    /// Wires from other gates into this one are left alone; they only update pin state from now on.
    pub fn destroy(&self) {
        if self.cell.status.get() == Lifecycle::Destroyed {
            return;
        }
        let wiring = self.cell.wiring.take();
        for (pin, id) in self.cell.inputs.iter().zip(wiring) {
            pin.remove_listener(id);
        }
        self.cell.status.set(Lifecycle::Destroyed);
        debug!(gate = %self.cell.name, "destroyed");
    }

    /// Evaluates the primitive over the cached input states
    pub fn evaluate(&self) -> BitVec {
        self.cell.evaluate()
    }

    /// Returns the instance name
    pub fn get_name(&self) -> &Identifier {
        &self.cell.name
    }

    /// Returns the primitive this gate evaluates
    pub fn get_kind(&self) -> &I {
        &self.cell.kind
    }

    /// Returns the lifecycle state
    pub fn status(&self) -> Lifecycle {
        self.cell.status.get()
    }

    /// Returns the input pins, in port order
    pub fn inputs(&self) -> &[Pin<I>] {
        &self.cell.inputs
    }

    /// Returns the output pins, in port order
    pub fn outputs(&self) -> &[Pin<I>] {
        &self.cell.outputs
    }

    /// Returns the input pin at position `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn get_input(&self, idx: usize) -> &Pin<I> {
        self.cell.inputs.get(idx).unwrap_or_else(|| {
            panic!(
                "Position {} out of bounds for gate with {} inputs",
                idx,
                self.cell.inputs.len()
            )
        })
    }

    /// Returns the output pin at position `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn get_output(&self, idx: usize) -> &Pin<I> {
        self.cell.outputs.get(idx).unwrap_or_else(|| {
            panic!(
                "Position {} out of bounds for gate with {} outputs",
                idx,
                self.cell.outputs.len()
            )
        })
    }

    /// Returns the single output pin.
    ///
    /// # Panics
    ///
    /// Panics if the gate does not have exactly one output.
    pub fn output(&self) -> &Pin<I> {
        if self.cell.outputs.len() != 1 {
            panic!("Attempted to grab the output of a multi-output gate");
        }
        &self.cell.outputs[0]
    }

    /// Returns the state of the single output.
    ///
    /// # Panics
    ///
    /// Panics if the gate does not have exactly one output.
    pub fn state(&self) -> bool {
        self.output().state()
    }

    /// Returns the state of output `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn output_state(&self, idx: usize) -> bool {
        self.get_output(idx).state()
    }

    /// Finds an input pin by port name
    pub fn find_input(&self, name: &Identifier) -> Option<&Pin<I>> {
        self.cell.inputs.iter().find(|p| p.get_name() == name)
    }

    /// Finds an output pin by port name
    pub fn find_output(&self, name: &Identifier) -> Option<&Pin<I>> {
        self.cell.outputs.iter().find(|p| p.get_name() == name)
    }

    /// Returns a copy of the cached input states
    pub fn cached_inputs(&self) -> BitVec {
        self.cell.cache.borrow().clone()
    }

    /// Returns the states of the output pins
    pub fn output_states(&self) -> BitVec {
        self.cell.outputs.iter().map(|p| p.state()).collect()
    }
}

impl<I> std::fmt::Debug for Gate<I>
where
    I: Instantiable,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("name", &self.cell.name)
            .field("kind", &self.cell.kind)
            .field("status", &self.cell.status.get())
            .field("inputs", &self.cell.inputs)
            .field("outputs", &self.cell.outputs)
            .finish()
    }
}

impl<I> std::fmt::Display for Gate<I>
where
    I: Instantiable,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pins = |pins: &[Pin<I>]| {
            pins.iter()
                .map(|p| format!("{}={}", p.get_name(), u8::from(p.state())))
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{} {}({}) -> ({})",
            self.cell.kind.get_name(),
            self.cell.name,
            pins(&self.cell.inputs),
            pins(&self.cell.outputs)
        )
    }
}
