/*!

  API for an explicit circuit: the gates and connections reachable in one design.

*/

use crate::{
    error::{Error, Result},
    gate::Gate,
    graph::Analysis,
    instance::{Identifier, Instantiable},
    pin::{ListenerId, Pin},
    snapshot::Snapshot,
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};
use tracing::debug;

/// Identifies a connection within a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A wire from an output pin to an input pin
#[derive(Debug, Clone)]
pub struct Connection<I: Instantiable> {
    id: ConnectionId,
    driver: Pin<I>,
    input: Pin<I>,
    /// The wire listener registered on `driver`
    listener: ListenerId,
}

impl<I> Connection<I>
where
    I: Instantiable,
{
    /// Returns the id of the connection
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the driving output pin
    pub fn src(&self) -> Pin<I> {
        self.driver.clone()
    }

    /// Returns the driven input pin
    pub fn target(&self) -> Pin<I> {
        self.input.clone()
    }

    /// Returns the gate owning the driving pin
    pub fn src_gate(&self) -> Option<Gate<I>> {
        self.driver.owner()
    }

    /// Returns the gate owning the driven pin
    pub fn target_gate(&self) -> Option<Gate<I>> {
        self.input.owner()
    }

    /// Returns `true` if either end of the connection belongs to `gate`
    pub fn touches(&self, gate: &Gate<I>) -> bool {
        self.driver.is_owned_by(gate) || self.input.is_owned_by(gate)
    }
}

impl<I> std::fmt::Display for Connection<I>
where
    I: Instantiable,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.driver.full_name(),
            self.input.full_name()
        )
    }
}

/// A circuit of gates wired output-to-input.
///
/// The circuit owns its gates and connections and keeps the wiring well-formed:
/// gate names are unique, every input has at most one driver, and connections
/// that would close a combinational loop are rejected. Propagation itself is
/// done by the pins, so a signal set on any input pin reaches the whole circuit.
#[derive(Debug)]
pub struct Circuit<I>
where
    I: Instantiable,
{
    /// The name of the circuit
    name: String,
    /// The gates, in insertion order
    gates: RefCell<Vec<Gate<I>>>,
    /// The connections, in creation order
    connections: RefCell<Vec<Connection<I>>>,
    /// Maps each driven input to its driver
    drivers: RefCell<HashMap<Pin<I>, Pin<I>>>,
    next_connection: Cell<u64>,
}

impl<I> Circuit<I>
where
    I: Instantiable,
{
    /// Creates a new, empty circuit with the given name
    pub fn new(name: String) -> Self {
        Self {
            name,
            gates: RefCell::new(Vec::new()),
            connections: RefCell::new(Vec::new()),
            drivers: RefCell::new(HashMap::new()),
            next_connection: Cell::new(0),
        }
    }

    /// Returns the name of the circuit
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Constructs and initializes a gate, and adds it to the circuit
    pub fn insert_gate(&self, kind: I, name: Identifier) -> Result<Gate<I>> {
        if self.get_gate(&name).is_some() {
            return Err(Error::DuplicateName(name));
        }
        let gate = Gate::build(kind, name)?;
        self.gates.borrow_mut().push(gate.clone());
        debug!(circuit = %self.name, gate = %gate.get_name(), "inserted gate");
        Ok(gate)
    }

    /// Returns `true` if `gate` belongs to this circuit
    pub fn contains(&self, gate: &Gate<I>) -> bool {
        self.gates.borrow().iter().any(|g| g == gate)
    }

    /// Looks up a gate by instance name
    pub fn get_gate(&self, name: &Identifier) -> Option<Gate<I>> {
        self.gates
            .borrow()
            .iter()
            .find(|g| g.get_name() == name)
            .cloned()
    }

    /// Returns an iterator over the gates, in insertion order
    pub fn gates(&self) -> impl Iterator<Item = Gate<I>> {
        let gates: Vec<Gate<I>> = self.gates.borrow().clone();
        gates.into_iter()
    }

    /// Returns the number of gates
    pub fn num_gates(&self) -> usize {
        self.gates.borrow().len()
    }

    /// Returns the first gate inserted
    pub fn first(&self) -> Option<Gate<I>> {
        self.gates.borrow().first().cloned()
    }

    /// Returns the last gate inserted
    pub fn last(&self) -> Option<Gate<I>> {
        self.gates.borrow().last().cloned()
    }

    /// Returns the gate owning `pin`, if it belongs to this circuit
    fn owning_gate(&self, pin: &Pin<I>) -> Result<Gate<I>> {
        pin.owner()
            .filter(|g| self.contains(g))
            .ok_or_else(|| Error::ForeignPin(pin.full_name()))
    }

    /// Wires the output pin `driver` to the input pin `input`, which immediately takes the driver's state.
    ///
    /// Fails if the pins have the wrong directions, either gate is not in this circuit,
    /// `input` already has a driver, or the wire would close a combinational loop.
    pub fn connect(&self, driver: &Pin<I>, input: &Pin<I>) -> Result<ConnectionId> {
        if !driver.is_output() || !input.is_input() {
            return Err(Error::DirectionMismatch {
                from: driver.full_name(),
                to: input.full_name(),
            });
        }
        let src = self.owning_gate(driver)?;
        let dst = self.owning_gate(input)?;

        if let Some(existing) = self.get_driver(input) {
            return Err(Error::AlreadyDriven {
                pin: input.full_name(),
                driver: existing.full_name(),
            });
        }

        if src == dst || self.feeds(&dst, &src) {
            return Err(Error::Cycle {
                from: driver.full_name(),
                to: input.full_name(),
            });
        }

        let listener = driver.connect(input)?;
        let id = ConnectionId(self.next_connection.get());
        self.next_connection.set(id.0 + 1);
        let connection = Connection {
            id,
            driver: driver.clone(),
            input: input.clone(),
            listener,
        };
        debug!(circuit = %self.name, connection = %connection, id = %id, "connected");
        self.drivers
            .borrow_mut()
            .insert(input.clone(), driver.clone());
        self.connections.borrow_mut().push(connection);
        Ok(id)
    }

    /// Removes a connection. The formerly driven input falls back to false, like any undriven input.
    pub fn disconnect(&self, id: ConnectionId) -> Result<Connection<I>> {
        let connection = {
            let mut connections = self.connections.borrow_mut();
            let pos = connections
                .iter()
                .position(|c| c.id == id)
                .ok_or(Error::UnknownConnection(id))?;
            connections.remove(pos)
        };
        self.drivers.borrow_mut().remove(&connection.input);
        connection.driver.disconnect(connection.listener);
        debug!(circuit = %self.name, connection = %connection, id = %id, "disconnected");
        connection.input.set_state(false)?;
        Ok(connection)
    }

    /// Removes a gate together with every connection into or out of it.
    /// Inputs the gate used to drive fall back to false.
    pub fn remove_gate(&self, gate: &Gate<I>) -> Result<()> {
        if !self.contains(gate) {
            return Err(Error::UnknownGate(gate.get_name().clone()));
        }
        // Detach first so resetting its own inputs does not ripple through
        gate.destroy();
        let touching: Vec<ConnectionId> = self
            .connections
            .borrow()
            .iter()
            .filter(|c| c.touches(gate))
            .map(|c| c.id)
            .collect();
        for id in touching {
            self.disconnect(id)?;
        }
        self.gates.borrow_mut().retain(|g| g != gate);
        debug!(circuit = %self.name, gate = %gate.get_name(), "removed gate");
        Ok(())
    }

    /// Tears down every connection and gate. Pin states are left as they are.
    pub fn clear(&self) {
        self.drivers.borrow_mut().clear();
        for connection in self.connections.take() {
            connection.driver.disconnect(connection.listener);
        }
        for gate in self.gates.take() {
            gate.destroy();
        }
        debug!(circuit = %self.name, "cleared");
    }

    /// Returns an iterator over the connections, in creation order
    pub fn connections(&self) -> impl Iterator<Item = Connection<I>> {
        let connections: Vec<Connection<I>> = self.connections.borrow().clone();
        connections.into_iter()
    }

    /// Returns the number of connections
    pub fn num_connections(&self) -> usize {
        self.connections.borrow().len()
    }

    /// Looks up a connection by id
    pub fn get_connection(&self, id: ConnectionId) -> Option<Connection<I>> {
        self.connections
            .borrow()
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Returns the output pin driving `input`, if any
    pub fn get_driver(&self, input: &Pin<I>) -> Option<Pin<I>> {
        self.drivers.borrow().get(input).cloned()
    }

    /// Returns the input pins driven by `driver`, in connection order
    pub fn get_users(&self, driver: &Pin<I>) -> Vec<Pin<I>> {
        self.connections
            .borrow()
            .iter()
            .filter(|c| c.driver == *driver)
            .map(|c| c.input.clone())
            .collect()
    }

    /// Returns the gates driving each input of `gate`, in port order
    pub fn drivers(&self, gate: &Gate<I>) -> impl Iterator<Item = Option<Gate<I>>> {
        let drivers: Vec<Option<Gate<I>>> = gate
            .inputs()
            .iter()
            .map(|pin| self.get_driver(pin).and_then(|d| d.owner()))
            .collect();
        drivers.into_iter()
    }

    /// Returns `true` if a signal from `upstream` can reach `downstream`
    pub fn feeds(&self, upstream: &Gate<I>, downstream: &Gate<I>) -> bool {
        self.dfs(downstream.clone()).any(|g| g == *upstream)
    }

    /// Returns a depth-first iterator over `from` and every gate in its fan-in cone
    pub fn dfs(&self, from: Gate<I>) -> iter::DfsIterator<'_, I> {
        iter::DfsIterator::new(self, from)
    }

    /// Constructs an analysis of the circuit.
    pub fn get_analysis<'a, A: Analysis<'a, I>>(&'a self) -> Result<A> {
        A::build(self)
    }

    /// Captures the current state of every pin
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self)
    }

    #[cfg(feature = "serde")]
    /// Serializes a snapshot of the current pin states to a writer.
    pub fn serialize(&self, writer: impl std::io::Write) -> std::result::Result<(), serde_json::Error> {
        crate::snapshot::serde::snapshot_serialize(&self.snapshot(), writer)
    }
}

impl<I> std::fmt::Display for Circuit<I>
where
    I: Instantiable,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "circuit {} {{", self.name)?;
        let indent = " ".repeat(2);
        for gate in self.gates.borrow().iter() {
            writeln!(f, "{indent}{gate}")?;
        }
        for connection in self.connections.borrow().iter() {
            writeln!(f, "{indent}{connection}")?;
        }
        writeln!(f, "}}")
    }
}

/// A collection of iterators for the circuit
pub mod iter {
    use super::{Circuit, Gate, Instantiable};
    use std::collections::HashSet;

    /// A depth-first walk from a gate through the gates driving it
    pub struct DfsIterator<'a, I: Instantiable> {
        circuit: &'a Circuit<I>,
        stack: Vec<Gate<I>>,
        visited: HashSet<Gate<I>>,
    }

    impl<'a, I> DfsIterator<'a, I>
    where
        I: Instantiable,
    {
        /// Creates a new DFS iterator for the circuit starting at `from`.
        pub fn new(circuit: &'a Circuit<I>, from: Gate<I>) -> Self {
            Self {
                circuit,
                stack: vec![from],
                visited: HashSet::new(),
            }
        }
    }

    impl<I> Iterator for DfsIterator<'_, I>
    where
        I: Instantiable,
    {
        type Item = Gate<I>;

        fn next(&mut self) -> Option<Self::Item> {
            while let Some(item) = self.stack.pop() {
                if !self.visited.insert(item.clone()) {
                    continue;
                }
                for driver in self.circuit.drivers(&item).flatten() {
                    self.stack.push(driver);
                }
                return Some(item);
            }
            None
        }
    }
}
