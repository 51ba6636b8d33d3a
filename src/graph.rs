/*!

  Analyses over the gates and connections of a circuit.

*/

use crate::circuit::Circuit;
#[cfg(feature = "graph")]
use crate::circuit::Connection;
use crate::error::{Error, Result};
use crate::gate::Gate;
use crate::instance::Instantiable;
use crate::pin::Pin;
#[cfg(feature = "graph")]
use petgraph::graph::DiGraph;
use std::collections::{HashMap, HashSet};

/// A common trait of analyses than can be performed on a circuit.
/// An analysis becomes stale when the circuit is rewired.
pub trait Analysis<'a, I: Instantiable>
where
    Self: Sized + 'a,
{
    /// Construct the analysis to the current state of the circuit.
    fn build(circuit: &'a Circuit<I>) -> Result<Self>;
}

/// A table that maps output pins and gates to what they drive
pub struct FanOutTable<'a, I: Instantiable> {
    // A reference to the underlying circuit
    _circuit: &'a Circuit<I>,
    // Maps an output pin to the input pins it drives
    pin_fan_out: HashMap<Pin<I>, Vec<Pin<I>>>,
    /// Maps a gate to the gates it drives
    gate_fan_out: HashMap<Gate<I>, Vec<Gate<I>>>,
}

impl<I> FanOutTable<'_, I>
where
    I: Instantiable,
{
    /// Returns an iterator to the input pins driven by `pin`.
    pub fn get_pin_users(&self, pin: &Pin<I>) -> impl Iterator<Item = Pin<I>> {
        self.pin_fan_out
            .get(pin)
            .into_iter()
            .flat_map(|users| users.iter().cloned())
    }

    /// Returns an iterator to the gates driven by `gate`. A gate driving another through several wires is listed once.
    pub fn get_gate_users(&self, gate: &Gate<I>) -> impl Iterator<Item = Gate<I>> {
        self.gate_fan_out
            .get(gate)
            .into_iter()
            .flat_map(|users| users.iter().cloned())
    }

    /// Returns `true` if `pin` drives anything in the circuit
    pub fn pin_has_uses(&self, pin: &Pin<I>) -> bool {
        self.pin_fan_out.get(pin).is_some_and(|users| !users.is_empty())
    }

    /// Returns the largest number of inputs driven by a single output pin
    pub fn get_max_fan_out(&self) -> usize {
        self.pin_fan_out.values().map(Vec::len).max().unwrap_or(0)
    }
}

impl<'a, I> Analysis<'a, I> for FanOutTable<'a, I>
where
    I: Instantiable,
{
    fn build(circuit: &'a Circuit<I>) -> Result<Self> {
        let mut pin_fan_out: HashMap<Pin<I>, Vec<Pin<I>>> = HashMap::new();
        let mut gate_fan_out: HashMap<Gate<I>, Vec<Gate<I>>> = HashMap::new();

        for c in circuit.connections() {
            pin_fan_out.entry(c.src()).or_default().push(c.target());

            let (Some(src), Some(target)) = (c.src_gate(), c.target_gate()) else {
                return Err(Error::Analysis(format!("connection {c} outlived its gates")));
            };
            let users = gate_fan_out.entry(src).or_default();
            if !users.contains(&target) {
                users.push(target);
            }
        }

        Ok(FanOutTable {
            _circuit: circuit,
            pin_fan_out,
            gate_fan_out,
        })
    }
}

/// The logic level of every gate: one more than the deepest gate driving it.
/// Gates with no driven inputs are at level 1.
pub struct LogicDepth<'a, I: Instantiable> {
    // A reference to the underlying circuit
    circuit: &'a Circuit<I>,
    // Maps a gate to its logic level
    depth: HashMap<Gate<I>, usize>,
    /// The maximum depth of the circuit
    max_depth: usize,
}

impl<I> LogicDepth<'_, I>
where
    I: Instantiable,
{
    /// Returns the logic level of a gate in the circuit.
    pub fn get_depth(&self, gate: &Gate<I>) -> Option<usize> {
        self.depth.get(gate).cloned()
    }

    /// Returns the maximum logic level of the circuit.
    pub fn get_max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the gates ordered by level, so every gate comes after its drivers.
    /// Gates on the same level keep their insertion order.
    pub fn topological_order(&self) -> Vec<Gate<I>> {
        let mut gates: Vec<Gate<I>> = self.circuit.gates().collect();
        gates.sort_by_key(|g| self.depth.get(g).cloned().unwrap_or(0));
        gates
    }

    /// Levels `root` and everything in its fan-in cone, walking drivers with an explicit stack
    fn visit(
        circuit: &Circuit<I>,
        root: Gate<I>,
        depth: &mut HashMap<Gate<I>, usize>,
        on_path: &mut HashSet<Gate<I>>,
    ) -> Result<()> {
        // A gate is pushed once to expand it and again, marked, to level it
        let mut stack = vec![(root, false)];
        while let Some((gate, expanded)) = stack.pop() {
            if expanded {
                let level = circuit
                    .drivers(&gate)
                    .flatten()
                    .filter_map(|d| depth.get(&d).cloned())
                    .max()
                    .unwrap_or(0);
                on_path.remove(&gate);
                depth.insert(gate, level + 1);
                continue;
            }
            if depth.contains_key(&gate) {
                continue;
            }
            if !on_path.insert(gate.clone()) {
                return Err(Error::Analysis(format!(
                    "cycle detected through {}",
                    gate.get_name()
                )));
            }
            let drivers: Vec<Gate<I>> = circuit
                .drivers(&gate)
                .flatten()
                .filter(|d| !depth.contains_key(d))
                .collect();
            stack.push((gate, true));
            stack.extend(drivers.into_iter().map(|d| (d, false)));
        }
        Ok(())
    }
}

impl<'a, I> Analysis<'a, I> for LogicDepth<'a, I>
where
    I: Instantiable,
{
    fn build(circuit: &'a Circuit<I>) -> Result<Self> {
        let mut depth: HashMap<Gate<I>, usize> = HashMap::new();
        let mut on_path: HashSet<Gate<I>> = HashSet::new();

        for gate in circuit.gates() {
            Self::visit(circuit, gate, &mut depth, &mut on_path)?;
        }

        let max_depth = depth.values().max().cloned().unwrap_or(0);

        Ok(LogicDepth {
            circuit,
            depth,
            max_depth,
        })
    }
}

/// Returns a petgraph representation of the circuit as a directed multi-graph with type [DiGraph<Gate, Connection>].
#[cfg(feature = "graph")]
pub struct MultiDiGraph<'a, I: Instantiable> {
    _circuit: &'a Circuit<I>,
    graph: DiGraph<Gate<I>, Connection<I>>,
}

#[cfg(feature = "graph")]
impl<I> MultiDiGraph<'_, I>
where
    I: Instantiable,
{
    /// Return a reference to the graph constructed by this analysis
    pub fn get_graph(&self) -> &DiGraph<Gate<I>, Connection<I>> {
        &self.graph
    }
}

#[cfg(feature = "graph")]
impl<'a, I> Analysis<'a, I> for MultiDiGraph<'a, I>
where
    I: Instantiable,
{
    fn build(circuit: &'a Circuit<I>) -> Result<Self> {
        let mut mapping = HashMap::new();
        let mut graph = DiGraph::new();

        for gate in circuit.gates() {
            let id = graph.add_node(gate.clone());
            mapping.insert(gate, id);
        }

        for connection in circuit.connections() {
            let (Some(src), Some(target)) = (connection.src_gate(), connection.target_gate())
            else {
                return Err(Error::Analysis(format!(
                    "connection {connection} outlived its gates"
                )));
            };
            let s_id = mapping[&src];
            let t_id = mapping[&target];
            graph.add_edge(s_id, t_id, connection);
        }

        Ok(Self {
            _circuit: circuit,
            graph,
        })
    }
}
