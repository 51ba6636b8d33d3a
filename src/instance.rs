/*!

  Identifiers, pin directions, and the [Instantiable] trait every gate kind implements.

*/

use crate::truth_table::TruthTable;
use bitvec::{slice::BitSlice, vec::BitVec};

/// The largest number of inputs for which a truth table is tabulated by default
pub const MAX_TABULATED_INPUTS: usize = 16;

/// The direction of a pin: it either receives a signal or drives one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Direction {
    /// An input pin, driven by an output pin or external stimulus
    In,
    /// An output pin, driven by its gate
    Out,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// An identifier of a gate instance, gate kind or pin
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Identifier {
    /// The name of the identifier
    name: String,
}

impl Identifier {
    /// Creates a new identifier with the given name
    pub fn new(name: String) -> Self {
        Self { name }
    }

    /// Returns the name of the identifier
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns a hierarchical identifier `self.other`, as used to name a pin of a gate instance
    pub fn join(&self, other: &Identifier) -> Self {
        Self::new(format!("{}.{}", self.name, other.name))
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A trait for the boolean primitives a gate can instantiate, such as AND, OR, NOT or a LUT.
///
/// A kind fixes the number and names of the pins of every gate built from it,
/// and maps the cached input states to the output states. The mapping must be
/// pure: the same inputs always produce the same outputs.
pub trait Instantiable: Clone + std::fmt::Debug {
    /// Returns the name of the primitive
    fn get_name(&self) -> Identifier;

    /// Returns the input ports of the primitive, order matters
    fn get_input_ports(&self) -> impl IntoIterator<Item = Identifier>;

    /// Returns the output ports of the primitive, order matters
    fn get_output_ports(&self) -> impl IntoIterator<Item = Identifier>;

    /// Computes the output states from the input states.
    /// `inputs` has exactly one bit per input port and the result must have one bit per output port.
    fn evaluate(&self, inputs: &BitSlice) -> BitVec;

    /// Returns the number of input ports
    fn num_inputs(&self) -> usize {
        self.get_input_ports().into_iter().count()
    }

    /// Returns the number of output ports
    fn num_outputs(&self) -> usize {
        self.get_output_ports().into_iter().count()
    }

    /// Returns the input port at position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    fn get_input_port(&self, index: usize) -> Identifier {
        self.get_input_ports()
            .into_iter()
            .nth(index)
            .expect("Input port index out of bounds")
    }

    /// Returns the output port at position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    fn get_output_port(&self, index: usize) -> Identifier {
        self.get_output_ports()
            .into_iter()
            .nth(index)
            .expect("Output port index out of bounds")
    }

    /// Tabulates the primitive, if it has a single output and at most [MAX_TABULATED_INPUTS] inputs.
    fn truth_table(&self) -> Option<TruthTable> {
        let inputs = self.num_inputs();
        if self.num_outputs() != 1 || inputs > MAX_TABULATED_INPUTS {
            return None;
        }
        TruthTable::from_fn(inputs, |row| self.evaluate(row)[0]).ok()
    }
}
