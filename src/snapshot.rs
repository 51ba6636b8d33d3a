/*!

  Point-in-time captures of pin states, for observers that poll instead of listening.

*/

use crate::{circuit::Circuit, gate::Gate, instance::Instantiable};

/// The pin states of one gate
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct GateState {
    /// The instance name
    pub name: String,
    /// The name of the primitive
    pub kind: String,
    /// Input pin states, in port order
    pub inputs: Vec<bool>,
    /// Output pin states, in port order
    pub outputs: Vec<bool>,
}

impl<I> From<&Gate<I>> for GateState
where
    I: Instantiable,
{
    fn from(gate: &Gate<I>) -> Self {
        Self {
            name: gate.get_name().to_string(),
            kind: gate.get_kind().get_name().to_string(),
            inputs: gate.inputs().iter().map(|p| p.state()).collect(),
            outputs: gate.outputs().iter().map(|p| p.state()).collect(),
        }
    }
}

/// The pin states of every gate in a circuit
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Snapshot {
    /// The name of the circuit
    pub name: String,
    /// One entry per gate, in insertion order
    pub gates: Vec<GateState>,
}

impl Snapshot {
    /// Captures the current pin states of `circuit`
    pub fn new<I: Instantiable>(circuit: &Circuit<I>) -> Self {
        Self {
            name: circuit.get_name().to_string(),
            gates: circuit.gates().map(|g| GateState::from(&g)).collect(),
        }
    }

    /// Looks up the states of a gate by instance name
    pub fn get(&self, name: &str) -> Option<&GateState> {
        self.gates.iter().find(|g| g.name == name)
    }
}

#[cfg(feature = "serde")]
/// Serde support for snapshots
pub mod serde {
    use super::Snapshot;

    /// Serialize the snapshot into the writer.
    pub fn snapshot_serialize(
        snapshot: &Snapshot,
        writer: impl std::io::Write,
    ) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, snapshot)
    }

    /// Deserialize a snapshot from the reader.
    pub fn snapshot_deserialize(reader: impl std::io::Read) -> Result<Snapshot, serde_json::Error> {
        serde_json::from_reader(reader)
    }
}
