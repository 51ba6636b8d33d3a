/*!

  The standard boolean gate kinds.

*/

use crate::{
    circuit::Circuit,
    gate::Gate,
    instance::{Identifier, Instantiable},
    pin::Pin,
    truth_table::TruthTable,
};
use bitvec::{slice::BitSlice, vec::BitVec};

/// A primitive boolean gate. Every kind has a single output port `Y`.
///
/// | Kind       | Inputs        | Y                   |
/// |------------|---------------|---------------------|
/// | `Const(v)` | none          | `v`                 |
/// | `Buf`      | `A`           | `A`                 |
/// | `Not`      | `A`           | `!A`                |
/// | `And`      | `A`, `B`      | `A & B`             |
/// | `Or`       | `A`, `B`      | `A \| B`            |
/// | `Xor`      | `A`, `B`      | `A ^ B`             |
/// | `Nand`     | `A`, `B`      | `!(A & B)`          |
/// | `Nor`      | `A`, `B`      | `!(A \| B)`         |
/// | `Xnor`     | `A`, `B`      | `!(A ^ B)`          |
/// | `Lut(t)`   | `I0`..`Ik-1`  | `t` at the inputs   |
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Logic {
    /// A constant driver
    Const(bool),
    /// A buffer
    Buf,
    /// An inverter
    Not,
    /// Conjunction
    And,
    /// Disjunction
    Or,
    /// Exclusive or
    Xor,
    /// Negated conjunction
    Nand,
    /// Negated disjunction
    Nor,
    /// Negated exclusive or
    Xnor,
    /// A lookup table over any number of inputs
    Lut(TruthTable),
}

impl Logic {
    /// Returns every two-input kind
    pub fn binary() -> [Logic; 6] {
        [
            Logic::And,
            Logic::Or,
            Logic::Xor,
            Logic::Nand,
            Logic::Nor,
            Logic::Xnor,
        ]
    }

    /// Returns `true` if the output is the negation of another kind's
    pub fn is_inverting(&self) -> bool {
        matches!(
            self,
            Logic::Not | Logic::Nand | Logic::Nor | Logic::Xnor
        )
    }
}

impl Instantiable for Logic {
    fn get_name(&self) -> Identifier {
        match self {
            Logic::Const(false) => "CONST0".into(),
            Logic::Const(true) => "CONST1".into(),
            Logic::Buf => "BUF".into(),
            Logic::Not => "NOT".into(),
            Logic::And => "AND".into(),
            Logic::Or => "OR".into(),
            Logic::Xor => "XOR".into(),
            Logic::Nand => "NAND".into(),
            Logic::Nor => "NOR".into(),
            Logic::Xnor => "XNOR".into(),
            Logic::Lut(table) => format!("LUT{}", table.num_inputs()).into(),
        }
    }

    fn get_input_ports(&self) -> impl IntoIterator<Item = Identifier> {
        match self {
            Logic::Lut(table) => (0..table.num_inputs())
                .map(|i| Identifier::new(format!("I{i}")))
                .collect::<Vec<_>>(),
            _ => ["A", "B"]
                .into_iter()
                .take(self.num_inputs())
                .map(Identifier::from)
                .collect::<Vec<_>>(),
        }
    }

    fn get_output_ports(&self) -> impl IntoIterator<Item = Identifier> {
        std::iter::once(Identifier::from("Y"))
    }

    fn num_inputs(&self) -> usize {
        match self {
            Logic::Const(_) => 0,
            Logic::Buf | Logic::Not => 1,
            Logic::And | Logic::Or | Logic::Xor | Logic::Nand | Logic::Nor | Logic::Xnor => 2,
            Logic::Lut(table) => table.num_inputs(),
        }
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn evaluate(&self, inputs: &BitSlice) -> BitVec {
        let y = match self {
            Logic::Const(v) => *v,
            Logic::Buf => inputs[0],
            Logic::Not => !inputs[0],
            Logic::And => inputs[0] & inputs[1],
            Logic::Or => inputs[0] | inputs[1],
            Logic::Xor => inputs[0] ^ inputs[1],
            Logic::Nand => !(inputs[0] & inputs[1]),
            Logic::Nor => !(inputs[0] | inputs[1]),
            Logic::Xnor => !(inputs[0] ^ inputs[1]),
            Logic::Lut(table) => table.lookup(inputs),
        };
        BitVec::repeat(y, 1)
    }

    fn truth_table(&self) -> Option<TruthTable> {
        match self {
            Logic::Lut(table) => Some(table.clone()),
            _ => TruthTable::from_fn(self.num_inputs(), |row| self.evaluate(row)[0]).ok(),
        }
    }
}

impl std::fmt::Display for Logic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Logic::Lut(table) => write!(f, "{}({})", self.get_name(), table),
            _ => write!(f, "{}", self.get_name()),
        }
    }
}

/// A type alias for gates of the standard kinds
pub type LogicGate = Gate<Logic>;
/// A type alias for pins of standard gates
pub type LogicPin = Pin<Logic>;
/// A type alias for a circuit of standard gates
pub type LogicCircuit = Circuit<Logic>;
