/*!

  Lookup tables mapping every input combination to a single output bit.

*/

use crate::error::{Error, Result};
use crate::util::{enumerate_inputs, num_rows, row_inputs};
use bitvec::{slice::BitSlice, vec::BitVec};

/// The exhaustive input-to-output mapping of a single-output boolean function.
///
/// Row `r` holds the output for the inputs where input `i` is bit `i` of `r`,
/// so the first input is the least significant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(try_from = "RawTruthTable")
)]
pub struct TruthTable {
    inputs: usize,
    table: BitVec,
}

impl TruthTable {
    /// Creates a truth table over `inputs` inputs. `table` must have exactly `2^inputs` entries.
    pub fn new(inputs: usize, table: BitVec) -> Result<Self> {
        let expected = num_rows(inputs)?;
        if table.len() != expected {
            return Err(Error::TruthTableSize {
                inputs,
                expected,
                got: table.len(),
            });
        }
        Ok(Self { inputs, table })
    }

    /// Creates a truth table from the low `2^inputs` bits of `init`, like a LUT `INIT` parameter.
    pub fn from_bits(inputs: usize, init: u64) -> Result<Self> {
        if inputs > 6 {
            return Err(Error::TooManyInputs { inputs, limit: 6 });
        }
        let table = (0..1usize << inputs)
            .map(|row| (init >> row) & 1 == 1)
            .collect::<BitVec>();
        Ok(Self { inputs, table })
    }

    /// Tabulates `f` over every combination of `inputs` inputs.
    pub fn from_fn(inputs: usize, f: impl Fn(&BitSlice) -> bool) -> Result<Self> {
        let table = enumerate_inputs(inputs)?
            .map(|row| f(row.as_bitslice()))
            .collect::<BitVec>();
        Ok(Self { inputs, table })
    }

    /// Returns the number of inputs
    pub fn num_inputs(&self) -> usize {
        self.inputs
    }

    /// Returns the number of rows, `2^inputs`
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the table has no rows. A well-formed table always has at least one.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the output at row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn get(&self, row: usize) -> bool {
        self.table[row]
    }

    /// Looks up the output for the given input states.
    ///
    /// # Panics
    ///
    /// Panics if the number of inputs does not match.
    pub fn lookup(&self, inputs: &BitSlice) -> bool {
        assert_eq!(
            inputs.len(),
            self.inputs,
            "Truth table expects {} inputs, got {}",
            self.inputs,
            inputs.len()
        );
        let row = inputs
            .iter()
            .by_vals()
            .enumerate()
            .fold(0usize, |acc, (i, bit)| acc | ((bit as usize) << i));
        self.table[row]
    }

    /// Negates every output of the table
    pub fn invert(&mut self) {
        self.table = !self.table.clone();
    }

    /// Returns the outputs as a bit slice, indexed by row
    pub fn as_bitslice(&self) -> &BitSlice {
        self.table.as_bitslice()
    }

    /// Returns an iterator over `(inputs, output)` for every row
    pub fn rows(&self) -> impl Iterator<Item = (BitVec, bool)> {
        let inputs = self.inputs;
        self.table
            .iter()
            .by_vals()
            .enumerate()
            .map(move |(row, output)| (row_inputs(row, inputs), output))
    }
}

/// The unchecked serialized form, validated by [TruthTable::new] on the way in
#[cfg(feature = "serde")]
#[derive(::serde::Deserialize)]
struct RawTruthTable {
    inputs: usize,
    table: BitVec,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTruthTable> for TruthTable {
    type Error = Error;

    fn try_from(raw: RawTruthTable) -> Result<Self> {
        Self::new(raw.inputs, raw.table)
    }
}

impl std::fmt::Display for TruthTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}'b{}",
            self.table.len(),
            self.table
                .iter()
                .by_vals()
                .rev()
                .map(|b| if b { '1' } else { '0' })
                .collect::<String>()
        )
    }
}
