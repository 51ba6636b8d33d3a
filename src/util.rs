/*!

  Utils for signal-net development.

*/

use crate::error::{Error, Result};
use bitvec::vec::BitVec;

/// Builds an [Identifier](crate::instance::Identifier) with `format!` syntax.
#[macro_export]
macro_rules! format_id {
    ($($arg:tt)*) => {
        $crate::instance::Identifier::new(format!($($arg)*))
    };
}

/// Returns the number of rows, `2^arity`, in a table over `arity` inputs.
/// Fails with [Error::TooManyInputs] when that does not fit in a `usize`.
pub fn num_rows(arity: usize) -> Result<usize> {
    u32::try_from(arity)
        .ok()
        .and_then(|shift| 1usize.checked_shl(shift))
        .ok_or(Error::TooManyInputs {
            inputs: arity,
            limit: usize::BITS as usize - 1,
        })
}

/// Returns the input states of row `row`: input `i` is bit `i` of `row`.
pub(crate) fn row_inputs(row: usize, arity: usize) -> BitVec {
    (0..arity).map(|i| (row >> i) & 1 == 1).collect()
}

/// Enumerates every combination of `arity` input bits, in row order.
/// Row `r` sets input `i` to bit `i` of `r`.
pub fn enumerate_inputs(arity: usize) -> Result<impl Iterator<Item = BitVec>> {
    let rows = num_rows(arity)?;
    Ok((0..rows).map(move |row| row_inputs(row, arity)))
}
