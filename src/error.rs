/*!

  Error types for wiring and propagating signals.

*/

use crate::instance::Identifier;
use crate::circuit::ConnectionId;
use thiserror::Error;

/// Result type for fallible operations in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving a circuit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A pin kept changing within one propagation walk: a feedback loop that does not settle
    #[error("pin {pin} changed more than {limit} times without settling")]
    Unsettled {
        /// The pin that hit the limit
        pin: Identifier,
        /// The limit that was in effect
        limit: usize,
    },

    /// A connection must go from an output pin to an input pin
    #[error("cannot connect {from} to {to}: expected an output pin driving an input pin")]
    DirectionMismatch {
        /// The would-be driving pin
        from: Identifier,
        /// The would-be driven pin
        to: Identifier,
    },

    /// The gate already registered its input listeners
    #[error("gate {0} is already initialized")]
    AlreadyInitialized(Identifier),

    /// The gate has been torn down
    #[error("gate {0} has been destroyed")]
    Destroyed(Identifier),

    /// The connection would close a combinational loop
    #[error("connecting {from} to {to} would create a combinational cycle")]
    Cycle {
        /// The would-be driving pin
        from: Identifier,
        /// The would-be driven pin
        to: Identifier,
    },

    /// The input pin already has a driver in the circuit
    #[error("input {pin} is already driven by {driver}")]
    AlreadyDriven {
        /// The driven input pin
        pin: Identifier,
        /// The existing driver
        driver: Identifier,
    },

    /// The pin is not owned by a gate of this circuit
    #[error("pin {0} does not belong to this circuit")]
    ForeignPin(Identifier),

    /// Gate instance names must be unique within a circuit
    #[error("gate name {0} is already in use")]
    DuplicateName(Identifier),

    /// No gate with this name exists in the circuit
    #[error("unknown gate {0}")]
    UnknownGate(Identifier),

    /// No connection with this id exists in the circuit
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// A lookup table must have exactly 2^k entries
    #[error("truth table over {inputs} inputs needs {expected} entries, got {got}")]
    TruthTableSize {
        /// The number of inputs
        inputs: usize,
        /// The number of entries required
        expected: usize,
        /// The number of entries provided
        got: usize,
    },

    /// A table over this many inputs has more rows than can be addressed
    #[error("a table over {inputs} inputs is too large, at most {limit} inputs are supported")]
    TooManyInputs {
        /// The number of inputs requested
        inputs: usize,
        /// The largest supported number of inputs
        limit: usize,
    },

    /// An analysis could not be built
    #[error("analysis failed: {0}")]
    Analysis(String),
}
