#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, unreachable_pub)]
/*!

`signal-net`

A push-based logic simulation kernel. [Gate](gate::Gate)s own directed
[Pin](pin::Pin)s; setting a pin to a new state synchronously notifies its
listeners, so a change on any input ripples through every gate downstream
before the call returns. A [Circuit](circuit::Circuit) owns a set of gates and
the connections between them, and keeps the wiring free of multiple drivers
and combinational loops.

Gates are generic over an [Instantiable](instance::Instantiable) primitive.
[Logic](logic::Logic) provides the standard boolean kinds and lookup tables.

*/
#![doc = "## Simple Example\n```"]
#![doc = include_str!("../demos/simple.rs")]
#![doc = "\n```"]

pub mod circuit;
pub mod error;
pub mod gate;
pub mod graph;
pub mod instance;
pub mod logic;
pub mod pin;
pub mod propagation;
pub mod snapshot;
pub mod truth_table;
pub mod util;
