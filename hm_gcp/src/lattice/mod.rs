//! Value lattice for global constant propagation.
//!
//! - `value`: lattice elements (`Value` and its numeric/string sub-lattices)
//! - `ops`: meet, join, dual and the predicates the transfer functions use
//! - `widening`: approximation limits

pub mod ops;
pub mod value;
pub mod widening;

pub use ops::StructLattice;
pub use value::{Alias, Aliases, Fidx, Fidxs, FltValue, FunValue, IntValue, StrValue, StructId, Value};
