//! Approximation limits for the analysis.
//!
//! These constants bound how deep recursive data and closures may nest
//! before the struct arena folds them, and how long the worklist may run.

/// Default struct nesting depth per allocation site before folding.
pub const DEFAULT_CUTOFF: usize = 1;

/// Default nesting depth of function return values mentioning the same
/// function before the inner value is widened to `scalar`.
pub const DEFAULT_FUN_CUTOFF: usize = 2;

/// Maximum worklist pops before the analysis gives up.
pub const MAX_WORKLIST_ITERATIONS: usize = 100_000;

/// Fold rounds tried before chopping the struct at the cutoff.
pub const MAX_FOLD_ROUNDS: usize = 8;
