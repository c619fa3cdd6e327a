// Library code reports through `log` and `Diagnostics`; only the CLI prints.
#![deny(clippy::print_stderr)]

//! hm_gcp
//!
//! Type inference for a small functional language by two cooperating
//! analyses run to a joint fixed point:
//!
//! - Hindley-Milner unification over a union-find arena of type variables,
//!   with let-polymorphism, structural records, nilable types and type
//!   errors that accumulate instead of aborting.
//! - Global constant propagation over a value lattice with cyclic,
//!   hash-consed struct values.
//!
//! Constant facts prune dead `if` branches before they are unified, and
//! unification facts sharpen the values returned by parametric calls.
//!
//! # Example
//!
//! ```
//! use hm_gcp::{analyze, AnalysisConfig};
//!
//! let result = analyze("id = {x -> x}; (pair (id 1) (id \"s\"))", &AnalysisConfig::default()).unwrap();
//! assert_eq!(result.program_type, "( int64, *str )");
//! ```

// Core modules
pub mod lattice;
pub mod structs;
pub mod syntax;
pub mod tvar;
pub mod worklist;

// Driver
pub mod analysis;
pub mod config;
pub mod diagnostics;
pub mod error;

pub use analysis::{analyze, Analysis, AnalysisResult, EscapedSignature, Iterations, NodeReport};
pub use config::AnalysisConfig;
pub use diagnostics::{Diagnostic, DiagnosticReason, Diagnostics};
pub use error::AnalysisError;
pub use lattice::Value;
