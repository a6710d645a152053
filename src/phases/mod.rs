//! Scripted battle phases
//!
//! A phase pairs a trigger expression with a result script:
//!
//! ```text
//! trigger = clause ("|" clause)*
//! clause  = term ("&" term)*
//! term    = "start" | "T" n | "T+" n | "e" idx op value STAT
//! script  = directive ("&" directive)*
//! ```

pub mod ast;
pub mod engine;
pub mod parser;
pub mod script;

pub use ast::{Clause, Comparison, Term, Trigger};
pub use engine::{CompiledPhase, ConditionEngine};
pub use parser::{parse_directive, parse_script, parse_term, parse_trigger};
pub use script::Directive;
