//! Matcher expression engine
//!
//! Matchers are small boolean expressions over request and policy
//! attributes, declared under `[matchers]` in the model:
//!
//! ```text
//! m = g(r.sub, p.sub) && keyMatch(r.obj, p.obj) && r.act == p.act
//! ```
//!
//! The expression is parsed once at model load ([`parse`]) and evaluated
//! per policy row at decision time ([`eval_bool`]). Parse failures are
//! configuration errors; evaluation failures are internal faults.

pub mod eval;
pub mod functions;
pub mod parser;

pub use eval::{eval_bool, EvalContext};
pub use functions::{FunctionMap, MatcherFn};
pub use parser::{parse, Expr, ParseError};
