#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! Regular-expression worksheet functions.
//!
//! The crate registers `REGEXMATCH`, `REGEXREPLACE`, `REGEXESCAPE`, `ISREGEXMATCH`,
//! `REGEXVERSIONNUMBER` and three capture-group listings (`REGEXMATCHGROUPS`, `REGEXMATCHES`,
//! `REGEXGROUPMATCHES`) with an `inventory`-backed registry. Hosts evaluate them through
//! [`call_function`] with worksheet [`Value`]s, or call the typed entry points in [`functions`]
//! directly.
//!
//! ## Group order
//!
//! Capture groups are reported in *layout order*: the unnamed groups in declaration order, then
//! the named groups in declaration order, regardless of where they appear in the pattern. See
//! [`engine`] for details.
//!
//! ## Laziness
//!
//! Matches are produced on demand and the aggregators stop pulling as soon as a `MaxMatches`
//! ceiling is reached, so a small ceiling on a large input only scans as far as needed.

pub mod aggregate;
pub mod coercion;
pub mod engine;
pub mod error;
pub mod functions;
pub mod value;

pub use engine::{EngineConfig, RegexEngine, RegexOptions};
pub use error::{EngineError, FunctionError, FunctionResult};
pub use functions::{
    call_function, iter_function_specs, lookup_function, FunctionContext, FunctionSpec, Session,
};
pub use value::{ErrorKind, Value};
