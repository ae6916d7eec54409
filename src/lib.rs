//! An interactive shell whose pipes can fan out.
//!
//! A line is split into clauses on `,` (run without any shared channel) and
//! runs of `|`: a single `|` is an ordinary pipe, `||` and `|||` broadcast the
//! producer's complete output to the next two or three clauses. Each clause
//! may carry `<`, `>` and `>>` redirections.

pub mod alias;
pub mod builtin;
pub mod channel;
pub mod config;
pub mod error;
pub mod eval;
pub mod global;
pub mod history;
pub mod input;
pub mod interrupt;
pub mod job;
pub mod parser;
pub mod plan;
pub mod relay;
pub mod repl;
pub mod split;
pub mod types;
