//! Integration tests - builder, grammar and connection working together
//!
//! Every test runs against a `RecordingConnection`, so the compiled Cypher and
//! the bindings that would reach a server can be asserted on directly.

mod config_tests;
mod mutation_tests;
mod select_tests;
mod support;
