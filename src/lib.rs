//! Purpose: Library crate behind the `rowset` CLI: buffered query results as typed records.
//! Exports: `core` (cursor, decoding, column metadata, errors) and `api` (public surface, backends).
//! Role: Shared by the binary and integration tests; `api` is the supported entry point.
//! Invariants: A result set owns its row source and releases it exactly once, on drop.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
