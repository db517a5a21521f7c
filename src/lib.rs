//! Rowdeck — Upload a five-column CSV dataset and query it over HTTP.
//!
//! An upload is validated against the fixed `postId, id, name, email, body`
//! header schema, streamed into rows, and swapped in as the current dataset.
//! Queries (substring search and page-windowed reads) always run against a
//! single consistent snapshot of that dataset.
//!
//! ## Layout
//!
//! - **Ingest** (`ingest`, `format`) — extension check, streaming CSV parse,
//!   header normalization, atomic publish into the store.
//! - **Store** (`data`) — `Row`, `Dataset`, and the replace/snapshot slot.
//! - **Queries** (`query`) — search, paginate, and search-then-paginate.
//! - **Transport** (`server`, `config`) — Axum routes mapping errors to HTTP.

pub mod config;
pub mod data;
pub mod format;
pub mod ingest;
pub mod query;
pub mod server;
