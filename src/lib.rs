//! cardpeek reads the character cards that tavern-style chat front-ends embed in
//! PNG images.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`character`] checks the PNG signature, walks text chunks, decodes their
//!   payloads, and falls back to a brute-force scan of the raw bytes.
//! - [`render`] turns an extracted card into a Markdown or JSON document and a
//!   safe file name.
//! - [`core::config`] loads the optional TOML configuration.
//! - [`logging`] installs the `tracing` subscriber used by the binary.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod character;
pub mod cli;
pub mod core;
pub mod logging;
pub mod render;
