//! Collar library - testable modules for the GNSS activity collar.
//!
//! This library contains the core logic that can be tested on the host machine.
//! The binary (`main.rs`) uses this library and adds the embedded-specific code
//! (UART receiver, SPI LED output, flash persistence).
//!
//! # Data Flow
//!
//! ```text
//! UART bytes -> gnss::LineAssembler -> gnss::parse_rmc -> Fix
//!                                                        |
//!                 metrics::MetricsAggregator <-----------+----> render::RenderEngine
//!                          |                                          |
//!                  storage::KeyValueStore                     apa102::encode_chain
//!                          |                                          |
//!                 summary::SummaryPayload                         SPI DMA
//! ```
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test --lib --target x86_64-unknown-linux-gnu
//! ```
//!
//! The optional serde derives are covered by the same suite with the feature on:
//! ```bash
//! cargo test --lib --features serde --target x86_64-unknown-linux-gnu
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), allowing use of the standard
//! test framework while the actual firmware runs as `no_std`.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

// === Pure logic modules (testable on host, no ARM dependencies) ===

// Configuration and persistence
pub mod config;
pub mod storage;

// Position input and daily activity
pub mod gnss;
pub mod metrics;
pub mod summary;

// LED output
pub mod apa102;
pub mod connectivity;
pub mod render;
