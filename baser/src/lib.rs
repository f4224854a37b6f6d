//! Baser: a 10GBASE-R line code model, XGMII lanes to 64b/66b blocks and back.
//!
//! The transmit path queues Ethernet frames in an [`XgmiiSource`](encoder::framer::XgmiiSource),
//! encodes each lane vector into a block, scrambles it and serializes it onto a SERDES
//! interface word. The receive path reverses each step and reassembles frames from START to
//! TERM. [`SerdesSource`] and [`SerdesSink`] compose the two paths.

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::private_doc_tests)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::invalid_rust_codeblocks)]
#![deny(rustdoc::bare_urls)]
//
#![allow(clippy::needless_lifetimes)]
#![allow(elided_lifetimes_in_paths)]

pub mod block_type;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fcs;
pub mod fsm;
pub mod gearbox;
pub mod scrambler;
pub mod serdes;
pub mod types;
pub mod utils;

pub use config::{CodecConfig, LineInterface};
pub use decoder::block_lock::BlockLockConfig;
pub use decoder::DecoderStats;
pub use encoder::EncoderStats;
pub use error::{ConfigError, DecodeError, SendError};
pub use fsm::Fsm;
pub use gearbox::GearboxConfig;
pub use scrambler::ScramblerConfig;
pub use serdes::{SerdesSink, SerdesSource};
pub use types::*;
