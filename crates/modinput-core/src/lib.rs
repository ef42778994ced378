// SPDX-License-Identifier: MIT OR Apache-2.0
//! modinput-core
//!
//! Data model for modular inputs: the scheme a script reports, the
//! documents the host feeds on stdin, and the events written back.
//!
//! Wire encoding lives in `modinput-protocol`; this crate only holds values
//! and the invariants they must satisfy.
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod event;
pub mod scheme;

pub use config::{
    InputConfiguration, Parameter, ServerContext, Stanza, ValidationItems, parse_bool,
};
pub use error::ContractViolation;
pub use event::Event;
pub use scheme::{Argument, DataType, Scheme, StreamingMode};
