// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! signalflow: an in-process reactive dispatch graph.
//!
//! Nodes receive a value or an error through `read`, run a handler against it
//! and forward results to their subscribers with `write`. Small transforms
//! compose into pipelines with [`lift`] without any central scheduler.

pub mod config;         // file + env configuration
pub mod engine;         // nodes, adapter, dispatch
pub mod errors;         // error handling
pub mod observability;
pub mod traits;         // seams: callables, sinks, id generators

pub use engine::{
    delift, lift, Carrier, Ctx, Data, DispatchMode, Node, NodeError, Runtime, Shape, Value,
    ValueClass,
};
