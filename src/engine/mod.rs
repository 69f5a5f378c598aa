// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod adapter;
pub mod chain;
pub mod context;
pub mod convert;
pub mod dispatch;
pub mod ids;
pub mod node;
pub mod runtime;
pub mod value;

pub use adapter::{DataHandler, DynamicFn, ErrorHandler, Handler, Shape};
pub use chain::{delift, lift};
pub use context::{Carrier, Ctx};
pub use dispatch::TaskGroup;
pub use ids::{SequentialGenerator, UuidGenerator};
pub use node::{DispatchMode, Node, NthFinder, Subscriber};
pub use runtime::{Runtime, RuntimeBuilder};
pub use value::{Data, NodeError, Value, ValueClass};
