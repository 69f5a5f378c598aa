// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph nodes: ingress (`read`), fan-out (`write`, `write_every`) and
//! subscriber registration (`signal*`).
//!
//! A [`Node`] is a cheap, cloneable handle. Its id, handler and dispatch mode
//! are fixed at construction; only the subscriber list changes, and only by
//! appending.
//!
//! ```
//! use signalflow::{Ctx, Data, Runtime};
//!
//! let rt = Runtime::new();
//! let double = rt.data_sync(|ctx: &Ctx, data: Option<&Data>| {
//!     if let Some(n) = data.and_then(|d| d.downcast_ref::<i64>()) {
//!         ctx.rw().write(ctx, n * 2);
//!     }
//! });
//! let print = double.signal_d(|_ctx: &Ctx, data: Option<&Data>| {
//!     println!("{:?}", data.and_then(|d| d.downcast_ref::<i64>()));
//! });
//!
//! double.read(21i64, None);
//! assert_eq!(double.subscriber_count(), 1);
//! assert_eq!(print.root().map(|r| r.id().to_string()), Some(double.id().to_string()));
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::engine::adapter::{resolve, wrap_data, wrap_error, Handler, Shape};
use crate::engine::context::{Carrier, Ctx};
use crate::engine::runtime::Runtime;
use crate::engine::value::{Data, NodeError, Value};
use crate::observability::messages::node::{FanOut, NodeCreated, SubscriberRegistered};
use crate::observability::messages::StructuredLog;
use crate::traits::Sink;

/// How a node runs its handler on `read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Inline on the caller's thread; `read` returns after the handler.
    Sync,
    /// On the runtime's task group; `read` returns immediately.
    Async,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMode::Sync => "sync",
            DispatchMode::Async => "async",
        }
    }
}

/// Index mapper for [`Node::write_every`]: `(index, subscriber_count) -> target`.
pub type NthFinder = dyn Fn(usize, usize) -> isize + Send + Sync;

/// Anything `signal` can register: an existing node or a handler shape.
pub enum Subscriber {
    Node(Node),
    Shape(Shape),
}

impl From<Node> for Subscriber {
    fn from(node: Node) -> Self {
        Subscriber::Node(node)
    }
}

impl From<&Node> for Subscriber {
    fn from(node: &Node) -> Self {
        Subscriber::Node(node.clone())
    }
}

impl From<Shape> for Subscriber {
    fn from(shape: Shape) -> Self {
        Subscriber::Shape(shape)
    }
}

impl From<Handler> for Subscriber {
    fn from(handler: Handler) -> Self {
        Subscriber::Shape(Shape::Handler(handler))
    }
}

struct NodeInner {
    id: String,
    handler: Handler,
    mode: DispatchMode,
    subscribers: RwLock<Vec<Node>>,
    root: Option<Weak<NodeInner>>,
    sink: Option<Arc<dyn Sink>>,
    runtime: Runtime,
}

#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    pub(crate) fn build(
        runtime: &Runtime,
        handler: Handler,
        mode: DispatchMode,
        root: Option<&Node>,
        sink: Option<Arc<dyn Sink>>,
    ) -> Node {
        let id = runtime.next_id();
        NodeCreated {
            node_id: &id,
            mode: mode.as_str(),
        }
        .log();
        Node {
            inner: Arc::new(NodeInner {
                id,
                handler,
                mode,
                subscribers: RwLock::new(Vec::new()),
                root: root.map(|r| Arc::downgrade(&r.inner)),
                sink,
                runtime: runtime.clone(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn mode(&self) -> DispatchMode {
        self.inner.mode
    }

    pub fn is_async(&self) -> bool {
        self.inner.mode == DispatchMode::Async
    }

    /// The node whose `signal*` call created this one, while it is alive.
    pub fn root(&self) -> Option<Node> {
        self.inner
            .root
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Node { inner })
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read_recursive().len()
    }

    /// Snapshot of the subscriber list in registration order.
    pub fn subscribers(&self) -> Vec<Node> {
        self.inner.subscribers.read_recursive().clone()
    }

    /// Deliver a value to this node's handler.
    ///
    /// Errors go to the error branch, data to the data branch and
    /// [`Value::Empty`] arrives with neither. Without a carrier a default one
    /// is used. Asynchronous nodes hand the call to the runtime's task group
    /// and return at once.
    pub fn read(&self, value: impl Into<Value>, carrier: Option<Carrier>) {
        let ctx = Ctx::new(carrier.unwrap_or_default(), self.clone());
        let value = value.into();

        match self.inner.mode {
            DispatchMode::Sync => invoke(&self.inner.handler, &ctx, &value),
            DispatchMode::Async => {
                let handler = Arc::clone(&self.inner.handler);
                // Fails only if no runtime could be started; the group logs it.
                let _ = self
                    .inner
                    .runtime
                    .task_group()
                    .spawn(&self.inner.id, move || invoke(&handler, &ctx, &value));
            }
        }
    }

    /// Forward a value to every subscriber's `write`.
    ///
    /// Subscriber handlers do not run; a value only reaches a handler through
    /// `read`. Holds the shared subscriber lock for the whole fan-out, so a
    /// subscriber must not `signal` on this node from inside its own write.
    pub fn write(&self, ctx: &Ctx, value: impl Into<Value>) {
        let value = value.into();
        let ctx = Ctx::new(ctx.carrier().clone(), self.clone());

        if let Some(sink) = &self.inner.sink {
            sink.write(&ctx, &value);
        }

        let subscribers = self.inner.subscribers.read_recursive();
        FanOut {
            node_id: &self.inner.id,
            class: value.class().as_str(),
            subscriber_count: subscribers.len(),
        }
        .log();
        for subscriber in subscribers.iter() {
            subscriber.write(&ctx, value.clone());
        }
    }

    /// Forward a value to the subscribers picked by `finder`.
    ///
    /// For each position `i` the finder maps `(i, len)` to a target; the
    /// subscriber at `i` is written when `0 < target < len`. The default
    /// finder is the identity, so position 0 is never written.
    pub fn write_every(&self, ctx: &Ctx, value: impl Into<Value>, finder: Option<&NthFinder>) {
        let value = value.into();
        let ctx = Ctx::new(ctx.carrier().clone(), self.clone());

        if let Some(sink) = &self.inner.sink {
            sink.write(&ctx, &value);
        }

        let subscribers = self.inner.subscribers.read_recursive();
        let len = subscribers.len();
        FanOut {
            node_id: &self.inner.id,
            class: value.class().as_str(),
            subscriber_count: len,
        }
        .log();
        for (index, subscriber) in subscribers.iter().enumerate() {
            let target = finder.map_or(index as isize, |find| find(index, len));
            if target > 0 && (target as usize) < len {
                subscriber.write(&ctx, value.clone());
            }
        }
    }

    /// Register a subscriber. Shapes become new synchronous nodes rooted here.
    ///
    /// Returns `None` only when a dynamic shape is rejected.
    pub fn signal(&self, subscriber: impl Into<Subscriber>) -> Option<Node> {
        self.attach(subscriber.into(), DispatchMode::Sync)
    }

    /// Like [`Node::signal`], but shapes become asynchronous nodes.
    pub fn async_signal(&self, subscriber: impl Into<Subscriber>) -> Option<Node> {
        self.attach(subscriber.into(), DispatchMode::Async)
    }

    /// Register an existing node as is and return it.
    pub fn signal_node(&self, node: &Node) -> Node {
        self.register(node.clone())
    }

    pub fn signal_fn<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&NodeError>, Option<&Data>) + Send + Sync + 'static,
    {
        self.attach_handler(Arc::new(f), DispatchMode::Sync)
    }

    pub fn async_signal_fn<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&NodeError>, Option<&Data>) + Send + Sync + 'static,
    {
        self.attach_handler(Arc::new(f), DispatchMode::Async)
    }

    pub fn signal_d<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&Data>) + Send + Sync + 'static,
    {
        self.attach_handler(wrap_data(Arc::new(f)), DispatchMode::Sync)
    }

    pub fn async_signal_d<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&Data>) + Send + Sync + 'static,
    {
        self.attach_handler(wrap_data(Arc::new(f)), DispatchMode::Async)
    }

    pub fn signal_e<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&NodeError>) + Send + Sync + 'static,
    {
        self.attach_handler(wrap_error(Arc::new(f)), DispatchMode::Sync)
    }

    pub fn async_signal_e<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&NodeError>) + Send + Sync + 'static,
    {
        self.attach_handler(wrap_error(Arc::new(f)), DispatchMode::Async)
    }

    fn attach(&self, subscriber: Subscriber, mode: DispatchMode) -> Option<Node> {
        match subscriber {
            Subscriber::Node(node) => Some(self.register(node)),
            Subscriber::Shape(shape) => {
                let handler = resolve(shape)?;
                Some(self.attach_handler(handler, mode))
            }
        }
    }

    fn attach_handler(&self, handler: Handler, mode: DispatchMode) -> Node {
        let node = Node::build(&self.inner.runtime, handler, mode, Some(self), None);
        self.register(node)
    }

    fn register(&self, node: Node) -> Node {
        let mut subscribers = self.inner.subscribers.write();
        subscribers.push(node.clone());
        SubscriberRegistered {
            node_id: &self.inner.id,
            subscriber_id: node.id(),
            subscriber_count: subscribers.len(),
        }
        .log();
        node
    }
}

fn invoke(handler: &Handler, ctx: &Ctx, value: &Value) {
    match value {
        Value::Error(err) => handler(ctx, Some(err), None),
        Value::Data(data) => handler(ctx, None, Some(data)),
        Value::Empty => handler(ctx, None, None),
    }
}

/// Handle identity: two handles are equal when they point at the same node.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.inner.id)
            .field("mode", &self.inner.mode)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
