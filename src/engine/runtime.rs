// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Node factory and owner of the shared task group.
//!
//! A [`Runtime`] carries the two things every node needs but should not pick
//! for itself: where its id comes from and where its asynchronous reads run.
//! Nodes created through `signal*` inherit the runtime of the node they are
//! registered on.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::config::consts::{default_max_concurrency, DEFAULT_SHUTDOWN_GRACE_MS};
use crate::config::{Config, IdStrategy};
use crate::engine::adapter::{resolve, wrap_data, wrap_error, wrap_typed, Shape};
use crate::engine::context::Ctx;
use crate::engine::dispatch::TaskGroup;
use crate::engine::ids::{SequentialGenerator, UuidGenerator};
use crate::engine::node::{DispatchMode, Node};
use crate::engine::value::{Data, NodeError, Value};
use crate::errors::DispatchError;
use crate::traits::{IdGenerator, Sink};

#[derive(Clone)]
pub struct Runtime {
    ids: Arc<dyn IdGenerator>,
    tasks: Arc<TaskGroup>,
}

impl Runtime {
    /// Random ids, default concurrency and grace, current tokio runtime.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    pub fn from_config(config: &Config) -> Self {
        let builder = Self::builder()
            .max_concurrency(config.dispatch.max_concurrency)
            .shutdown_grace(config.dispatch.shutdown_grace());
        match config.ids.generator {
            IdStrategy::Uuid => builder.id_generator(UuidGenerator),
            IdStrategy::Sequential => {
                builder.id_generator(SequentialGenerator::new(config.ids.prefix.clone()))
            }
        }
        .build()
    }

    pub fn next_id(&self) -> String {
        self.ids.next_id()
    }

    pub fn id_generator(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    pub fn task_group(&self) -> &TaskGroup {
        &self.tasks
    }

    /// Build a node from any shape. `None` when a dynamic shape is rejected.
    pub fn node(&self, shape: Shape, mode: DispatchMode) -> Option<Node> {
        let handler = resolve(shape)?;
        Some(Node::build(self, handler, mode, None, None))
    }

    pub fn sync_node<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&NodeError>, Option<&Data>) + Send + Sync + 'static,
    {
        Node::build(self, Arc::new(f), DispatchMode::Sync, None, None)
    }

    pub fn async_node<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&NodeError>, Option<&Data>) + Send + Sync + 'static,
    {
        Node::build(self, Arc::new(f), DispatchMode::Async, None, None)
    }

    pub fn data_sync<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&Data>) + Send + Sync + 'static,
    {
        Node::build(self, wrap_data(Arc::new(f)), DispatchMode::Sync, None, None)
    }

    pub fn data_async<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&Data>) + Send + Sync + 'static,
    {
        Node::build(self, wrap_data(Arc::new(f)), DispatchMode::Async, None, None)
    }

    pub fn error_sync<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&NodeError>) + Send + Sync + 'static,
    {
        Node::build(self, wrap_error(Arc::new(f)), DispatchMode::Sync, None, None)
    }

    pub fn error_async<F>(&self, f: F) -> Node
    where
        F: Fn(&Ctx, Option<&NodeError>) + Send + Sync + 'static,
    {
        Node::build(self, wrap_error(Arc::new(f)), DispatchMode::Async, None, None)
    }

    pub fn typed_sync<T, F>(&self, f: F) -> Node
    where
        T: Any + Send + Sync,
        F: Fn(&Ctx, Option<&NodeError>, Option<&T>) + Send + Sync + 'static,
    {
        Node::build(self, wrap_typed(f), DispatchMode::Sync, None, None)
    }

    pub fn typed_async<T, F>(&self, f: F) -> Node
    where
        T: Any + Send + Sync,
        F: Fn(&Ctx, Option<&NodeError>, Option<&T>) + Send + Sync + 'static,
    {
        Node::build(self, wrap_typed(f), DispatchMode::Async, None, None)
    }

    /// A synchronous node that hands every value it reads or writes to `sink`
    /// before fanning writes out to its subscribers.
    pub fn sink(&self, sink: impl Sink) -> Node {
        let sink: Arc<dyn Sink> = Arc::new(sink);
        let observer = Arc::clone(&sink);
        let handler = Arc::new(
            move |ctx: &Ctx, err: Option<&NodeError>, data: Option<&Data>| {
                let value = match (err, data) {
                    (Some(err), _) => Value::Error(Arc::clone(err)),
                    (None, data) => Value::from(data.cloned()),
                };
                observer.write(ctx, &value);
            },
        );
        Node::build(self, handler, DispatchMode::Sync, None, Some(sink))
    }

    /// A sink node that reads every value written to it into `target`,
    /// keeping the writer's carrier.
    ///
    /// `write` only reaches subscribers' write entry points; a relay is how a
    /// written value gets to a downstream handler.
    pub fn relay(&self, target: &Node) -> Node {
        let target = target.clone();
        self.sink(move |ctx: &Ctx, value: &Value| {
            target.read(value.clone(), Some(ctx.carrier().clone()));
        })
    }

    /// Wait for every asynchronous read submitted so far.
    pub async fn drain(&self) {
        self.tasks.drain().await
    }

    /// Stop pending asynchronous reads and wait for running ones within the
    /// configured grace.
    pub async fn shutdown(&self) -> Result<(), DispatchError> {
        self.tasks.shutdown().await
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("id_generator", &self.ids.name())
            .field("tasks", &self.tasks)
            .finish()
    }
}

pub struct RuntimeBuilder {
    ids: Option<Arc<dyn IdGenerator>>,
    max_concurrency: usize,
    shutdown_grace: Duration,
    handle: Option<Handle>,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self {
            ids: None,
            max_concurrency: default_max_concurrency(),
            shutdown_grace: Duration::from_millis(DEFAULT_SHUTDOWN_GRACE_MS),
            handle: None,
        }
    }
}

impl RuntimeBuilder {
    pub fn id_generator(mut self, ids: impl IdGenerator) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    /// Cap on concurrently running asynchronous handlers; `0` removes the cap.
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Run asynchronous reads on this runtime rather than the caller's.
    pub fn handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn build(self) -> Runtime {
        let mut tasks = TaskGroup::new(self.max_concurrency, self.shutdown_grace);
        if let Some(handle) = self.handle {
            tasks = tasks.with_handle(handle);
        }
        Runtime {
            ids: self.ids.unwrap_or_else(|| Arc::new(UuidGenerator)),
            tasks: Arc::new(tasks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DispatchOptions, IdOptions};

    #[test]
    fn default_runtime_uses_uuid_ids() {
        let rt = Runtime::new();
        assert_eq!(rt.id_generator().name(), "uuid");
        let a = rt.sync_node(|_, _, _| {});
        let b = rt.sync_node(|_, _, _| {});
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().len(), 36);
    }

    #[test]
    fn from_config_applies_every_option() {
        let config = Config {
            dispatch: DispatchOptions {
                max_concurrency: 3,
                shutdown_grace_ms: 250,
            },
            ids: IdOptions {
                generator: IdStrategy::Sequential,
                prefix: "stage".to_string(),
            },
        };
        let rt = Runtime::from_config(&config);

        assert_eq!(rt.task_group().max_concurrency(), 3);
        assert_eq!(rt.task_group().grace(), Duration::from_millis(250));
        assert_eq!(rt.sync_node(|_, _, _| {}).id(), "stage-1");
    }

    #[test]
    fn node_factory_sets_mode() {
        let rt = Runtime::builder()
            .id_generator(SequentialGenerator::new("m"))
            .build();

        assert!(!rt.sync_node(|_, _, _| {}).is_async());
        assert!(rt.async_node(|_, _, _| {}).is_async());
        assert!(!rt.data_sync(|_, _| {}).is_async());
        assert!(rt.data_async(|_, _| {}).is_async());
        assert!(!rt.error_sync(|_, _| {}).is_async());
        assert!(rt.error_async(|_, _| {}).is_async());
        assert!(rt
            .node(Shape::handler(|_, _, _| {}), DispatchMode::Async)
            .is_some_and(|n| n.is_async()));
    }

    #[test]
    fn sink_node_observes_reads() {
        let rt = Runtime::builder()
            .id_generator(SequentialGenerator::new("s"))
            .build();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let tap = Arc::clone(&seen);
        let node = rt.sink(move |_ctx: &Ctx, value: &Value| tap.lock().push(value.class()));

        node.read(1u8, None);
        node.read((), None);

        use crate::engine::ValueClass;
        assert_eq!(*seen.lock(), vec![ValueClass::Data, ValueClass::Empty]);
    }

    #[test]
    fn relay_runs_the_target_handler() {
        let rt = Runtime::builder()
            .id_generator(SequentialGenerator::new("r"))
            .build();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let tap = Arc::clone(&seen);
        let target = rt.data_sync(move |_ctx, data| {
            tap.lock().push(*data.and_then(|d| d.downcast_ref::<u16>()).unwrap());
        });
        let source = rt.data_sync(|ctx, data| {
            let n = data.and_then(|d| d.downcast_ref::<u16>()).copied().unwrap_or_default();
            ctx.rw().write(ctx, n + 1);
        });
        source.signal_node(&rt.relay(&target));

        source.read(1u16, None);
        source.read(10u16, None);

        assert_eq!(*seen.lock(), vec![2, 11]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_with_no_work_is_clean() {
        let rt = Runtime::builder().shutdown_grace(Duration::from_millis(20)).build();
        rt.drain().await;
        assert!(rt.shutdown().await.is_ok());
        assert!(rt.task_group().is_cancelled());
    }
}
