#![allow(dead_code)]

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, Once},
};

use dioxus_backend_hooks::{
    aggregate::{Aggregate, AggregateData, AggregateSpec},
    backend::{Backend, SnapshotMetadata},
    children::{ChildEvent, ChildEventKind},
    errors::{BackendError, BackendResult},
    policy::{ListenOptions, ListenSource, Source},
    reference::Path,
    subscription::{Listener, Unsubscribe},
};
use futures::{FutureExt, future::BoxFuture};
use serde_json::Value;

pub fn block_on_test(fut: impl Future<Output = ()>) {
    init_logging();
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
        .block_on(fut);
}

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn path(raw: &str) -> Path {
    Path::parse(raw).expect("valid path")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Doc {
    pub path: Path,
    pub data: Option<Value>,
    pub from_cache: bool,
}

impl SnapshotMetadata for Doc {
    fn from_cache(&self) -> bool {
        self.from_cache
    }
}

struct Registration {
    id: u64,
    path: Path,
    options: ListenOptions,
    listener: Listener<Doc>,
}

struct ChildRegistration {
    id: u64,
    path: Path,
    kind: ChildEventKind,
    listener: Listener<ChildEvent<Doc>>,
}

#[derive(Default)]
struct Inner {
    cache: HashMap<Path, Value>,
    server: HashMap<Path, Value>,
    offline: bool,
    emit_on_subscribe: bool,
    registrations: Vec<Registration>,
    child_registrations: Vec<ChildRegistration>,
    keep_after_unsubscribe: bool,
    next_id: u64,
    reads: Vec<(Path, Source)>,
    opened: Vec<(Path, ListenOptions)>,
}

/// In-memory document store with a cache and a server side
///
/// Listeners are always called without the store's lock held. Clones share
/// the same store.
#[derive(Default, Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn put_server(&self, raw: &str, value: Value) {
        self.inner().server.insert(path(raw), value);
    }

    pub fn put_cache(&self, raw: &str, value: Value) {
        self.inner().cache.insert(path(raw), value);
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner().offline = offline;
    }

    /// Deliver the current data synchronously from inside `subscribe`
    pub fn set_emit_on_subscribe(&self, emit: bool) {
        self.inner().emit_on_subscribe = emit;
    }

    /// Keep delivering to listeners after their handle was released, like a
    /// channel whose teardown races with in-flight events
    pub fn set_keep_after_unsubscribe(&self, keep: bool) {
        self.inner().keep_after_unsubscribe = keep;
    }

    pub fn reads(&self) -> Vec<(Path, Source)> {
        self.inner().reads.clone()
    }

    pub fn opened(&self) -> Vec<(Path, ListenOptions)> {
        self.inner().opened.clone()
    }

    pub fn active_listeners(&self) -> usize {
        self.inner().registrations.len()
    }

    /// Push a snapshot to every listener on `raw`
    pub fn emit(&self, raw: &str, data: Option<Value>, from_cache: bool) {
        let target = path(raw);
        let listeners: Vec<_> = self
            .inner()
            .registrations
            .iter()
            .filter(|registration| registration.path == target)
            .map(|registration| registration.listener.clone())
            .collect();
        for listener in listeners {
            listener.next(Doc {
                path: target.clone(),
                data: data.clone(),
                from_cache,
            });
        }
    }

    pub fn active_child_listeners(&self) -> Vec<(Path, ChildEventKind)> {
        self.inner()
            .child_registrations
            .iter()
            .map(|registration| (registration.path.clone(), registration.kind))
            .collect()
    }

    /// Report a `kind` event for child `key` of `parent`
    pub fn emit_child(&self, parent: &str, kind: ChildEventKind, key: &str, data: Option<Value>, previous: Option<&str>) {
        let parent = path(parent);
        let target = parent.child(key).expect("valid child key");
        let listeners: Vec<_> = self
            .inner()
            .child_registrations
            .iter()
            .filter(|registration| registration.path == parent && registration.kind == kind)
            .map(|registration| registration.listener.clone())
            .collect();
        for listener in listeners {
            listener.next(ChildEvent {
                kind,
                snapshot: Doc {
                    path: target.clone(),
                    data: data.clone(),
                    from_cache: false,
                },
                previous_child: previous.map(str::to_string),
            });
        }
    }

    pub fn fail_children(&self, parent: &str, error: BackendError) {
        let parent = path(parent);
        let listeners: Vec<_> = self
            .inner()
            .child_registrations
            .iter()
            .filter(|registration| registration.path == parent)
            .map(|registration| registration.listener.clone())
            .collect();
        for listener in listeners {
            listener.error(error.clone());
        }
    }

    pub fn fail(&self, raw: &str, error: BackendError) {
        let target = path(raw);
        let listeners: Vec<_> = self
            .inner()
            .registrations
            .iter()
            .filter(|registration| registration.path == target)
            .map(|registration| registration.listener.clone())
            .collect();
        for listener in listeners {
            listener.error(error.clone());
        }
    }

    fn current(&self, target: &Path, options: ListenOptions) -> Option<Doc> {
        let inner = self.inner();
        let use_server = !inner.offline && options.source == ListenSource::Default;
        if use_server {
            Some(Doc {
                path: target.clone(),
                data: inner.server.get(target).cloned(),
                from_cache: false,
            })
        } else {
            inner.cache.get(target).map(|value| Doc {
                path: target.clone(),
                data: Some(value.clone()),
                from_cache: true,
            })
        }
    }
}

impl Backend for MemoryBackend {
    type Reference = Path;
    type Snapshot = Doc;

    fn read_once(&self, reference: &Path, source: Source) -> BoxFuture<'static, BackendResult<Doc>> {
        let outcome = {
            let mut inner = self.inner();
            inner.reads.push((reference.clone(), source));
            let use_server = match source {
                Source::Server => true,
                Source::Cache => false,
                Source::Default => !inner.offline,
            };
            if !use_server {
                inner
                    .cache
                    .get(reference)
                    .map(|value| Doc {
                        path: reference.clone(),
                        data: Some(value.clone()),
                        from_cache: true,
                    })
                    .ok_or_else(|| BackendError::unavailable(Source::Cache, "not in cache"))
            } else if inner.offline {
                Err(BackendError::unavailable(Source::Server, "offline"))
            } else {
                let data = inner.server.get(reference).cloned();
                if let Some(value) = &data {
                    inner.cache.insert(reference.clone(), value.clone());
                }
                Ok(Doc {
                    path: reference.clone(),
                    data,
                    from_cache: false,
                })
            }
        };
        async move { outcome }.boxed()
    }

    fn subscribe(&self, reference: &Path, options: ListenOptions, listener: Listener<Doc>) -> Unsubscribe {
        let (id, emit_now) = {
            let mut inner = self.inner();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.opened.push((reference.clone(), options));
            inner.registrations.push(Registration {
                id,
                path: reference.clone(),
                options,
                listener: listener.clone(),
            });
            (id, inner.emit_on_subscribe)
        };
        if emit_now {
            if let Some(doc) = self.current(reference, options) {
                listener.next(doc);
            }
        }

        let inner = self.inner.clone();
        Unsubscribe::new(move || {
            let mut inner = inner.lock().unwrap();
            if !inner.keep_after_unsubscribe {
                inner.registrations.retain(|registration| registration.id != id);
            }
        })
    }

    fn aggregate(&self, reference: &Path, spec: &AggregateSpec) -> BoxFuture<'static, BackendResult<AggregateData>> {
        let outcome = {
            let mut inner = self.inner();
            inner.reads.push((reference.clone(), Source::Server));
            if inner.offline {
                Err(BackendError::unavailable(Source::Server, "offline"))
            } else {
                let entries: Vec<&Value> = inner
                    .server
                    .iter()
                    .filter(|(path, _)| path.parent().as_ref() == Some(reference))
                    .map(|(_, value)| value)
                    .collect();
                let field_sum = |field: &str| -> f64 {
                    entries
                        .iter()
                        .filter_map(|value| value.get(field).and_then(Value::as_f64))
                        .sum()
                };
                let mut data = AggregateData::new();
                for (alias, aggregate) in spec.iter() {
                    let value = match aggregate {
                        Aggregate::Count => Some(entries.len() as f64),
                        Aggregate::Sum(field) => Some(field_sum(field)),
                        Aggregate::Average(_) if entries.is_empty() => None,
                        Aggregate::Average(field) => Some(field_sum(field) / entries.len() as f64),
                    };
                    data = data.with(alias, value);
                }
                Ok(data)
            }
        };
        async move { outcome }.boxed()
    }

    fn on_child_event(
        &self,
        reference: &Path,
        kind: ChildEventKind,
        listener: Listener<ChildEvent<Doc>>,
    ) -> Unsubscribe {
        let id = {
            let mut inner = self.inner();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.child_registrations.push(ChildRegistration {
                id,
                path: reference.clone(),
                kind,
                listener,
            });
            id
        };
        let inner = self.inner.clone();
        Unsubscribe::new(move || {
            let mut inner = inner.lock().unwrap();
            if !inner.keep_after_unsubscribe {
                inner.child_registrations.retain(|registration| registration.id != id);
            }
        })
    }

    fn snapshots_equal(&self, a: &Doc, b: &Doc) -> bool {
        a == b
    }
}
