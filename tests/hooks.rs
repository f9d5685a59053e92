mod common;

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use common::{Doc, MemoryBackend, block_on_test, path};
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_backend_hooks::prelude::{
    AsyncResult, AuthClient, BackendError, Callable, ChildEvent, ChildEventKind, ChildHandlers,
    FetchPolicy, Listener, Path, Phase, Unsubscribe, try_use_backend, use_auth_state, use_backend,
    use_backend_provider, use_callable, use_child_events, use_count, use_fetch,
};
use futures::{FutureExt, future::BoxFuture};
use serde_json::json;
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::yield_now,
};

type Recorder = Rc<RefCell<Vec<AsyncResult<Doc, BackendError>>>>;

/// Instructions the test sends into a mounted [`Document`]
enum Command {
    Point(Option<Path>),
    Retry,
    SwapBackend(Arc<MemoryBackend>),
}

type Commands = Rc<RefCell<Option<UnboundedReceiver<Command>>>>;

#[derive(Props, Clone)]
struct DocumentProps {
    backend: Arc<MemoryBackend>,
    reference: Option<Path>,
    policy: FetchPolicy,
    recorder: Recorder,
    commands: Commands,
}

impl PartialEq for DocumentProps {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
            && self.reference == other.reference
            && self.policy == other.policy
            && Rc::ptr_eq(&self.recorder, &other.recorder)
            && Rc::ptr_eq(&self.commands, &other.commands)
    }
}

#[allow(non_snake_case)]
fn Document(props: DocumentProps) -> Element {
    let mut backend = use_signal(|| props.backend.clone());
    let mut reference = use_signal(|| props.reference.clone());
    let fetch = use_fetch(backend.read().clone(), reference.read().clone(), props.policy);

    let commands = props.commands.clone();
    let driver = fetch.clone();
    use_hook(move || {
        if let Some(mut receiver) = commands.borrow_mut().take() {
            spawn(async move {
                while let Some(command) = receiver.recv().await {
                    match command {
                        Command::Point(next) => reference.set(next),
                        Command::Retry => driver.retry(),
                        Command::SwapBackend(next) => backend.set(next),
                    }
                }
            });
        }
    });

    let state = fetch.state();
    let record = props.recorder.clone();
    use_effect(move || {
        record.borrow_mut().push(state.read().clone());
    });
    rsx! {}
}

struct Mounted {
    vdom: VirtualDom,
    recorder: Recorder,
    commands: UnboundedSender<Command>,
}

impl Mounted {
    fn new(backend: &Arc<MemoryBackend>, reference: Option<Path>, policy: FetchPolicy) -> Self {
        let recorder: Recorder = Rc::new(RefCell::new(Vec::new()));
        let (commands, receiver) = unbounded_channel();
        let mut vdom = VirtualDom::new_with_props(
            Document,
            DocumentProps {
                backend: backend.clone(),
                reference,
                policy,
                recorder: recorder.clone(),
                commands: Rc::new(RefCell::new(Some(receiver))),
            },
        );
        vdom.rebuild_in_place();
        Self {
            vdom,
            recorder,
            commands,
        }
    }

    async fn send(&mut self, command: Command) {
        assert!(self.commands.send(command).is_ok(), "document is mounted");
        pump(&mut self.vdom).await;
    }

    fn last(&self) -> Option<AsyncResult<Doc, BackendError>> {
        self.recorder.borrow().last().cloned()
    }

    fn last_data(&self) -> Option<serde_json::Value> {
        self.last()
            .and_then(|state| state.value.as_ref().and_then(|doc| doc.data.clone()))
    }
}

async fn pump(vdom: &mut VirtualDom) {
    let mut mutations = NoOpMutations;
    for _ in 0..5 {
        while vdom.wait_for_work().now_or_never().is_some() {
            vdom.render_immediate(&mut mutations);
        }
        yield_now().await;
    }
}

#[test]
fn use_fetch_reads_once_and_renders_result() {
    block_on_test(async {
        let backend = MemoryBackend::new();
        backend.put_server("todos/1", json!("one"));

        let mut mounted = Mounted::new(&backend, Some(path("todos/1")), FetchPolicy::OneShotServerOnly);
        pump(&mut mounted.vdom).await;

        assert_eq!(mounted.last_data(), Some(json!("one")));
        assert!(mounted.last().is_some_and(|state| !state.is_loading));
        assert_eq!(backend.reads().len(), 1);
    });
}

#[test]
fn use_fetch_follows_live_updates_and_releases_on_unmount() {
    block_on_test(async {
        let backend = MemoryBackend::new();

        let mut mounted = Mounted::new(&backend, Some(path("rooms/a")), FetchPolicy::LiveDefault);
        pump(&mut mounted.vdom).await;
        assert_eq!(backend.active_listeners(), 1);

        backend.emit("rooms/a", Some(json!(1)), false);
        pump(&mut mounted.vdom).await;
        assert_eq!(mounted.last_data(), Some(json!(1)));

        backend.emit("rooms/a", Some(json!(2)), false);
        pump(&mut mounted.vdom).await;
        assert_eq!(mounted.last_data(), Some(json!(2)));
        assert_eq!(backend.opened().len(), 1, "re-renders must not resubscribe");

        drop(mounted);
        assert_eq!(backend.active_listeners(), 0);
    });
}

#[test]
fn use_fetch_without_reference_stays_idle() {
    block_on_test(async {
        let backend = MemoryBackend::new();

        let mut mounted = Mounted::new(&backend, None, FetchPolicy::LiveDefault);
        pump(&mut mounted.vdom).await;

        assert!(backend.opened().is_empty());
        assert!(backend.reads().is_empty());
        assert!(mounted.last().is_some_and(|state| state.phase() == Phase::Idle));
    });
}

#[test]
fn use_fetch_moves_subscription_when_reference_changes() {
    block_on_test(async {
        let backend = MemoryBackend::new();

        let mut mounted = Mounted::new(&backend, Some(path("rooms/a")), FetchPolicy::LiveDefault);
        pump(&mut mounted.vdom).await;
        backend.emit("rooms/a", Some(json!("a")), false);
        pump(&mut mounted.vdom).await;
        assert_eq!(mounted.last_data(), Some(json!("a")));

        mounted.send(Command::Point(Some(path("rooms/b")))).await;
        assert_eq!(backend.opened().len(), 2);
        assert_eq!(backend.active_listeners(), 1);

        backend.emit("rooms/a", Some(json!("stale")), false);
        backend.emit("rooms/b", Some(json!("b")), false);
        pump(&mut mounted.vdom).await;
        assert_eq!(mounted.last_data(), Some(json!("b")));

        mounted.send(Command::Point(Some(path("/rooms/b/")))).await;
        assert_eq!(backend.opened().len(), 2, "equal reference keeps the subscription");

        mounted.send(Command::Point(None)).await;
        assert_eq!(backend.active_listeners(), 0);
        assert!(mounted.last().is_some_and(|state| state.phase() == Phase::Idle));
    });
}

#[test]
fn use_fetch_retry_reissues_failed_read() {
    block_on_test(async {
        let backend = MemoryBackend::new();
        backend.put_server("todos/1", json!("one"));
        backend.set_offline(true);

        let mut mounted = Mounted::new(&backend, Some(path("todos/1")), FetchPolicy::OneShotServerOnly);
        pump(&mut mounted.vdom).await;
        assert!(
            mounted
                .last()
                .is_some_and(|state| state.error.as_ref().is_some_and(BackendError::is_unavailable))
        );

        backend.set_offline(false);
        mounted.send(Command::Retry).await;

        let last = mounted.last().expect("state recorded");
        assert_eq!(last.error, None);
        assert_eq!(mounted.last_data(), Some(json!("one")));
        assert_eq!(backend.reads().len(), 2);
    });
}

#[test]
fn use_fetch_keeps_first_backend() {
    block_on_test(async {
        let first = MemoryBackend::new();
        first.put_server("todos/1", json!("first"));
        let second = MemoryBackend::new();
        second.put_server("todos/1", json!("second"));

        let mut mounted = Mounted::new(&first, Some(path("todos/1")), FetchPolicy::OneShotServerOnly);
        pump(&mut mounted.vdom).await;

        mounted.send(Command::SwapBackend(second.clone())).await;
        mounted.send(Command::Retry).await;

        assert_eq!(mounted.last_data(), Some(json!("first")));
        assert_eq!(first.reads().len(), 2);
        assert!(second.reads().is_empty());
    });
}

#[derive(Props, Clone)]
struct DoublerProps {
    results: Rc<RefCell<Vec<Option<u32>>>>,
}

impl PartialEq for DoublerProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.results, &other.results)
    }
}

#[allow(non_snake_case)]
fn Doubler(props: DoublerProps) -> Element {
    let double = use_callable(|| Callable::new(|n: u32| async move { Ok(n * 2) }));
    let state = double.state();
    let record = props.results.clone();
    use_effect(move || {
        record.borrow_mut().push(state.read().value.as_deref().copied());
    });
    use_hook(|| double.invoke(21));
    rsx! {}
}

#[test]
fn use_callable_renders_invocation_result() {
    block_on_test(async {
        let results = Rc::new(RefCell::new(Vec::new()));
        let mut vdom = VirtualDom::new_with_props(
            Doubler,
            DoublerProps {
                results: results.clone(),
            },
        );
        vdom.rebuild_in_place();
        pump(&mut vdom).await;

        assert_eq!(results.borrow().last(), Some(&Some(42)));
    });
}

#[derive(Default)]
struct MemoryAuth {
    user: Mutex<Option<String>>,
    listeners: Mutex<Vec<Listener<Option<String>>>>,
    released: Arc<AtomicUsize>,
}

impl MemoryAuth {
    fn sign_in(&self, uid: &str) {
        *self.user.lock().unwrap() = Some(uid.to_string());
        let listeners = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener.next(Some(uid.to_string()));
        }
    }
}

impl AuthClient for MemoryAuth {
    type User = String;

    fn auth_state_ready(&self) -> BoxFuture<'static, ()> {
        async {}.boxed()
    }

    fn current_user(&self) -> Option<String> {
        self.user.lock().unwrap().clone()
    }

    fn on_auth_state_changed(&self, listener: Listener<Option<String>>) -> Unsubscribe {
        listener.next(self.current_user());
        self.listeners.lock().unwrap().push(listener);
        let released = self.released.clone();
        Unsubscribe::new(move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }
}

type AuthRecorder = Rc<RefCell<Vec<AsyncResult<Option<String>, BackendError>>>>;

#[derive(Props, Clone)]
struct SessionProps {
    client: Arc<MemoryAuth>,
    recorder: AuthRecorder,
}

impl PartialEq for SessionProps {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.client, &other.client) && Rc::ptr_eq(&self.recorder, &other.recorder)
    }
}

#[allow(non_snake_case)]
fn Session(props: SessionProps) -> Element {
    let auth = use_auth_state(props.client.clone());
    let record = props.recorder.clone();
    use_effect(move || {
        record.borrow_mut().push(auth.read().clone());
    });
    rsx! {}
}

#[test]
fn use_auth_state_follows_sign_in_and_releases_on_unmount() {
    block_on_test(async {
        let client = Arc::new(MemoryAuth::default());
        let recorder: AuthRecorder = Rc::new(RefCell::new(Vec::new()));
        let mut vdom = VirtualDom::new_with_props(
            Session,
            SessionProps {
                client: client.clone(),
                recorder: recorder.clone(),
            },
        );
        vdom.rebuild_in_place();
        pump(&mut vdom).await;

        let user = |recorder: &AuthRecorder| {
            recorder
                .borrow()
                .last()
                .and_then(|state| state.value.as_deref().cloned())
        };
        assert_eq!(user(&recorder), Some(None));

        client.sign_in("ada");
        pump(&mut vdom).await;
        assert_eq!(user(&recorder), Some(Some("ada".to_string())));

        drop(vdom);
        assert_eq!(client.released.load(Ordering::SeqCst), 1);
    });
}

#[derive(Props, Clone)]
struct ShellProps {
    backend: Arc<MemoryBackend>,
    recorder: Recorder,
    missing_other: Rc<Cell<Option<bool>>>,
}

impl PartialEq for ShellProps {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
            && Rc::ptr_eq(&self.recorder, &other.recorder)
            && Rc::ptr_eq(&self.missing_other, &other.missing_other)
    }
}

#[allow(non_snake_case)]
fn Shell(props: ShellProps) -> Element {
    let shared = props.backend.clone();
    use_backend_provider(move || (*shared).clone());
    rsx! {
        Reader { recorder: props.recorder.clone(), missing_other: props.missing_other.clone() }
    }
}

#[derive(Props, Clone)]
struct ReaderProps {
    recorder: Recorder,
    missing_other: Rc<Cell<Option<bool>>>,
}

impl PartialEq for ReaderProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.recorder, &other.recorder) && Rc::ptr_eq(&self.missing_other, &other.missing_other)
    }
}

#[allow(non_snake_case)]
fn Reader(props: ReaderProps) -> Element {
    let backend = use_backend::<MemoryBackend>();
    props
        .missing_other
        .set(Some(try_use_backend::<MemoryAuth>().is_none()));
    let fetch = use_fetch(backend, Some(path("todos/1")), FetchPolicy::OneShotServerOnly);
    let state = fetch.state();
    let record = props.recorder.clone();
    use_effect(move || {
        record.borrow_mut().push(state.read().clone());
    });
    rsx! {}
}

#[test]
fn provided_backend_reaches_descendants() {
    block_on_test(async {
        let backend = MemoryBackend::new();
        backend.put_server("todos/1", json!("one"));
        let recorder: Recorder = Rc::new(RefCell::new(Vec::new()));
        let missing_other = Rc::new(Cell::new(None));

        let mut vdom = VirtualDom::new_with_props(
            Shell,
            ShellProps {
                backend: backend.clone(),
                recorder: recorder.clone(),
                missing_other: missing_other.clone(),
            },
        );
        vdom.rebuild_in_place();
        pump(&mut vdom).await;

        assert_eq!(
            recorder
                .borrow()
                .last()
                .and_then(|state| state.value.as_ref().and_then(|doc| doc.data.clone())),
            Some(json!("one"))
        );
        assert_eq!(backend.reads().len(), 1, "the provided clone shares the store");
        assert_eq!(missing_other.get(), Some(true));
    });
}

#[derive(Props, Clone)]
struct RoomProps {
    backend: Arc<MemoryBackend>,
    counts: Rc<RefCell<Vec<Option<u64>>>>,
    added: Arc<Mutex<Vec<String>>>,
}

impl PartialEq for RoomProps {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
            && Rc::ptr_eq(&self.counts, &other.counts)
            && Arc::ptr_eq(&self.added, &other.added)
    }
}

#[allow(non_snake_case)]
fn Room(props: RoomProps) -> Element {
    let members = use_count(props.backend.clone(), Some(path("members")));
    let added = props.added.clone();
    use_child_events(
        props.backend.clone(),
        Some(path("messages")),
        ChildHandlers::new().on_added(move |event: ChildEvent<Doc>| {
            added.lock().unwrap().push(event.snapshot.path.id().to_string());
        }),
    );
    let record = props.counts.clone();
    let state = members.state();
    use_effect(move || {
        record.borrow_mut().push(state.read().value.as_ref().and_then(|data| data.count()));
    });
    rsx! {}
}

#[test]
fn use_count_and_child_events_follow_the_backend() {
    block_on_test(async {
        let backend = MemoryBackend::new();
        backend.put_server("members/ada", json!({}));
        backend.put_server("members/grace", json!({}));
        let counts = Rc::new(RefCell::new(Vec::new()));
        let added = Arc::new(Mutex::new(Vec::new()));

        let mut vdom = VirtualDom::new_with_props(
            Room,
            RoomProps {
                backend: backend.clone(),
                counts: counts.clone(),
                added: added.clone(),
            },
        );
        vdom.rebuild_in_place();
        pump(&mut vdom).await;

        assert_eq!(counts.borrow().last(), Some(&Some(2)));
        assert_eq!(
            backend.active_child_listeners(),
            vec![(path("messages"), ChildEventKind::Added)]
        );

        backend.emit_child("messages", ChildEventKind::Added, "m1", Some(json!("hi")), None);
        assert_eq!(*added.lock().unwrap(), vec!["m1".to_string()]);

        drop(vdom);
        assert!(backend.active_child_listeners().is_empty());
    });
}
