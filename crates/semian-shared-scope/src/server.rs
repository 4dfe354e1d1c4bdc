//! The shared-scope coordinator: a unix-domain-socket server holding one
//! [`ResourceState`] per registered resource name, broadcasting state changes
//! to subscribers and sweeping open breakers toward half-open on a timer.

use crate::protocol::{Request, Response, ServerMessage, StateChangeNotification, WireState};
use crate::state::{ResourceParams, ResourceState};
use semian_core::CircuitState;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

struct ResourceEntry {
    state: ResourceState,
    subscribers: Mutex<HashMap<String, mpsc::UnboundedSender<String>>>,
}

/// Owns every registered resource's breaker state and subscriber list, shared
/// across all accepted connections behind an `Arc`.
pub struct Coordinator {
    resources: Mutex<HashMap<String, Arc<ResourceEntry>>>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
        }
    }

    fn entry_or_register(&self, name: &str, params: ResourceParams) -> (Arc<ResourceEntry>, bool) {
        let mut resources = self.resources.lock().unwrap();
        if let Some(entry) = resources.get(name) {
            return (Arc::clone(entry), false);
        }
        let entry = Arc::new(ResourceEntry {
            state: ResourceState::new(params),
            subscribers: Mutex::new(HashMap::new()),
        });
        resources.insert(name.to_string(), Arc::clone(&entry));
        (entry, true)
    }

    fn lookup(&self, name: &str) -> Option<Arc<ResourceEntry>> {
        self.resources.lock().unwrap().get(name).cloned()
    }

    fn broadcast(&self, name: &str, entry: &ResourceEntry, state: WireState) {
        let message = ServerMessage::Notify(StateChangeNotification {
            name: name.to_string(),
            state,
        });
        let line = match serde_json::to_string(&message) {
            Ok(line) => line,
            Err(_) => return,
        };
        let mut subscribers = entry.subscribers.lock().unwrap();
        subscribers.retain(|_, sender| sender.send(line.clone()).is_ok());
    }

    fn handle(
        &self,
        request: Request,
        registered_here: &mut Vec<(String, String)>,
        outbound: &mpsc::UnboundedSender<String>,
    ) -> Response {
        match request {
            Request::RegisterResource {
                name,
                error_threshold,
                error_timeout_ms,
                success_threshold,
            } => {
                let params = ResourceParams {
                    error_threshold,
                    error_timeout: Duration::from_millis(error_timeout_ms),
                    success_threshold,
                };
                let (entry, freshly_registered) = self.entry_or_register(&name, params);
                Response::Registered {
                    registered: freshly_registered,
                    state: entry.state.current_state().into(),
                }
            }
            Request::ReportError { name } => match self.lookup(&name) {
                Some(entry) => {
                    let state = entry.state.record_error();
                    self.broadcast(&name, &entry, state.into());
                    Response::StateChanged {
                        state: Some(state.into()),
                    }
                }
                None => unknown(&name),
            },
            Request::ReportSuccess { name } => match self.lookup(&name) {
                Some(entry) => {
                    let state = entry.state.record_success();
                    self.broadcast(&name, &entry, state.into());
                    Response::StateChanged {
                        state: Some(state.into()),
                    }
                }
                None => unknown(&name),
            },
            Request::GetState { name } => match self.lookup(&name) {
                Some(entry) => Response::State {
                    state: entry.state.current_state().into(),
                },
                None => unknown(&name),
            },
            Request::GetOpenStates => {
                let resources = self.resources.lock().unwrap();
                let states = resources
                    .iter()
                    .map(|(name, entry)| (name.clone(), entry.state.current_state()))
                    .filter(|(_, state)| *state != CircuitState::Closed)
                    .map(|(name, state)| (name, state.into()))
                    .collect();
                Response::OpenStates { states }
            }
            Request::Subscribe { name, subscriber_ref } => match self.lookup(&name) {
                Some(entry) => {
                    entry
                        .subscribers
                        .lock()
                        .unwrap()
                        .insert(subscriber_ref.clone(), outbound.clone());
                    registered_here.push((name, subscriber_ref));
                    Response::Subscribed
                }
                None => unknown(&name),
            },
            Request::Unsubscribe { name, subscriber_ref } => {
                if let Some(entry) = self.lookup(&name) {
                    entry.subscribers.lock().unwrap().remove(&subscriber_ref);
                }
                registered_here.retain(|(n, s)| !(n == &name && s == &subscriber_ref));
                Response::Unsubscribed
            }
        }
    }

    /// Runs one pass of the open→half-open sweep, broadcasting any transitions.
    /// Meant to be called on a fixed interval from [`SharedScopeServer::serve`].
    pub fn sweep_once(&self) {
        let snapshot: Vec<(String, Arc<ResourceEntry>)> = {
            let resources = self.resources.lock().unwrap();
            resources.iter().map(|(n, e)| (n.clone(), Arc::clone(e))).collect()
        };
        for (name, entry) in snapshot {
            if let Some(new_state) = entry.state.maybe_expire() {
                self.broadcast(&name, &entry, new_state.into());
            }
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown(name: &str) -> Response {
    Response::Error {
        message: format!("resource '{name}' is not registered"),
    }
}

/// Binds a [`Coordinator`] to a unix domain socket path and serves it.
pub struct SharedScopeServer {
    socket_path: PathBuf,
    coordinator: Arc<Coordinator>,
    sweep_interval: Duration,
}

impl SharedScopeServer {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            coordinator: Arc::new(Coordinator::new()),
            sweep_interval: Duration::from_millis(250),
        }
    }

    pub fn coordinator(&self) -> Arc<Coordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Binds the socket and serves connections until the process is killed or
    /// the listener errors out. Removes a stale socket file left over from a
    /// previous run before binding, the way a unix-socket server conventionally
    /// does.
    pub async fn serve(self) -> io::Result<()> {
        let _ = std::fs::remove_file(&self.socket_path);
        let listener = UnixListener::bind(&self.socket_path)?;

        #[cfg(feature = "tracing")]
        tracing::info!(path = %self.socket_path.display(), "shared-scope coordinator listening");

        let coordinator = Arc::clone(&self.coordinator);
        let sweep_interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                coordinator.sweep_once();
            }
        });

        loop {
            let (stream, _addr) = listener.accept().await?;
            let coordinator = Arc::clone(&self.coordinator);
            tokio::spawn(async move {
                if let Err(_err) = handle_connection(stream, coordinator).await {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(error = %_err, "shared-scope connection ended");
                }
            });
        }
    }
}

async fn handle_connection(stream: UnixStream, coordinator: Arc<Coordinator>) -> io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(line) = outbound_rx.recv().await {
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if write_half.write_all(b"\n").await.is_err() {
                break;
            }
        }
    });

    let mut registered_here: Vec<(String, String)> = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                let response = ServerMessage::Response(Response::Error {
                    message: format!("malformed request: {err}"),
                });
                if let Ok(line) = serde_json::to_string(&response) {
                    let _ = outbound_tx.send(line);
                }
                continue;
            }
        };
        let response = coordinator.handle(request, &mut registered_here, &outbound_tx);
        if let Ok(line) = serde_json::to_string(&ServerMessage::Response(response)) {
            if outbound_tx.send(line).is_err() {
                break;
            }
        }
    }

    for (name, subscriber_ref) in registered_here {
        if let Some(entry) = coordinator.lookup(&name) {
            entry.subscribers.lock().unwrap().remove(&subscriber_ref);
        }
    }
    drop(outbound_tx);
    let _ = writer.await;
    Ok(())
}
