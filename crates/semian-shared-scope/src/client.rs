//! Client half of the shared-scope protocol.
//!
//! Holds one persistent connection with automatic reconnect and exponential
//! backoff (the same shape as `ConnectionState`/backoff in a typical
//! reconnecting-client design: a tri-state connection flag plus a growing
//! retry delay). When the coordinator is unreachable the client degrades to
//! its local cache of last-known states; error/success reports are queued
//! (bounded FIFO, oldest dropped first) and replayed in order once the
//! connection comes back, and pending registrations/subscriptions are
//! re-established the same way.

use crate::error::{Result, SharedScopeError};
use crate::protocol::{Request, Response, ServerMessage, StateChangeNotification, WireState};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot, watch};

const MIN_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(5);
const QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone)]
struct RegistrationParams {
    error_threshold: usize,
    error_timeout_ms: u64,
    success_threshold: usize,
}

#[derive(Debug, Clone)]
enum QueuedReport {
    Error { name: String },
    Success { name: String },
}

impl QueuedReport {
    fn into_request(self) -> Request {
        match self {
            QueuedReport::Error { name } => Request::ReportError { name },
            QueuedReport::Success { name } => Request::ReportSuccess { name },
        }
    }
}

enum Command {
    Call(Request, oneshot::Sender<Result<Response>>),
    Fire(Request),
    Subscribe(String, oneshot::Sender<watch::Receiver<WireState>>),
}

struct Shared {
    link: Mutex<LinkState>,
    warned_unreachable: AtomicBool,
    cache: Mutex<HashMap<String, WireState>>,
    queue: Mutex<VecDeque<QueuedReport>>,
    registrations: Mutex<HashMap<String, RegistrationParams>>,
    watches: Mutex<HashMap<String, watch::Sender<WireState>>>,
    subscriber_ref: String,
}

impl Shared {
    fn mark_connected(&self) {
        *self.link.lock().unwrap() = LinkState::Connected;
        self.warned_unreachable.store(false, Ordering::Relaxed);
    }

    fn mark_disconnected(&self) {
        *self.link.lock().unwrap() = LinkState::Disconnected;
        if !self.warned_unreachable.swap(true, Ordering::Relaxed) {
            #[cfg(feature = "tracing")]
            tracing::warn!("shared-scope coordinator unreachable, degrading to local cache");
        }
    }

    fn update_cache(&self, name: &str, state: WireState) {
        self.cache.lock().unwrap().insert(name.to_string(), state);
        if let Some(sender) = self.watches.lock().unwrap().get(name) {
            let _ = sender.send(state);
        }
    }

    fn cached(&self, name: &str) -> WireState {
        *self
            .cache
            .lock()
            .unwrap()
            .get(name)
            .unwrap_or(&WireState::Closed)
    }

    fn enqueue(&self, report: QueuedReport) {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() >= QUEUE_CAPACITY {
            queue.pop_front();
            #[cfg(feature = "tracing")]
            tracing::debug!("shared-scope report queue full, dropping oldest queued report");
        }
        queue.push_back(report);
    }

    fn drain_queue(&self) -> Vec<QueuedReport> {
        self.queue.lock().unwrap().drain(..).collect()
    }

    fn remember_registration(&self, name: &str, params: RegistrationParams) {
        self.registrations
            .lock()
            .unwrap()
            .insert(name.to_string(), params);
    }

    fn registrations_snapshot(&self) -> Vec<(String, RegistrationParams)> {
        self.registrations
            .lock()
            .unwrap()
            .iter()
            .map(|(n, p)| (n.clone(), p.clone()))
            .collect()
    }

    fn subscribed_names(&self) -> Vec<String> {
        self.watches.lock().unwrap().keys().cloned().collect()
    }

    fn degraded_response(&self, request: &Request) -> Result<Response> {
        match request {
            Request::RegisterResource { name, .. } => Ok(Response::Registered {
                registered: true,
                state: self.cached(name),
            }),
            Request::GetState { name } => Ok(Response::State {
                state: self.cached(name),
            }),
            Request::GetOpenStates => {
                let states = self
                    .cache
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|(_, state)| **state != WireState::Closed)
                    .map(|(name, state)| (name.clone(), *state))
                    .collect();
                Ok(Response::OpenStates { states })
            }
            _ => Err(SharedScopeError::ConnectionClosed),
        }
    }
}

/// A handle to the background task maintaining the shared-scope connection.
/// Cloning is cheap; every clone shares the same connection and cache.
#[derive(Clone)]
pub struct SharedScopeClient {
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<Shared>,
}

impl SharedScopeClient {
    /// Spawns the background connection task and returns immediately; the
    /// first connection attempt happens asynchronously, so an early call may
    /// observe degraded behavior until it completes.
    pub fn connect(socket_path: impl Into<PathBuf>) -> Self {
        let socket_path = socket_path.into();
        let shared = Arc::new(Shared {
            link: Mutex::new(LinkState::Disconnected),
            warned_unreachable: AtomicBool::new(false),
            cache: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            registrations: Mutex::new(HashMap::new()),
            watches: Mutex::new(HashMap::new()),
            subscriber_ref: format!("{}-{}", std::process::id(), next_client_id()),
        });
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let task_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            run(socket_path, commands_rx, task_shared).await;
        });
        Self {
            commands: commands_tx,
            shared,
        }
    }

    pub fn link_state(&self) -> LinkState {
        *self.shared.link.lock().unwrap()
    }

    pub async fn register_resource(
        &self,
        name: &str,
        error_threshold: usize,
        error_timeout: Duration,
        success_threshold: usize,
    ) -> Result<WireState> {
        self.shared.remember_registration(
            name,
            RegistrationParams {
                error_threshold,
                error_timeout_ms: error_timeout.as_millis() as u64,
                success_threshold,
            },
        );
        let request = Request::RegisterResource {
            name: name.to_string(),
            error_threshold,
            error_timeout_ms: error_timeout.as_millis() as u64,
            success_threshold,
        };
        match self.call(request).await? {
            Response::Registered { state, .. } => {
                self.shared.update_cache(name, state);
                Ok(state)
            }
            Response::Error { message } => Err(SharedScopeError::Remote(message)),
            _ => Err(SharedScopeError::ConnectionClosed),
        }
    }

    /// Reports an error for `name`. Fire-and-forget from the caller's
    /// perspective: queued locally if the coordinator is unreachable.
    pub fn report_error(&self, name: &str) {
        let request = Request::ReportError {
            name: name.to_string(),
        };
        if self.commands.send(Command::Fire(request)).is_err() {
            self.shared.enqueue(QueuedReport::Error {
                name: name.to_string(),
            });
        }
    }

    pub fn report_success(&self, name: &str) {
        let request = Request::ReportSuccess {
            name: name.to_string(),
        };
        if self.commands.send(Command::Fire(request)).is_err() {
            self.shared.enqueue(QueuedReport::Success {
                name: name.to_string(),
            });
        }
    }

    pub async fn get_state(&self, name: &str) -> Result<WireState> {
        match self
            .call(Request::GetState {
                name: name.to_string(),
            })
            .await?
        {
            Response::State { state } => {
                self.shared.update_cache(name, state);
                Ok(state)
            }
            Response::Error { message } => Err(SharedScopeError::Remote(message)),
            _ => Err(SharedScopeError::ConnectionClosed),
        }
    }

    pub async fn get_open_states(&self) -> Result<HashMap<String, WireState>> {
        match self.call(Request::GetOpenStates).await? {
            Response::OpenStates { states } => Ok(states),
            _ => Err(SharedScopeError::ConnectionClosed),
        }
    }

    /// Subscribes to state changes for `name`, returning a `watch::Receiver`
    /// that observes the last-known state whether or not the coordinator is
    /// currently reachable.
    pub async fn subscribe(&self, name: &str) -> Result<watch::Receiver<WireState>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Subscribe(name.to_string(), reply_tx))
            .map_err(|_| SharedScopeError::ConnectionClosed)?;
        reply_rx.await.map_err(|_| SharedScopeError::ConnectionClosed)
    }

    async fn call(&self, request: Request) -> Result<Response> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Call(request, reply_tx))
            .map_err(|_| SharedScopeError::ConnectionClosed)?;
        reply_rx.await.map_err(|_| SharedScopeError::ConnectionClosed)?
    }
}

fn next_client_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

async fn run(socket_path: PathBuf, mut commands: mpsc::UnboundedReceiver<Command>, shared: Arc<Shared>) {
    loop {
        let stream = match connect_with_backoff(&socket_path, &mut commands, &shared).await {
            Some(stream) => stream,
            None => return, // client dropped while disconnected
        };
        shared.mark_connected();
        #[cfg(feature = "tracing")]
        tracing::info!(path = %socket_path.display(), "shared-scope client connected");

        if !serve_connection(stream, &mut commands, &shared).await {
            return; // client dropped
        }
        shared.mark_disconnected();
    }
}

/// Attempts to connect, servicing incoming commands in degraded mode between
/// attempts. Returns `None` only when the command channel has closed (the
/// client handle was dropped), meaning the task should exit entirely.
async fn connect_with_backoff(
    socket_path: &PathBuf,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    shared: &Arc<Shared>,
) -> Option<UnixStream> {
    let mut backoff = MIN_BACKOFF;
    let sleep = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => {
                match UnixStream::connect(socket_path).await {
                    Ok(stream) => return Some(stream),
                    Err(_err) => {
                        shared.mark_disconnected();
                        sleep.as_mut().reset(tokio::time::Instant::now() + backoff);
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
            maybe_command = commands.recv() => {
                match maybe_command {
                    None => return None,
                    Some(command) => handle_degraded(command, shared),
                }
            }
        }
    }
}

fn handle_degraded(command: Command, shared: &Arc<Shared>) {
    match command {
        Command::Call(request, responder) => {
            let _ = responder.send(shared.degraded_response(&request));
        }
        Command::Fire(request) => {
            let queued = match request {
                Request::ReportError { name } => QueuedReport::Error { name },
                Request::ReportSuccess { name } => QueuedReport::Success { name },
                _ => return,
            };
            shared.enqueue(queued);
        }
        Command::Subscribe(name, reply) => {
            let rx = watch_for(shared, &name);
            let _ = reply.send(rx);
        }
    }
}

fn watch_for(shared: &Arc<Shared>, name: &str) -> watch::Receiver<WireState> {
    let mut watches = shared.watches.lock().unwrap();
    if let Some(sender) = watches.get(name) {
        return sender.subscribe();
    }
    let (tx, rx) = watch::channel(shared.cached(name));
    watches.insert(name.to_string(), tx);
    rx
}

/// Runs one connected session: replays queued work, then services commands
/// and incoming lines until the connection drops. Returns `false` if the
/// client handle was dropped (command channel closed) so the caller should
/// stop entirely rather than reconnect.
async fn serve_connection(
    stream: UnixStream,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    shared: &Arc<Shared>,
) -> bool {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let mut pending: VecDeque<oneshot::Sender<Result<Response>>> = VecDeque::new();

    for (name, params) in shared.registrations_snapshot() {
        let request = Request::RegisterResource {
            name,
            error_threshold: params.error_threshold,
            error_timeout_ms: params.error_timeout_ms,
            success_threshold: params.success_threshold,
        };
        if write_request(&mut write_half, &request).await.is_err() {
            return true;
        }
        pending.push_back(drop_reply_channel());
    }
    for name in shared.subscribed_names() {
        let request = Request::Subscribe {
            name,
            subscriber_ref: shared.subscriber_ref.clone(),
        };
        if write_request(&mut write_half, &request).await.is_err() {
            return true;
        }
        pending.push_back(drop_reply_channel());
    }
    for report in shared.drain_queue() {
        let request = report.into_request();
        if write_request(&mut write_half, &request).await.is_err() {
            return true;
        }
        pending.push_back(drop_reply_channel());
    }

    loop {
        tokio::select! {
            maybe_line = lines.next_line() => {
                match maybe_line {
                    Ok(Some(line)) => {
                        if !handle_server_line(&line, &mut pending, shared) {
                            return true;
                        }
                    }
                    _ => return true,
                }
            }
            maybe_command = commands.recv() => {
                match maybe_command {
                    None => return false,
                    Some(Command::Call(request, responder)) => {
                        if write_request(&mut write_half, &request).await.is_err() {
                            let _ = responder.send(Err(SharedScopeError::ConnectionClosed));
                            return true;
                        }
                        pending.push_back(responder);
                    }
                    Some(Command::Fire(request)) => {
                        if write_request(&mut write_half, &request).await.is_err() {
                            return true;
                        }
                        pending.push_back(drop_reply_channel());
                    }
                    Some(Command::Subscribe(name, reply)) => {
                        let rx = watch_for(shared, &name);
                        let _ = reply.send(rx);
                        let request = Request::Subscribe {
                            name,
                            subscriber_ref: shared.subscriber_ref.clone(),
                        };
                        if write_request(&mut write_half, &request).await.is_err() {
                            return true;
                        }
                        pending.push_back(drop_reply_channel());
                    }
                }
            }
        }
    }
}

fn drop_reply_channel() -> oneshot::Sender<Result<Response>> {
    let (tx, _rx) = oneshot::channel();
    tx
}

async fn write_request(write_half: &mut tokio::net::unix::OwnedWriteHalf, request: &Request) -> std::io::Result<()> {
    let line = serde_json::to_string(request).expect("Request always serializes");
    write_half.write_all(line.as_bytes()).await?;
    write_half.write_all(b"\n").await
}

fn handle_server_line(
    line: &str,
    pending: &mut VecDeque<oneshot::Sender<Result<Response>>>,
    shared: &Arc<Shared>,
) -> bool {
    let message: ServerMessage = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(_) => return true,
    };
    match message {
        ServerMessage::Response(response) => {
            if let Some(sender) = pending.pop_front() {
                let _ = sender.send(Ok(response));
            }
            true
        }
        ServerMessage::Notify(StateChangeNotification { name, state }) => {
            shared.update_cache(&name, state);
            true
        }
    }
}
