//! A viewer session. [`ViewerSession`] decides what happens for every event
//! and returns the effects to carry out; [`run`] owns the socket, the timers
//! and the background requests and feeds their outcomes back in as events.

use std::{future, sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use model::{
    message::{ServerMessage, PING},
    Snapshot,
};
use tokio::{
    net::TcpStream,
    sync::mpsc,
    task::JoinSet,
    time::{interval_at, sleep_until, timeout, Instant, Interval, MissedTickBehavior},
};
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;

use crate::{
    channel::{Channel, ChannelState, Reconnect},
    config::ViewerConfig,
    notification::{Notification, NotificationKind, Notifications},
    poller::SnapshotFetcher,
    reconciler::ViewState,
    ViewerError,
};

/// Input from the person looking at the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Select(String),
    ClosePanel,
    Refresh,
}

#[derive(Debug)]
pub enum Event {
    Opened,
    Closed,
    Message(String),
    Polled(Result<Snapshot, ViewerError>),
    PollDue,
    PingDue,
    ReconnectDue,
    NotificationDue,
    Action(Action),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Render,
    Connect,
    Ping,
    /// Restart the ping period, the channel just opened.
    StartPinging,
    ScheduleReconnect(Duration),
    Poll,
}

/// Draws the state of a session.
pub trait Render {
    fn render(&mut self, session: &ViewerSession);
}

#[derive(Debug)]
pub struct ViewerSession {
    view: ViewState,
    channel: Channel,
    notifications: Notifications,
    poll_interval: Duration,
    poll_failing: bool,
}

impl ViewerSession {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            view: ViewState::new(),
            channel: Channel::new(config.max_reconnect_attempts, config.reconnect_delay),
            notifications: Notifications::new(config.notification_ttl),
            poll_interval: config.poll_interval,
            poll_failing: false,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn has_given_up(&self) -> bool {
        self.channel.has_given_up()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.current()
    }

    pub fn notification_deadline(&self) -> Option<Instant> {
        self.notifications.deadline()
    }

    /// Opens the channel and loads the first snapshot without waiting for it.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.channel.connect() {
            vec![Effect::Connect, Effect::Poll]
        } else {
            vec![Effect::Poll]
        }
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Opened => {
                info!("live channel open");
                self.channel.opened();
                vec![Effect::StartPinging, Effect::Render]
            }
            Event::Closed => self.on_closed(),
            Event::Message(text) => self.on_message(&text),
            Event::Polled(Ok(snapshot)) => {
                self.poll_failing = false;
                self.view.reconcile(snapshot);
                vec![Effect::Render]
            }
            Event::Polled(Err(why)) => {
                warn!("{}", why);
                if self.poll_failing {
                    return vec![];
                }
                self.poll_failing = true;
                self.notifications
                    .show(NotificationKind::Error, format!("Could not load data: {}", why));
                vec![Effect::Render]
            }
            Event::PollDue => vec![Effect::Poll],
            Event::PingDue if self.channel.is_open() => vec![Effect::Ping],
            Event::PingDue => vec![],
            Event::ReconnectDue if self.channel.connect() => {
                debug!("reconnect attempt {}", self.channel.attempts());
                vec![Effect::Connect, Effect::Render]
            }
            Event::ReconnectDue => vec![],
            Event::NotificationDue if self.notifications.expire(Instant::now()) => {
                vec![Effect::Render]
            }
            Event::NotificationDue => vec![],
            Event::Action(action) => self.on_action(action),
        }
    }

    fn on_closed(&mut self) -> Vec<Effect> {
        if self.channel.has_given_up() {
            return vec![];
        }
        match self.channel.closed() {
            Reconnect::After(delay) => {
                info!(
                    "live channel closed, reconnecting in {:?} (attempt {})",
                    delay,
                    self.channel.attempts()
                );
                vec![Effect::ScheduleReconnect(delay), Effect::Render]
            }
            Reconnect::GiveUp => {
                warn!("live channel unavailable, polling only");
                self.notifications.show(
                    NotificationKind::Error,
                    format!(
                        "Live updates unavailable, refreshing every {}s",
                        self.poll_interval.as_secs()
                    ),
                );
                vec![Effect::Poll, Effect::Render]
            }
        }
    }

    fn on_message(&mut self, text: &str) -> Vec<Effect> {
        match ServerMessage::parse(text) {
            Ok(ServerMessage::Snapshot(snapshot)) => {
                self.view.reconcile(snapshot);
                vec![Effect::Render]
            }
            Ok(ServerMessage::Pong) => vec![],
            Ok(ServerMessage::Other(tag)) => {
                debug!("ignoring `{}` message", tag);
                vec![]
            }
            Err(why) => {
                warn!("dropping message: {}", why);
                vec![]
            }
        }
    }

    fn on_action(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Select(name) => {
                if !self.view.select(&name) {
                    self.notifications
                        .show(NotificationKind::Error, format!("No zone named {}", name));
                }
                vec![Effect::Render]
            }
            Action::ClosePanel => {
                self.view.close_panel();
                vec![Effect::Render]
            }
            Action::Refresh if self.channel.is_open() => {
                self.notifications
                    .show(NotificationKind::Info, "Using live updates");
                vec![Effect::Render]
            }
            Action::Refresh => {
                self.notifications.show(NotificationKind::Success, "Data refreshed");
                vec![Effect::Poll, Effect::Render]
            }
        }
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Runtime<F, R> {
    config: ViewerConfig,
    fetcher: Arc<F>,
    renderer: R,
    socket: Option<Socket>,
    connects: JoinSet<Result<Socket, ViewerError>>,
    /// Holds at most one request, a due poll is skipped while one is running.
    polls: JoinSet<Result<Snapshot, ViewerError>>,
    ping: Interval,
    reconnect_at: Option<Instant>,
}

impl<F: SnapshotFetcher, R: Render> Runtime<F, R> {
    async fn apply(&mut self, effect: Effect, session: &ViewerSession) -> Option<Event> {
        match effect {
            Effect::Render => self.renderer.render(session),
            Effect::Connect => {
                let url = self.config.ws_url.clone();
                let limit = self.config.connect_timeout;
                self.connects.spawn(async move {
                    match timeout(limit, connect_async(url.as_str())).await {
                        Ok(connected) => connected
                            .map(|(socket, _)| socket)
                            .map_err(ViewerError::from),
                        Err(elapsed) => Err(ViewerError::from(elapsed)),
                    }
                });
            }
            Effect::Ping => {
                let socket = self.socket.as_mut()?;
                if let Err(why) = socket.send(Message::Text(PING.to_owned())).await {
                    debug!("ping failed: {}", why);
                    self.socket = None;
                    return Some(Event::Closed);
                }
            }
            Effect::StartPinging => self.ping.reset(),
            Effect::ScheduleReconnect(delay) => {
                self.reconnect_at = Some(Instant::now() + delay);
            }
            Effect::Poll if !self.polls.is_empty() => debug!("previous poll still running"),
            Effect::Poll => {
                let fetcher = Arc::clone(&self.fetcher);
                self.polls.spawn(async move { fetcher.fetch().await });
            }
        }
        None
    }

    async fn teardown(&mut self) {
        self.connects.shutdown().await;
        self.polls.shutdown().await;
        if let Some(mut socket) = self.socket.take() {
            if let Err(why) = socket.close(None).await {
                debug!("closing the live channel failed: {}", why);
            }
        }
        self.reconnect_at = None;
    }
}

async fn next_frame(
    socket: &mut Option<Socket>,
) -> Option<Result<Message, tokio_tungstenite::tungstenite::Error>> {
    match socket {
        Some(socket) => socket.next().await,
        None => future::pending().await,
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

/// Drives a session until `shutdown` is cancelled. Nothing fires after this
/// returns: the socket is closed, timers are dropped and in-flight requests
/// are aborted.
pub async fn run<F, R>(
    config: ViewerConfig,
    fetcher: F,
    renderer: R,
    mut actions: mpsc::Receiver<Action>,
    shutdown: CancellationToken,
) where
    F: SnapshotFetcher,
    R: Render,
{
    let mut session = ViewerSession::new(&config);

    let mut poll = interval_at(Instant::now() + config.poll_interval, config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ping = interval_at(Instant::now() + config.ping_interval, config.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut runtime = Runtime {
        config,
        fetcher: Arc::new(fetcher),
        renderer,
        socket: None,
        connects: JoinSet::new(),
        polls: JoinSet::new(),
        ping,
        reconnect_at: None,
    };
    let mut actions_open = true;

    let mut effects = session.start();
    loop {
        let mut follow_up = Vec::new();
        for effect in effects.drain(..) {
            if let Some(event) = runtime.apply(effect, &session).await {
                follow_up.push(event);
            }
        }
        for event in follow_up {
            effects.extend(session.handle(event));
        }
        if !effects.is_empty() {
            continue;
        }

        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            action = actions.recv(), if actions_open => match action {
                Some(action) => Event::Action(action),
                None => {
                    actions_open = false;
                    continue;
                }
            },
            frame = next_frame(&mut runtime.socket) => match frame {
                Some(Ok(Message::Text(text))) => Event::Message(text),
                Some(Ok(Message::Close(_))) | None => {
                    runtime.socket = None;
                    Event::Closed
                }
                Some(Err(why)) => {
                    debug!("live channel failed: {}", why);
                    runtime.socket = None;
                    Event::Closed
                }
                // binary, ping and pong frames
                Some(Ok(_)) => continue,
            },
            Some(joined) = runtime.connects.join_next() => match joined {
                Ok(Ok(socket)) => {
                    runtime.socket = Some(socket);
                    Event::Opened
                }
                Ok(Err(why)) => {
                    debug!("{}", why);
                    Event::Closed
                }
                Err(why) => {
                    warn!("connect task failed: {}", why);
                    Event::Closed
                }
            },
            Some(joined) = runtime.polls.join_next() => match joined {
                Ok(result) => Event::Polled(result),
                Err(why) => {
                    warn!("poll task failed: {}", why);
                    continue;
                }
            },
            _ = poll.tick() => Event::PollDue,
            _ = runtime.ping.tick() => Event::PingDue,
            _ = sleep_until_some(runtime.reconnect_at) => {
                runtime.reconnect_at = None;
                Event::ReconnectDue
            },
            _ = sleep_until_some(session.notification_deadline()) => Event::NotificationDue,
        };
        effects = session.handle(event);
    }

    runtime.teardown().await;
    info!("viewer session stopped");
}
