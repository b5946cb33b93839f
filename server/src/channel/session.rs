// server/src/channel/session.rs
use actix::prelude::SendError;
use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, Message, StreamHandler};
use actix_web_actors::ws;
use common::{ChannelConfig, ChannelEvent, ChannelRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::registry::{ChannelHandle, ChannelId, ConnectionRegistry, PushError};

/// Actor message: deliver one notification to the connected client
#[derive(Message)]
#[rtype(result = "()")]
pub struct PushNotification {
    pub event: Value,
}

/// One client's notification channel.
///
/// The channel carries no identity until the client announces one; on stop it
/// evicts itself from the registry by channel id.
pub struct ChannelSessionActor {
    channel_id: ChannelId,
    user_id: Option<String>,
    registry: Arc<ConnectionRegistry>,
    heartbeat_interval: Duration,
    client_timeout: Duration,
    last_heartbeat: Instant,
}

impl ChannelSessionActor {
    pub fn new(registry: Arc<ConnectionRegistry>, config: &ChannelConfig) -> Self {
        Self {
            channel_id: Uuid::new_v4(),
            user_id: None,
            registry,
            heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs.max(1)),
            client_timeout: Duration::from_secs(config.client_timeout_secs.max(1)),
            last_heartbeat: Instant::now(),
        }
    }

    // Ping periodically; stop the channel when the client goes quiet
    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > act.client_timeout {
                tracing::warn!(
                    "Channel {} heartbeat timeout (user: {:?})",
                    act.channel_id,
                    act.user_id
                );
                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }

    fn send_event(&self, event: &ChannelEvent, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(event) {
            Ok(json) => ctx.text(json),
            Err(e) => tracing::error!("Failed to serialize channel event: {}", e),
        }
    }

    fn handle_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::from_str::<ChannelRequest>(text) {
            Ok(ChannelRequest::Announce { user_id }) => {
                let user_id = user_id.trim().to_string();
                if user_id.is_empty() {
                    self.send_event(
                        &ChannelEvent::Error {
                            message: "user_id must not be empty".into(),
                        },
                        ctx,
                    );
                    return;
                }

                let handle = Arc::new(SessionHandle::new(self.channel_id, ctx.address()));
                if let Some(displaced) = self.registry.announce(&user_id, handle) {
                    // the old channel stays open until its client drops it
                    tracing::info!(
                        "User {} moved from channel {} to {}",
                        user_id,
                        displaced.id(),
                        self.channel_id
                    );
                } else {
                    tracing::info!("User {} announced on channel {}", user_id, self.channel_id);
                }

                self.user_id = Some(user_id.clone());
                self.send_event(&ChannelEvent::Announced { user_id }, ctx);
            }
            Err(e) => {
                tracing::warn!("Invalid frame on channel {}: {}", self.channel_id, e);
                self.send_event(
                    &ChannelEvent::Error {
                        message: "Invalid message format".into(),
                    },
                    ctx,
                );
            }
        }
    }
}

impl Actor for ChannelSessionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("Channel opened: {}", self.channel_id);
        self.last_heartbeat = Instant::now();
        self.heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        match self.registry.evict(self.channel_id) {
            Some(user_id) => {
                tracing::info!("Channel {} closed, user {} disconnected", self.channel_id, user_id)
            }
            None => tracing::info!("Channel {} closed", self.channel_id),
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChannelSessionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("Protocol error on channel {}: {}", self.channel_id, e);
                ctx.stop();
                return;
            }
        };

        match msg {
            ws::Message::Ping(msg) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            ws::Message::Pong(_) => {
                self.last_heartbeat = Instant::now();
            }
            ws::Message::Text(text) => {
                self.last_heartbeat = Instant::now();
                self.handle_text(&text, ctx);
            }
            ws::Message::Binary(_) => {
                self.last_heartbeat = Instant::now();
                self.send_event(
                    &ChannelEvent::Error {
                        message: "Binary frames are not supported".into(),
                    },
                    ctx,
                );
            }
            ws::Message::Close(reason) => {
                tracing::debug!("Client closing channel {}: {:?}", self.channel_id, reason);
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) | ws::Message::Nop => (),
        }
    }
}

impl Handler<PushNotification> for ChannelSessionActor {
    type Result = ();

    fn handle(&mut self, msg: PushNotification, ctx: &mut Self::Context) -> Self::Result {
        self.send_event(&ChannelEvent::Notification { event: msg.event }, ctx);
    }
}

/// Registry-facing handle to a [`ChannelSessionActor`].
#[derive(Clone)]
pub struct SessionHandle {
    id: ChannelId,
    addr: Addr<ChannelSessionActor>,
}

impl SessionHandle {
    pub fn new(id: ChannelId, addr: Addr<ChannelSessionActor>) -> Self {
        Self { id, addr }
    }
}

impl ChannelHandle for SessionHandle {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn push(&self, event: Value) -> Result<(), PushError> {
        self.addr
            .try_send(PushNotification { event })
            .map_err(|e| match e {
                SendError::Full(_) => PushError::Full(self.id),
                SendError::Closed(_) => PushError::Closed(self.id),
            })
    }

    fn is_open(&self) -> bool {
        self.addr.connected()
    }
}
