// server/src/channel/routing.rs
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use common::Config;

use super::session::ChannelSessionActor;
use crate::registry::ConnectionRegistry;

/// Configure routes for notification channels
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws/notifications").route(web::get().to(notification_ws_route)));
}

/// WebSocket route for notification channels
async fn notification_ws_route(
    req: HttpRequest,
    stream: web::Payload,
    registry: web::Data<ConnectionRegistry>,
    config: web::Data<Config>,
) -> Result<HttpResponse, Error> {
    let session = ChannelSessionActor::new(registry.into_inner(), &config.channel);

    tracing::debug!(
        "Upgrading notification channel for {}",
        req.connection_info().realip_remote_addr().unwrap_or("unknown")
    );

    ws::start(session, &req, stream)
}
