// server/src/api/notifications.rs
use actix_web::{web, HttpResponse};
use common::{NotifyRequest, NotifyResponse, Role};

use crate::auth::AuthenticatedUser;
use crate::dispatcher::NotificationDispatcher;
use crate::error::ApiError;

// Raise a notification for a user. Dropped silently when the user has no live channel.
// Recruiters only.
pub async fn notify(
    user: AuthenticatedUser,
    body: web::Json<NotifyRequest>,
    dispatcher: web::Data<NotificationDispatcher>,
) -> Result<HttpResponse, ApiError> {
    user.require_role(Role::Recruiter)?;

    let NotifyRequest { user_id, event } = body.into_inner();

    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("user_id is required".into()));
    }

    let delivery = dispatcher.dispatch(user_id, event);
    tracing::info!(
        "Notification from {} to {}: {:?}",
        user.subject(),
        user_id,
        delivery
    );

    Ok(HttpResponse::Ok().json(NotifyResponse {
        delivered: delivery.is_delivered(),
    }))
}
