// server/src/api/mod.rs
pub mod auth;
pub mod notifications;

use actix_web::{get, web, HttpResponse, Responder};
use common::TokenCodec;
use serde_json::json;

use crate::auth::RequireAuth;

#[get("/")]
pub async fn api_index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "Elevatr API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `/api` routes. Each guarded resource carries its own token guard so unknown
/// paths still fall through to 404.
pub fn configure(cfg: &mut web::ServiceConfig, codec: web::Data<TokenCodec>) {
    cfg.service(
        web::scope("/api")
            .service(api_index)
            .service(auth::issue_token)
            .service(
                web::resource("/me")
                    .route(web::get().to(auth::me))
                    .wrap(RequireAuth::new(codec.clone())),
            )
            .service(
                web::resource("/notifications")
                    .route(web::post().to(notifications::notify))
                    .wrap(RequireAuth::new(codec)),
            ),
    );
}
