pub mod handlers;

use actix_web::web;

/// Registers every route spec §6 names, plus the dockerflow-style
/// operational endpoints (spec §12's observability surface riding on the
/// same app).
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/query").route(web::post().to(handlers::query)))
        .service(web::resource("/databases").route(web::get().to(handlers::list_databases)))
        .service(
            web::resource("/databases/{name}/refresh")
                .route(web::post().to(handlers::refresh_schema)),
        )
        .service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(web::resource("/__heartbeat__").route(web::get().to(handlers::health)))
        .service(web::resource("/__lbheartbeat__").route(web::get().to(handlers::lbheartbeat)))
        .service(web::resource("/__version__").route(web::get().to(handlers::version)))
        .service(web::resource("/__error__").route(web::get().to(handlers::test_error)));
}
