//! The query gateway's HTTP surface and process wiring: `actix-web` routes
//! for the ops of spec §6, the CLI (spec §6 "CLI surface"), startup/shutdown
//! sequencing of every singleton collaborator, and structured logging.
#[macro_use]
extern crate slog_scope;

pub mod bootstrap;
pub mod cli;
pub mod error;
pub mod logging;
pub mod state;
pub mod web;

/// Builds the single `App` surface shared by the real server and
/// integration tests. A macro rather than a function, following the
/// reference project's `build_app!`, so the `App<...>` type stays whatever
/// `actix_web::App::new()...` infers instead of having to be spelled out
/// (actix-web's service-factory generics make that signature unwieldy to
/// write by hand for a function, and the reference project never does).
#[macro_export]
macro_rules! build_app {
    ($state:expr) => {
        actix_web::App::new()
            .app_data($state)
            .app_data(
                actix_web::web::JsonConfig::default()
                    .error_handler($crate::error::json_error_handler),
            )
            .wrap(
                actix_cors::Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .configure($crate::web::configure)
    };
}
