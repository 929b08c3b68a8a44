use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::handlers;
use crate::state::AppState;

/// Route table shared by `run` and the integration tests (`actix_web::test`
/// builds an `App` with the same `configure` and no real socket bind).
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(handlers::ws::handler))
        .route("/ws/forge/terminal", web::get().to(handlers::ws::handler))
        .service(
            web::scope("/api/am")
                .route("/health", web::get().to(handlers::health::handler))
                .route(
                    "/llm/conversations/{tab_id}",
                    web::get().to(handlers::conversations::handler),
                )
                .route("/log", web::post().to(handlers::log::handler))
                .route("/enable", web::post().to(handlers::enable::handler))
                .route("/install-hooks", web::post().to(handlers::hooks::install))
                .route("/apply-hooks", web::post().to(handlers::hooks::apply_hooks))
                .route("/restore-hooks", web::post().to(handlers::hooks::restore_hooks))
                .route("/hook", web::post().to(handlers::hook_ping::handler))
                .route(
                    "/sessions/recoverable",
                    web::get().to(handlers::recoverable::list),
                )
                .route(
                    "/sessions/recoverable/grouped",
                    web::get().to(handlers::recoverable::grouped),
                )
                .route("/validate", web::post().to(handlers::validate::handler)),
        )
        .service(
            web::scope("/api/sessions")
                .route("", web::get().to(handlers::sessions::get))
                .route("", web::post().to(handlers::sessions::post)),
        );
}

/// Bind and run the HTTP/WebSocket server. Grounded on `agent-server`'s
/// `run_server_with_config` (`App::new().app_data(...).wrap(Cors::permissive())`
/// plus a `web::scope` route table).
pub async fn run(state: AppState, port: u16) -> io::Result<()> {
    let data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Cors::permissive())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
