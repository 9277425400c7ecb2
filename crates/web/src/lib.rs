//! HTTP front end for the shelf catalog.
//!
//! | Method     | Path                       | Action                           |
//! |------------|----------------------------|----------------------------------|
//! | GET        | `/`                        | Paged books, categories, users   |
//! | GET / POST | `/libro/create`            | Book form / create               |
//! | GET / POST | `/libro/edit/{id}`         | Book form / update               |
//! | GET        | `/libro/delete/{id}`       | Delete a book                    |
//! | GET / POST | `/categoria/create`        | Category form / create           |
//! | GET / POST | `/categoria/edit/{id}`     | Category form / update           |
//! | GET        | `/categoria/delete/{id}`   | Delete an unused category        |
//! | GET / POST | `/usuario/create`          | User form / create               |
//! | GET / POST | `/usuario/edit/{id}`       | User form / update               |
//! | GET        | `/usuario/delete/{id}`     | Delete a user, returning books   |
//! | GET        | `/status`                  | Liveness probe                   |
//!
//! Successful writes answer `303 See Other` back to `/`. Rejected form input
//! re-renders the form with `422 Unprocessable Entity`.

pub mod error;
mod handlers;
mod state;
pub mod views;

pub use crate::error::HttpError;
pub use crate::state::AppState;
pub use crate::views::Views;
use actix_web::{App, HttpServer, middleware, web};
use shelf_config::ServerConfig;

/// Register every route on an actix-web application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use crate::handlers::{books, categories, users};

    cfg.route("/", web::get().to(handlers::index))
        .route("/status", web::get().to(handlers::status))
        .service(web::resource("/libro/create").route(web::get().to(books::new)).route(web::post().to(books::create)))
        .service(web::resource("/libro/edit/{id}").route(web::get().to(books::edit)).route(web::post().to(books::update)))
        .route("/libro/delete/{id}", web::get().to(books::delete))
        .service(
            web::resource("/categoria/create")
                .route(web::get().to(categories::new))
                .route(web::post().to(categories::create)),
        )
        .service(
            web::resource("/categoria/edit/{id}")
                .route(web::get().to(categories::edit))
                .route(web::post().to(categories::update)),
        )
        .route("/categoria/delete/{id}", web::get().to(categories::delete))
        .service(web::resource("/usuario/create").route(web::get().to(users::new)).route(web::post().to(users::create)))
        .service(web::resource("/usuario/edit/{id}").route(web::get().to(users::edit)).route(web::post().to(users::update)))
        .route("/usuario/delete/{id}", web::get().to(users::delete));
}

/// Serve the application until the process is told to stop.
pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let data = web::Data::new(state);
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(configure)
            // Registered last so it wraps everything above.
            .wrap(middleware::Logger::default())
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }
    let server = server.bind(config.bind.as_str())?;
    tracing::info!(bind = %config.bind, "listening");
    server.run().await
}
