use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;

use laser_chess_server::config::Config;
use laser_chess_server::models::AppState;
use laser_chess_server::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = Config::parse();

    // Shared by every worker; a match's clock may fire on any of them.
    let app_state = web::Data::new(AppState::new());

    let (host, port) = config.bind_addr();
    info!("Starting laser chess server at ws://{}:{}/ws", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}
