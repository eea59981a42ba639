use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use rusqlite::Connection;
use tokio::sync::mpsc;

use backend::config::Config;
use backend::job_controller::{self, state::JobsState};
use backend::services;
use backend::services::certificates::store;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env();
    config.ensure_dirs()?;

    // Create the certificate table up front so request handlers and workers
    // can open plain connections.
    let conn = Connection::open(&config.db_path)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    store::init_db(&conn).map_err(|e| std::io::Error::other(e.to_string()))?;
    drop(conn);

    // Initialize the job registry and its updater task.
    let (tx, rx) = mpsc::channel(100);
    let jobs_state = JobsState::new(tx);
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    let bind_addr = (config.host.clone(), config.port);
    info!("Server running at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(config.clone()))
            .service(services::sessions::configure_routes())
            .service(services::generate::configure_routes())
            .service(services::certificates::configure_routes())
    })
    .bind(bind_addr)?
    .run()
    .await
}
