mod classifier;
mod config;
mod error;
mod handlers;
mod models;
mod preprocess;
mod service;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing::info;

use crate::classifier::OnnxClassifier;
use crate::config::ServerConfig;
use crate::service::PredictionService;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("digit_backend=info".parse()?),
        )
        .init();

    let config = ServerConfig::load()?;
    info!(
        bind_addr = %config.bind_addr,
        model_path = %config.model_path,
        inference_timeout_ms = config.inference_timeout_ms,
        "configuration loaded"
    );

    // The classifier must be usable before any request is accepted; a
    // missing or corrupt weights file aborts startup.
    let classifier = OnnxClassifier::load(&config.model_path)
        .with_context(|| format!("cannot start without classifier at {}", config.model_path))?;

    let service = web::Data::new(PredictionService::new(classifier));
    let config_data = web::Data::new(config.clone());

    info!("server running at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(service.clone())
            .app_data(config_data.clone())
            .service(web::resource("/").route(web::get().to(handlers::index)))
            .service(
                web::resource("/predict")
                    .route(web::post().to(handlers::predict::<OnnxClassifier>)),
            )
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}
