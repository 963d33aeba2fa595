// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, caches, background tasks and
// start the HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{start_cleanup_task, start_payout_processor, ConfigCache, NotchPayClient};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Starting findam-api...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // 5. System configuration cache (5 minute TTL)
    let config_cache = Arc::new(ConfigCache::new(300));
    log::info!("Initialized system configuration cache (TTL: 5 minutes)");

    // Background cleanup of expired cache entries (every 5 minutes)
    start_cleanup_task(config_cache.clone(), 300);

    // 6. Payment gateway client
    let notchpay = Arc::new(NotchPayClient::new(
        config.notchpay_public_key.clone(),
        config.notchpay_hash_key.clone(),
        config.notchpay_sandbox,
    ));

    // 7. Background payout processing
    start_payout_processor(pool.clone(), config.payout_interval_seconds);
    log::info!(
        "Started payout processor (interval: {} seconds)",
        config.payout_interval_seconds
    );

    // 8. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state (database pool, config, cache, gateway)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(config_cache.clone()))
            .app_data(web::Data::new(notchpay.clone()))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::properties_config)
                    .configure(handlers::bookings_config)
                    .configure(handlers::payments_config)
                    .configure(handlers::webhooks_config)
                    .configure(handlers::reviews_config)
                    .configure(handlers::messages_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind(&server_addr)?
    .run()
    .await
}
