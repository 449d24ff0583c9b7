use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use emb_exchange::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{EmailSender, FcmPush, HttpMailer, PushSender},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.user_token_expires_in,
        config.jwt.admin_token_expires_in,
    );

    // outbound transports, log-only when unconfigured
    let mailer = HttpMailer::new(config.mail.clone());
    if !mailer.is_configured() {
        log::warn!("Mail API not configured, emails will only be logged");
    }
    let mailer: Arc<dyn EmailSender> = Arc::new(mailer);
    let push: Arc<dyn PushSender> = Arc::new(FcmPush::new(config.push.clone()));

    let (delivery_queue, delivery_receiver) = DeliveryQueue::channel();
    let delivery_worker = DeliveryWorker::new(
        pool.clone(),
        mailer.clone(),
        push,
        RetryPolicy::from(&config.delivery),
    );
    tasks::spawn_all(delivery_worker, delivery_receiver);

    let config_service = ConfigService::new(pool.clone());
    let catalog_service = CatalogService::new(pool.clone());
    let admin_service = AdminService::new(pool.clone());
    if let Some(bootstrap) = &config.bootstrap_admin
        && let Some(admin) = admin_service
            .bootstrap(bootstrap)
            .await
            .expect("Failed to create bootstrap admin")
    {
        log::info!("Created first admin account {}", admin.username);
    }
    let notification_service = NotificationService::new(pool.clone(), delivery_queue.clone());
    let email_service = EmailService::new(pool.clone(), delivery_queue);
    let limit_service = LimitService::new(
        pool.clone(),
        config_service.clone(),
        config.limits.missing_limit_policy,
    );
    let transaction_service = TransactionService::new(
        pool.clone(),
        catalog_service.clone(),
        config_service.clone(),
        limit_service.clone(),
        notification_service.clone(),
        email_service,
    );
    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        admin_service.clone(),
        mailer,
    );
    let user_service = UserService::new(pool.clone());

    log::info!(
        "Starting HTTP server at {}:{} (missing monthly limit policy: {:?})",
        config.server.host,
        config.server.port,
        config.limits.missing_limit_policy
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .app_data(web::Data::new(config_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(limit_service.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .app_data(web::Data::new(transaction_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::admin_config)
                    .configure(handlers::user_config)
                    .configure(handlers::catalog_config)
                    .configure(handlers::transaction_config)
                    .configure(handlers::limit_config)
                    .configure(handlers::notification_config)
                    .configure(handlers::push_config)
                    .configure(handlers::settings_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
