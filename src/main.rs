use std::sync::Arc;
use std::time::Duration;

use axum::{ Router, routing::{ get, post } };
use migration::MigratorTrait;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };
use voicepay::{ Config, Result };

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "voicepay=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| voicepay::AppError::Config(e.to_string()))?;
    let config = Arc::new(config);

    let db = sea_orm::Database
        ::connect(&config.database_url).await
        .map_err(voicepay::AppError::Database)?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await.map_err(voicepay::AppError::Database)?;

    let shard_timeout = Duration::from_secs(config.shard_op_timeout_seconds);
    let shards = Arc::new(voicepay::db::ShardManager::new(db.clone(), shard_timeout));
    let index = Arc::new(voicepay::db::ScheduleIndexStore::new(db.clone(), shard_timeout));

    let worker_auth = Arc::new(
        voicepay::crypto::WorkerAuth::new(
            &config.hmac_shared_secret,
            config.hmac_clock_skew_seconds
        )
    );

    let chain = Arc::new(
        voicepay::chain::ChainClient::new(
            &config.rpc_url,
            config.chain_id,
            &config.executor_private_key,
            &config.recurring_contract
        )?
    );
    tracing::info!("Chain client initialized for contract {}", config.recurring_contract);

    let auth_service = Arc::new(
        voicepay::services::AuthService::new(
            shards.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_seconds
        )
    );

    let recipient_service = Arc::new(voicepay::services::RecipientService::new(shards.clone()));

    let schedule_service = Arc::new(
        voicepay::services::ScheduleService::new(shards.clone(), index.clone())
    );

    let transaction_service = Arc::new(
        voicepay::services::TransactionService::new(shards.clone())
    );

    let parser = Arc::new(
        voicepay::services::HttpIntentParser::new(
            config.parser_url.clone(),
            Duration::from_secs(config.parser_timeout_seconds)
        )?
    );
    let intent_service = Arc::new(
        voicepay::services::IntentService::new(parser, recipient_service.clone())
    );

    let executor_client = Arc::new(
        voicepay::services::ExecutorClient::new(
            config.executor_url.clone(),
            worker_auth.clone(),
            Duration::from_secs(config.dispatch_timeout_seconds)
        )?
    );

    let bridge = Arc::new(voicepay::executor::ExecutorBridge::new(chain));

    // Background task: periodic schedule dispatcher
    let dispatcher = voicepay::dispatcher::Dispatcher::new(
        shards.clone(),
        index.clone(),
        executor_client,
        &config
    );
    tokio::spawn(async move {
        dispatcher.run().await;
    });
    tracing::info!("Dispatcher started, scanning every {}s", config.dispatch_interval_seconds);

    let app_state = voicepay::api::AppState::new(
        config.clone(),
        auth_service,
        recipient_service,
        schedule_service,
        transaction_service,
        intent_service,
        bridge,
        worker_auth
    );

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/auth/nonce", post(voicepay::api::auth::issue_nonce))
        .route("/auth/verify", post(voicepay::api::auth::verify_signature))
        .route(
            "/recipients",
            get(voicepay::api::recipients::list_recipients)
                .post(voicepay::api::recipients::add_recipient)
                .put(voicepay::api::recipients::update_recipient)
                .delete(voicepay::api::recipients::delete_recipient)
        )
        .route("/intent/parse-intent", post(voicepay::api::intent::parse_intent))
        .route("/transactions", get(voicepay::api::transactions::list_transactions))
        .route("/transactions/store", post(voicepay::api::transactions::store_transaction))
        .route("/transactions/setup-recurring", post(voicepay::api::transactions::setup_recurring))
        .route(
            "/transactions/recurring",
            get(voicepay::api::transactions::list_schedules).delete(
                voicepay::api::transactions::cancel_schedule
            )
        )
        .route("/transactions/process-recurring", post(voicepay::api::process::process_recurring))
        .with_state(app_state)
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("VoicePay control plane listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| voicepay::AppError::Internal(e.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| voicepay::AppError::Internal(e.to_string()))?;

    tracing::info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health_check() -> &'static str {
    "OK"
}
