use std::sync::Arc;
use std::time::Duration;

use poem::{EndpointExt, Route, Server, listener::TcpListener, post};
use poem_openapi::OpenApiService;
use sqlx::postgres::PgPoolOptions;
use tokio::main;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sendhub::{
    application::{
        handlers::{dispatcher::DispatchHandler, reconciler::StatusReconciler},
        services::{
            job_queue::RetryPolicy,
            rate_limit::{RateLimitConfig, RateLimiter},
        },
        usecases::{
            create_template::CreateTemplateUseCase,
            enqueue_bulk::EnqueueBulkUseCase,
            get_message::GetMessageUseCase,
            list_messages::ListMessagesUseCase,
            submit_template::SubmitTemplateUseCase,
            sync_template_approval::SyncTemplateApprovalUseCase,
        },
    },
    config::Config,
    infrastructure::{
        provider::{
            content::{ContentApiConfig, TwilioContentClient},
            twilio::{TwilioClient, TwilioConfig},
        },
        queue::jetstream::{JetstreamConfig, JetstreamQueue},
        rate_limit::redis::RedisCounterStore,
        repositories::postgres::{PostgresMessageRepository, PostgresTemplateRepository},
    },
    presentation::http::{
        endpoints::{
            health::HealthEndpoints, messages::MessagesEndpoints, root::ApiState,
            templates::TemplatesEndpoints,
        },
        webhook::provider_status_callback,
    },
};

#[main]
async fn main() -> anyhow::Result<()> {
    let config = Config::try_parse().map_err(anyhow::Error::msg)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let messages = PostgresMessageRepository::new(pool.clone());
    let templates = PostgresTemplateRepository::new(pool.clone());

    let rate_limiter = RateLimiter::new(
        Arc::new(RedisCounterStore::new(&config.redis_url).await?),
        RateLimitConfig {
            max_requests: config.rate_limit_max_requests,
            window: Duration::from_secs(config.rate_limit_window_secs),
        },
    );

    let provider = TwilioClient::new(TwilioConfig {
        account_sid: config.twilio_account_sid.clone(),
        auth_token: config.twilio_auth_token.clone(),
        from_number: config.twilio_from_number.clone(),
        base_url: config.twilio_api_base_url.clone(),
        status_callback_url: config.status_callback_url.clone(),
        send_timeout: Duration::from_secs(config.send_timeout_secs),
    })?;
    let content = TwilioContentClient::new(ContentApiConfig {
        account_sid: config.twilio_account_sid.clone(),
        auth_token: config.twilio_auth_token.clone(),
        base_url: config.twilio_content_base_url.clone(),
    })?;

    let retry = RetryPolicy {
        max_attempts: config.retry_max_attempts,
        backoff: config
            .retry_backoff_secs
            .iter()
            .map(|secs| Duration::from_secs(*secs))
            .collect(),
    };
    let (queue, worker) = JetstreamQueue::new(
        &JetstreamConfig {
            url: config.nats_url.clone(),
            stream: config.nats_stream.clone(),
            subject: config.nats_subject.clone(),
            durable: config.nats_durable.clone(),
            pull_batch: config.pull_batch,
            ack_wait_seconds: config.ack_wait_seconds,
        },
        retry,
    )
    .await?;

    let handler = Arc::new(DispatchHandler::new(
        rate_limiter,
        messages.clone(),
        provider,
    ));
    let _dispatcher = worker.spawn(handler);

    let reconciler = Arc::new(StatusReconciler::new(messages.clone()));

    let state = Arc::new(ApiState {
        enqueue_bulk_usecase: Arc::new(EnqueueBulkUseCase::new(queue)),
        get_message_usecase: Arc::new(GetMessageUseCase::new(messages.clone())),
        list_messages_usecase: Arc::new(ListMessagesUseCase::new(messages)),
        create_template_usecase: Arc::new(CreateTemplateUseCase::new(
            templates.clone(),
            content.clone(),
        )),
        submit_template_usecase: Arc::new(SubmitTemplateUseCase::new(
            templates.clone(),
            content.clone(),
        )),
        sync_template_approval_usecase: Arc::new(SyncTemplateApprovalUseCase::new(
            templates, content,
        )),
    });

    let api_service = OpenApiService::new(
        (
            HealthEndpoints,
            MessagesEndpoints::new(state.clone()),
            TemplatesEndpoints::new(state),
        ),
        "Sendhub API",
        "0.1.0",
    )
    .server(format!("http://localhost:{}/api", config.port));
    let ui = api_service.swagger_ui();

    let app = Route::new()
        .nest("/api", api_service)
        .at("/webhooks/provider/status", post(provider_status_callback))
        .nest("/", ui)
        .data(reconciler);

    info!(port = config.port, "starting server");
    Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run(app)
        .await?;
    Ok(())
}
