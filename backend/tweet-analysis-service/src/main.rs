use std::path::Path;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tweet_analysis_service::config::Config;
use tweet_analysis_service::handlers::{self, AppState};
use tweet_analysis_service::query::LimitPolicy;
use tweet_analysis_service::services::{
    ensure_index, post_index_mapping, DatasetLoader, ElasticsearchStore, EmotionClassifier,
    HttpEmotionModel, PostStore,
};

fn init_logging(format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());

    if format.eq_ignore_ascii_case("pretty") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_target(true),
            )
            .init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;
    init_logging(&config.log_format);

    info!(
        es_host = %config.es_host,
        es_index = %config.es_index,
        classifier_url = %config.classifier_url,
        "starting tweet-analysis-service"
    );

    let store: Arc<dyn PostStore> = Arc::new(
        ElasticsearchStore::connect(&config).context("failed to build search index client")?,
    );

    match ensure_index(store.as_ref(), &post_index_mapping()).await {
        Ok(true) => {
            info!(index = %config.es_index, "created post index");
            if config.seed_on_index_create {
                seed_dataset(store.clone(), &config.dataset_path).await;
            }
        }
        Ok(false) => info!(index = %config.es_index, "post index already exists"),
        // The service still starts; /health reports the outage.
        Err(e) => warn!(error = %e, "could not verify post index"),
    }

    let model = HttpEmotionModel::from_config(&config)
        .context("failed to build emotion model client")?;
    let classifier = Arc::new(EmotionClassifier::new(
        Arc::new(model),
        resilience::inference_config(config.classifier_timeout(), config.classifier_max_retries),
    ));

    let state = web::Data::new(AppState::new(
        store,
        classifier,
        LimitPolicy::new(config.default_limit, config.max_limit),
        config.classification_concurrency,
        config.dataset_path.clone(),
    ));

    let bind_address = (config.host.clone(), config.port);
    info!(host = %config.host, port = config.port, "HTTP server listening");

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(bind_address)
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .shutdown_timeout(30)
    .run()
    .await
    .context("HTTP server error")?;

    info!("tweet-analysis-service stopped");
    Ok(())
}

/// One-shot load after index creation. Failures are logged, startup continues.
async fn seed_dataset(store: Arc<dyn PostStore>, dataset_path: &str) {
    match DatasetLoader::new(store)
        .load_file(Path::new(dataset_path))
        .await
    {
        Ok(report) => info!(
            indexed = report.indexed,
            failed = report.failed,
            "seeded post index from dataset"
        ),
        Err(e) => warn!(error = %e, "dataset seeding skipped"),
    }
}
