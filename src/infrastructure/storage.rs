use crate::config::BotConfig;
use crate::services::storage::S3StorageService;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &BotConfig) -> Arc<S3StorageService> {
    info!(
        "☁️  R2 Storage: {} (Bucket: {})",
        config.r2_endpoint, config.r2_bucket
    );

    let aws_config = aws_config::from_env()
        .endpoint_url(&config.r2_endpoint)
        .region(Region::new("auto"))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            config.r2_access_key_id.clone(),
            config.r2_secret_access_key.clone(),
            None,
            None,
            "static",
        ))
        .load()
        .await;

    // R2 only serves path-style requests
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    Arc::new(S3StorageService::new(
        s3_client,
        config.r2_bucket.clone(),
        config.public_base_url.clone(),
    ))
}
