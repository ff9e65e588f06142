//! S3/R2 storage service for uploaded course materials.

use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client, Config,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("File not found: {0}")]
    NotFound(String),
}

/// S3/R2 storage service for material uploads and downloads.
pub struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    /// Create a new storage service from environment variables.
    ///
    /// Required env vars:
    /// - S3_BUCKET: Bucket name
    /// - S3_REGION: Region (use "auto" for Cloudflare R2)
    /// - S3_ENDPOINT: Custom endpoint URL (required for R2)
    /// - S3_ACCESS_KEY: Access key ID
    /// - S3_SECRET_KEY: Secret access key
    pub async fn new() -> Result<Self, StorageError> {
        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| StorageError::Config("S3_BUCKET not set".to_string()))?;

        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string());

        let endpoint = std::env::var("S3_ENDPOINT").ok();

        let access_key = std::env::var("S3_ACCESS_KEY")
            .map_err(|_| StorageError::Config("S3_ACCESS_KEY not set".to_string()))?;

        let secret_key = std::env::var("S3_SECRET_KEY")
            .map_err(|_| StorageError::Config("S3_SECRET_KEY not set".to_string()))?;

        let credentials = Credentials::new(
            access_key,
            secret_key,
            None,  // session token
            None,  // expiry
            "env", // provider name
        );

        let mut config_builder = Config::builder()
            .region(Region::new(region))
            .credentials_provider(credentials)
            .behavior_version_latest();

        // Set custom endpoint for R2 or other S3-compatible services
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        let config = config_builder.build();
        let client = Client::from_conf(config);

        Ok(Self { client, bucket })
    }

    /// Upload a material file to S3. Returns the key it was stored under.
    pub async fn upload_file(
        &self,
        key: &str,
        content: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let body = ByteStream::from(content.to_vec());

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        tracing::info!("Uploaded material to S3: {}", key);
        Ok(key.to_string())
    }

    /// Download a material file from S3.
    pub async fn download_file(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("NoSuchKey") || err_str.contains("not found") {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::S3(err_str)
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    /// Delete a material file from S3.
    pub async fn delete_file(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        tracing::info!("Deleted material from S3: {}", key);
        Ok(())
    }

    /// Generate the S3 key for a user's material file.
    ///
    /// Format: `{user_id}/{file_name}`
    pub fn make_key(user_id: &str, file_name: &str) -> String {
        format!("{}/{}", user_id, file_name.trim_start_matches('/'))
    }
}
