use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, Client};
use tracing::{debug, error};
use crate::domain::{error::BillingError, ports::FileFetcher};

/// Reads objects through an S3-compatible API (AWS, or the GCS
/// interoperability endpoint when `AWS_ENDPOINT_URL` points at it).
pub struct S3Adapter {
    client: Client,
}

impl S3Adapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FileFetcher for S3Adapter {
    async fn fetch_file(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BillingError> {
        debug!("Requesting object {}/{}", bucket, name);

        let output = self.client
            .get_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                let not_found = e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false);
                if not_found {
                    error!("Object {}/{} not found", bucket, name);
                    BillingError::Fetch(format!("object {}/{} not found", bucket, name))
                } else {
                    error!("GetObject failed for {}/{}: {}", bucket, name, DisplayErrorContext(&e));
                    BillingError::Fetch(DisplayErrorContext(&e).to_string())
                }
            })?;

        let expected = output.content_length().unwrap_or(0).max(0) as usize;
        let mut body = output.body;
        let mut buf = Vec::with_capacity(expected);
        let mut chunks = 0;

        while let Some(chunk) = body.try_next().await.map_err(|e| {
            error!("Stream error while reading {}/{} after {} chunks: {}", bucket, name, chunks, e);
            BillingError::Fetch(e.to_string())
        })? {
            chunks += 1;
            buf.extend_from_slice(&chunk);
        }

        debug!("Read {} bytes in {} chunks from {}/{}", buf.len(), chunks, bucket, name);
        Ok(buf)
    }
}
