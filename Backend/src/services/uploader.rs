use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;
use crate::errors::{AppError, AppResult};
use crate::utils::data_uri::ImageDataUri;

/// Upload d'image vers le stockage objet, renvoie l'URL publique
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, image: &ImageDataUri, folder: &str) -> AppResult<String>;
}

pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryUploader {
    pub fn new(client: reqwest::Client, config: CloudinaryConfig) -> Self {
        Self { client, config }
    }

    fn upload_url(&self) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/image/upload", self.config.cloud_name)
    }
}

/// Signature d'upload: paramètres triés `k=v&...` suivis du secret, en SHA-256
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, image: &ImageDataUri, folder: &str) -> AppResult<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed = [("folder", folder.to_string()), ("timestamp", timestamp.clone())];
        let signature = sign_params(&signed, &self.config.api_secret);

        let form = [
            ("file", image.as_str().to_string()),
            ("api_key", self.config.api_key.clone()),
            ("folder", folder.to_string()),
            ("timestamp", timestamp),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ];

        let response = self.client.post(self.upload_url()).form(&form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Image upload returned {}: {}", status, body)));
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::info!(folder, size = image.size, url = %uploaded.secure_url, "Image uploaded");
        Ok(uploaded.secure_url)
    }
}

/// Utilisé quand Cloudinary n'est pas configuré
pub struct DisabledUploader;

#[async_trait]
impl ImageUploader for DisabledUploader {
    async fn upload(&self, _image: &ImageDataUri, _folder: &str) -> AppResult<String> {
        Err(AppError::Config("Image uploads are not configured".to_string()))
    }
}

/// Upload optionnel: `None` si aucune image n'est fournie
pub async fn upload_optional(
    uploader: &dyn ImageUploader,
    image: Option<&ImageDataUri>,
    folder: &str,
) -> AppResult<Option<String>> {
    match image {
        Some(image) => Ok(Some(uploader.upload(image, folder).await?)),
        None => Ok(None),
    }
}
