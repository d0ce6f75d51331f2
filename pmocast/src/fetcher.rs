//! Téléchargement des documents de description.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::errors::FetchError;

/// Récupère le corps texte d'une URL.
///
/// Toutes les défaillances (timeout, connexion, statut non 2xx, corps vide)
/// sont équivalentes pour le locator : le candidat est écarté.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_text(&self, uri: &Url, timeout: Duration) -> Result<String, FetchError>;
}

/// Fetcher HTTP adossé à un client reqwest partagé.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_text(&self, uri: &Url, timeout: Duration) -> Result<String, FetchError> {
        debug!("Fetching device description at {}", uri);

        let response = self
            .client
            .get(uri.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(from_reqwest)?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(body)
    }
}

fn from_reqwest(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(e)
    }
}
