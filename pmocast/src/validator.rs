//! Filtrage et validation des candidats SSDP.
//!
//! Une URL candidate n'est gardée que si son chemin se termine par le chemin
//! conventionnel des descriptions DIAL ; le document est alors téléchargé et
//! son `deviceType` comparé à [`DIAL_DEVICE_TYPE`]. Un échec ne concerne
//! qu'un candidat, qui est simplement omis.

use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info};
use url::Url;

use crate::description::DeviceDescription;
use crate::device::Device;
use crate::errors::{FetchError, ValidationError};
use crate::fetcher::DocumentFetcher;

/// Type UPnP des récepteurs DIAL (Chromecast & co)
pub const DIAL_DEVICE_TYPE: &str = "urn:dial-multiscreen-org:device:dial:1";

/// Chemin conventionnel du document de description des récepteurs DIAL
pub const DEVICE_DESCRIPTION_SUFFIX: &str = "/ssdp/device-desc.xml";

/// Mode de validation des candidats d'une session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Une requête à la fois, dans l'ordre de découverte.
    #[default]
    Sequential,
    /// Toutes les requêtes en parallèle ; l'ordre de découverte est conservé.
    Concurrent,
}

pub fn is_candidate_uri(uri: &Url) -> bool {
    uri.path().ends_with(DEVICE_DESCRIPTION_SUFFIX)
}

pub fn is_dial_device_type(device_type: &str) -> bool {
    device_type.eq_ignore_ascii_case(DIAL_DEVICE_TYPE)
}

/// Télécharge et vérifie la description d'un candidat.
///
/// `timeout` est le timeout de la découverte elle-même, réutilisé tel quel.
pub async fn validate_device<F>(
    fetcher: &F,
    uri: &Url,
    timeout: Duration,
) -> Result<Device, ValidationError>
where
    F: DocumentFetcher + ?Sized,
{
    let body = fetcher.fetch_text(uri, timeout).await?;
    if body.trim().is_empty() {
        return Err(FetchError::EmptyBody.into());
    }

    let description = DeviceDescription::parse(&body)?;
    if !is_dial_device_type(&description.device_type) {
        return Err(ValidationError::DeviceTypeMismatch {
            found: description.device_type,
        });
    }

    Ok(Device::new(uri.clone()).confirm(description))
}

/// Réduit les candidats d'une session aux devices confirmés.
///
/// `candidates` est déjà dédupliqué par URL : aucune URL n'est téléchargée
/// deux fois. Le résultat suit l'ordre des candidats.
pub async fn select_confirmed_devices<F>(
    fetcher: &F,
    candidates: &[Url],
    timeout: Duration,
    mode: ValidationMode,
) -> Vec<Device>
where
    F: DocumentFetcher + ?Sized,
{
    let retained: Vec<&Url> = candidates
        .iter()
        .filter(|uri| {
            let keep = is_candidate_uri(uri);
            if !keep {
                debug!("Skipping non DIAL location {}", uri);
            }
            keep
        })
        .collect();

    debug!(
        "{} candidate(s) out of {} to validate ({:?})",
        retained.len(),
        candidates.len(),
        mode
    );

    let results = match mode {
        ValidationMode::Sequential => {
            let mut results = Vec::with_capacity(retained.len());
            for uri in &retained {
                results.push(validate_device(fetcher, uri, timeout).await);
            }
            results
        }
        ValidationMode::Concurrent => {
            join_all(
                retained
                    .iter()
                    .map(|uri| validate_device(fetcher, uri, timeout)),
            )
            .await
        }
    };

    retained
        .into_iter()
        .zip(results)
        .filter_map(|(uri, result)| match result {
            Ok(device) => {
                info!("✅ DIAL device confirmed: {}", device);
                Some(device)
            }
            Err(e) => {
                debug!("Dropping candidate {}: {}", uri, e);
                None
            }
        })
        .collect()
}
