//! Découverte des récepteurs DIAL.
//!
//! Une découverte se déroule en deux temps :
//!
//! 1. **Fenêtre de sondage** : un M-SEARCH est renvoyé en boucle vers le
//!    groupe multicast jusqu'à l'échéance, pendant qu'un collecteur vide le
//!    canal des datagrammes reçus et accumule les URL `LOCATION` uniques.
//!    Les deux futures ne partagent que ce canal et l'échéance.
//! 2. **Validation** : une fois la fenêtre fermée et l'endpoint libéré, les
//!    candidats sont filtrés puis validés (voir [`crate::validator`]).

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use pmoconfig::Config;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::device::Device;
use crate::errors::TransportError;
use crate::fetcher::{DocumentFetcher, HttpFetcher};
use crate::ssdp::{M_SEARCH_REQUEST, SSDP_MULTICAST_ADDR, extract_device_uri, multicast_target};
use crate::transport::{Transport, TransportFactory, UdpTransportFactory};
use crate::validator::{ValidationMode, select_confirmed_devices};

/// Durée de découverte utilisée quand celle demandée est nulle.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

// Échéance plafond (30 ans) quand `now + timeout` n'est pas représentable
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Remplace un timeout nul par [`DEFAULT_TIMEOUT`].
pub fn normalize_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_TIMEOUT
    } else {
        timeout
    }
}

/// Convertit un timeout signé en millisecondes (configuration, CLI).
/// Toute valeur négative ou nulle donne [`DEFAULT_TIMEOUT`].
pub fn timeout_from_millis(millis: i64) -> Duration {
    if millis <= 0 {
        DEFAULT_TIMEOUT
    } else {
        Duration::from_millis(millis as u64)
    }
}

/// Réglages d'une découverte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Adresse locale de l'endpoint UDP (port éphémère par défaut)
    pub bind_address: SocketAddrV4,
    /// Pause entre deux M-SEARCH ; zéro = renvoi immédiat jusqu'à l'échéance
    pub send_interval: Duration,
    pub validation: ValidationMode,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            bind_address: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
            send_interval: Duration::ZERO,
            validation: ValidationMode::Sequential,
        }
    }
}

impl LocatorOptions {
    pub fn from_config(config: &Config) -> Self {
        let validation = if config.get_concurrent_validation() {
            ValidationMode::Concurrent
        } else {
            ValidationMode::Sequential
        };

        Self {
            bind_address: config.get_bind_address(),
            send_interval: Duration::from_millis(config.get_send_interval_ms() as u64),
            validation,
        }
    }
}

/// URL candidates uniques, dans l'ordre d'arrivée.
#[derive(Debug, Default)]
pub struct CandidateSet {
    order: Vec<Url>,
    seen: HashSet<Url>,
}

impl CandidateSet {
    /// Retourne `false` si l'URL était déjà connue.
    pub fn insert(&mut self, uri: Url) -> bool {
        if self.seen.contains(&uri) {
            return false;
        }
        self.seen.insert(uri.clone());
        self.order.push(uri);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.order.iter()
    }

    pub fn into_urls(self) -> Vec<Url> {
        self.order
    }
}

/// Localise les récepteurs DIAL du segment réseau local via SSDP.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use pmocast::DeviceLocator;
///
/// # async fn run() -> Result<(), pmocast::TransportError> {
/// let locator = DeviceLocator::new();
/// for device in locator.locate_devices(Duration::from_secs(3)).await? {
///     println!("{} -> {}", device.friendly_name, device.device_uri);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DeviceLocator<T = UdpTransportFactory, F = HttpFetcher> {
    transports: T,
    fetcher: F,
    options: LocatorOptions,
}

impl DeviceLocator {
    pub fn new() -> Self {
        Self::with_parts(
            UdpTransportFactory::default(),
            HttpFetcher::new(),
            LocatorOptions::default(),
        )
    }

    pub fn from_config(config: &Config) -> Self {
        let transports = UdpTransportFactory {
            multicast_loop: config.get_multicast_loop(),
        };
        Self::with_parts(
            transports,
            HttpFetcher::new(),
            LocatorOptions::from_config(config),
        )
    }
}

impl Default for DeviceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> DeviceLocator<T, F>
where
    T: TransportFactory,
    F: DocumentFetcher,
{
    pub fn with_parts(transports: T, fetcher: F, options: LocatorOptions) -> Self {
        Self {
            transports,
            fetcher,
            options,
        }
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Lance une découverte et retourne les devices confirmés.
    ///
    /// Un `timeout` nul est remplacé par [`DEFAULT_TIMEOUT`]. Le même timeout
    /// borne la fenêtre de sondage puis chaque téléchargement de description.
    /// Seules les erreurs d'initialisation du transport sont remontées ;
    /// aucun device trouvé donne une liste vide.
    pub async fn locate_devices(&self, timeout: Duration) -> Result<Vec<Device>, TransportError> {
        self.locate_devices_with_cancel(timeout, CancellationToken::new())
            .await
    }

    /// Comme [`locate_devices`](Self::locate_devices), mais `cancel` peut
    /// fermer la fenêtre de sondage avant l'échéance. Les candidats déjà
    /// reçus sont quand même validés.
    pub async fn locate_devices_with_cancel(
        &self,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<Vec<Device>, TransportError> {
        let timeout = normalize_timeout(timeout);
        info!("🔍 Searching DIAL devices for {} ms", timeout.as_millis());

        let mut endpoint = self.transports.create();
        let probed = self.probe(&mut endpoint, timeout, &cancel).await;
        endpoint.close().await;
        let candidates = probed?;

        let devices =
            select_confirmed_devices(&self.fetcher, &candidates, timeout, self.options.validation)
                .await;

        info!(
            "✅ {} DIAL device(s) confirmed out of {} location(s)",
            devices.len(),
            candidates.len()
        );
        Ok(devices)
    }

    async fn probe(
        &self,
        endpoint: &mut T::Transport,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<Url>, TransportError> {
        endpoint.bind(self.options.bind_address).await?;
        endpoint.join_multicast_group(SSDP_MULTICAST_ADDR).await?;
        let incoming = endpoint.incoming()?;

        let deadline = probe_deadline(Instant::now(), timeout);
        let endpoint = &*endpoint;
        let (sent, candidates) = tokio::join!(
            send_searches(endpoint, deadline, self.options.send_interval, cancel),
            collect_candidates(incoming, deadline, cancel),
        );

        debug!(
            "Probe window closed: {} M-SEARCH sent, {} unique location(s)",
            sent,
            candidates.len()
        );
        Ok(candidates.into_urls())
    }
}

/// Échéance de la fenêtre de sondage, plafonnée pour les timeouts énormes.
fn probe_deadline(now: Instant, timeout: Duration) -> Instant {
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Renvoie le M-SEARCH jusqu'à l'échéance. Au moins un envoi est fait.
async fn send_searches<P>(
    endpoint: &P,
    deadline: Instant,
    interval: Duration,
    cancel: &CancellationToken,
) -> usize
where
    P: Transport + ?Sized,
{
    let target = multicast_target();
    let mut sent = 0usize;
    let mut failures = 0usize;

    loop {
        match endpoint.send_to(target, M_SEARCH_REQUEST).await {
            Ok(()) => sent += 1,
            Err(e) => {
                if failures == 0 {
                    warn!("❌ Failed to send M-SEARCH: {}", e);
                } else {
                    trace!("M-SEARCH send failure #{}: {}", failures + 1, e);
                }
                failures += 1;
            }
        }

        if Instant::now() >= deadline || cancel.is_cancelled() {
            break;
        }

        if interval.is_zero() {
            // Laisse le collecteur avancer entre deux envois
            tokio::task::yield_now().await;
        } else {
            let wake = (Instant::now() + interval).min(deadline);
            tokio::select! {
                _ = sleep_until(wake) => {}
                _ = cancel.cancelled() => break,
            }
        }

        if Instant::now() >= deadline {
            break;
        }
    }

    if failures > 0 {
        warn!("{} M-SEARCH could not be sent", failures);
    }
    sent
}

/// Vide le canal des datagrammes jusqu'à l'échéance.
///
/// Les datagrammes déjà en file sont lus avant de tester l'échéance ou
/// l'annulation : une réponse arrivée dans la fenêtre n'est jamais perdue.
///
/// Le récepteur est consommé : à la sortie, le handler est désenregistré et
/// l'ensemble retourné n'est plus modifié.
async fn collect_candidates(
    mut incoming: mpsc::UnboundedReceiver<String>,
    deadline: Instant,
    cancel: &CancellationToken,
) -> CandidateSet {
    let mut candidates = CandidateSet::default();

    loop {
        tokio::select! {
            biased;

            message = incoming.recv() => match message {
                Some(raw) => record_location(&mut candidates, &raw),
                None => {
                    debug!("Datagram channel closed before deadline");
                    break;
                }
            },
            _ = sleep_until(deadline) => break,
            _ = cancel.cancelled() => {
                debug!("Discovery cancelled, closing probe window");
                break;
            }
        }
    }

    candidates
}

fn record_location(candidates: &mut CandidateSet, raw: &str) {
    if let Some(uri) = extract_device_uri(raw) {
        if candidates.insert(uri.clone()) {
            debug!("New SSDP location: {}", uri);
        }
    }
}
