//! # pmocast - découverte des récepteurs DIAL
//!
//! Découverte des récepteurs de cast (Chromecast, TV DIAL...) présents sur le
//! segment réseau local :
//!
//! - sondage SSDP multicast (`M-SEARCH ssdp:all`) pendant une fenêtre bornée,
//! - déduplication des URL `LOCATION` reçues,
//! - téléchargement des descriptions `/ssdp/device-desc.xml` et vérification
//!   du type `urn:dial-multiscreen-org:device:dial:1`.
//!
//! ```no_run
//! use std::time::Duration;
//! use pmocast::DeviceLocator;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), pmocast::TransportError> {
//! let devices = DeviceLocator::new()
//!     .locate_devices(Duration::from_millis(2000))
//!     .await?;
//! for device in devices {
//!     println!("{device}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod description;
pub mod device;
pub mod errors;
pub mod fetcher;
pub mod locator;
pub mod ssdp;
pub mod transport;
pub mod validator;

pub use description::DeviceDescription;
pub use device::Device;
pub use errors::{DescriptionError, FetchError, TransportError, ValidationError};
pub use fetcher::{DocumentFetcher, HttpFetcher};
pub use locator::{
    CandidateSet, DEFAULT_TIMEOUT, DeviceLocator, LocatorOptions, normalize_timeout,
    timeout_from_millis,
};
pub use ssdp::extract_device_uri;
pub use transport::{Transport, TransportFactory, UdpTransport, UdpTransportFactory};
pub use validator::{
    DIAL_DEVICE_TYPE, ValidationMode, is_candidate_uri, is_dial_device_type,
    select_confirmed_devices, validate_device,
};

pub use tokio_util::sync::CancellationToken;
