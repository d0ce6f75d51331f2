//! # SSDP - Simple Service Discovery Protocol
//!
//! Côté control point uniquement : construction du M-SEARCH envoyé en
//! multicast et extraction de l'en-tête `LOCATION` des réponses.
//!
//! ## Constantes SSDP
//!
//! - **Adresse multicast** : 239.255.255.250:1900
//! - **Cible de recherche** : `ssdp:all`
//! - **MX** : 3 secondes

use std::net::{Ipv4Addr, SocketAddrV4};

use tracing::trace;
use url::Url;

/// Adresse multicast SSDP
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port SSDP
pub const SSDP_PORT: u16 = 1900;

/// Délai de réponse maximal demandé aux devices (en secondes)
pub const SEARCH_MX: u32 = 3;

/// M-SEARCH envoyé à chaque itération de la boucle de découverte.
///
/// Casse des en-têtes et ligne vide finale à conserver : certains
/// répondeurs SSDP ignorent toute autre forme.
pub const M_SEARCH_REQUEST: &str = "M-SEARCH * HTTP/1.1\r\n\
                                    HOST:239.255.255.250:1900\r\n\
                                    ST:ssdp:all\r\n\
                                    MAN:\"ssdp:discover\"\r\n\
                                    MX:3\r\n\
                                    \r\n";

const LOCATION_HEADER: &str = "location:";

/// Destination de chaque M-SEARCH.
pub fn multicast_target() -> SocketAddrV4 {
    SocketAddrV4::new(SSDP_MULTICAST_ADDR, SSDP_PORT)
}

/// Extrait l'URL de description d'une réponse SSDP brute.
///
/// Cherche (sans tenir compte de la casse) une ligne commençant par
/// `location:`, prend la valeur jusqu'au premier `\r`, et la parse comme URL
/// absolue. Retourne `None` si l'en-tête est absent, vide ou invalide : les
/// réponses mal formées sont fréquentes avec `ssdp:all`.
pub fn extract_device_uri(raw: &str) -> Option<Url> {
    if raw.trim().is_empty() {
        return None;
    }

    let value = raw.split('\n').find_map(location_value)?;

    match Url::parse(value) {
        Ok(uri) => Some(uri),
        Err(e) => {
            trace!("Ignoring SSDP LOCATION '{}': {}", value, e);
            None
        }
    }
}

fn location_value(line: &str) -> Option<&str> {
    let prefix = line.get(..LOCATION_HEADER.len())?;
    if !prefix.eq_ignore_ascii_case(LOCATION_HEADER) {
        return None;
    }

    let rest = &line[LOCATION_HEADER.len()..];
    let end = rest.find('\r').unwrap_or(rest.len());
    let value = rest[..end].trim();
    (!value.is_empty()).then_some(value)
}
