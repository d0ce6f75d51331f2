//! Utilitaires réseau pour la découverte multicast.
//!
//! # Fonctions principales
//!
//! - [`list_ipv4_interfaces`] : adresses IPv4 non-loopback sur lesquelles
//!   rejoindre un groupe multicast
//! - [`guess_local_ip`] : devine l'adresse IP locale utilisée pour les
//!   connexions sortantes
//!
//! # Examples
//!
//! ```
//! use pmoutils::{guess_local_ip, list_ipv4_interfaces};
//!
//! println!("Adresse IP locale: {}", guess_local_ip());
//! for ip in list_ipv4_interfaces() {
//!     println!("Interface multicast: {}", ip);
//! }
//! ```
mod ip_utils;

pub use ip_utils::{guess_local_ip, list_ipv4_interfaces};
