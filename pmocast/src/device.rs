//! Représentation d'un récepteur découvert

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::description::DeviceDescription;

/// Un récepteur DIAL découvert sur le réseau.
///
/// L'identité d'un device est l'URL de son document de description.
/// Un device est créé non validé dès qu'une URL inédite est reçue, puis
/// confirmé une seule fois lorsque sa description a été lue et reconnue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// URL absolue du document de description (clé d'identité)
    pub device_uri: Url,

    /// Nom lisible ; peut rester vide si la description n'en donne pas
    pub friendly_name: String,

    /// UDN annoncé par la description, si présent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(skip)]
    validated: bool,
}

impl Device {
    /// Crée un device non validé pour cette URL de description.
    pub fn new(device_uri: Url) -> Self {
        Self {
            device_uri,
            friendly_name: String::new(),
            udn: None,
            model_name: None,
            manufacturer: None,
            validated: false,
        }
    }

    /// Renseigne le device à partir de sa description validée.
    pub fn confirm(mut self, description: DeviceDescription) -> Self {
        self.friendly_name = description.friendly_name;
        self.udn = description.udn;
        self.model_name = description.model_name;
        self.manufacturer = description.manufacturer;
        self.validated = true;
        self
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Hôte de l'URL de description, en pratique l'adresse du récepteur.
    pub fn host(&self) -> Option<&str> {
        self.device_uri.host_str()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.validated {
            write!(f, "<unvalidated> ({})", self.device_uri)
        } else if self.friendly_name.is_empty() {
            write!(f, "<unnamed> ({})", self.device_uri)
        } else {
            write!(f, "{} ({})", self.friendly_name, self.device_uri)
        }
    }
}
