//! Lecture des documents de description UPnP (`device-desc.xml`).

use serde::Deserialize;

use crate::errors::DescriptionError;

/// Champs d'une description utiles au locator.
///
/// `friendly_name` est vide quand le document n'en annonce pas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub udn: Option<String>,
    pub model_name: Option<String>,
    pub manufacturer: Option<String>,
}

// <root xmlns="urn:schemas-upnp-org:device-1-0"><device>...</device></root>
#[derive(Debug, Deserialize)]
struct DescriptionRoot {
    #[serde(default)]
    device: Option<RootDevice>,
}

#[derive(Debug, Default, Deserialize)]
struct RootDevice {
    #[serde(rename = "deviceType", default)]
    device_type: Option<String>,
    #[serde(rename = "friendlyName", default)]
    friendly_name: Option<String>,
    #[serde(rename = "UDN", default)]
    udn: Option<String>,
    #[serde(rename = "modelName", default)]
    model_name: Option<String>,
    #[serde(default)]
    manufacturer: Option<String>,
}

impl DeviceDescription {
    /// Parse une description XML.
    ///
    /// Seul le device racine est lu ; les devices imbriqués (`deviceList`)
    /// sont ignorés. Seul `deviceType` est obligatoire.
    pub fn parse(xml: &str) -> Result<Self, DescriptionError> {
        let root: DescriptionRoot = quick_xml::de::from_str(xml)?;
        let device = root.device.ok_or(DescriptionError::MissingField("device"))?;

        let device_type =
            non_empty(device.device_type).ok_or(DescriptionError::MissingField("deviceType"))?;
        let friendly_name = non_empty(device.friendly_name).unwrap_or_default();

        Ok(Self {
            device_type,
            friendly_name,
            udn: non_empty(device.udn),
            model_name: non_empty(device.model_name),
            manufacturer: non_empty(device.manufacturer),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROMECAST_DESC: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion>
    <major>1</major>
    <minor>0</minor>
  </specVersion>
  <URLBase>http://10.0.0.5:8008</URLBase>
  <device>
    <deviceType>urn:dial-multiscreen-org:device:dial:1</deviceType>
    <friendlyName>Living Room TV</friendlyName>
    <manufacturer>Google Inc.</manufacturer>
    <modelName>Eureka Dongle</modelName>
    <UDN>uuid:3e1cc7c3-f2a2-4b5c-8a4f-0123456789ab</UDN>
    <iconList>
      <icon>
        <mimetype>image/png</mimetype>
        <width>98</width>
        <height>55</height>
        <depth>32</depth>
        <url>/setup/icon.png</url>
      </icon>
    </iconList>
    <serviceList>
      <service>
        <serviceType>urn:dial-multiscreen-org:service:dial:1</serviceType>
        <serviceId>urn:dial-multiscreen-org:serviceId:dial</serviceId>
        <controlURL>/ssdp/notfound</controlURL>
        <eventSubURL>/ssdp/notfound</eventSubURL>
        <SCPDURL>/ssdp/notfound</SCPDURL>
      </service>
    </serviceList>
  </device>
</root>"#;

    #[test]
    fn test_parse_chromecast_description() {
        let desc = DeviceDescription::parse(CHROMECAST_DESC).unwrap();
        assert_eq!(desc.device_type, "urn:dial-multiscreen-org:device:dial:1");
        assert_eq!(desc.friendly_name, "Living Room TV");
        assert_eq!(desc.manufacturer.as_deref(), Some("Google Inc."));
        assert_eq!(desc.model_name.as_deref(), Some("Eureka Dongle"));
        assert_eq!(
            desc.udn.as_deref(),
            Some("uuid:3e1cc7c3-f2a2-4b5c-8a4f-0123456789ab")
        );
    }

    #[test]
    fn test_parse_escaped_friendly_name() {
        let xml = "<root><device>\
            <deviceType>urn:dial-multiscreen-org:device:dial:1</deviceType>\
            <friendlyName>Tom &amp; Jerry</friendlyName>\
            </device></root>";
        let desc = DeviceDescription::parse(xml).unwrap();
        assert_eq!(desc.friendly_name, "Tom & Jerry");
        assert_eq!(desc.udn, None);
    }

    #[test]
    fn test_missing_friendly_name_is_empty() {
        let xml = "<root><device>\
            <deviceType>urn:dial-multiscreen-org:device:dial:1</deviceType>\
            </device></root>";
        let desc = DeviceDescription::parse(xml).unwrap();
        assert_eq!(desc.device_type, "urn:dial-multiscreen-org:device:dial:1");
        assert_eq!(desc.friendly_name, "");

        let xml = "<root><device>\
            <deviceType>urn:dial-multiscreen-org:device:dial:1</deviceType>\
            <friendlyName>   </friendlyName>\
            </device></root>";
        assert_eq!(DeviceDescription::parse(xml).unwrap().friendly_name, "");
    }

    #[test]
    fn test_missing_device_type() {
        let xml = "<root><device><friendlyName>Salon</friendlyName></device></root>";
        let err = DeviceDescription::parse(xml).unwrap_err();
        assert!(matches!(err, DescriptionError::MissingField("deviceType")));
    }

    #[test]
    fn test_missing_device_element() {
        let xml = "<root><specVersion><major>1</major></specVersion></root>";
        let err = DeviceDescription::parse(xml).unwrap_err();
        assert!(matches!(err, DescriptionError::MissingField("device")));
    }

    #[test]
    fn test_malformed_document() {
        assert!(DeviceDescription::parse("<root><device><deviceType>").is_err());
    }
}
