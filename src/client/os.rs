// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device OS variants and their capability matrices.
//!
//! Network operating systems differ in which RPCs and encodings their gNMI
//! implementations accept, and in how origins map onto YANG modules. The
//! client consults the selected variant before building each request so
//! that unsupported combinations fail locally with a clear message.

use std::str::FromStr;

use crate::error::{GnmiError, Result};
use crate::resources::Encoding;

/// Network OS running on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceOs {
    /// No vendor-specific behavior; all RPCs and encodings are attempted.
    #[default]
    Generic,
    /// Cisco IOS XR.
    IosXr,
    /// Cisco IOS XE.
    IosXe,
    /// Cisco NX-OS.
    NxOs,
}

impl DeviceOs {
    /// Whether the variant's gNMI implementation accepts Get.
    #[must_use]
    pub fn supports_get(&self) -> bool {
        !matches!(self, DeviceOs::NxOs)
    }

    /// Whether the variant's gNMI implementation accepts Set.
    #[must_use]
    pub fn supports_set(&self) -> bool {
        !matches!(self, DeviceOs::NxOs)
    }

    /// Whether the variant supports the CLI passthrough origin.
    #[must_use]
    pub fn supports_cli(&self) -> bool {
        matches!(self, DeviceOs::IosXr)
    }

    /// Default encoding for Get requests.
    #[must_use]
    pub fn default_get_encoding(&self) -> Encoding {
        match self {
            DeviceOs::Generic | DeviceOs::IosXr | DeviceOs::IosXe => Encoding::JsonIetf,
            DeviceOs::NxOs => Encoding::Json,
        }
    }

    /// Default encoding for Subscribe requests.
    #[must_use]
    pub fn default_subscribe_encoding(&self) -> Encoding {
        match self {
            DeviceOs::Generic | DeviceOs::IosXr => Encoding::Proto,
            DeviceOs::IosXe => Encoding::JsonIetf,
            DeviceOs::NxOs => Encoding::Proto,
        }
    }

    /// Whether JSON payloads in Set requests use the RFC 7951 variant.
    #[must_use]
    pub fn uses_json_ietf(&self) -> bool {
        !matches!(self, DeviceOs::NxOs)
    }

    /// Encodings the variant accepts for Get.
    #[must_use]
    pub fn get_encodings(&self) -> &'static [Encoding] {
        match self {
            DeviceOs::Generic => &[
                Encoding::Json,
                Encoding::Bytes,
                Encoding::Proto,
                Encoding::Ascii,
                Encoding::JsonIetf,
            ],
            DeviceOs::IosXr => &[Encoding::Json, Encoding::JsonIetf, Encoding::Ascii],
            DeviceOs::IosXe => &[Encoding::Json, Encoding::JsonIetf],
            DeviceOs::NxOs => &[],
        }
    }

    /// Encodings the variant accepts for Subscribe.
    #[must_use]
    pub fn subscribe_encodings(&self) -> &'static [Encoding] {
        match self {
            DeviceOs::Generic => &[
                Encoding::Json,
                Encoding::Bytes,
                Encoding::Proto,
                Encoding::Ascii,
                Encoding::JsonIetf,
            ],
            DeviceOs::IosXr => &[Encoding::Proto],
            DeviceOs::IosXe => &[Encoding::Json, Encoding::JsonIetf],
            DeviceOs::NxOs => &[Encoding::Json, Encoding::Proto],
        }
    }

    /// Reject a Get encoding outside the variant's supported set.
    pub fn validate_get_encoding(&self, encoding: Encoding) -> Result<()> {
        if self.get_encodings().contains(&encoding) {
            return Ok(());
        }
        Err(GnmiError::Validation(format!(
            "encoding {encoding} is not supported for Get on {self}; supported: {}",
            encoding_list(self.get_encodings())
        )))
    }

    /// Reject a Subscribe encoding outside the variant's supported set.
    pub fn validate_subscribe_encoding(&self, encoding: Encoding) -> Result<()> {
        if self.subscribe_encodings().contains(&encoding) {
            return Ok(());
        }
        Err(GnmiError::Validation(format!(
            "encoding {encoding} is not supported for Subscribe on {self}; supported: {}",
            encoding_list(self.subscribe_encodings())
        )))
    }

    /// Split an xpath into an origin and the remaining path according to
    /// the variant's module conventions.
    ///
    /// IOS XR and XE place the YANG module name before a colon as the
    /// origin, except for OpenConfig paths which carry no origin. NX-OS
    /// routes `Cisco-NX-OS-device` paths through the `device` origin and
    /// everything else through `openconfig`.
    #[must_use]
    pub fn resolve_origin<'a>(&self, xpath: &'a str) -> (Option<String>, &'a str) {
        let bare = xpath.trim_start_matches('/');
        match self {
            DeviceOs::Generic => (None, xpath),
            DeviceOs::IosXr | DeviceOs::IosXe => {
                if bare.starts_with("openconfig") {
                    return (None, xpath);
                }
                match split_module(xpath) {
                    Some((module, rest)) => (Some(module.to_string()), rest),
                    None => (None, xpath),
                }
            }
            DeviceOs::NxOs => {
                if bare.starts_with("Cisco-NX-OS-device") {
                    let rest = match split_module(xpath) {
                        Some((_, rest)) => rest,
                        None => xpath,
                    };
                    (Some("device".to_string()), rest)
                } else {
                    (Some("openconfig".to_string()), xpath)
                }
            }
        }
    }
}

/// Split `module:rest`, ignoring colons that appear after the first `/`
/// (which belong to key values).
fn split_module(xpath: &str) -> Option<(&str, &str)> {
    let head_end = xpath.find('/').unwrap_or(xpath.len());
    let colon = xpath[..head_end].find(':')?;
    let module = xpath[..colon].trim_start_matches('/');
    Some((module, &xpath[colon + 1..]))
}

fn encoding_list(encodings: &[Encoding]) -> String {
    if encodings.is_empty() {
        return "none".to_string();
    }
    encodings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Display for DeviceOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceOs::Generic => write!(f, "generic"),
            DeviceOs::IosXr => write!(f, "IOS XR"),
            DeviceOs::IosXe => write!(f, "IOS XE"),
            DeviceOs::NxOs => write!(f, "NX-OS"),
        }
    }
}

impl FromStr for DeviceOs {
    type Err = GnmiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
            "" | "none" | "generic" => Ok(DeviceOs::Generic),
            "ios xr" | "xr" | "iosxr" => Ok(DeviceOs::IosXr),
            "ios xe" | "xe" | "iosxe" => Ok(DeviceOs::IosXe),
            "nx os" | "nx" | "nxos" => Ok(DeviceOs::NxOs),
            other => Err(GnmiError::Validation(format!(
                "unknown device OS {other:?}; expected generic, IOS XR, IOS XE or NX-OS"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_matrix() {
        assert!(DeviceOs::Generic.supports_get());
        assert!(DeviceOs::IosXr.supports_set());
        assert!(!DeviceOs::NxOs.supports_get());
        assert!(!DeviceOs::NxOs.supports_set());
        assert!(DeviceOs::IosXr.supports_cli());
        assert!(!DeviceOs::IosXe.supports_cli());
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("".parse::<DeviceOs>().unwrap(), DeviceOs::Generic);
        assert_eq!("None".parse::<DeviceOs>().unwrap(), DeviceOs::Generic);
        assert_eq!("IOS XR".parse::<DeviceOs>().unwrap(), DeviceOs::IosXr);
        assert_eq!("ios-xe".parse::<DeviceOs>().unwrap(), DeviceOs::IosXe);
        assert_eq!("NX-OS".parse::<DeviceOs>().unwrap(), DeviceOs::NxOs);
        assert!("junos".parse::<DeviceOs>().is_err());
    }

    #[test]
    fn test_subscribe_encoding_validation() {
        assert!(DeviceOs::IosXr
            .validate_subscribe_encoding(Encoding::Proto)
            .is_ok());
        let err = DeviceOs::IosXr
            .validate_subscribe_encoding(Encoding::JsonIetf)
            .unwrap_err();
        assert!(matches!(err, GnmiError::Validation(_)));
    }

    #[test]
    fn test_xr_origin_resolution() {
        let (origin, rest) =
            DeviceOs::IosXr.resolve_origin("Cisco-IOS-XR-shellutil-cfg:/host-names");
        assert_eq!(origin.as_deref(), Some("Cisco-IOS-XR-shellutil-cfg"));
        assert_eq!(rest, "/host-names");

        let (origin, rest) = DeviceOs::IosXr.resolve_origin("/interfaces/interface");
        assert_eq!(origin, None);
        assert_eq!(rest, "/interfaces/interface");

        let (origin, _) = DeviceOs::IosXr.resolve_origin("openconfig-interfaces:/interfaces");
        assert_eq!(origin, None);
    }

    #[test]
    fn test_xr_origin_ignores_colon_in_keys() {
        let (origin, rest) =
            DeviceOs::IosXr.resolve_origin("/network-instances/network-instance[name=VRF:blue]");
        assert_eq!(origin, None);
        assert_eq!(rest, "/network-instances/network-instance[name=VRF:blue]");
    }

    #[test]
    fn test_nx_origin_resolution() {
        let (origin, rest) = DeviceOs::NxOs.resolve_origin("Cisco-NX-OS-device:/System/name");
        assert_eq!(origin.as_deref(), Some("device"));
        assert_eq!(rest, "/System/name");

        let (origin, rest) = DeviceOs::NxOs.resolve_origin("/interfaces/interface");
        assert_eq!(origin.as_deref(), Some("openconfig"));
        assert_eq!(rest, "/interfaces/interface");
    }

    #[test]
    fn test_generic_origin_untouched() {
        let (origin, rest) = DeviceOs::Generic.resolve_origin("anything:/goes");
        assert_eq!(origin, None);
        assert_eq!(rest, "anything:/goes");
    }
}
