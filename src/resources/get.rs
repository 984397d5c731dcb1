// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers for the Get RPC.

use std::str::FromStr;

use crate::api::gnmi::get_request::DataType as ProtoDataType;
use crate::api::gnmi::Encoding as ProtoEncoding;
use crate::error::GnmiError;

/// Class of data requested by a Get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    /// All data classes.
    #[default]
    All,
    /// Configuration (writable) data only.
    Config,
    /// Read-only state data.
    State,
    /// Operational data learned from interactions outside the target.
    Operational,
}

impl From<DataType> for i32 {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::All => ProtoDataType::All as i32,
            DataType::Config => ProtoDataType::Config as i32,
            DataType::State => ProtoDataType::State as i32,
            DataType::Operational => ProtoDataType::Operational as i32,
        }
    }
}

impl From<i32> for DataType {
    fn from(value: i32) -> Self {
        match value {
            1 => DataType::Config,
            2 => DataType::State,
            3 => DataType::Operational,
            _ => DataType::All,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::All => write!(f, "all"),
            DataType::Config => write!(f, "config"),
            DataType::State => write!(f, "state"),
            DataType::Operational => write!(f, "operational"),
        }
    }
}

impl FromStr for DataType {
    type Err = GnmiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(DataType::All),
            "config" => Ok(DataType::Config),
            "state" => Ok(DataType::State),
            "operational" => Ok(DataType::Operational),
            other => Err(GnmiError::Validation(format!(
                "unknown data type {other:?}; expected all, config, state or operational"
            ))),
        }
    }
}

/// Value encoding negotiated with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// JSON with implementation-defined module handling.
    Json,
    /// Opaque byte sequences.
    Bytes,
    /// Scalar protobuf values.
    Proto,
    /// ASCII text in implementation-defined format.
    Ascii,
    /// RFC 7951 JSON.
    #[default]
    JsonIetf,
}

impl From<Encoding> for i32 {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Json => ProtoEncoding::Json as i32,
            Encoding::Bytes => ProtoEncoding::Bytes as i32,
            Encoding::Proto => ProtoEncoding::Proto as i32,
            Encoding::Ascii => ProtoEncoding::Ascii as i32,
            Encoding::JsonIetf => ProtoEncoding::JsonIetf as i32,
        }
    }
}

impl From<i32> for Encoding {
    fn from(value: i32) -> Self {
        match value {
            1 => Encoding::Bytes,
            2 => Encoding::Proto,
            3 => Encoding::Ascii,
            4 => Encoding::JsonIetf,
            _ => Encoding::Json,
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Json => write!(f, "json"),
            Encoding::Bytes => write!(f, "bytes"),
            Encoding::Proto => write!(f, "proto"),
            Encoding::Ascii => write!(f, "ascii"),
            Encoding::JsonIetf => write!(f, "json_ietf"),
        }
    }
}

impl FromStr for Encoding {
    type Err = GnmiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Encoding::Json),
            "bytes" => Ok(Encoding::Bytes),
            "proto" => Ok(Encoding::Proto),
            "ascii" => Ok(Encoding::Ascii),
            "json_ietf" | "json-ietf" | "jsonietf" => Ok(Encoding::JsonIetf),
            other => Err(GnmiError::Validation(format!(
                "unknown encoding {other:?}; expected json, bytes, proto, ascii or json_ietf"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_conversion() {
        assert_eq!(i32::from(DataType::All), 0);
        assert_eq!(i32::from(DataType::Config), 1);
        assert_eq!(i32::from(DataType::State), 2);
        assert_eq!(i32::from(DataType::Operational), 3);

        assert_eq!(DataType::from(2), DataType::State);
        assert_eq!(DataType::from(99), DataType::All);
    }

    #[test]
    fn test_data_type_from_str() {
        assert_eq!("CONFIG".parse::<DataType>().unwrap(), DataType::Config);
        assert!("bogus".parse::<DataType>().is_err());
    }

    #[test]
    fn test_encoding_conversion() {
        assert_eq!(i32::from(Encoding::Json), 0);
        assert_eq!(i32::from(Encoding::Bytes), 1);
        assert_eq!(i32::from(Encoding::Proto), 2);
        assert_eq!(i32::from(Encoding::Ascii), 3);
        assert_eq!(i32::from(Encoding::JsonIetf), 4);

        assert_eq!(Encoding::from(4), Encoding::JsonIetf);
        assert_eq!(Encoding::from(99), Encoding::Json);
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("json-ietf".parse::<Encoding>().unwrap(), Encoding::JsonIetf);
        assert_eq!("PROTO".parse::<Encoding>().unwrap(), Encoding::Proto);
        assert!("xml".parse::<Encoding>().is_err());
    }
}
