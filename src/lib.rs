// SPDX-License-Identifier: MIT OR Apache-2.0

//! An async gNMI client.
//!
//! gNMI (gRPC Network Management Interface) is the OpenConfig protocol
//! for configuration and telemetry on network devices. This crate wraps
//! the raw gRPC surface in a typed client with a fluent builder, TLS
//! handling suited to device certificates, XPath-style path strings and
//! per-OS request conventions for Cisco IOS XR, IOS XE and NX-OS.
//!
//! ```no_run
//! use gnmi_rs::{ClientBuilder, DeviceOs};
//! use gnmi_rs::resources::DataType;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new("192.0.2.1:57400")
//!     .os(DeviceOs::IosXr)
//!     .secure_from_target()
//!     .call_authentication("admin", "admin")
//!     .construct()
//!     .await?;
//!
//! let response = client
//!     .get_xpaths(&["/interfaces/interface/state/counters"], DataType::State, None)
//!     .await?;
//! for update in gnmi_rs::flatten::flatten_get_response(&response) {
//!     println!("{} = {}", update.xpath, update.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod flatten;
pub mod path;
pub mod resources;
pub mod testkit;

pub use client::{ClientBuilder, DeviceOs, GnmiClient, Target, DEFAULT_PORT};
pub use error::{GnmiError, Result};
pub use resources::{
    DataType, Encoding, RequestMode, SetOperations, SubMode, SubscriptionSpec, SubscriptionStream,
};
