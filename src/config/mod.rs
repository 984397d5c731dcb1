// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration management for gNMI clients.
//!
//! This module parses the gnmi-cli config file, which records connection
//! details for multiple targets as named contexts.
//!
//! # Environment Variables
//!
//! - `GNMI_CONFIG` - Path to the config file (default: `~/.gnmi/config`)
//! - `GNMI_CONTEXT` - Override the active context
//!
//! # Example
//!
//! ```no_run
//! use gnmi_rs::config::GnmiConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GnmiConfig::load_with_env()?;
//!
//! if let Some(ctx) = config.active_context() {
//!     println!("Target: {}", ctx.target);
//! }
//! # Ok(())
//! # }
//! ```

mod gnmiconfig;

pub use gnmiconfig::{GnmiConfig, GnmiContext, ENV_GNMI_CONFIG, ENV_GNMI_CONTEXT};
