// SPDX-License-Identifier: MIT OR Apache-2.0

// Modules produced by build.rs from the vendored proto definitions.
pub mod gnmi;
pub mod gnmi_ext;
