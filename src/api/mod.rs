// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod generated;

// Re-export API modules
pub use generated::gnmi;
pub use generated::gnmi_ext;
