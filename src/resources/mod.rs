// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strongly typed domain wrappers for gNMI operations.
//!
//! This module provides ergonomic, type-safe wrappers around the raw
//! protobuf types generated from the gNMI service definition.

mod get;
mod set;
mod subscribe;

pub use get::{DataType, Encoding};
pub use set::{SetOperations, SetOperationsBuilder};
pub use subscribe::{
    RequestMode, SubMode, SubscriptionSpec, SubscriptionSpecBuilder, SubscriptionStream,
};
