// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers for the Set RPC.

use crate::api::gnmi::{Path, SetRequest, Update};

/// The delete, replace and update collections carried by a single Set.
///
/// # Example
///
/// ```no_run
/// use gnmi_rs::resources::SetOperations;
/// use gnmi_rs::path::parse_xpath;
///
/// let ops = SetOperations::builder()
///     .delete(parse_xpath("/interfaces/interface[name=eth0]", None)?)
///     .build();
/// # Ok::<(), gnmi_rs::GnmiError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SetOperations {
    /// Prefix applied to every path in the request.
    pub prefix: Option<Path>,
    /// Paths to delete.
    pub deletes: Vec<Path>,
    /// Values that replace existing state entirely.
    pub replaces: Vec<Update>,
    /// Values merged into existing state.
    pub updates: Vec<Update>,
}

impl SetOperations {
    /// Create a new builder for `SetOperations`.
    #[must_use]
    pub fn builder() -> SetOperationsBuilder {
        SetOperationsBuilder::default()
    }

    /// True when no operation of any kind is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.replaces.is_empty() && self.updates.is_empty()
    }
}

impl From<SetOperations> for SetRequest {
    fn from(ops: SetOperations) -> Self {
        SetRequest {
            prefix: ops.prefix,
            delete: ops.deletes,
            replace: ops.replaces,
            update: ops.updates,
            extension: Vec::new(),
        }
    }
}

/// Builder for `SetOperations`.
#[derive(Debug, Clone, Default)]
pub struct SetOperationsBuilder {
    prefix: Option<Path>,
    deletes: Vec<Path>,
    replaces: Vec<Update>,
    updates: Vec<Update>,
}

impl SetOperationsBuilder {
    /// Set the request-wide path prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: Path) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Add a path to delete.
    #[must_use]
    pub fn delete(mut self, path: Path) -> Self {
        self.deletes.push(path);
        self
    }

    /// Add a replace operation.
    #[must_use]
    pub fn replace(mut self, update: Update) -> Self {
        self.replaces.push(update);
        self
    }

    /// Add an update (merge) operation.
    #[must_use]
    pub fn update(mut self, update: Update) -> Self {
        self.updates.push(update);
        self
    }

    /// Build the operations.
    #[must_use]
    pub fn build(self) -> SetOperations {
        SetOperations {
            prefix: self.prefix,
            deletes: self.deletes,
            replaces: self.replaces,
            updates: self.updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_xpath;

    #[test]
    fn test_empty_detection() {
        assert!(SetOperations::builder().build().is_empty());

        let ops = SetOperations::builder()
            .delete(parse_xpath("/system/config/hostname", None).unwrap())
            .build();
        assert!(!ops.is_empty());
    }

    #[test]
    fn test_request_conversion() {
        let ops = SetOperations::builder()
            .delete(parse_xpath("/a", None).unwrap())
            .delete(parse_xpath("/b", None).unwrap())
            .update(Update {
                path: Some(parse_xpath("/c", None).unwrap()),
                val: None,
                duplicates: 0,
            })
            .build();

        let request: SetRequest = ops.into();
        assert_eq!(request.delete.len(), 2);
        assert_eq!(request.replace.len(), 0);
        assert_eq!(request.update.len(), 1);
        assert!(request.prefix.is_none());
    }
}
