// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers for the Subscribe RPC.

use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::api::gnmi::subscribe_response::Response;
use crate::api::gnmi::subscription_list::Mode as ProtoListMode;
use crate::api::gnmi::{
    Path, SubscribeRequest, SubscribeResponse, Subscription, SubscriptionList,
    SubscriptionMode as ProtoSubMode,
};
use crate::error::{GnmiError, Result};
use crate::resources::Encoding;

/// Lifetime of a subscription exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Values stream until the client closes the RPC.
    #[default]
    Stream,
    /// One snapshot, then the target closes the RPC.
    Once,
    /// Values on demand, driven by poll messages.
    Poll,
}

impl From<RequestMode> for i32 {
    fn from(mode: RequestMode) -> Self {
        match mode {
            RequestMode::Stream => ProtoListMode::Stream as i32,
            RequestMode::Once => ProtoListMode::Once as i32,
            RequestMode::Poll => ProtoListMode::Poll as i32,
        }
    }
}

impl std::fmt::Display for RequestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestMode::Stream => write!(f, "stream"),
            RequestMode::Once => write!(f, "once"),
            RequestMode::Poll => write!(f, "poll"),
        }
    }
}

impl FromStr for RequestMode {
    type Err = GnmiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stream" => Ok(RequestMode::Stream),
            "once" => Ok(RequestMode::Once),
            "poll" => Ok(RequestMode::Poll),
            other => Err(GnmiError::Validation(format!(
                "unknown subscription mode {other:?}; expected stream, once or poll"
            ))),
        }
    }
}

/// How values are produced for a single streamed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubMode {
    /// The target chooses between sampling and on-change.
    TargetDefined,
    /// A value is sent only when it changes.
    OnChange,
    /// Values are sent at a fixed interval.
    #[default]
    Sample,
}

impl From<SubMode> for i32 {
    fn from(mode: SubMode) -> Self {
        match mode {
            SubMode::TargetDefined => ProtoSubMode::TargetDefined as i32,
            SubMode::OnChange => ProtoSubMode::OnChange as i32,
            SubMode::Sample => ProtoSubMode::Sample as i32,
        }
    }
}

impl std::fmt::Display for SubMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubMode::TargetDefined => write!(f, "target_defined"),
            SubMode::OnChange => write!(f, "on_change"),
            SubMode::Sample => write!(f, "sample"),
        }
    }
}

impl FromStr for SubMode {
    type Err = GnmiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "target_defined" | "target-defined" => Ok(SubMode::TargetDefined),
            "on_change" | "on-change" => Ok(SubMode::OnChange),
            "sample" => Ok(SubMode::Sample),
            other => Err(GnmiError::Validation(format!(
                "unknown per-path mode {other:?}; expected target_defined, on_change or sample"
            ))),
        }
    }
}

/// A fully resolved subscription, ready to be sent as the opening message
/// of a Subscribe RPC.
#[derive(Debug, Clone)]
pub struct SubscriptionSpec {
    /// Prefix applied to every subscribed path.
    pub prefix: Option<Path>,
    /// Individual per-path subscriptions.
    pub subscriptions: Vec<Subscription>,
    /// Exchange lifetime.
    pub mode: RequestMode,
    /// Value encoding for streamed updates.
    pub encoding: Encoding,
    /// Suppress the initial snapshot, sending only subsequent updates.
    pub updates_only: bool,
    /// End the local stream once the initial sync marker arrives.
    pub sync_stop: bool,
}

impl SubscriptionSpec {
    /// Create a new builder for `SubscriptionSpec`.
    #[must_use]
    pub fn builder() -> SubscriptionSpecBuilder {
        SubscriptionSpecBuilder::default()
    }

    /// Convert into the opening request of the RPC.
    #[must_use]
    pub fn to_request(&self) -> SubscribeRequest {
        SubscribeRequest {
            request: Some(crate::api::gnmi::subscribe_request::Request::Subscribe(
                SubscriptionList {
                    prefix: self.prefix.clone(),
                    subscription: self.subscriptions.clone(),
                    use_aliases: false,
                    qos: None,
                    mode: self.mode.into(),
                    allow_aggregation: false,
                    use_models: Vec::new(),
                    encoding: self.encoding.into(),
                    updates_only: self.updates_only,
                },
            )),
            extension: Vec::new(),
        }
    }
}

/// Builder for `SubscriptionSpec`.
///
/// Paths added with [`path`](Self::path) inherit the builder's per-path
/// mode and sample interval at `build` time; fully formed `Subscription`
/// messages can be added with [`subscription`](Self::subscription) when
/// per-path settings differ.
#[derive(Debug, Clone)]
pub struct SubscriptionSpecBuilder {
    prefix: Option<Path>,
    paths: Vec<Path>,
    subscriptions: Vec<Subscription>,
    mode: RequestMode,
    sub_mode: SubMode,
    encoding: Encoding,
    sample_interval: Duration,
    suppress_redundant: bool,
    heartbeat_interval: Option<Duration>,
    updates_only: bool,
    sync_stop: bool,
}

impl Default for SubscriptionSpecBuilder {
    fn default() -> Self {
        Self {
            prefix: None,
            paths: Vec::new(),
            subscriptions: Vec::new(),
            mode: RequestMode::Stream,
            sub_mode: SubMode::Sample,
            encoding: Encoding::Proto,
            sample_interval: Duration::from_secs(10),
            suppress_redundant: false,
            heartbeat_interval: None,
            updates_only: false,
            sync_stop: false,
        }
    }
}

impl SubscriptionSpecBuilder {
    /// Set the prefix applied to every subscribed path.
    #[must_use]
    pub fn prefix(mut self, prefix: Path) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Subscribe to a path with the builder-wide per-path settings.
    #[must_use]
    pub fn path(mut self, path: Path) -> Self {
        self.paths.push(path);
        self
    }

    /// Add a fully formed subscription.
    #[must_use]
    pub fn subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    /// Set the exchange lifetime.
    #[must_use]
    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the per-path mode for paths added via [`path`](Self::path).
    #[must_use]
    pub fn sub_mode(mut self, sub_mode: SubMode) -> Self {
        self.sub_mode = sub_mode;
        self
    }

    /// Set the value encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the sample interval for sampled paths.
    #[must_use]
    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Skip samples whose value has not changed.
    #[must_use]
    pub fn suppress_redundant(mut self, suppress: bool) -> Self {
        self.suppress_redundant = suppress;
        self
    }

    /// Force a value at least once per heartbeat interval, even when
    /// redundant samples are suppressed.
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Suppress the initial snapshot.
    #[must_use]
    pub fn updates_only(mut self, updates_only: bool) -> Self {
        self.updates_only = updates_only;
        self
    }

    /// End the local stream once the initial sync marker arrives.
    #[must_use]
    pub fn sync_stop(mut self, sync_stop: bool) -> Self {
        self.sync_stop = sync_stop;
        self
    }

    /// Build the spec.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no path was subscribed.
    pub fn build(self) -> Result<SubscriptionSpec> {
        let mut subscriptions = self.subscriptions;
        for path in self.paths {
            subscriptions.push(Subscription {
                path: Some(path),
                mode: self.sub_mode.into(),
                sample_interval: self.sample_interval.as_nanos() as u64,
                suppress_redundant: self.suppress_redundant,
                heartbeat_interval: self
                    .heartbeat_interval
                    .map_or(0, |d| d.as_nanos() as u64),
            });
        }
        if subscriptions.is_empty() {
            return Err(GnmiError::Validation(
                "subscription requires at least one path".to_string(),
            ));
        }
        Ok(SubscriptionSpec {
            prefix: self.prefix,
            subscriptions,
            mode: self.mode,
            encoding: self.encoding,
            updates_only: self.updates_only,
            sync_stop: self.sync_stop,
        })
    }
}

/// Response stream produced by a Subscribe RPC.
///
/// Wraps the raw gRPC stream and, when `sync_stop` is set, terminates the
/// stream after yielding the initial sync marker.
pub struct SubscriptionStream {
    inner: tonic::Streaming<SubscribeResponse>,
    sync_stop: bool,
    done: bool,
}

impl SubscriptionStream {
    pub(crate) fn new(inner: tonic::Streaming<SubscribeResponse>, sync_stop: bool) -> Self {
        Self {
            inner,
            sync_stop,
            done: false,
        }
    }

    /// Receive the next response, or `None` once the stream ended.
    pub async fn message(&mut self) -> Result<Option<SubscribeResponse>> {
        if self.done {
            return Ok(None);
        }
        match self.inner.message().await? {
            Some(response) => {
                if self.sync_stop && is_sync_marker(&response) {
                    self.done = true;
                }
                Ok(Some(response))
            }
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

fn is_sync_marker(response: &SubscribeResponse) -> bool {
    matches!(response.response, Some(Response::SyncResponse(_)))
}

impl tokio_stream::Stream for SubscriptionStream {
    type Item = Result<SubscribeResponse>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(response))) => {
                if this.sync_stop && is_sync_marker(&response) {
                    this.done = true;
                }
                Poll::Ready(Some(Ok(response)))
            }
            Poll::Ready(Some(Err(status))) => Poll::Ready(Some(Err(status.into()))),
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gnmi::subscribe_request::Request;
    use crate::path::parse_xpath;

    #[test]
    fn test_mode_conversion() {
        assert_eq!(i32::from(RequestMode::Stream), 0);
        assert_eq!(i32::from(RequestMode::Once), 1);
        assert_eq!(i32::from(RequestMode::Poll), 2);

        assert_eq!(i32::from(SubMode::TargetDefined), 0);
        assert_eq!(i32::from(SubMode::OnChange), 1);
        assert_eq!(i32::from(SubMode::Sample), 2);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("ONCE".parse::<RequestMode>().unwrap(), RequestMode::Once);
        assert_eq!("on-change".parse::<SubMode>().unwrap(), SubMode::OnChange);
        assert!("weekly".parse::<SubMode>().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let spec = SubscriptionSpec::builder()
            .path(parse_xpath("/interfaces/interface/state/counters", None).unwrap())
            .build()
            .unwrap();

        assert_eq!(spec.mode, RequestMode::Stream);
        assert_eq!(spec.subscriptions.len(), 1);
        let sub = &spec.subscriptions[0];
        assert_eq!(sub.mode, i32::from(SubMode::Sample));
        assert_eq!(sub.sample_interval, 10_000_000_000);
        assert!(!spec.sync_stop);
    }

    #[test]
    fn test_builder_without_paths_rejected() {
        assert!(matches!(
            SubscriptionSpec::builder().build(),
            Err(GnmiError::Validation(_))
        ));
    }

    #[test]
    fn test_to_request() {
        let spec = SubscriptionSpec::builder()
            .path(parse_xpath("/system", None).unwrap())
            .mode(RequestMode::Once)
            .encoding(Encoding::JsonIetf)
            .updates_only(true)
            .build()
            .unwrap();

        let request = spec.to_request();
        let Some(Request::Subscribe(list)) = request.request else {
            panic!("expected a subscription list");
        };
        assert_eq!(list.mode, i32::from(RequestMode::Once));
        assert_eq!(list.encoding, i32::from(Encoding::JsonIetf));
        assert!(list.updates_only);
        assert_eq!(list.subscription.len(), 1);
    }

    #[test]
    fn test_heartbeat_and_suppress() {
        let spec = SubscriptionSpec::builder()
            .path(parse_xpath("/system/state", None).unwrap())
            .sub_mode(SubMode::OnChange)
            .suppress_redundant(true)
            .heartbeat_interval(Duration::from_secs(60))
            .build()
            .unwrap();

        let sub = &spec.subscriptions[0];
        assert_eq!(sub.mode, i32::from(SubMode::OnChange));
        assert!(sub.suppress_redundant);
        assert_eq!(sub.heartbeat_interval, 60_000_000_000);
    }
}
