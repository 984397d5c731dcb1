// SPDX-License-Identifier: MIT OR Apache-2.0

//! The gNMI client and its construction.

mod builder;
mod os;
mod target;
mod tls;

pub use builder::ClientBuilder;
pub use os::DeviceOs;
pub use target::{Target, DEFAULT_PORT};

use serde_json::Value as JsonValue;
use tonic::metadata::MetadataValue;
use tonic::transport::Channel;
use tracing::debug;

use crate::api::gnmi::g_nmi_client::GNmiClient;
use crate::api::gnmi::{
    typed_value, CapabilityRequest, CapabilityResponse, GetRequest, GetResponse, Path,
    SetResponse, SubscribeRequest, TypedValue, Update,
};
use crate::error::{GnmiError, Result};
use crate::path::{parse_cli, parse_xpath};
use crate::resources::{
    DataType, Encoding, SetOperations, SubscriptionSpec, SubscriptionSpecBuilder,
    SubscriptionStream,
};

/// A connected gNMI client.
///
/// Cheap to clone; all clones share the underlying channel. Build one
/// with [`ClientBuilder`].
#[derive(Clone, Debug)]
pub struct GnmiClient {
    channel: Channel,
    os: DeviceOs,
    metadata: Vec<(&'static str, String)>,
}

impl GnmiClient {
    /// Start building a client for `target`.
    #[must_use]
    pub fn builder(target: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(target)
    }

    pub(crate) fn from_parts(
        channel: Channel,
        os: DeviceOs,
        metadata: Vec<(&'static str, String)>,
    ) -> Self {
        Self {
            channel,
            os,
            metadata,
        }
    }

    /// The OS variant this client was built for.
    #[must_use]
    pub fn os(&self) -> DeviceOs {
        self.os
    }

    fn stub(&self) -> GNmiClient<Channel> {
        GNmiClient::new(self.channel.clone())
    }

    /// Wrap a message in a request carrying the configured credentials.
    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        for (key, value) in &self.metadata {
            if let Ok(value) = MetadataValue::try_from(value.as_str()) {
                request.metadata_mut().insert(*key, value);
            }
        }
        request
    }

    /// Retrieve the target's capabilities.
    pub async fn capabilities(&self) -> Result<CapabilityResponse> {
        debug!("sending CapabilityRequest");
        let response = self
            .stub()
            .capabilities(self.request(CapabilityRequest::default()))
            .await?;
        Ok(response.into_inner())
    }

    /// Snapshot the data tree under the given paths.
    pub async fn get(
        &self,
        paths: Vec<Path>,
        data_type: DataType,
        encoding: Encoding,
    ) -> Result<GetResponse> {
        if !self.os.supports_get() {
            return Err(GnmiError::Unsupported(format!(
                "{} does not implement Get",
                self.os
            )));
        }
        if paths.is_empty() {
            return Err(GnmiError::Validation(
                "Get requires at least one path".to_string(),
            ));
        }
        self.os.validate_get_encoding(encoding)?;

        let request = GetRequest {
            prefix: None,
            path: paths,
            r#type: data_type.into(),
            encoding: encoding.into(),
            use_models: Vec::new(),
            extension: Vec::new(),
        };
        debug!(?data_type, %encoding, "sending GetRequest");
        let response = self.stub().get(self.request(request)).await?;
        Ok(response.into_inner())
    }

    /// Snapshot the data tree under XPath-style path strings, applying
    /// the OS variant's origin conventions.
    pub async fn get_xpaths(
        &self,
        xpaths: &[&str],
        data_type: DataType,
        encoding: Option<Encoding>,
    ) -> Result<GetResponse> {
        let paths = self.parse_os_xpaths(xpaths)?;
        let encoding = encoding.unwrap_or_else(|| self.os.default_get_encoding());
        self.get(paths, data_type, encoding).await
    }

    /// Run CLI commands through the gNMI CLI passthrough origin.
    pub async fn get_cli(&self, commands: &[&str]) -> Result<GetResponse> {
        if !self.os.supports_cli() {
            return Err(GnmiError::Unsupported(format!(
                "{} does not implement the CLI passthrough",
                self.os
            )));
        }
        if commands.is_empty() {
            return Err(GnmiError::Validation(
                "get_cli requires at least one command".to_string(),
            ));
        }
        let paths = commands
            .iter()
            .map(|command| parse_cli(command))
            .collect::<Result<Vec<_>>>()?;
        let request = GetRequest {
            prefix: None,
            path: paths,
            r#type: DataType::All.into(),
            encoding: Encoding::Ascii.into(),
            use_models: Vec::new(),
            extension: Vec::new(),
        };
        debug!(commands = commands.len(), "sending CLI GetRequest");
        let response = self.stub().get(self.request(request)).await?;
        Ok(response.into_inner())
    }

    /// Apply a set of delete, replace and update operations.
    pub async fn set(&self, operations: SetOperations) -> Result<SetResponse> {
        if !self.os.supports_set() {
            return Err(GnmiError::Unsupported(format!(
                "{} does not implement Set",
                self.os
            )));
        }
        if operations.is_empty() {
            return Err(GnmiError::Validation(
                "Set requires at least one delete, replace or update".to_string(),
            ));
        }
        debug!(
            deletes = operations.deletes.len(),
            replaces = operations.replaces.len(),
            updates = operations.updates.len(),
            "sending SetRequest"
        );
        let request: crate::api::gnmi::SetRequest = operations.into();
        let response = self.stub().set(self.request(request)).await?;
        Ok(response.into_inner())
    }

    /// Apply JSON configuration documents as update and replace
    /// operations. Each document must hold a single top-level key naming
    /// the target container, module-prefixed where the OS variant expects
    /// it.
    pub async fn set_json(&self, updates: &[&str], replaces: &[&str]) -> Result<SetResponse> {
        let mut builder = SetOperations::builder();
        for update in self.json_updates(updates)? {
            builder = builder.update(update);
        }
        for replace in self.json_updates(replaces)? {
            builder = builder.replace(replace);
        }
        self.set(builder.build()).await
    }

    /// Delete the subtrees named by XPath-style path strings, optionally
    /// joined under a common prefix.
    pub async fn delete_xpaths(&self, xpaths: &[&str], prefix: Option<&str>) -> Result<SetResponse> {
        let mut builder = SetOperations::builder();
        if let Some(prefix) = prefix {
            let (origin, rest) = self.os.resolve_origin(prefix);
            builder = builder.prefix(parse_xpath(rest, origin.as_deref())?);
        }
        for path in self.parse_os_xpaths(xpaths)? {
            builder = builder.delete(path);
        }
        self.set(builder.build()).await
    }

    /// Open a subscription described by a [`SubscriptionSpec`].
    pub async fn subscribe(&self, spec: SubscriptionSpec) -> Result<SubscriptionStream> {
        self.os.validate_subscribe_encoding(spec.encoding)?;
        let sync_stop = spec.sync_stop;
        debug!(
            subscriptions = spec.subscriptions.len(),
            mode = %spec.mode,
            encoding = %spec.encoding,
            "sending SubscribeRequest"
        );
        self.subscribe_raw(vec![spec.to_request()], sync_stop).await
    }

    /// Subscribe to XPath-style path strings with the OS variant's
    /// defaults: STREAM lifetime, SAMPLE mode every ten seconds.
    pub async fn subscribe_xpaths(&self, xpaths: &[&str]) -> Result<SubscriptionStream> {
        let spec = self.subscription_for(xpaths)?.build()?;
        self.subscribe(spec).await
    }

    /// Pre-seeded [`SubscriptionSpecBuilder`] for xpaths, using the OS
    /// variant's default encoding and origin conventions.
    pub fn subscription_for(&self, xpaths: &[&str]) -> Result<SubscriptionSpecBuilder> {
        let mut builder =
            SubscriptionSpec::builder().encoding(self.os.default_subscribe_encoding());
        for path in self.parse_os_xpaths(xpaths)? {
            builder = builder.path(path);
        }
        Ok(builder)
    }

    /// Open a subscription from raw request messages. The first message
    /// must carry the subscription list; later messages may carry polls.
    pub async fn subscribe_raw(
        &self,
        requests: Vec<SubscribeRequest>,
        sync_stop: bool,
    ) -> Result<SubscriptionStream> {
        let request = self.request(tokio_stream::iter(requests));
        let response = self.stub().subscribe(request).await?;
        Ok(SubscriptionStream::new(response.into_inner(), sync_stop))
    }

    fn parse_os_xpaths(&self, xpaths: &[&str]) -> Result<Vec<Path>> {
        xpaths
            .iter()
            .map(|xpath| {
                let (origin, rest) = self.os.resolve_origin(xpath);
                parse_xpath(rest, origin.as_deref())
            })
            .collect()
    }

    fn json_updates(&self, configs: &[&str]) -> Result<Vec<Update>> {
        configs
            .iter()
            .map(|config| self.json_update(config))
            .collect()
    }

    fn json_update(&self, config: &str) -> Result<Update> {
        let document: JsonValue = serde_json::from_str(config)
            .map_err(|e| GnmiError::Validation(format!("invalid JSON config: {e}")))?;
        let JsonValue::Object(map) = document else {
            return Err(GnmiError::Validation(
                "JSON config must be an object".to_string(),
            ));
        };
        if map.len() != 1 {
            return Err(GnmiError::Validation(format!(
                "JSON config must have exactly one top-level key, found {}",
                map.len()
            )));
        }
        let (key, value) = map.into_iter().next().expect("one entry");

        if matches!(self.os, DeviceOs::IosXr | DeviceOs::IosXe) && !key.contains(':') {
            return Err(GnmiError::Validation(format!(
                "top-level key {key:?} must be module-prefixed on {}",
                self.os
            )));
        }
        let (origin, element) = self.os.resolve_origin(&key);
        let path = parse_xpath(element, origin.as_deref())?;

        let payload = serde_json::to_vec(&value)
            .map_err(|e| GnmiError::Validation(format!("unable to serialize config: {e}")))?;
        let val = if self.os.uses_json_ietf() {
            typed_value::Value::JsonIetfVal(payload)
        } else {
            typed_value::Value::JsonVal(payload)
        };
        Ok(Update {
            path: Some(path),
            val: Some(TypedValue { value: Some(val) }),
            duplicates: 0,
        })
    }
}

#[cfg(test)]
mod tests;
