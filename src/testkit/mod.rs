// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process mock gNMI target for tests.
//!
//! [`MockTarget`] serves a canned gNMI implementation on an ephemeral
//! loopback port: Get echoes the requested paths, Set acknowledges each
//! operation, and Subscribe emits one update per subscription on either
//! side of a sync marker. Responses are deterministic so tests can assert
//! exact shapes.

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::{Stream, StreamExt};
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};

use crate::api::gnmi::g_nmi_server::{GNmi, GNmiServer};
use crate::api::gnmi::{
    subscribe_request, subscribe_response, typed_value, update_result, CapabilityRequest,
    CapabilityResponse, Encoding, GetRequest, GetResponse, ModelData, Notification, SetRequest,
    SetResponse, SubscribeRequest, SubscribeResponse, TypedValue, Update, UpdateResult,
};

/// Timestamp stamped on every mock notification.
pub const MOCK_TIMESTAMP: i64 = 1_700_000_000_000_000_000;

/// gNMI version reported by the mock.
pub const MOCK_VERSION: &str = "0.7.0";

#[derive(Debug, Default)]
struct MockGnmi {
    usernames: Arc<Mutex<Vec<String>>>,
}

impl MockGnmi {
    fn record_username<T>(&self, request: &Request<T>) {
        if let Some(value) = request.metadata().get("username") {
            if let Ok(username) = value.to_str() {
                self.usernames
                    .lock()
                    .expect("mock lock")
                    .push(username.to_string());
            }
        }
    }
}

fn echo_notification(path: crate::api::gnmi::Path, encoding: Encoding) -> Notification {
    let val = match encoding {
        Encoding::Ascii => typed_value::Value::AsciiVal("mock cli output".to_string()),
        Encoding::Proto => typed_value::Value::UintVal(1500),
        _ => typed_value::Value::JsonIetfVal(br#"{"mock":true}"#.to_vec()),
    };
    Notification {
        timestamp: MOCK_TIMESTAMP,
        prefix: None,
        update: vec![Update {
            path: Some(path),
            val: Some(TypedValue { value: Some(val) }),
            duplicates: 0,
        }],
        delete: Vec::new(),
        atomic: false,
    }
}

#[tonic::async_trait]
impl GNmi for MockGnmi {
    async fn capabilities(
        &self,
        request: Request<CapabilityRequest>,
    ) -> std::result::Result<Response<CapabilityResponse>, Status> {
        self.record_username(&request);
        Ok(Response::new(CapabilityResponse {
            supported_models: vec![
                ModelData {
                    name: "openconfig-interfaces".to_string(),
                    organization: "OpenConfig working group".to_string(),
                    version: "2.4.3".to_string(),
                },
                ModelData {
                    name: "Cisco-IOS-XR-shellutil-cfg".to_string(),
                    organization: "Cisco Systems, Inc.".to_string(),
                    version: "1.0.0".to_string(),
                },
            ],
            supported_encodings: vec![
                Encoding::Json as i32,
                Encoding::JsonIetf as i32,
                Encoding::Proto as i32,
            ],
            g_nmi_version: MOCK_VERSION.to_string(),
            extension: Vec::new(),
        }))
    }

    async fn get(
        &self,
        request: Request<GetRequest>,
    ) -> std::result::Result<Response<GetResponse>, Status> {
        self.record_username(&request);
        let request = request.into_inner();
        if request.path.is_empty() {
            return Err(Status::invalid_argument("no paths requested"));
        }
        let encoding = Encoding::try_from(request.encoding).unwrap_or(Encoding::Json);
        let notification = request
            .path
            .into_iter()
            .map(|path| echo_notification(path, encoding))
            .collect();
        Ok(Response::new(GetResponse {
            notification,
            extension: Vec::new(),
        }))
    }

    async fn set(
        &self,
        request: Request<SetRequest>,
    ) -> std::result::Result<Response<SetResponse>, Status> {
        self.record_username(&request);
        let request = request.into_inner();
        let mut response = Vec::new();
        for path in request.delete {
            response.push(UpdateResult {
                path: Some(path),
                op: update_result::Operation::Delete as i32,
            });
        }
        for replace in request.replace {
            response.push(UpdateResult {
                path: replace.path,
                op: update_result::Operation::Replace as i32,
            });
        }
        for update in request.update {
            response.push(UpdateResult {
                path: update.path,
                op: update_result::Operation::Update as i32,
            });
        }
        if response.is_empty() {
            return Err(Status::invalid_argument("no operations requested"));
        }
        Ok(Response::new(SetResponse {
            prefix: None,
            response,
            timestamp: MOCK_TIMESTAMP,
            extension: Vec::new(),
        }))
    }

    type SubscribeStream =
        Pin<Box<dyn Stream<Item = std::result::Result<SubscribeResponse, Status>> + Send>>;

    async fn subscribe(
        &self,
        request: Request<Streaming<SubscribeRequest>>,
    ) -> std::result::Result<Response<Self::SubscribeStream>, Status> {
        self.record_username(&request);
        let mut inbound = request.into_inner();
        let first = inbound
            .next()
            .await
            .ok_or_else(|| Status::invalid_argument("empty request stream"))??;
        let Some(subscribe_request::Request::Subscribe(list)) = first.request else {
            return Err(Status::invalid_argument(
                "first message must carry a subscription list",
            ));
        };
        let encoding = Encoding::try_from(list.encoding).unwrap_or(Encoding::Json);

        // One update per subscription, a sync marker, then one more update
        // per subscription.
        let mut responses = Vec::new();
        for subscription in &list.subscription {
            if let Some(path) = &subscription.path {
                responses.push(SubscribeResponse {
                    response: Some(subscribe_response::Response::Update(echo_notification(
                        path.clone(),
                        encoding,
                    ))),
                    extension: Vec::new(),
                });
            }
        }
        responses.push(SubscribeResponse {
            response: Some(subscribe_response::Response::SyncResponse(true)),
            extension: Vec::new(),
        });
        for subscription in &list.subscription {
            if let Some(path) = &subscription.path {
                responses.push(SubscribeResponse {
                    response: Some(subscribe_response::Response::Update(echo_notification(
                        path.clone(),
                        encoding,
                    ))),
                    extension: Vec::new(),
                });
            }
        }

        let outbound = tokio_stream::iter(responses.into_iter().map(Ok));
        Ok(Response::new(Box::pin(outbound)))
    }
}

/// A mock gNMI target bound to an ephemeral loopback port.
///
/// The server shuts down when the handle is dropped.
pub struct MockTarget {
    addr: SocketAddr,
    usernames: Arc<Mutex<Vec<String>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockTarget {
    /// Bind and serve on `127.0.0.1:0`.
    ///
    /// # Panics
    ///
    /// Panics when the loopback listener cannot be bound; tests have no
    /// reasonable way to continue from that.
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock target");
        let addr = listener.local_addr().expect("mock target addr");
        let usernames = Arc::new(Mutex::new(Vec::new()));
        let service = MockGnmi {
            usernames: Arc::clone(&usernames),
        };
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server = Server::builder()
            .add_service(GNmiServer::new(service))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                let _ = shutdown_rx.await;
            });
        tokio::spawn(server);

        Self {
            addr,
            usernames,
            shutdown: Some(shutdown_tx),
        }
    }

    /// `host:port` string suitable for [`crate::ClientBuilder::new`].
    #[must_use]
    pub fn target(&self) -> String {
        self.addr.to_string()
    }

    /// Usernames observed in request metadata, in arrival order.
    #[must_use]
    pub fn seen_usernames(&self) -> Vec<String> {
        self.usernames.lock().expect("mock lock").clone()
    }
}

impl Drop for MockTarget {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
