//! In-process fake of the pods API, driving a [kube::Client] through a `tower-test` mock service.
use http::{Method, Request, Response, StatusCode};
use k8s_openapi::api::core::v1::{Pod, PodCondition, PodStatus};
use kube::client::Body;
use kube::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tower_test::mock;

type ApiServerHandle = mock::Handle<Request<Body>, Response<Body>>;

pub(crate) enum Scenario {
    /// Created pods are reported ready from their n-th list request on.
    ReadyAfterLists(usize),
    /// Created pods stay pending forever.
    NeverReady,
    /// Every matching list request returns the created pod twice.
    DuplicatedPods,
    /// Pod creation is forbidden.
    CreateRejected,
    /// Pods become ready at once but deletion fails.
    DeleteFails,
}

/// Requests observed by the fake api-server.
#[derive(Default)]
pub(crate) struct ApiServerState {
    pods: BTreeMap<String, Pod>,
    list_requests: BTreeMap<String, usize>,
    pub creates: usize,
    pub lists: usize,
    /// Name and request body of every delete request.
    pub deletes: Vec<(String, Value)>,
}

pub(crate) type SharedState = Arc<Mutex<ApiServerState>>;

pub(crate) struct ApiServerVerifier {
    handle: ApiServerHandle,
    scenario: Scenario,
    state: SharedState,
}

impl ApiServerVerifier {
    /// Returns a client backed by the fake api-server and the state it records.
    /// Must be called from within a tokio runtime.
    pub(crate) fn start(scenario: Scenario) -> (Client, SharedState) {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let state = SharedState::default();
        let verifier = ApiServerVerifier {
            handle,
            scenario,
            state: state.clone(),
        };
        tokio::spawn(verifier.run());
        (Client::new(mock_service, "default"), state)
    }

    async fn run(mut self) {
        while let Some((request, send)) = self.handle.next_request().await {
            let (status, body) = self.respond(request).await;
            send.send_response(
                Response::builder()
                    .status(status)
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            );
        }
    }

    async fn respond(&self, request: Request<Body>) -> (StatusCode, Value) {
        let method = request.method().clone();
        let uri = request.uri().to_string();
        let body = request.into_body().collect_bytes().await.unwrap();

        match method {
            Method::POST => self.create(&body),
            Method::GET => self.list(&uri),
            Method::DELETE => self.delete(&uri, &body),
            _ => (StatusCode::NOT_FOUND, status_response(404, "NotFound")),
        }
    }

    fn create(&self, body: &[u8]) -> (StatusCode, Value) {
        let mut state = self.state.lock().unwrap();
        state.creates += 1;

        if let Scenario::CreateRejected = self.scenario {
            return (
                StatusCode::FORBIDDEN,
                status_response(403, "Forbidden"),
            );
        }

        let pod: Pod = serde_json::from_slice(body).unwrap();
        let name = pod.metadata.name.clone().unwrap();
        state.pods.insert(name, pod.clone());
        (StatusCode::CREATED, serde_json::to_value(&pod).unwrap())
    }

    fn list(&self, uri: &str) -> (StatusCode, Value) {
        let mut state = self.state.lock().unwrap();
        state.lists += 1;

        // Pod names only hold `[a-z0-9-]`, so they show up verbatim in the encoded selector.
        let matching: Vec<String> = state
            .pods
            .keys()
            .filter(|name| uri.contains(name.as_str()))
            .cloned()
            .collect();

        let mut items = Vec::new();
        for name in matching {
            let seen = state.list_requests.entry(name.clone()).or_default();
            *seen += 1;
            let seen = *seen;

            let mut pod = state.pods[&name].clone();
            pod.status = Some(match self.scenario {
                Scenario::ReadyAfterLists(n) if seen >= n => ready_status(),
                Scenario::DuplicatedPods | Scenario::DeleteFails => ready_status(),
                _ => pending_status(),
            });
            let pod = serde_json::to_value(&pod).unwrap();

            if let Scenario::DuplicatedPods = self.scenario {
                items.push(pod.clone());
            }
            items.push(pod);
        }

        (
            StatusCode::OK,
            json!({
                "apiVersion": "v1",
                "kind": "PodList",
                "metadata": { "resourceVersion": "1" },
                "items": items,
            }),
        )
    }

    fn delete(&self, uri: &str, body: &[u8]) -> (StatusCode, Value) {
        let mut state = self.state.lock().unwrap();
        let name = uri
            .split('?')
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string();
        let params: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        state.deletes.push((name.clone(), params));

        if let Scenario::DeleteFails = self.scenario {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                status_response(500, "InternalError"),
            );
        }

        match state.pods.remove(&name) {
            Some(pod) => (StatusCode::OK, serde_json::to_value(&pod).unwrap()),
            None => (StatusCode::NOT_FOUND, status_response(404, "NotFound")),
        }
    }
}

pub(crate) fn ready_status() -> PodStatus {
    PodStatus {
        phase: Some("Running".to_string()),
        conditions: Some(vec![PodCondition {
            type_: "Ready".to_string(),
            status: "True".to_string(),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

fn pending_status() -> PodStatus {
    PodStatus {
        phase: Some("Pending".to_string()),
        ..Default::default()
    }
}

fn status_response(code: u16, reason: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": format!("fake api-server: {reason}"),
        "reason": reason,
        "code": code,
    })
}
