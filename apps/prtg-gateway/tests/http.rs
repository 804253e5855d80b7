use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use prtg_connection::{
    GatewayConnection, HostResolver, HttpReply, HttpRequest, HttpTransport, TransportError,
};
use prtg_gateway::diagnostics::TelemetryDiagnostics;
use prtg_gateway::{AppState, create_router};
use prtg_webhook::{ChannelSubscriber, SubscriberRegistry, WebhookDispatcher};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

const TOKEN: &str = "3f0e7c9a-token";

/// 不允许任何出站请求的传输层。
struct OfflineTransport;

#[async_trait]
impl HttpTransport for OfflineTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpReply, TransportError> {
        Err(TransportError::Failed("offline".to_string()))
    }
}

fn app() -> (axum::Router, Arc<SubscriberRegistry>) {
    let connection = Arc::new(GatewayConnection::new(
        Arc::new(OfflineTransport),
        HostResolver::system(),
    ));
    let registry = Arc::new(SubscriberRegistry::new());
    let dispatcher = WebhookDispatcher::new(
        connection.clone(),
        Arc::new(TelemetryDiagnostics::new()),
        registry.clone(),
    );
    let router = create_router(AppState {
        connection,
        dispatcher,
        webhook_token: Arc::from(TOKEN),
    });
    (router, registry)
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
}

#[tokio::test]
async fn health_reports_connection_state() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("x-trace-id"));

    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).expect("json");
    assert_eq!(body["ok"], false);
    assert_eq!(body["state"], "inactive");
    assert_eq!(body["code"], 104);
    assert_eq!(body["summary"], "");
}

#[tokio::test]
async fn wrong_token_is_not_found() {
    let (app, registry) = app();
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.subscribe(None, Arc::new(ChannelSubscriber::new(tx)));

    let response = app
        .oneshot(
            Request::post("/hook/prtg/not-the-token")
                .body(Body::from("12"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn post_broadcasts_changed_ids() {
    let (app, registry) = app();
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.subscribe(None, Arc::new(ChannelSubscriber::new(tx)));

    let response = app
        .oneshot(
            Request::post(format!("/hook/prtg/{TOKEN}"))
                .body(Body::from("12%0D%0A%0D%0A34"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let first = rx.recv().await.expect("first");
    let second = rx.recv().await.expect("second");
    assert_eq!((first.entity_id, second.entity_id), (12, 34));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn plain_get_is_not_found() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::get(format!("/hook/prtg/{TOKEN}?foo=bar"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn graph_query_while_inactive_is_not_found() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::get(format!(
                "/hook/prtg/{TOKEN}?graph=png&id=2001&graphid=0&width=400&height=200&theme=0"
            ))
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn diagnostics_header_returns_push_report() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::get(format!("/hook/prtg/{TOKEN}"))
                .header("SensorID", "1234")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).expect("json");
    assert_eq!(body["prtg"]["error"], 0);
    let channels = body["prtg"]["result"].as_array().expect("result");
    assert!(channels.iter().any(|channel| channel["channel"] == "Uptime"));
}

#[tokio::test]
async fn unsupported_method_with_wrong_token_is_not_found() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::put("/hook/prtg/not-the-token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_method_with_token_is_rejected_by_dispatcher() {
    let (app, registry) = app();
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.subscribe(None, Arc::new(ChannelSubscriber::new(tx)));

    let response = app
        .oneshot(
            Request::put(format!("/hook/prtg/{TOKEN}"))
                .body(Body::from("12"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(rx.try_recv().is_err());
}
