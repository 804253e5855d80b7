mod support;

use domain::{ConnectionState, Credentials, RequestEnvelope};
use prtg_config::ConnectionSettings;
use prtg_connection::{
    CallError, GatewayConnection, GraphError, GraphFormat, GraphRange, GraphRequest, HostResolver,
    TransportError,
};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use support::{ScriptedTransport, StaticResolver};

fn settings(enabled: bool, host: &str) -> ConnectionSettings {
    ConnectionSettings {
        enabled,
        host: host.to_string(),
        credentials: Credentials::new("admin", "secret"),
    }
}

fn build(
    transport: ScriptedTransport,
    addresses: Vec<IpAddr>,
) -> (GatewayConnection, Arc<ScriptedTransport>, Arc<StaticResolver>) {
    let transport = Arc::new(transport);
    let names = Arc::new(StaticResolver::new(addresses));
    let connection = GatewayConnection::new(transport.clone(), HostResolver::new(names.clone()));
    (connection, transport, names)
}

fn lan() -> Vec<IpAddr> {
    vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))]
}

#[tokio::test]
async fn disabled_feature_stays_inactive_for_any_host() {
    for host in ["http://prtg.local", "", "http://", "not a url at all"] {
        let (connection, transport, names) = build(ScriptedTransport::new(), lan());
        let state = connection.reconfigure(&settings(false, host)).await;
        assert_eq!(state, ConnectionState::Inactive, "{host}");
        assert_eq!(transport.calls(), 0);
        assert_eq!(names.calls(), 0);
    }
}

#[tokio::test]
async fn placeholder_host_is_inactive() {
    let (connection, _, _) = build(ScriptedTransport::new(), lan());
    let state = connection.reconfigure(&settings(true, "http://")).await;
    assert_eq!(state, ConnectionState::Inactive);
    assert_eq!(connection.status().code, 104);
}

#[tokio::test]
async fn missing_host_is_url_invalid() {
    let (connection, transport, _) = build(ScriptedTransport::new(), lan());
    let state = connection.reconfigure(&settings(true, "https:///prtg")).await;
    assert_eq!(state, ConnectionState::UrlInvalid);
    assert_eq!(connection.status().code, 203);
    assert_eq!(connection.status().summary, "");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn dns_failure_is_disconnected() {
    let (connection, transport, _) = build(ScriptedTransport::new(), Vec::new());
    let state = connection.reconfigure(&settings(true, "prtg.local")).await;
    assert_eq!(state, ConnectionState::Disconnected);
    assert_eq!(connection.status().code, 201);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn passhash_404_is_disconnected() {
    let (connection, _, _) = build(ScriptedTransport::new().reply(404, ""), lan());
    let state = connection.reconfigure(&settings(true, "prtg.local")).await;
    assert_eq!(state, ConnectionState::Disconnected);
    assert_eq!(connection.status().summary, "http://10.0.0.7/");
}

#[tokio::test]
async fn empty_passhash_is_unauthorized() {
    let (connection, _, _) = build(ScriptedTransport::new().reply(401, "denied"), lan());
    let state = connection.reconfigure(&settings(true, "prtg.local")).await;
    assert_eq!(state, ConnectionState::Unauthorized);
    assert_eq!(connection.status().code, 202);

    let (connection, _, _) = build(ScriptedTransport::new().reply(200, "  \n"), lan());
    let state = connection.reconfigure(&settings(true, "prtg.local")).await;
    assert_eq!(state, ConnectionState::Unauthorized);
}

#[tokio::test]
async fn successful_exchange_connects_and_publishes_status() {
    let (connection, transport, _) =
        build(ScriptedTransport::new().reply(200, "1234567\n"), lan());
    let mut status_rx = connection.subscribe_status();

    let state = connection
        .reconfigure(&settings(true, "http://prtg.local/"))
        .await;
    assert_eq!(state, ConnectionState::Connected);

    status_rx.changed().await.expect("status published");
    let status = status_rx.borrow().clone();
    assert_eq!(status.state, ConnectionState::Connected);
    assert_eq!(status.code, 102);
    assert_eq!(status.summary, "http://10.0.0.7/");

    let request = &transport.requests()[0];
    assert!(request.url.starts_with("http://10.0.0.7/api/getpasshash.htm?"));
    assert!(request.url.contains("username=admin"));
    assert!(request.url.contains("password=secret"));
}

#[tokio::test]
async fn call_never_reaches_transport_when_not_connected() {
    let (connection, transport, _) = build(ScriptedTransport::new(), Vec::new());
    connection.reconfigure(&settings(true, "prtg.local")).await;

    let err = connection
        .call(&RequestEnvelope::new("api/table.json"))
        .await
        .expect_err("short circuit");
    assert!(matches!(
        err,
        CallError::NotConnected(ConnectionState::Disconnected)
    ));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn call_merges_session_params_and_posts_body() {
    let transport = ScriptedTransport::new()
        .reply(200, "hash42")
        .reply(200, "{}")
        .reply(200, "ok");
    let (connection, transport, _) = build(transport, lan());
    connection.reconfigure(&settings(true, "prtg.local/prtg")).await;

    let get = RequestEnvelope::new("/api/table.json")
        .param("content", "sensors")
        .param("passhash", "stale");
    connection.call(&get).await.expect("get");

    let post = RequestEnvelope::new("api/pause.htm").post("a=b");
    connection.call(&post).await.expect("post");

    let requests = transport.requests();
    assert_eq!(
        requests[1].url,
        "http://10.0.0.7/prtg/api/table.json?content=sensors&passhash=hash42&username=admin"
    );
    assert_eq!(requests[1].body, None);
    assert_eq!(requests[2].body.as_deref(), Some("a=b"));
}

#[tokio::test]
async fn reconfigure_clears_previous_session() {
    let transport = ScriptedTransport::new().reply(200, "hash42");
    let (connection, transport, _) = build(transport, lan());
    connection.reconfigure(&settings(true, "prtg.local")).await;
    assert_eq!(connection.state(), ConnectionState::Connected);

    connection.reconfigure(&settings(false, "prtg.local")).await;
    assert_eq!(connection.state(), ConnectionState::Inactive);
    assert!(connection.query_url(&RequestEnvelope::new("x")).is_none());
    let err = connection
        .call(&RequestEnvelope::new("api/table.json"))
        .await
        .expect_err("inactive");
    assert!(matches!(err, CallError::NotConnected(ConnectionState::Inactive)));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn transport_timeout_surfaces_as_call_error() {
    let transport = ScriptedTransport::new()
        .reply(200, "hash42")
        .fail(TransportError::Timeout);
    let (connection, _, _) = build(transport, lan());
    connection.reconfigure(&settings(true, "prtg.local")).await;

    let err = connection
        .call(&RequestEnvelope::new("api/table.json"))
        .await
        .expect_err("timeout");
    assert!(matches!(err, CallError::Transport(TransportError::Timeout)));
}

fn graph_request() -> GraphRequest {
    GraphRequest {
        format: GraphFormat::Svg,
        sensor_id: 2001,
        range: GraphRange::Last48Hours,
        width: 850,
        height: 300,
        theme: 0,
        base_font_size: 10,
        show_legend: 1,
    }
}

#[tokio::test]
async fn fetch_graph_returns_bytes_with_content_type() {
    let transport = ScriptedTransport::new()
        .reply(200, "hash42")
        .reply(200, "<svg/>");
    let (connection, transport, _) = build(transport, lan());
    connection.reconfigure(&settings(true, "prtg.local")).await;

    let graph = connection
        .fetch_graph(&graph_request())
        .await
        .expect("graph");
    assert_eq!(graph.content_type, "image/svg+xml");
    assert_eq!(graph.bytes, b"<svg/>".to_vec());

    let url = &transport.requests()[1].url;
    assert!(url.starts_with("http://10.0.0.7/chart.svg?"));
    assert!(url.contains("graphid=1"));
    assert!(url.contains("id=2001"));
    assert!(url.contains("refreshable=true"));
    assert!(url.contains("type=graph"));
}

#[tokio::test]
async fn fetch_graph_reports_not_connected_and_http_errors() {
    let (connection, _, _) = build(ScriptedTransport::new(), lan());
    let err = connection
        .fetch_graph(&graph_request())
        .await
        .expect_err("inactive");
    assert!(matches!(err, GraphError::NotConnected(ConnectionState::Inactive)));

    let transport = ScriptedTransport::new().reply(200, "hash42").reply(500, "");
    let (connection, _, _) = build(transport, lan());
    connection.reconfigure(&settings(true, "prtg.local")).await;
    let err = connection
        .fetch_graph(&graph_request())
        .await
        .expect_err("server error");
    assert!(matches!(err, GraphError::Http(500)));
}
