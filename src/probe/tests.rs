use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::domain::Endpoint;
use crate::test_support::{
    TEST_HOST, TestCert, TestResponse, spawn_h2_server, spawn_h3_server, spawn_https1_server,
};
use crate::transport::{TransportOptions, build_transport};

const fn close(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

fn local_prober(
    cert: &TestCert,
    protocol: Protocol,
    port: u16,
    timeout: Duration,
) -> Result<HttpProber, String> {
    let options = TransportOptions {
        timeout,
        extra_roots: vec![cert.cert.clone()],
    };
    let endpoint = Endpoint::new("local", "127.0.0.1", protocol);
    let handle =
        build_transport(&endpoint, &options).map_err(|err| format!("build failed: {}", err))?;
    let domain = format!("{}:{}", TEST_HOST, port);
    let target = ProbeTarget::new(&domain, "/ping", timeout)
        .map_err(|err| format!("target failed: {}", err))?;
    Ok(HttpProber::new(handle, Arc::new(target)))
}

#[test]
fn origin_time_parses_seconds_with_suffix() -> Result<(), String> {
    let parsed = parse_origin_time("0.045s").ok_or_else(|| "Expected a value".to_owned())?;
    if !close(parsed, 45.0) {
        return Err(format!("Unexpected origin time: {}", parsed));
    }
    let spaced = parse_origin_time(" 1.5 s ").ok_or_else(|| "Expected a value".to_owned())?;
    if !close(spaced, 1500.0) {
        return Err(format!("Unexpected origin time: {}", spaced));
    }
    Ok(())
}

#[test]
fn origin_time_without_suffix_is_seconds() -> Result<(), String> {
    let parsed = parse_origin_time("0.2").ok_or_else(|| "Expected a value".to_owned())?;
    if !close(parsed, 200.0) {
        return Err(format!("Unexpected origin time: {}", parsed));
    }
    Ok(())
}

#[test]
fn origin_time_zero_is_present() -> Result<(), String> {
    match parse_origin_time("0") {
        Some(value) if close(value, 0.0) => Ok(()),
        other => Err(format!("Expected present zero, got {:?}", other)),
    }
}

#[test]
fn origin_time_garbage_is_absent() -> Result<(), String> {
    for raw in ["abc", "", "s", "-0.5", "NaN", "inf", "1.2ms"] {
        if let Some(value) = parse_origin_time(raw) {
            return Err(format!("'{}' parsed as {}", raw, value));
        }
    }
    Ok(())
}

#[test]
fn probe_target_joins_domain_and_path() -> Result<(), String> {
    let target = ProbeTarget::new("cdn.example.com", "/api/ping?x=1", Duration::from_secs(1))
        .map_err(|err| format!("target failed: {}", err))?;
    if target.uri.to_string() != "https://cdn.example.com/api/ping?x=1" {
        return Err(format!("Unexpected uri: {}", target.uri));
    }
    if target.host != "cdn.example.com" {
        return Err(format!("Unexpected host: {}", target.host));
    }
    Ok(())
}

#[test]
fn probe_target_rejects_invalid_url() -> Result<(), String> {
    match ProbeTarget::new("bad host", "/", Duration::from_secs(1)) {
        Err(ValidationError::InvalidUrl { .. }) => Ok(()),
        other => Err(format!("Unexpected result: {:?}", other.map(|target| target.uri))),
    }
}

#[test]
fn browser_request_sets_host_only_for_http1() -> Result<(), String> {
    let target = ProbeTarget::new("cdn.example.com", "/", Duration::from_secs(1))
        .map_err(|err| format!("target failed: {}", err))?;
    let http1 = build_request(Protocol::Http1, &target).map_err(|err| err.to_string())?;
    if http1.headers().get(HOST).and_then(|value| value.to_str().ok()) != Some("cdn.example.com")
    {
        return Err("HTTP/1.1 request missing Host".to_owned());
    }
    if http1.headers().get(USER_AGENT).and_then(|value| value.to_str().ok())
        != Some(BROWSER_USER_AGENT)
    {
        return Err("Missing browser user agent".to_owned());
    }
    let http2 = build_request(Protocol::Http2, &target).map_err(|err| err.to_string())?;
    if http2.headers().contains_key(HOST) {
        return Err("HTTP/2 request carries Host header".to_owned());
    }
    if http2.method() != http::Method::GET {
        return Err("Probe must use GET".to_owned());
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn http1_probe_decomposes_latency() -> Result<(), String> {
    let cert = TestCert::generate()?;
    let response = TestResponse::ok().with_header(ORIGIN_TIME_HEADER, "0.001s");
    let (addr, server) = spawn_https1_server(&cert, response).await?;
    let prober = local_prober(&cert, Protocol::Http1, addr.port(), Duration::from_secs(5))?;

    let first = prober.probe(1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = prober.probe(2).await;
    server.abort();

    if let Some(err) = first.error.as_ref().or(second.error.as_ref()) {
        return Err(format!("Probe failed: {}", err));
    }
    if first.index != 1 || second.index != 2 {
        return Err("Samples lost their round index".to_owned());
    }
    if first.status_code != 200 || first.actual_protocol != "HTTP/1.1" {
        return Err(format!(
            "Unexpected head: {} {}",
            first.status_code, first.actual_protocol
        ));
    }
    let origin = first
        .origin_ms
        .ok_or_else(|| "Missing origin time".to_owned())?;
    if !close(origin, 1.0) {
        return Err(format!("Unexpected origin time: {}", origin));
    }
    if !close(first.cdn_latency_ms, first.ttfb_ms() - 1.0) {
        return Err("CDN latency is not TTFB minus origin".to_owned());
    }
    if first.reused || !second.reused {
        return Err(format!(
            "Unexpected reuse flags: {} {}",
            first.reused, second.reused
        ));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn http2_probe_reports_actual_protocol() -> Result<(), String> {
    let cert = TestCert::generate()?;
    let response = TestResponse::ok().with_status(503);
    let (addr, server) = spawn_h2_server(&cert, response).await?;
    let prober = local_prober(&cert, Protocol::Http2, addr.port(), Duration::from_secs(5))?;

    let sample = prober.probe(1).await;
    server.abort();

    if let Some(err) = sample.error {
        return Err(format!("Probe failed: {}", err));
    }
    if sample.status_code != 503 {
        return Err(format!("Unexpected status: {}", sample.status_code));
    }
    if sample.actual_protocol != "HTTP/2.0" {
        return Err(format!("Unexpected protocol: {}", sample.actual_protocol));
    }
    if sample.origin_ms.is_some() {
        return Err("Origin time without header".to_owned());
    }
    if !close(sample.cdn_latency_ms, sample.ttfb_ms()) {
        return Err("CDN latency should equal TTFB without origin data".to_owned());
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn http3_probe_decomposes_latency() -> Result<(), String> {
    let cert = TestCert::generate()?;
    let response = TestResponse::ok().with_header(ORIGIN_TIME_HEADER, "0.045s");
    let server = spawn_h3_server(&cert, response)?;
    let prober = local_prober(&cert, Protocol::Http3, server.addr.port(), Duration::from_secs(5))?;

    let first = prober.probe(1).await;
    let second = prober.probe(2).await;
    server.task.abort();

    if let Some(err) = first.error.as_ref().or(second.error.as_ref()) {
        return Err(format!("Probe failed: {}", err));
    }
    if first.status_code != 200 || first.actual_protocol != "HTTP/3.0" {
        return Err(format!(
            "Unexpected head: {} {}",
            first.status_code, first.actual_protocol
        ));
    }
    let origin = first
        .origin_ms
        .ok_or_else(|| "Missing origin time".to_owned())?;
    if (origin - 45.0).abs() > 1e-6 {
        return Err(format!("Unexpected origin time: {}", origin));
    }
    if !close(first.cdn_latency_ms, first.ttfb_ms() - origin) {
        return Err("CDN latency is not TTFB minus origin".to_owned());
    }
    if first.reused || !second.reused {
        return Err(format!(
            "Unexpected reuse flags: {} {}",
            first.reused, second.reused
        ));
    }
    let names = server
        .server_names
        .lock()
        .map_err(|err| format!("lock failed: {}", err))?
        .clone();
    if names != vec![TEST_HOST.to_owned()] {
        return Err(format!("Expected one session with SNI {}, got {:?}", TEST_HOST, names));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn probe_timeout_becomes_failure_sample() -> Result<(), String> {
    let cert = TestCert::generate()?;
    let response = TestResponse::ok().with_delay(Duration::from_secs(2));
    let (addr, server) = spawn_https1_server(&cert, response).await?;
    let prober = local_prober(&cert, Protocol::Http1, addr.port(), Duration::from_millis(200))?;

    let sample = prober.probe(3).await;
    server.abort();

    let err = sample
        .error
        .as_ref()
        .ok_or_else(|| "Expected a timeout failure".to_owned())?;
    if !err.contains("timed out") {
        return Err(format!("Unexpected error: {}", err));
    }
    if sample.index != 3 || sample.status_code != 0 {
        return Err("Failure sample has unexpected fields".to_owned());
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn refused_connection_becomes_failure_sample() -> Result<(), String> {
    let cert = TestCert::generate()?;
    let listener = std::net::TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind failed: {}", err))?;
    let port = listener
        .local_addr()
        .map_err(|err| format!("local addr failed: {}", err))?
        .port();
    drop(listener);
    let prober = local_prober(&cert, Protocol::Http1, port, Duration::from_secs(2))?;

    let sample = prober.probe(1).await;
    let err = sample
        .error
        .ok_or_else(|| "Expected a connect failure".to_owned())?;
    if !err.contains("127.0.0.1") {
        return Err(format!("Error does not name the pinned address: {}", err));
    }
    Ok(())
}
