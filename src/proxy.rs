//! Forwarding proxy for the generation API.
//!
//! A single-threaded accept loop that relays every request to
//! `{target_base}{path}`: the `host` header is stripped, non-GET/HEAD bodies
//! are re-serialized as JSON with a forced JSON content-type, and the
//! upstream status, content-type, and body come back verbatim. A missing
//! target base answers 500; any forwarding failure answers 502.
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;
use ureq::Agent;

pub struct ProxyConfig {
    /// Upstream base URL, usually from `API_TARGET_BASE`.
    pub target_base: Option<String>,
}

struct HttpRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

struct UpstreamResponse {
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

/// Run the accept loop on an already-bound listener.
pub fn serve(listener: TcpListener, config: &ProxyConfig) -> Result<()> {
    // Statuses are relayed, never treated as client errors.
    let agent = Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let addr = listener.local_addr().context("resolve proxy listen address")?;
    tracing::info!(%addr, "proxy listening");

    for incoming in listener.incoming() {
        let mut stream = match incoming {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(error = %err, "accept failed");
                continue;
            }
        };
        if let Err(err) = stream.set_read_timeout(Some(Duration::from_secs(15))) {
            tracing::warn!(error = %err, "set read timeout failed");
        }
        if let Err(err) = handle_connection(&mut stream, &agent, config.target_base.as_deref()) {
            tracing::warn!(error = %err, "request failed");
        }
    }
    Ok(())
}

fn handle_connection(
    stream: &mut TcpStream,
    agent: &Agent,
    target_base: Option<&str>,
) -> Result<()> {
    let request = read_http_request(stream)?;
    let Some(base) = target_base else {
        let body = json!({"error": "API_TARGET_BASE non configuré"}).to_string();
        return write_http_response(stream, 500, "application/json", body.as_bytes());
    };
    match forward(agent, base, &request) {
        Ok(upstream) => {
            write_http_response(stream, upstream.status, &upstream.content_type, &upstream.body)
        }
        Err(err) => {
            tracing::warn!(error = %err, "upstream forward failed");
            let body = json!({"error": "ProxyError", "message": err.to_string()}).to_string();
            write_http_response(stream, 502, "application/json", body.as_bytes())
        }
    }
}

fn forward(agent: &Agent, base: &str, request: &HttpRequest) -> Result<UpstreamResponse> {
    let url = format!("{}{}", base.trim_end_matches('/'), request.path);
    tracing::info!(method = %request.method, %url, "forwarding request");

    let method = ureq::http::Method::from_bytes(request.method.as_bytes())
        .map_err(|err| anyhow!("method {:?}: {err}", request.method))?;
    let mut builder = ureq::http::Request::builder().method(method).uri(url.as_str());
    for (name, value) in &request.headers {
        // host belongs to the upstream URL; the body headers are rewritten.
        if name.eq_ignore_ascii_case("host")
            || name.eq_ignore_ascii_case("content-length")
            || name.eq_ignore_ascii_case("content-type")
            || name.eq_ignore_ascii_case("connection")
        {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }

    let result = if request.method == "GET" || request.method == "HEAD" {
        let upstream_request = builder.body(()).context("build upstream request")?;
        agent.run(upstream_request)
    } else {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_else(|_| json!({}));
        let upstream_request = builder
            .header("content-type", "application/json")
            .body(body.to_string())
            .context("build upstream request")?;
        agent.run(upstream_request)
    };
    let mut response = result.map_err(|err| anyhow!("fetch {url}: {err}"))?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|err| anyhow!("read upstream body from {url}: {err}"))?;
    Ok(UpstreamResponse {
        status,
        content_type,
        body,
    })
}

fn read_http_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 1024];
    let mut header_end = None;

    while header_end.is_none() {
        let n = stream.read(&mut chunk).context("read request")?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(idx) = find_header_end(&buf) {
            header_end = Some(idx);
            break;
        }
        if buf.len() > 1024 * 1024 {
            return Err(anyhow!("request header too large"));
        }
    }

    let header_end = header_end.ok_or_else(|| anyhow!("incomplete http request"))?;
    let header_text = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().ok_or_else(|| anyhow!("missing request line"))?;

    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| anyhow!("missing method"))?
        .to_string();
    let path = parts
        .next()
        .ok_or_else(|| anyhow!("missing path"))?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().unwrap_or(0);
            }
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let mut body = Vec::with_capacity(content_length);
    if buf.len() > header_end + 4 {
        body.extend_from_slice(&buf[(header_end + 4)..]);
    }
    while body.len() < content_length {
        let n = stream.read(&mut chunk).context("read request body")?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    if body.len() > content_length {
        body.truncate(content_length);
    }

    Ok(HttpRequest {
        method,
        path,
        headers,
        body,
    })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn write_http_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<()> {
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
        status,
        reason_phrase(status),
        content_type,
        body.len()
    );
    stream
        .write_all(header.as_bytes())
        .context("write response header")?;
    stream.write_all(body).context("write response body")?;
    stream.flush().context("flush response")?;
    Ok(())
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
