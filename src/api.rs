//! Fallback HTTP caller for the generation API.
//!
//! The remote API's route naming has changed across deployments, so every
//! logical operation carries an ordered list of candidate path suffixes.
//! Candidates are tried strictly in order: 404 means "not deployed at this
//! path, try the next one"; any other failure is recorded and the next
//! sibling path is still tried, so one broken mirror does not mask a working
//! one. Only exhaustion surfaces an error. No retries, no backoff, no
//! timeout beyond the transport defaults.
use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::{json, Value};
use ureq::Agent;

use crate::catalog::BibleVersion;
use crate::util::truncate_string;

/// Candidate routes for enriched generation; the gemini route can 404 in
/// production, in which case the baseline routes take over.
pub const ENRICHED_ENDPOINTS: &[&str] = &[
    "/generate-verse-by-verse-gemini",
    "/generate-verse-by-verse",
    "/g_te-verse-by-verse",
];

/// Candidate routes for standard generation (current name, then legacy).
pub const STANDARD_ENDPOINTS: &[&str] = &["/generate-verse-by-verse", "/g_te-verse-by-verse"];

/// How much of an error response body is carried in the error message.
const ERROR_BODY_PREVIEW_BYTES: usize = 300;

/// Payload for the generation endpoints.
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    pub passage: String,
    pub version: BibleVersion,
    pub enriched: bool,
    pub target_chars: u32,
}

/// A successful call: parsed data plus the URL that answered.
#[derive(Debug)]
pub struct ApiSuccess {
    pub data: Value,
    pub url: String,
}

/// HTTP client bound to one API base.
pub struct ApiClient {
    agent: Agent,
    base: String,
}

impl ApiClient {
    pub fn new(api_base: &str) -> Self {
        // Statuses are inspected here, not turned into transport errors.
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        ApiClient {
            agent,
            base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// POST the payload to each candidate in order and return the first
    /// success together with the URL that served it.
    pub fn post_with_fallback<T: Serialize>(
        &self,
        candidates: &[&str],
        payload: &T,
    ) -> Result<ApiSuccess> {
        let mut last_error: Option<anyhow::Error> = None;
        for candidate in candidates {
            let url = format!("{}{}", self.base, candidate);
            tracing::info!(%url, "POST generation request");
            let mut response = match self.agent.post(url.as_str()).send_json(payload) {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(%url, error = %err, "transport failure, trying next candidate");
                    last_error = Some(anyhow!("request {url}: {err}"));
                    continue;
                }
            };
            let status = response.status().as_u16();
            if (200..300).contains(&status) {
                match read_success_body(&mut response, &url) {
                    Ok(data) => {
                        tracing::info!(%url, "generation request succeeded");
                        return Ok(ApiSuccess { data, url });
                    }
                    Err(err) => {
                        last_error = Some(err);
                        continue;
                    }
                }
            }
            if status == 404 {
                tracing::debug!(%url, "endpoint not deployed at this path");
                last_error = Some(anyhow!("404 @ {url}"));
                continue;
            }
            let body = response.body_mut().read_to_string().unwrap_or_default();
            let preview = truncate_string(&body, ERROR_BODY_PREVIEW_BYTES);
            tracing::warn!(%url, status, "endpoint failed, trying next candidate");
            last_error = Some(if preview.is_empty() {
                anyhow!("HTTP {status} @ {url}")
            } else {
                anyhow!("HTTP {status} @ {url} – {preview}")
            });
        }
        Err(last_error.unwrap_or_else(|| anyhow!("all endpoints failed")))
    }
}

/// Parse a 2xx body: JSON when the content-type says so, otherwise the raw
/// text wrapped as `{"raw": ...}`.
fn read_success_body(response: &mut ureq::http::Response<ureq::Body>, url: &str) -> Result<Value> {
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();
    if content_type.contains("application/json") {
        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|err| anyhow!("parse JSON from {url}: {err}"))
    } else {
        let raw = response
            .body_mut()
            .read_to_string()
            .map_err(|err| anyhow!("read body from {url}: {err}"))?;
        Ok(json!({ "raw": raw }))
    }
}

/// Extract the study text from a generation response.
///
/// Non-string `content` values are pretty-printed so the formatter only ever
/// sees a string; responses with a non-JSON body surface through `raw`.
pub fn content_text(data: &Value) -> Option<String> {
    match data.get("content") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Null) | None => data
            .get("raw")
            .and_then(|raw| raw.as_str())
            .map(str::to_string),
        Some(other) => {
            Some(serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    struct StubResponse {
        status: u16,
        reason: &'static str,
        content_type: &'static str,
        body: &'static str,
        drop_connection: bool,
    }

    impl StubResponse {
        fn ok_json(body: &'static str) -> Self {
            StubResponse {
                status: 200,
                reason: "OK",
                content_type: "application/json",
                body,
                drop_connection: false,
            }
        }

        fn status(status: u16, reason: &'static str, body: &'static str) -> Self {
            StubResponse {
                status,
                reason,
                content_type: "application/json",
                body,
                drop_connection: false,
            }
        }

        fn reset() -> Self {
            StubResponse {
                status: 0,
                reason: "",
                content_type: "",
                body: "",
                drop_connection: true,
            }
        }
    }

    /// One-shot HTTP stub answering scripted responses in order and
    /// reporting the requested paths.
    fn spawn_stub(responses: Vec<StubResponse>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let path = read_request(&mut stream);
                sender.send(path).unwrap();
                if response.drop_connection {
                    continue;
                }
                let payload = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.status,
                    response.reason,
                    response.content_type,
                    response.body.len(),
                    response.body
                );
                stream.write_all(payload.as_bytes()).unwrap();
            }
        });
        (base, receiver)
    }

    /// Read one full request (headers + body) and return its path.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break buf.len();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(idx) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
                break idx + 4;
            }
        };
        let header = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let content_length = header
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                if key.trim().eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        let mut body_len = buf.len() - header_end;
        while body_len < content_length {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            body_len += n;
        }
        header
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or("")
            .to_string()
    }

    fn payload() -> GenerationRequest {
        GenerationRequest {
            passage: "Jean 3:16".to_string(),
            version: BibleVersion::Lsg,
            enriched: true,
            target_chars: 500,
        }
    }

    #[test]
    fn request_payload_serializes_the_wire_fields() {
        let value = serde_json::to_value(payload()).unwrap();
        assert_eq!(
            value,
            json!({
                "passage": "Jean 3:16",
                "version": "LSG",
                "enriched": true,
                "target_chars": 500
            })
        );
    }

    #[test]
    fn fallback_skips_404_and_stops_at_first_success() {
        let (base, paths) = spawn_stub(vec![
            StubResponse::status(404, "Not Found", "{\"detail\":\"Not Found\"}"),
            StubResponse::ok_json("{\"content\":\"x\"}"),
        ]);
        let client = ApiClient::new(&base);
        let success = client
            .post_with_fallback(&["/a", "/b", "/c"], &payload())
            .unwrap();
        assert_eq!(success.data, json!({"content": "x"}));
        assert!(success.url.ends_with("/b"));
        let seen: Vec<String> = paths.try_iter().collect();
        assert_eq!(seen, vec!["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn single_500_failure_reports_status_url_and_body() {
        let (base, _paths) = spawn_stub(vec![StubResponse::status(
            500,
            "Internal Server Error",
            "{\"detail\":\"boom\"}",
        )]);
        let client = ApiClient::new(&base);
        let err = client
            .post_with_fallback(&["/only"], &payload())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"), "{message}");
        assert!(message.contains("/only"), "{message}");
        assert!(message.contains("boom"), "{message}");
    }

    #[test]
    fn transport_failure_does_not_stop_the_fallback_walk() {
        let (base, paths) = spawn_stub(vec![
            StubResponse::reset(),
            StubResponse::ok_json("{\"content\":\"après coupure\"}"),
        ]);
        let client = ApiClient::new(&base);
        let success = client.post_with_fallback(&["/a", "/b"], &payload()).unwrap();
        assert_eq!(success.data, json!({"content": "après coupure"}));
        assert!(success.url.ends_with("/b"));
        let seen: Vec<String> = paths.try_iter().collect();
        assert_eq!(seen, vec!["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn non_json_success_is_wrapped_as_raw() {
        let (base, _paths) = spawn_stub(vec![StubResponse {
            status: 200,
            reason: "OK",
            content_type: "text/plain; charset=utf-8",
            body: "Bonjour",
            drop_connection: false,
        }]);
        let client = ApiClient::new(&base);
        let success = client.post_with_fallback(&["/texte"], &payload()).unwrap();
        assert_eq!(success.data, json!({"raw": "Bonjour"}));
    }

    #[test]
    fn empty_candidate_list_reports_a_generic_failure() {
        let client = ApiClient::new("http://127.0.0.1:1");
        let err = client.post_with_fallback(&[], &payload()).unwrap_err();
        assert!(err.to_string().contains("all endpoints failed"));
    }

    #[test]
    fn content_text_prefers_content_then_raw() {
        assert_eq!(
            content_text(&json!({"content": "texte"})).as_deref(),
            Some("texte")
        );
        assert_eq!(
            content_text(&json!({"raw": "brut"})).as_deref(),
            Some("brut")
        );
        assert_eq!(content_text(&json!({"autre": 1})), None);
    }

    #[test]
    fn generated_content_renders_into_the_final_html() {
        let (base, _paths) = spawn_stub(vec![StubResponse::ok_json(
            "{\"content\":\"Intro.\\n\\nVERSET 16\\nTEXTE BIBLIQUE :\\nCar Dieu a tant aimé...\\nEXPLICATION THÉOLOGIQUE :\\nCe verset résume...\"}",
        )]);
        let client = ApiClient::new(&base);
        let success = client
            .post_with_fallback(&["/generate-verse-by-verse"], &payload())
            .unwrap();
        let raw = content_text(&success.data).unwrap();
        let html = crate::render::format_study(&raw);
        assert!(html.contains("<div class=\"introduction\">"));
        assert!(html.contains("VERSET 16"));
        assert!(html.contains("Car Dieu a tant aimé..."));
        assert!(html.contains("Ce verset résume..."));
        assert_eq!(html.matches("verset-block").count(), 1);
    }

    #[test]
    fn non_string_content_is_pretty_printed() {
        let text = content_text(&json!({"content": {"a": 1}})).unwrap();
        assert!(text.contains("\"a\": 1"));
    }
}
