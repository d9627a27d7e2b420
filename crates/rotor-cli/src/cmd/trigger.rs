use std::time::Duration;

use chrono::Utc;
use rotor_core::config::Config;
use rotor_core::state::format_timestamp;
use serde_json::{json, Value};

use crate::output::print_json;

/// Response of one call to the rotate endpoint.
pub(crate) struct Relay {
    pub ok: bool,
    pub body: Value,
}

pub fn run(config: &Config, server: Option<&str>) -> anyhow::Result<()> {
    let base = server
        .map(str::to_string)
        .unwrap_or_else(|| config.server.base_url());
    let relay = invoke(&base, request_timeout(config));
    let triggered_at = format_timestamp(Utc::now());

    if relay.ok {
        print_json(&json!({
            "success": true,
            "rotationResult": relay.body,
            "triggeredAt": triggered_at,
        }))?;
        Ok(())
    } else {
        print_json(&json!({
            "success": false,
            "details": relay.body,
            "triggeredAt": triggered_at,
        }))?;
        anyhow::bail!("rotation failed")
    }
}

/// POST `{base}/api/rotate`. Transport failures are folded into the relay
/// so callers always have a body to report.
pub(crate) fn invoke(base: &str, timeout: Duration) -> Relay {
    let url = format!("{}/api/rotate", base.trim_end_matches('/'));
    let request_id = format!("req_{}", uuid::Uuid::new_v4().simple());
    tracing::info!(%url, %request_id, "triggering rotation");

    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let result = agent
        .post(&url)
        .set("content-type", "application/json")
        .set("x-request-id", &request_id)
        .send_string("{}");

    match result {
        Ok(resp) => {
            let body = read_body(resp);
            let ok = body.get("success").and_then(Value::as_bool) != Some(false);
            Relay { ok, body }
        }
        Err(ureq::Error::Status(code, resp)) => {
            tracing::warn!(%url, status = code, "rotation endpoint returned an error");
            Relay {
                ok: false,
                body: read_body(resp),
            }
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "rotation endpoint unreachable");
            Relay {
                ok: false,
                body: json!({ "error": e.to_string() }),
            }
        }
    }
}

/// Long enough for a full deploy wait plus slack for create and delete.
pub(crate) fn request_timeout(config: &Config) -> Duration {
    config.rotation.deploy_timeout() + Duration::from_secs(60)
}

fn read_body(resp: ureq::Response) -> Value {
    match resp.into_string() {
        Ok(text) => parse_body(text),
        Err(e) => json!({ "error": format!("could not read response: {e}") }),
    }
}

fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_bodies_are_kept() {
        let body = parse_body(r#"{"success":true}"#.to_string());
        assert_eq!(body["success"], true);
    }

    #[test]
    fn non_json_bodies_are_wrapped() {
        let body = parse_body("<html>Bad Gateway</html>".to_string());
        assert_eq!(body["raw"], "<html>Bad Gateway</html>");
    }

    #[test]
    fn unreachable_server_is_a_failed_relay() {
        let relay = invoke("http://127.0.0.1:9", Duration::from_secs(2));
        assert!(!relay.ok);
        assert!(relay.body.get("error").is_some());
    }

    #[test]
    fn timeout_covers_deploy_wait() {
        let config = Config::default();
        assert_eq!(request_timeout(&config), Duration::from_secs(360));
    }
}
