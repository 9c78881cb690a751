//! OctoPrint REST transport over blocking reqwest.
//!
//! Compound commands mirror what the print server expects from its own UI:
//! homing first zeroes the hotend target, pausing parks the head clear of
//! the bed.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;

use octopanel_core::{PushCommand, Transport, TransportError};

use crate::settings::Settings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const PAUSE_PARK_Y_MM: f32 = -60.0;

#[derive(Deserialize)]
struct ConnectionResponse {
    current: ConnectionCurrent,
}

#[derive(Deserialize)]
struct ConnectionCurrent {
    state: String,
}

#[derive(Deserialize)]
struct ToolResponse {
    tool0: ToolStatus,
}

#[derive(Deserialize)]
struct ToolStatus {
    target: f32,
}

#[derive(Deserialize)]
struct JobResponse {
    state: String,
}

pub struct OctoTransport {
    http: Client,
    base_url: String,
}

impl OctoTransport {
    pub fn new(settings: &Settings) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&settings.api_key)
            .map_err(|err| TransportError::Request(err.to_string()))?;
        headers.insert("X-Api-Key", key);
        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| TransportError::Request(err.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|err| TransportError::Request(err.to_string()))?;
        let status = response.status();
        // 409 means the printer is not connected; the tool endpoint answers
        // this while the connection endpoint still serves a state, so the
        // caller gets a distinguishable error rather than garbage.
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        response
            .json()
            .map_err(|err| TransportError::Malformed(err.to_string()))
    }

    fn post_json(&self, path: &str, body: serde_json::Value) -> Result<(), TransportError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .map_err(|err| TransportError::Request(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status(status.as_u16()))
        }
    }

    fn post_tool_target(&self, target_c: f32) -> Result<(), TransportError> {
        self.post_json(
            "/api/printer/tool",
            json!({"command": "target", "targets": {"tool0": target_c}}),
        )
    }
}

fn home_body() -> serde_json::Value {
    json!({"command": "home", "axes": "xyz"})
}

fn park_body() -> serde_json::Value {
    json!({
        "command": "jog",
        "x": 0.0,
        "y": PAUSE_PARK_Y_MM,
        "absolute": true,
    })
}

impl Transport for OctoTransport {
    fn connection_state(&mut self) -> Result<String, TransportError> {
        let response: ConnectionResponse = self.get("/api/connection")?;
        Ok(response.current.state)
    }

    fn tool_target(&mut self) -> Result<f32, TransportError> {
        let response: ToolResponse = self.get("/api/printer/tool")?;
        Ok(response.tool0.target)
    }

    fn job_state(&mut self) -> Result<String, TransportError> {
        let response: JobResponse = self.get("/api/job")?;
        Ok(response.state)
    }

    fn post(&mut self, command: &PushCommand) -> Result<(), TransportError> {
        match command {
            PushCommand::Connect => {
                self.post_json("/api/connection", json!({"command": "connect"}))
            }
            PushCommand::Disconnect => {
                self.post_json("/api/connection", json!({"command": "disconnect"}))
            }
            PushCommand::Cancel => self.post_json("/api/job", json!({"command": "cancel"})),
            PushCommand::Pause => {
                self.post_json(
                    "/api/job",
                    json!({"command": "pause", "action": "pause"}),
                )?;
                // Park the head clear of the print.
                self.post_json("/api/printer/printhead", park_body())
            }
            PushCommand::Resume => {
                self.post_json("/api/job", json!({"command": "pause", "action": "resume"}))
            }
            PushCommand::Home => {
                // Drop the hotend target before homing so a cancelled print
                // never leaves the nozzle cooking against the bed.
                self.post_tool_target(0.0)?;
                self.post_json("/api/printer/printhead", home_body())
            }
            PushCommand::Calibrate => self.post_json(
                "/api/printer/command",
                json!({"command": "play /sd/factory_setup.gcode"}),
            ),
            PushCommand::Target(target_c) => self.post_tool_target(*target_c),
            PushCommand::Extrude(amount_mm) => self.post_json(
                "/api/printer/tool",
                json!({"command": "extrude", "amount": amount_mm}),
            ),
            PushCommand::Rgb(r, g, b) => self.post_json(
                "/api/printer/command",
                json!({"command": format!("M150 R{r} U{g} B{b}")}),
            ),
        }
    }
}
