//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use proxy_config_agent::config::AgentConfig;
use proxy_config_agent::process::{CommandOutput, ControllerError, ProcessController, Step};

pub const TOKEN: &str = "secret-token";
pub const APP_ID: &str = "edge";
pub const AUTHOR: &str = "ops";

/// A request as seen by the mock authority.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Programmable stand-in for the configuration authority.
pub struct MockAuthority {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockAuthority {
    /// Start a mock that answers every request with `respond(request)`.
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond = Arc::new(respond);

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((mut socket, _)) => {
                        let recorded = recorded.clone();
                        let respond = respond.clone();
                        tokio::spawn(async move {
                            let request = match read_request(&mut socket).await {
                                Ok(request) => request,
                                Err(_) => return,
                            };
                            let (status, body) = respond(&request);
                            recorded.lock().unwrap().push(request);

                            let response = format!(
                                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                status_line(status),
                                body.len(),
                                body
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, requests }
    }

    /// Mock that always serves `value` as the managed item.
    pub async fn serving(value: &str) -> Self {
        let body = item_body(value);
        Self::start(move |_| (200, body.clone())).await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// JSON body the authority returns for the managed item.
pub fn item_body(value: &str) -> String {
    serde_json::json!({
        "key": APP_ID,
        "value": value,
        "comment": "nginx.conf",
        "dataChangeCreatedBy": AUTHOR,
        "dataChangeLastModifiedBy": AUTHOR,
        "dataChangeCreatedTime": "2024-03-01T10:00:00.000+0800",
        "dataChangeLastModifiedTime": "2024-03-01T10:00:00.000+0800"
    })
    .to_string()
}

/// Agent config pointing at `authority` and managing `managed`.
pub fn agent_config(authority: &str, managed: &Path) -> AgentConfig {
    AgentConfig {
        ip: authority.to_string(),
        env: "DEV".into(),
        app_id: APP_ID.into(),
        token: TOKEN.into(),
        created_by: AUTHOR.into(),
        nginx_conf_path: managed.display().to_string(),
    }
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<RecordedRequest> {
    let mut reader = BufReader::new(socket);

    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        line.clear();
        reader.read_line(&mut line).await?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;

    Ok(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        401 => "401 Unauthorized",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Controller that counts invocations instead of running nginx.
#[derive(Clone, Default)]
pub struct RecordingController {
    pub validations: Arc<AtomicUsize>,
    pub reloads: Arc<AtomicUsize>,
    pub fail_validate: bool,
    pub fail_reload: bool,
}

impl RecordingController {
    pub fn failing_validate() -> Self {
        Self {
            fail_validate: true,
            ..Self::default()
        }
    }

    pub fn failing_reload() -> Self {
        Self {
            fail_reload: true,
            ..Self::default()
        }
    }

    pub fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl ProcessController for RecordingController {
    async fn validate(&self) -> Result<CommandOutput, ControllerError> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        if self.fail_validate {
            return Err(ControllerError::Failed {
                step: Step::Validate,
                status: "exit code 1".into(),
                output: "nginx: [emerg] unexpected end of file".into(),
            });
        }
        Ok(CommandOutput {
            combined: "nginx: configuration file test is successful".into(),
        })
    }

    async fn reload(&self) -> Result<CommandOutput, ControllerError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reload {
            return Err(ControllerError::Failed {
                step: Step::Reload,
                status: "exit code 1".into(),
                output: "nginx: [error] invalid PID number".into(),
            });
        }
        Ok(CommandOutput::default())
    }
}
