//! MCP Transport - 전송 계층 구현
//!
//! provider 프로세스와 stdin/stdout 으로 줄 단위 JSON-RPC 2.0 메시지를 주고받는다.
//! - stdout: 응답 (id 로 대기 중인 요청에 전달)
//! - stderr: 진단 출력 (debug 로그로 흘려보냄)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use toolgate_foundation::{Error, Result};
use tracing::{debug, error, info, warn};

/// 기본 요청 제한 시간
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC 2.0 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// provider 가 보낸 요청에 대한 에러 응답
    pub fn error_reply(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            result: None,
            error: Some(error),
        }
    }

    /// 응답 id (정수 id 만 사용)
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.as_ref().and_then(Value::as_u64)
    }

    /// 결과 또는 에러로 변환
    pub fn into_result(self) -> Result<Value> {
        if let Some(error) = self.error {
            return Err(Error::Protocol(format!(
                "provider error {}: {}",
                error.code, error.message
            )));
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// JSON-RPC 에러
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }
}

/// JSON-RPC 알림 (응답 없음)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }
}

/// stdout 한 줄의 해석 결과
#[derive(Debug)]
enum Incoming {
    /// 우리 요청에 대한 응답
    Response(JsonRpcResponse),
    /// provider 가 보낸 요청 (응답 필요)
    Request { id: Value, method: String },
    /// provider 가 보낸 알림
    Notification { method: String },
}

fn parse_incoming(line: &str) -> Option<Incoming> {
    let value: Value = serde_json::from_str(line).ok()?;
    match value.get("method").and_then(Value::as_str) {
        Some(method) => {
            let method = method.to_string();
            match value.get("id") {
                Some(id) if !id.is_null() => Some(Incoming::Request {
                    id: id.clone(),
                    method,
                }),
                _ => Some(Incoming::Notification { method }),
            }
        }
        None => serde_json::from_value(value).ok().map(Incoming::Response),
    }
}

type PendingMap = Arc<RwLock<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// MCP Transport trait
///
/// 하나의 provider 연결. 테스트에서는 가짜 구현을 끼울 수 있다.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// 요청 전송 및 응답 수신
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value>;

    /// 알림 전송 (응답 없음)
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()>;

    /// 연결 종료
    async fn close(&self) -> Result<()>;

    /// 연결 상태 확인
    fn is_connected(&self) -> bool;
}

/// Stdio Transport - 프로세스 기반 통신
pub struct StdioTransport {
    /// provider 이름 (로그용)
    name: String,

    /// 요청 ID 카운터
    request_id: AtomicU64,

    /// 자식 프로세스
    child: Mutex<Option<Child>>,

    /// stdin writer
    stdin_tx: mpsc::Sender<String>,

    /// 대기 중인 요청들 (id -> response sender)
    pending_requests: PendingMap,

    /// 연결 상태
    connected: Arc<AtomicBool>,

    /// 요청 제한 시간
    timeout: Duration,
}

impl StdioTransport {
    /// 새 stdio transport 생성 및 프로세스 시작
    ///
    /// 환경은 현재 프로세스 환경에 `env` 를 덧붙인 것이다.
    pub async fn spawn(
        name: &str,
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<Self> {
        info!("Spawning provider '{}': {} {:?}", name, command, args);

        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Spawn(format!("provider '{}' ({}): {}", name, command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn("Failed to capture stdout".to_string()))?;
        let stderr = child.stderr.take();

        // 요청 전송용 채널
        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(32);

        let pending_requests: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let connected = Arc::new(AtomicBool::new(true));

        // stdin writer task
        let connected_for_writer = Arc::clone(&connected);
        let writer_name = name.to_string();
        let mut stdin_writer = stdin;
        tokio::spawn(async move {
            while let Some(msg) = stdin_rx.recv().await {
                let written = match stdin_writer.write_all(msg.as_bytes()).await {
                    Ok(()) => stdin_writer.flush().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = written {
                    error!("Failed to write to provider '{}': {}", writer_name, e);
                    connected_for_writer.store(false, Ordering::SeqCst);
                    break;
                }
            }
        });

        // stdout reader task
        let pending_for_reader = Arc::clone(&pending_requests);
        let connected_for_reader = Arc::clone(&connected);
        let reply_tx = stdin_tx.clone();
        let reader_name = name.to_string();
        let mut reader = BufReader::new(stdout).lines();
        tokio::spawn(async move {
            while let Ok(Some(line)) = reader.next_line().await {
                debug!("[{}] <- {}", reader_name, line);

                match parse_incoming(&line) {
                    Some(Incoming::Response(response)) => {
                        if let Some(id) = response.numeric_id() {
                            let sender = pending_for_reader.write().await.remove(&id);
                            match sender {
                                Some(sender) => {
                                    let _ = sender.send(response);
                                }
                                None => debug!("[{}] response for unknown id {}", reader_name, id),
                            }
                        }
                    }
                    Some(Incoming::Request { id, method }) => {
                        // provider → host 요청은 지원하지 않는다
                        let reply =
                            JsonRpcResponse::error_reply(id, JsonRpcError::method_not_found(&method));
                        if let Ok(msg) = serde_json::to_string(&reply) {
                            let _ = reply_tx.send(format!("{}\n", msg)).await;
                        }
                    }
                    Some(Incoming::Notification { method }) => {
                        debug!("[{}] notification: {}", reader_name, method);
                    }
                    None => debug!("[{}] non JSON-RPC line ignored", reader_name),
                }
            }

            connected_for_reader.store(false, Ordering::SeqCst);
            // 남은 요청은 채널이 닫히면서 바로 실패한다
            pending_for_reader.write().await.clear();
            info!("Provider '{}' stdout closed", reader_name);
        });

        // stderr drain task
        if let Some(stderr) = stderr {
            let stderr_name = name.to_string();
            let mut lines = BufReader::new(stderr).lines();
            tokio::spawn(async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[{}] stderr: {}", stderr_name, line);
                }
            });
        }

        Ok(Self {
            name: name.to_string(),
            request_id: AtomicU64::new(1),
            child: Mutex::new(Some(child)),
            stdin_tx,
            pending_requests,
            connected,
            timeout,
        })
    }

    /// 다음 요청 ID 생성
    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn send_line(&self, msg: String) -> Result<()> {
        debug!("[{}] -> {}", self.name, msg);
        self.stdin_tx
            .send(format!("{}\n", msg))
            .await
            .map_err(|_| Error::Protocol(format!("provider '{}' stdin closed", self.name)))
    }
}

/// 응답 수신 채널 등록
///
/// 등록 뒤 연결 상태를 다시 본다. reader 는 `connected` 를 내린 다음 pending 을 비우므로
/// 그 사이에 들어간 항목은 여기서 지워야 한다. 연결이 끊겼으면 `None`.
async fn register_pending(
    pending: &PendingMap,
    connected: &AtomicBool,
    id: u64,
) -> Option<oneshot::Receiver<JsonRpcResponse>> {
    let (tx, rx) = oneshot::channel();
    pending.write().await.insert(id, tx);

    if connected.load(Ordering::SeqCst) {
        Some(rx)
    } else {
        pending.write().await.remove(&id);
        None
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if !self.is_connected() {
            return Err(Error::Protocol(format!(
                "provider '{}' is not connected",
                self.name
            )));
        }

        let id = self.next_id();
        let request = JsonRpcRequest::new(id, method, params);

        let rx = register_pending(&self.pending_requests, &self.connected, id)
            .await
            .ok_or_else(|| {
                Error::Protocol(format!("provider '{}' is not connected", self.name))
            })?;

        let msg = serde_json::to_string(&request)?;
        if let Err(e) = self.send_line(msg).await {
            self.pending_requests.write().await.remove(&id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(Error::Protocol(format!(
                    "provider '{}' exited before answering '{}'",
                    self.name, method
                )))
            }
            Err(_) => {
                self.pending_requests.write().await.remove(&id);
                return Err(Error::Timeout(format!(
                    "provider '{}' did not answer '{}' within {}s",
                    self.name,
                    method,
                    self.timeout.as_secs()
                )));
            }
        };

        response.into_result()
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::Protocol(format!(
                "provider '{}' is not connected",
                self.name
            )));
        }

        let msg = serde_json::to_string(&JsonRpcNotification::new(method, params))?;
        self.send_line(msg).await
    }

    async fn close(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);

        let mut child_guard = self.child.lock().await;
        if let Some(mut child) = child_guard.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill provider '{}': {}", self.name, e);
                return Err(Error::Io(e));
            }
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_rpc_request() {
        let request = JsonRpcRequest::new(1, "tools/list", Some(json!({"key": "value"})));
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["jsonrpc"], "2.0");
        assert_eq!(wire["id"], 1);
        assert_eq!(wire["method"], "tools/list");
    }

    #[test]
    fn test_notification_has_no_id() {
        let wire = serde_json::to_value(JsonRpcNotification::new(
            "notifications/initialized",
            None,
        ))
        .unwrap();
        assert!(wire.get("id").is_none());
        assert!(wire.get("params").is_none());
    }

    #[test]
    fn test_parse_incoming() {
        match parse_incoming(r#"{"jsonrpc":"2.0","id":3,"result":{"tools":[]}}"#) {
            Some(Incoming::Response(r)) => assert_eq!(r.numeric_id(), Some(3)),
            other => panic!("unexpected: {:?}", other),
        }
        match parse_incoming(r#"{"jsonrpc":"2.0","id":"a","method":"roots/list"}"#) {
            Some(Incoming::Request { method, .. }) => assert_eq!(method, "roots/list"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            parse_incoming(r#"{"jsonrpc":"2.0","method":"notifications/tools/list_changed"}"#),
            Some(Incoming::Notification { .. })
        ));
        assert!(parse_incoming("starting server...").is_none());
    }

    #[test]
    fn test_error_response_is_protocol_error() {
        let response: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"nope"}}"#,
        )
        .unwrap();
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(err.to_string().contains("-32601"));
    }

    #[tokio::test]
    async fn test_pending_entry_dropped_when_connection_already_gone() {
        let pending: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let connected = AtomicBool::new(false);

        assert!(register_pending(&pending, &connected, 7).await.is_none());
        assert!(pending.read().await.is_empty());

        connected.store(true, Ordering::SeqCst);
        let rx = register_pending(&pending, &connected, 8).await;
        assert!(rx.is_some());
        assert!(pending.read().await.contains_key(&8));

        // reader 종료 시 pending 을 비우면 대기 중인 쪽은 바로 깨어난다
        pending.write().await.clear();
        assert!(rx.unwrap().await.is_err());
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_is_spawn_error() {
        let result = StdioTransport::spawn(
            "ghost",
            "toolgate-definitely-missing-binary",
            &[],
            &BTreeMap::new(),
            None,
            DEFAULT_REQUEST_TIMEOUT,
        )
        .await;
        assert!(matches!(result, Err(Error::Spawn(_))));
    }
}
