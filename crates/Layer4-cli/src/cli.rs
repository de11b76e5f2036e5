//! 서브커맨드 실행

use anyhow::{anyhow, Context};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use toolgate_core::{CancelHandle, ChunkSink, OutputStream, ToolExecutionFacade};
use toolgate_foundation::{ConfirmationDelegate, HostConfig, ToolCallRequest, ToolResult};
use tracing::{info, warn};

/// 한 번의 CLI 실행에 필요한 구성 요소
pub struct Session {
    facade: ToolExecutionFacade,
    /// `--yes`: 프롬프트가 stdin 을 읽지 않는다
    auto_approve: bool,
}

impl Session {
    pub fn open(
        root: PathBuf,
        delegate: Arc<dyn ConfirmationDelegate>,
        auto_approve: bool,
    ) -> anyhow::Result<Self> {
        let config = HostConfig::load(&root)
            .with_context(|| format!("failed to load config under {}", root.display()))?;
        info!("Workspace: {}", root.display());
        Ok(Self {
            facade: ToolExecutionFacade::new(root, delegate, &config),
            auto_approve,
        })
    }

    /// 승인 후 명령 실행, 출력은 터미널로 바로 흘린다
    pub async fn run(&self, command: &str) -> anyhow::Result<ExitCode> {
        let cancel = CancelHandle::new();
        let on_interrupt = cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling command");
                on_interrupt.cancel();
            }
        });

        let result = self
            .facade
            .run_command(command, Some(terminal_sink()), cancel)
            .await;
        interrupt.abort();

        Ok(report(&result))
    }

    pub async fn read(
        &self,
        path: &str,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> anyhow::Result<ExitCode> {
        let mut args = json!({ "path": path });
        if let Some(offset) = offset {
            args["offset"] = json!(offset);
        }
        if let Some(limit) = limit {
            args["limit"] = json!(limit);
        }
        Ok(self.builtin("read_file", args).await)
    }

    /// `content` 가 없으면 stdin 전체를 쓴다 (`--yes` 필요)
    pub async fn write(&self, path: &str, content: Option<String>) -> anyhow::Result<ExitCode> {
        let content = write_content(content, self.auto_approve, || {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        })?;
        Ok(self
            .builtin("write_to_file", json!({ "path": path, "content": content }))
            .await)
    }

    pub async fn replace(&self, path: &str, old: &str, new: &str) -> anyhow::Result<ExitCode> {
        Ok(self
            .builtin(
                "replace_in_file",
                json!({ "path": path, "old_span": old, "new_span": new }),
            )
            .await)
    }

    /// 내장 + provider 도구 목록
    pub async fn tools(&self, as_json: bool) -> anyhow::Result<ExitCode> {
        self.start_providers().await?;
        let definitions = self.facade.tool_definitions().await;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&definitions)?);
        } else {
            for def in &definitions {
                println!(
                    "{:<32} {}",
                    def["name"].as_str().unwrap_or_default(),
                    first_line(def["description"].as_str().unwrap_or_default())
                );
            }
        }

        self.facade.providers().shutdown().await;
        Ok(ExitCode::SUCCESS)
    }

    /// manifest 검증/연결 결과
    pub async fn providers(&self) -> anyhow::Result<ExitCode> {
        let report = self.facade.providers().startup().await?;

        for name in &report.connected {
            println!("connected  {}", name);
        }
        for (name, reason) in &report.invalid {
            println!("invalid    {} ({})", name, reason);
        }
        for (name, reason) in &report.failed {
            println!("failed     {} ({})", name, reason);
        }
        for name in &report.disabled {
            println!("disabled   {}", name);
        }
        if report.connected.is_empty()
            && report.invalid.is_empty()
            && report.failed.is_empty()
            && report.disabled.is_empty()
        {
            println!("No providers configured in .toolgate/mcp.json");
        }

        self.facade.providers().shutdown().await;
        Ok(if report.invalid.is_empty() && report.failed.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    /// 이름으로 도구 호출 (`<provider>__<tool>` 포함)
    pub async fn call(&self, name: &str, args: Option<&str>) -> anyhow::Result<ExitCode> {
        let arguments = parse_json_arg(args)?;
        self.start_providers().await?;

        let result = self
            .facade
            .execute(
                ToolCallRequest::new(name, arguments),
                Some(terminal_sink()),
                CancelHandle::new(),
            )
            .await;

        self.facade.providers().shutdown().await;
        Ok(report(&result))
    }

    pub async fn prompt(
        &self,
        provider: &str,
        name: &str,
        args: Option<&str>,
    ) -> anyhow::Result<ExitCode> {
        let arguments = match args {
            Some(raw) => Some(parse_json_arg(Some(raw))?),
            None => None,
        };
        self.start_providers().await?;

        let outcome = self
            .facade
            .providers()
            .get_prompt(provider, name, arguments)
            .await;
        self.facade.providers().shutdown().await;

        let prompt = outcome?;
        if let Some(description) = &prompt.description {
            println!("# {}", description);
        }
        for message in &prompt.messages {
            println!("[{}] {}", message.role, message.content.to_text());
        }
        Ok(ExitCode::SUCCESS)
    }

    pub async fn resource(&self, provider: &str, uri: &str) -> anyhow::Result<ExitCode> {
        self.start_providers().await?;

        let outcome = self.facade.providers().read_resource(provider, uri).await;
        self.facade.providers().shutdown().await;

        for contents in outcome?.contents {
            match (contents.text, contents.blob) {
                (Some(text), _) => println!("{}", text),
                (None, Some(blob)) => println!("[binary {} ({} bytes base64)]", contents.uri, blob.len()),
                (None, None) => println!("[empty {}]", contents.uri),
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    async fn builtin(&self, name: &str, args: Value) -> ExitCode {
        let result = self
            .facade
            .execute(ToolCallRequest::new(name, args), None, CancelHandle::new())
            .await;
        report(&result)
    }

    async fn start_providers(&self) -> anyhow::Result<()> {
        let report = self.facade.providers().startup().await?;
        for (name, reason) in report.invalid.iter().chain(report.failed.iter()) {
            eprintln!("provider '{}' unavailable: {}", name, reason);
        }
        Ok(())
    }
}

/// 결과 출력 후 종료 코드 결정
fn report(result: &ToolResult) -> ExitCode {
    if result.success {
        println!("{}", result.to_text());
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", result.to_text());
        ExitCode::FAILURE
    }
}

/// 출력 청크를 stdout/stderr 로 그대로 전달
fn terminal_sink() -> ChunkSink {
    Arc::new(|chunk| match chunk.stream {
        OutputStream::Stdout => {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(chunk.text.as_bytes());
            let _ = out.flush();
        }
        OutputStream::Stderr => {
            let mut err = std::io::stderr().lock();
            let _ = err.write_all(chunk.text.as_bytes());
            let _ = err.flush();
        }
    })
}

/// 쓰기 내용 결정
///
/// stdin 을 내용으로 다 읽고 나면 승인 프롬프트가 EOF 만 보게 되므로
/// stdin 입력은 자동 승인일 때만 허용한다.
fn write_content(
    content: Option<String>,
    auto_approve: bool,
    read_stdin: impl FnOnce() -> std::io::Result<String>,
) -> anyhow::Result<String> {
    match content {
        Some(content) => Ok(content),
        None if auto_approve => read_stdin().context("failed to read content from stdin"),
        None => Err(anyhow!(
            "reading content from stdin needs --yes, since the confirmation prompt also reads stdin; pass --content instead"
        )),
    }
}

fn parse_json_arg(raw: Option<&str>) -> anyhow::Result<Value> {
    match raw {
        None => Ok(json!({})),
        Some(raw) => {
            let value: Value =
                serde_json::from_str(raw).map_err(|e| anyhow!("--args is not valid JSON: {}", e))?;
            if !value.is_object() {
                return Err(anyhow!("--args must be a JSON object"));
            }
            Ok(value)
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_arg() {
        assert_eq!(parse_json_arg(None).unwrap(), json!({}));
        assert_eq!(parse_json_arg(Some(r#"{"q":"x"}"#)).unwrap()["q"], "x");
        assert!(parse_json_arg(Some("[1]")).is_err());
        assert!(parse_json_arg(Some("{oops")).is_err());
    }

    #[test]
    fn test_stdin_content_requires_auto_approve() {
        let err = write_content(None, false, || panic!("stdin must not be read")).unwrap_err();
        assert!(err.to_string().contains("--yes"));

        let piped = write_content(None, true, || Ok("piped\n".to_string())).unwrap();
        assert_eq!(piped, "piped\n");

        let inline = write_content(Some("inline".into()), false, || panic!("unused")).unwrap();
        assert_eq!(inline, "inline");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("one\ntwo"), "one");
        assert_eq!(first_line(""), "");
    }
}
