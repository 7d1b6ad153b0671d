//! hf CLI連携モジュール
//!
//! サブコマンド:
//! - `hf tags` / `hf grep TAG...` / `hf cat`
//! - `hf show --json REF`
//! - `hf tags add|del ID -t TAG...`
//! - `hf rm REF`
//!
//! 引数は検証済みの値から1要素ずつ組み立て、シェルは経由しない。

use super::CatalogGateway;
use crate::config::Config;
use crate::error::{HfServeError, Result};
use hf_serve_common::{
    parse_detail, parse_reference_lines, parse_tag_list, reports_unknown_object,
    validate_reference, ImageRecord, Tag, TagSet,
};
use log::{debug, info, warn};
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use wait_timeout::ChildExt;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// hfコマンドのラッパー
#[derive(Debug, Clone)]
pub struct HfCli {
    program: String,
    prefix_args: Vec<String>,
    timeout: Duration,
}

/// 1回の実行結果
struct CommandOutput {
    command: String,
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: String,
}

impl CommandOutput {
    fn stdout_text(&self) -> Result<String> {
        String::from_utf8(self.stdout.clone()).map_err(|_| {
            HfServeError::Gateway(format!("{}: 出力がUTF-8ではありません", self.command))
        })
    }

    /// 終了コード0ならstdoutを返す
    fn checked_stdout(&self) -> Result<String> {
        if !self.status.success() {
            return Err(self.failure());
        }
        self.stdout_text()
    }

    fn failure(&self) -> HfServeError {
        HfServeError::Gateway(format!(
            "{} failed (code {:?}): {}",
            self.command,
            self.status.code(),
            self.stderr.trim()
        ))
    }
}

impl HfCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.hf_command())
            .with_prefix_args(config.hf_args.clone())
            .with_timeout(config.timeout())
    }

    pub fn with_prefix_args(mut self, args: Vec<String>) -> Self {
        self.prefix_args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.prefix_args.iter().map(String::as_str))
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let command = self.describe(args);
        info!("{}", command);

        let mut child = Command::new(&self.program)
            .args(&self.prefix_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HfServeError::Gateway(format!("{} を起動できません: {}", self.program, e)))?;

        // パイプが詰まらないよう待機中も読み続ける
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                warn!("{} timed out after {}s", command, self.timeout.as_secs());
                return Err(HfServeError::GatewayTimeout {
                    command,
                    seconds: self.timeout.as_secs(),
                });
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(HfServeError::Gateway(format!("{}: {}", command, e)));
            }
        };

        let stdout = collect_reader(stdout_reader)?;
        let stderr = String::from_utf8_lossy(&collect_reader(stderr_reader)?).into_owned();
        debug!("{} -> {:?} ({} bytes)", command, status.code(), stdout.len());

        Ok(CommandOutput { command, status, stdout, stderr })
    }

    fn run_list(&self, args: &[String]) -> Result<Vec<String>> {
        let output = self.run(args)?;
        // grepと同じく「該当なし」を終了コード1で返す場合がある
        if output.status.code() == Some(1)
            && output.stdout.iter().all(u8::is_ascii_whitespace)
            && output.stderr.trim().is_empty()
        {
            return Ok(Vec::new());
        }
        Ok(parse_reference_lines(&output.checked_stdout()?))
    }

    fn run_mutation(&self, args: &[String]) -> Result<()> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(output.failure());
        }
        Ok(())
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        source.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

fn collect_reader(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| HfServeError::Gateway("出力の読み取りに失敗".into()))?
            .map_err(HfServeError::from),
        None => Ok(Vec::new()),
    }
}

fn parse_error(context: &str, e: hf_serve_common::Error) -> HfServeError {
    HfServeError::Gateway(format!("{}: {}", context, e))
}

// =============================================
// 引数の組み立て
// =============================================

pub(crate) fn tags_args() -> Vec<String> {
    vec!["tags".to_string()]
}

pub(crate) fn grep_args(tags: &[Tag]) -> Vec<String> {
    std::iter::once("grep".to_string())
        .chain(tags.iter().map(Tag::to_string))
        .collect()
}

pub(crate) fn cat_args() -> Vec<String> {
    vec!["cat".to_string()]
}

pub(crate) fn show_args(reference: &str) -> Vec<String> {
    vec!["show".to_string(), "--json".to_string(), reference.to_string()]
}

pub(crate) fn tag_mutation_args(action: &str, id: u64, tags: &TagSet) -> Vec<String> {
    let mut args = vec!["tags".to_string(), action.to_string(), id.to_string()];
    for tag in tags {
        args.push("-t".to_string());
        args.push(tag.to_string());
    }
    args
}

pub(crate) fn rm_args(reference: &str) -> Vec<String> {
    vec!["rm".to_string(), reference.to_string()]
}

impl CatalogGateway for HfCli {
    fn list_all_tags(&self) -> Result<Vec<Tag>> {
        let stdout = self.run(&tags_args())?.checked_stdout()?;
        parse_tag_list(&stdout).map_err(|e| parse_error("hf tags", e))
    }

    fn search_by_tags(&self, tags: &[Tag]) -> Result<Vec<String>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        self.run_list(&grep_args(tags))
    }

    fn list_all_images(&self) -> Result<Vec<String>> {
        self.run_list(&cat_args())
    }

    fn get_detail(&self, reference: &str) -> Result<Option<ImageRecord>> {
        validate_reference(reference)?;
        let output = self.run(&show_args(reference))?;

        if !output.status.success() {
            if reports_unknown_object(&output.stderr) {
                debug!("hf show: unknown object {}", reference);
                return Ok(None);
            }
            return Err(output.failure());
        }

        let record = parse_detail(&output.stdout_text()?).map_err(|e| parse_error("hf show", e))?;
        Ok(record.map(|mut r| {
            if r.location.is_empty() {
                r.location = reference.to_string();
            }
            r
        }))
    }

    fn apply_add(&self, id: u64, tags: &TagSet) -> Result<()> {
        if tags.is_empty() {
            info!("Skip add_tags");
            return Ok(());
        }
        self.run_mutation(&tag_mutation_args("add", id, tags))
    }

    fn apply_delete(&self, id: u64, tags: &TagSet) -> Result<()> {
        if tags.is_empty() {
            info!("Skip del_tags");
            return Ok(());
        }
        self.run_mutation(&tag_mutation_args("del", id, tags))
    }

    fn delete_image(&self, reference: &str) -> Result<()> {
        validate_reference(reference)?;
        self.run_mutation(&rm_args(reference)).map_err(|e| {
            warn!("hf rm {} failed: {}", reference, e);
            e
        })
    }
}
