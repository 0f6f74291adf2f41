//! Terminal front end.
//!
//! Stdin lines, health-poll ticks and finished network calls are all turned
//! into [`Message`]s on one channel. A single loop applies them to the
//! [`ViewState`] in arrival order and carries out the returned [`Effect`].

use anyhow::{anyhow, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::config::CliConfig;
use crate::providers::CloudType;
use crate::render;
use crate::view::{Effect, Message, SortKey, ViewState};

const HELP: &str = "\
关键词            搜索
/type <id>        切换网盘类型 (baidu, aliyun, quark, tianyi, uc, mobile, 115, pikpak, xunlei, 123, magnet, ed2k)
/all              全选 / 取消全选
/tab <id|all>     切换结果标签
/sort time|name   按时间 / 按名称排序 (再次选择切换升降序)
/copy <n>         复制第 n 条链接
/pw <n>           复制第 n 条提取码
/health           检查服务状态
/dismiss          关闭通知
/quit             退出";

pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// System clipboard via `arboard`. When no clipboard can be opened (headless
/// session, no display server) the text is printed for manual copying and
/// the copy is reported as failed.
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let inner = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                warn!("System clipboard unavailable: {}", e);
                None
            }
        };
        Self { inner }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        match self.inner.as_mut() {
            Some(clipboard) => {
                clipboard.set_text(text)?;
                Ok(())
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{text}")?;
                stdout.flush()?;
                Err(anyhow!("no system clipboard available"))
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Dispatch(Vec<Message>),
    Help,
    Quit,
}

#[derive(Debug)]
enum Event {
    Message(Message),
    Command(Result<Command, String>),
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Dispatch(vec![
            Message::QueryChanged(line.to_string()),
            Message::Submit,
        ]));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let index = |arg: Option<&str>| -> Result<usize, String> {
        arg.and_then(|a| a.parse().ok())
            .ok_or_else(|| format!("/{name} 需要一个序号"))
    };

    let message = match name {
        "quit" | "q" => return Ok(Command::Quit),
        "help" | "h" => return Ok(Command::Help),
        "all" => Message::ToggleAll,
        "health" => Message::HealthTick,
        "dismiss" => Message::DismissNotice,
        "type" => {
            let id = arg.ok_or("/type 需要网盘类型")?;
            let cloud_type = CloudType::from_id(id).ok_or_else(|| format!("未知网盘类型: {id}"))?;
            Message::ToggleProvider(cloud_type)
        }
        "tab" => match arg {
            None | Some("all") => Message::SelectTab(None),
            Some(tab) => Message::SelectTab(Some(tab.to_string())),
        },
        "sort" => match arg {
            Some("time") => Message::SortBy(SortKey::Datetime),
            Some("name") => Message::SortBy(SortKey::Name),
            _ => return Err("/sort time|name".to_string()),
        },
        "copy" => Message::CopyUrl(index(arg)?),
        "pw" => Message::CopyPassword(index(arg)?),
        other => return Err(format!("未知命令: /{other}")),
    };
    Ok(Command::Dispatch(vec![message]))
}

async fn read_stdin(tx: UnboundedSender<Event>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                if tx.send(Event::Command(parse_command(&line))).is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
    let _ = tx.send(Event::Quit);
}

async fn poll_health(tx: UnboundedSender<Event>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        // First tick fires immediately.
        interval.tick().await;
        if tx.send(Event::Message(Message::HealthTick)).is_err() {
            return;
        }
    }
}

fn execute(
    effect: Effect,
    client: &Arc<ApiClient>,
    clipboard: &mut dyn Clipboard,
    tx: &UnboundedSender<Event>,
) {
    match effect {
        Effect::None => {}
        Effect::Search(query) => {
            info!("Searching for: {}", query.kw);
            let client = Arc::clone(client);
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = client.search(&query).await.map_err(|e| {
                    warn!("Search failed: {}", e);
                    e.to_string()
                });
                let _ = tx.send(Event::Message(Message::SearchFinished(outcome)));
            });
        }
        Effect::CheckHealth => {
            let client = Arc::clone(client);
            let tx = tx.clone();
            tokio::spawn(async move {
                let report = client.health().await;
                debug!("Health report: {:?}", report);
                let _ = tx.send(Event::Message(Message::HealthChecked(report)));
            });
        }
        Effect::Copy { text, what } => {
            let ok = match clipboard.copy(&text) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Copy failed: {}", e);
                    false
                }
            };
            let _ = tx.send(Event::Message(Message::Copied { what, ok }));
        }
    }
}

pub async fn run() -> Result<()> {
    // Logs go to stderr; stdout carries the rendered view.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::from_env()?;
    info!("Search proxy: {}", config.api_base);

    let client = Arc::new(ApiClient::new(&config.api_base));
    let (tx, mut rx) = mpsc::unbounded_channel();

    tokio::spawn(read_stdin(tx.clone()));
    match config.health_interval {
        Some(period) => {
            tokio::spawn(poll_health(tx.clone(), period));
        }
        None => {
            let _ = tx.send(Event::Message(Message::HealthTick));
        }
    }
    if let Some(kw) = std::env::args().nth(1) {
        let _ = tx.send(Event::Command(Ok(Command::Dispatch(vec![
            Message::QueryChanged(kw),
            Message::Submit,
        ]))));
    }

    let mut state = ViewState::new();
    let mut clipboard = SystemClipboard::new();
    println!("{}", render::render(&state));

    while let Some(event) = rx.recv().await {
        let messages = match event {
            Event::Quit | Event::Command(Ok(Command::Quit)) => break,
            Event::Command(Ok(Command::Help)) => {
                println!("{HELP}");
                continue;
            }
            Event::Command(Err(msg)) => {
                println!("{msg}");
                continue;
            }
            Event::Command(Ok(Command::Dispatch(messages))) => messages,
            Event::Message(message) => vec![message],
        };

        for message in messages {
            let effect = state.update(message);
            execute(effect, &client, &mut clipboard, &tx);
        }
        println!("{}", render::render(&state));
    }

    Ok(())
}
