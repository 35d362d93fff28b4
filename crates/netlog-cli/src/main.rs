//! netlog: replays a HAR capture through the panel's request logger.
//!
//! Console requests are printed to stdout as JSON lines; diagnostics go to
//! stderr and are filtered with RUST_LOG.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use netlog_core::adapters::{HarReplaySource, ReplayLatency};
use netlog_core::config::PanelConfig;
use netlog_core::logging::{ConsoleScriptSink, JsonLinesChannel, LogSink, TracingLogSink};
use netlog_core::models::TabId;
use netlog_core::orchestration::NetworkLogger;

#[derive(Parser)]
#[command(name = "netlog", about = "Ordered network request logging for devtools panels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the entries of a HAR file as finished requests
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Path to the HAR capture
    har: PathBuf,
    /// Tab that console output is addressed to (overrides NETLOG_TAB_ID)
    #[arg(long)]
    tab_id: Option<i64>,
    /// Deliver every body after this many milliseconds instead of the recorded time
    #[arg(long)]
    latency_ms: Option<u64>,
    /// Log only request lines, not response bodies (overrides NETLOG_LOG_BODY)
    #[arg(long)]
    no_body: bool,
    /// Truncate logged bodies to this many characters (overrides NETLOG_MAX_BODY_CHARS)
    #[arg(long)]
    max_body_chars: Option<usize>,
    /// Where console lines are sent
    #[arg(long, value_enum, default_value_t = SinkKind::Script)]
    sink: SinkKind,
    /// Give up waiting for the queue after this many seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
}

impl ReplayArgs {
    /// Command-line flags win over whatever the environment configured.
    fn apply_overrides(&self, mut config: PanelConfig) -> PanelConfig {
        if let Some(tab_id) = self.tab_id {
            config.tab_id = TabId(tab_id);
        }
        if self.no_body {
            config.log_response_body = false;
        }
        if self.max_body_chars.is_some() {
            config.max_response_chars = self.max_body_chars;
        }
        config
    }

    fn latency(&self) -> ReplayLatency {
        self.latency_ms
            .map(|ms| ReplayLatency::Fixed(Duration::from_millis(ms)))
            .unwrap_or(ReplayLatency::Recorded)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum SinkKind {
    /// JSON console requests on stdout
    Script,
    /// tracing events on stderr
    Tracing,
}

fn build_sink<W: Write + Send + 'static>(kind: SinkKind, writer: W) -> Arc<dyn LogSink> {
    match kind {
        SinkKind::Script => Arc::new(ConsoleScriptSink::new(JsonLinesChannel::new(writer))),
        SinkKind::Tracing => Arc::new(TracingLogSink),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => {
            let config = args.apply_overrides(
                PanelConfig::from_env().context("Invalid NETLOG_* environment")?,
            );
            let sink = build_sink(args.sink, std::io::stdout());
            replay(&config, &args, sink).await
        }
    }
}

async fn replay(
    config: &PanelConfig,
    args: &ReplayArgs,
    sink: Arc<dyn LogSink>,
) -> anyhow::Result<()> {
    let source = HarReplaySource::from_path(&args.har)
        .with_context(|| format!("Failed to load HAR capture {}", args.har.display()))?
        .latency(args.latency());

    let logger = NetworkLogger::new(config, sink);
    logger.attach(&source);

    let replayed = source.replay();
    tracing::info!(entries = replayed, tab = %config.tab_id, "replaying HAR capture");

    logger
        .wait_for_idle(Some(Duration::from_secs(args.timeout_secs)))
        .await
        .context("Request queue did not drain")?;

    let snapshot = logger.queue().snapshot();
    tracing::info!(
        completed = snapshot.tasks_completed,
        drain_loops = snapshot.drain_loops_started,
        "replay finished"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use clap::Parser;
    use netlog_core::config::{LOG_BODY_ENV, MAX_BODY_CHARS_ENV, PanelConfig, TAB_ID_ENV};
    use netlog_core::models::TabId;

    use super::{Cli, Commands, ReplayArgs, SinkKind, build_sink, replay};

    const CAPTURE: &str = r#"{
        "log": {
            "entries": [
                {
                    "time": 20,
                    "request": {"method": "GET", "url": "https://example.test/a"},
                    "response": {"content": {"text": "abcdefgh"}}
                },
                {
                    "time": 1,
                    "request": {"method": "GET", "url": "https://example.test/b"},
                    "response": {"content": {"text": "xyz"}}
                }
            ]
        }
    }"#;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn parse(argv: &[&str]) -> ReplayArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Replay(args) => args,
        }
    }

    fn env(pairs: &'static [(&'static str, &'static str)]) -> PanelConfig {
        PanelConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        })
        .unwrap()
    }

    #[test]
    fn flags_override_environment() {
        let base = env(&[
            (TAB_ID_ENV, "3"),
            (LOG_BODY_ENV, "true"),
            (MAX_BODY_CHARS_ENV, "100"),
        ]);

        let args = parse(&[
            "netlog",
            "replay",
            "capture.har",
            "--tab-id",
            "9",
            "--no-body",
            "--max-body-chars",
            "4",
        ]);
        let config = args.apply_overrides(base.clone());
        assert_eq!(config.tab_id, TabId(9));
        assert!(!config.log_response_body);
        assert_eq!(config.max_response_chars, Some(4));

        let untouched = parse(&["netlog", "replay", "capture.har"]).apply_overrides(base.clone());
        assert_eq!(untouched, base);
        assert_eq!(parse(&["netlog", "replay", "x.har"]).sink, SinkKind::Script);
    }

    #[tokio::test]
    async fn replay_writes_console_requests_in_capture_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CAPTURE.as_bytes()).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = parse(&[
            "netlog",
            "replay",
            path.as_str(),
            "--sink",
            "script",
            "--tab-id",
            "4",
            "--max-body-chars",
            "3",
        ]);
        let config = args.apply_overrides(env(&[(TAB_ID_ENV, "1")]));

        let buffer = SharedBuffer::default();
        replay(&config, &args, build_sink(args.sink, buffer.clone()))
            .await
            .unwrap();

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"tabId":4,"code":"console.log(...[\"GET\",\"https://example.test/a\",[]]);"}"#,
                r#"{"tabId":4,"code":"console.log(...[\"abc…\"]);"}"#,
                r#"{"tabId":4,"code":"console.log(...[\"GET\",\"https://example.test/b\",[]]);"}"#,
                r#"{"tabId":4,"code":"console.log(...[\"xyz\"]);"}"#,
            ]
        );
    }

    #[tokio::test]
    async fn replay_reports_a_missing_capture() {
        let args = parse(&["netlog", "replay", "/nonexistent/capture.har"]);
        let buffer = SharedBuffer::default();
        let error = replay(&PanelConfig::default(), &args, build_sink(args.sink, buffer))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Failed to load HAR capture"));
    }
}
