//! App runners for interactive and one-shot mode

use std::env;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::application::ports::{ConfigStore, InboundReceiver, MessageChannel};
use crate::application::{EventLoop, LoopConfig, LoopEvent, QueryController, QueryEvent};
use crate::domain::config::{AppConfig, DEFAULT_LOG_LEVEL};
use crate::domain::query::QueryOutcome;
use crate::domain::time::Duration;
use crate::infrastructure::transcript::{Button, Routed};
use crate::infrastructure::{
    ConsoleControlSurface, ConsoleResponseSurface, LineRouter, MemoryView, ScriptedTranscript,
    SpinnerControlSurface, TerminalDictation, XdgConfigStore,
};

use super::presenter::Presenter;
use super::signals::forward_shutdown;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the host socket path
pub const SOCKET_ENV: &str = "WRIST_QUERY_SOCKET";

/// Settings shared by both runners
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub socket: PathBuf,
    pub timeout: Option<Duration>,
    pub icons: bool,
}

impl RunOptions {
    /// Resolve options from a merged config
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            socket: config.host_socket_or_default(),
            timeout: config.timeout_or_default(),
            icons: config.icons_or_default(),
        }
    }

    fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            timeout: self.timeout,
            icons: self.icons,
        }
    }
}

/// Run the interactive companion until the user quits
pub async fn run_interactive(options: RunOptions) -> ExitCode {
    let presenter = Presenter::new();
    let (channel, inbound) = open_channel(&options.socket, &presenter).await;
    let (dictation, router) = TerminalDictation::new();

    let controller = QueryController::new(ConsoleControlSurface::new(), ConsoleResponseSurface::new());
    let event_loop = EventLoop::new(
        controller,
        dictation,
        channel,
        inbound,
        options.loop_config(),
    );

    let tx = event_loop.sender();
    forward_shutdown(tx.clone());
    spawn_input(router, tx, presenter);

    presenter.key_help();
    let controller = event_loop.run().await;
    debug!(outcome = ?controller.last_outcome(), "interactive session ended");

    ExitCode::from(EXIT_SUCCESS)
}

/// Ask one question with a fixed transcript and print the answer
pub async fn run_oneshot(question: String, options: RunOptions) -> ExitCode {
    let presenter = Presenter::new();
    let (channel, inbound) = open_channel(&options.socket, &presenter).await;

    let response = MemoryView::new();
    let controller = QueryController::new(SpinnerControlSurface::new(), response.clone());
    let event_loop = EventLoop::new(
        controller,
        ScriptedTranscript::success(question),
        channel,
        inbound,
        LoopConfig {
            icons: false,
            ..options.loop_config()
        },
    );
    forward_shutdown(event_loop.sender());

    let controller = event_loop.run_single().await;

    match controller.last_outcome() {
        Some(QueryOutcome::Answered) => {
            if let Some(answer) = controller.last_response() {
                presenter.output(answer);
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Some(QueryOutcome::HostError) => {
            let message = controller
                .last_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| QueryOutcome::HostError.describe().to_string());
            presenter.error(&message);
            ExitCode::from(EXIT_ERROR)
        }
        Some(outcome) => {
            presenter.error(outcome.describe());
            ExitCode::from(EXIT_ERROR)
        }
        None => {
            presenter.warn("Interrupted");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Connect to the host, falling back to a channel that is not open
#[cfg(unix)]
async fn open_channel(
    path: &Path,
    presenter: &Presenter,
) -> (Box<dyn MessageChannel>, InboundReceiver) {
    use crate::infrastructure::UnixSocketChannel;

    match UnixSocketChannel::connect(path).await {
        Ok((channel, inbound)) => (Box::new(channel), inbound),
        Err(e) => {
            info!(path = %path.display(), error = %e, "host unreachable");
            presenter.warn(&format!(
                "Host not reachable at {} ({}); questions will not be sent",
                path.display(),
                e
            ));
            let (channel, inbound) = UnixSocketChannel::disconnected(path);
            (Box::new(channel), inbound)
        }
    }
}

/// No host transport on this platform; every send fails with "not open"
#[cfg(not(unix))]
async fn open_channel(
    path: &Path,
    presenter: &Presenter,
) -> (Box<dyn MessageChannel>, InboundReceiver) {
    use crate::infrastructure::LoopbackChannel;

    presenter.warn(&format!(
        "Host sockets are not supported on this platform ({}); questions will not be sent",
        path.display()
    ));
    let (channel, inbound, _host) = LoopbackChannel::pair();
    (Box::new(channel), inbound)
}

/// Read stdin on a dedicated thread and turn lines into loop events.
///
/// Blocking reads live outside the runtime so shutdown never waits on them.
fn spawn_input(router: LineRouter, tx: mpsc::Sender<LoopEvent>, presenter: Presenter) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };

            let event = match router.route(line) {
                Routed::Dictation => continue,
                Routed::Button(Button::Select) => QueryEvent::Trigger.into(),
                Routed::Button(Button::Back) => QueryEvent::ResponseDismissed.into(),
                Routed::Button(Button::Up) => QueryEvent::HistoryRequested.into(),
                Routed::Button(Button::Quit) => {
                    let _ = tx.blocking_send(LoopEvent::Shutdown);
                    return;
                }
                Routed::Unknown(line) => {
                    debug!(%line, "input outside a capture session ignored");
                    presenter.warn("Press Enter first, then type your question");
                    continue;
                }
            };

            if tx.blocking_send(event).is_err() {
                return;
            }
        }

        router.close();
        let _ = tx.blocking_send(LoopEvent::Shutdown);
    });
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    let env_config = AppConfig {
        host_socket: env::var(SOCKET_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins over the configured level; an unparsable level falls back
/// to the default.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level_or_default()))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
