use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, SpawnHandle, StreamHandler};
use actix_web_actors::ws;
use am_core::classify;
use am_logger::LlmLoggerRegistry;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::auth_url::detect_auth_url;
use crate::autorespond;
use crate::cwd_detect::detect_cwd;
use crate::session::{PtyEvent, PtySession};
use crate::shell::Shell;

const RECENT_OUTPUT_CAP: usize = 2048;
const QUIESCENCE_WINDOW: Duration = Duration::from_millis(500);
const ECHO_SUPPRESSION_WINDOW: Duration = Duration::from_secs(1);
const OUTPUT_FLUSH_THRESHOLD: Duration = Duration::from_millis(750);
const FLUSH_TICK: Duration = Duration::from_millis(200);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

const CLOSE_PTY_EXIT: u16 = 4000;
const CLOSE_TIMEOUT: u16 = 4001;
const CLOSE_READ_ERROR: u16 = 4002;

#[derive(Deserialize)]
struct ResizeFrame {
    #[serde(rename = "type")]
    kind: String,
    cols: u16,
    rows: u16,
}

/// One established terminal WebSocket connection. Owns its PTY session
/// handle exclusively for the lifetime of the socket; the `PtySession`
/// itself may outlive the actor (reused by am-server across reconnects).
pub type CwdChangeCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

pub struct PtyBridgeActor {
    session: Arc<PtySession>,
    shell: Shell,
    tab_id: String,
    logger_registry: Arc<LlmLoggerRegistry>,
    autorespond_enabled: bool,
    recent_output: String,
    last_cwd: Option<String>,
    last_auth_url: Option<String>,
    last_self_send: Option<Instant>,
    input_line_buffer: String,
    quiescence_handle: Option<SpawnHandle>,
    hb: Instant,
    on_cwd_change: Option<CwdChangeCallback>,
}

impl PtyBridgeActor {
    pub fn new(
        session: Arc<PtySession>,
        shell: Shell,
        tab_id: impl Into<String>,
        logger_registry: Arc<LlmLoggerRegistry>,
        autorespond_enabled: bool,
        known_cwd: Option<String>,
    ) -> Self {
        Self {
            session,
            shell,
            tab_id: tab_id.into(),
            logger_registry,
            autorespond_enabled,
            recent_output: String::new(),
            last_cwd: known_cwd,
            last_auth_url: None,
            last_self_send: None,
            input_line_buffer: String::new(),
            quiescence_handle: None,
            hb: Instant::now(),
            on_cwd_change: None,
        }
    }

    /// Invoked with `(tab_id, new_cwd)` whenever `cwd_detect` finds a
    /// changed prompt directory. The caller uses this to persist the
    /// directory so a reconnect can replay a `cd` into it (§4.10).
    pub fn with_cwd_change_callback(mut self, cb: CwdChangeCallback) -> Self {
        self.on_cwd_change = Some(cb);
        self
    }

    fn hb_tick(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if act.hb.elapsed() > CLIENT_TIMEOUT {
                close(ctx, CLOSE_TIMEOUT, "client heartbeat timeout");
                return;
            }
            ctx.ping(b"");
        });
    }

    fn replay_known_cwd(&self) {
        if let Some(dir) = &self.last_cwd {
            let cmd = self.shell.cd_command(dir);
            let _ = self.session.write_input(cmd.as_bytes());
        }
    }

    fn handle_inbound_binary(&mut self, data: Vec<u8>, ctx: &mut ws::WebsocketContext<Self>) {
        if self.session.write_input(&data).is_err() {
            close(ctx, CLOSE_READ_ERROR, "pty write failed");
            return;
        }

        let text = String::from_utf8_lossy(&data).into_owned();
        self.input_line_buffer.push_str(&text);

        let mut completed_lines = Vec::new();
        while let Some(pos) = self.input_line_buffer.find(['\r', '\n']) {
            let line: String = self.input_line_buffer.drain(..=pos).collect();
            completed_lines.push(line);
        }

        let tab_id = self.tab_id.clone();
        let logger_registry = self.logger_registry.clone();

        actix::spawn(async move {
            let logger = logger_registry.get_or_create(&tab_id);
            for line in &completed_lines {
                let detected = classify(line.trim());
                if detected.detected && logger.active_conversation_id().await.is_none() {
                    let _ = logger.start_conversation(&detected).await;
                }
            }
            if logger.active_conversation_id().await.is_some() {
                logger.add_user_input(&text).await;
            }
        });
    }

    fn handle_inbound_text(&self, text: &str) {
        if let Ok(resize) = serde_json::from_str::<ResizeFrame>(text) {
            if resize.kind == "resize" {
                let _ = self.session.resize(resize.cols, resize.rows);
            }
        }
    }

    fn handle_output_chunk(&mut self, bytes: Vec<u8>, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.binary(bytes.clone());

        let mirror_text = String::from_utf8_lossy(&bytes).into_owned();
        let tab_id = self.tab_id.clone();
        let logger_registry = self.logger_registry.clone();
        actix::spawn(async move {
            if let Some(logger) = logger_registry.get(&tab_id) {
                if logger.active_conversation_id().await.is_some() {
                    logger.add_assistant_output(&mirror_text).await;
                }
            }
        });

        let cleaned = am_core::ansi::strip_ansi(&mirror_text).cleaned;
        self.recent_output.push_str(&cleaned);
        if self.recent_output.len() > RECENT_OUTPUT_CAP {
            let excess = self.recent_output.len() - RECENT_OUTPUT_CAP;
            self.recent_output.drain(..excess);
        }

        if let Some(dir) = detect_cwd(&self.recent_output) {
            if self.last_cwd.as_deref() != Some(dir.as_str()) {
                self.last_cwd = Some(dir.clone());
                if let Some(cb) = &self.on_cwd_change {
                    cb(&self.tab_id, &dir);
                }
            }
        }

        if let Some(url) = detect_auth_url(&cleaned) {
            if self.last_auth_url.as_deref() != Some(url.as_str()) {
                self.last_auth_url = Some(url.clone());
                let payload = serde_json::json!({"type": "auth_url", "url": url});
                ctx.text(payload.to_string());
            }
        }

        if self.autorespond_enabled {
            if let Some(handle) = self.quiescence_handle.take() {
                ctx.cancel_future(handle);
            }
            let handle = ctx.run_later(QUIESCENCE_WINDOW, |act, _ctx| {
                act.quiescence_handle = None;
                act.try_autorespond();
            });
            self.quiescence_handle = Some(handle);
        }
    }

    fn try_autorespond(&mut self) {
        if let Some(last) = self.last_self_send {
            if last.elapsed() < ECHO_SUPPRESSION_WINDOW {
                return;
            }
        }
        if let Some(response) = autorespond::evaluate(&self.recent_output) {
            if self.session.write_input(response.as_bytes()).is_ok() {
                self.last_self_send = Some(Instant::now());
            }
        }
    }
}

fn close(ctx: &mut ws::WebsocketContext<PtyBridgeActor>, code: u16, reason: &str) {
    ctx.close(Some(ws::CloseReason {
        code: ws::CloseCode::Other(code),
        description: Some(reason.to_string()),
    }));
    ctx.stop();
}

impl Actor for PtyBridgeActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb_tick(ctx);
        self.replay_known_cwd();

        let stream = BroadcastStream::new(self.session.subscribe())
            .filter_map(|item| item.ok());
        ctx.add_stream(stream);

        let logger_registry = self.logger_registry.clone();
        let tab_id = self.tab_id.clone();
        ctx.run_interval(FLUSH_TICK, move |_act, _ctx| {
            let logger_registry = logger_registry.clone();
            let tab_id = tab_id.clone();
            actix::spawn(async move {
                if let Some(logger) = logger_registry.get(&tab_id) {
                    if logger.should_flush_output(OUTPUT_FLUSH_THRESHOLD).await {
                        let _ = logger.flush_output().await;
                    }
                }
            });
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(tab_id = %self.tab_id, "pty bridge socket closed");
        let logger_registry = self.logger_registry.clone();
        let tab_id = self.tab_id.clone();
        actix::spawn(async move {
            if let Some(logger) = logger_registry.get(&tab_id) {
                let _ = logger.end_conversation().await;
            }
        });
    }
}

impl StreamHandler<PtyEvent> for PtyBridgeActor {
    fn handle(&mut self, item: PtyEvent, ctx: &mut Self::Context) {
        match item {
            PtyEvent::Output(bytes) => self.handle_output_chunk(bytes, ctx),
            PtyEvent::Exited => {
                tracing::info!(tab_id = %self.tab_id, "pty process exited");
                close(ctx, CLOSE_PTY_EXIT, "pty exited");
            }
            PtyEvent::ReadError => {
                tracing::warn!(tab_id = %self.tab_id, "pty read error");
                close(ctx, CLOSE_READ_ERROR, "pty read error");
            }
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for PtyBridgeActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => {
                close(ctx, CLOSE_READ_ERROR, "protocol error");
                return;
            }
        };

        match msg {
            ws::Message::Binary(data) => self.handle_inbound_binary(data.to_vec(), ctx),
            ws::Message::Text(text) => self.handle_inbound_text(&text),
            ws::Message::Ping(msg) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            ws::Message::Pong(_) => self.hb = Instant::now(),
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => {}
        }
    }
}
