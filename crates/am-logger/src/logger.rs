use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use am_core::{
    classify, clean_user_input, parse_assistant_output, CommandType, ConversationTurn,
    DetectedCommand, EventBus, EventKind, LayerEvent, LlmConversation, Result, Role, LAYER_PTY,
};
use tokio::sync::Mutex;

use crate::storage::persist_conversation;

const SUGGESTED_PROMPT_MAX_CHARS: usize = 100;

pub type LowConfidenceCallback = Arc<dyn Fn(&str) + Send + Sync>;

struct State {
    conversations: HashMap<String, LlmConversation>,
    active_id: String,
    pending_user: String,
    pending_assistant: String,
    last_input_time: Instant,
    last_output_time: Instant,
}

impl State {
    fn new() -> Self {
        Self {
            conversations: HashMap::new(),
            active_id: String::new(),
            pending_user: String::new(),
            pending_assistant: String::new(),
            last_input_time: Instant::now(),
            last_output_time: Instant::now(),
        }
    }

    fn active_mut(&mut self) -> Option<&mut LlmConversation> {
        if self.active_id.is_empty() {
            None
        } else {
            self.conversations.get_mut(&self.active_id)
        }
    }
}

/// Owns one tab's conversation lifecycle: buffers raw I/O, flushes it into
/// turns, and persists the active conversation. Exactly one conversation
/// per tab is active at any time; starting while another is active simply
/// displaces the active id (the previous conversation is never lost, just
/// no longer receiving turns).
pub struct LlmLogger {
    tab_id: String,
    am_dir: PathBuf,
    bus: EventBus,
    autorespond: bool,
    state: Mutex<State>,
    low_confidence_callback: Option<LowConfidenceCallback>,
}

impl LlmLogger {
    pub fn new(tab_id: impl Into<String>, am_dir: PathBuf, bus: EventBus, autorespond: bool) -> Self {
        Self {
            tab_id: tab_id.into(),
            am_dir,
            bus,
            autorespond,
            state: Mutex::new(State::new()),
            low_confidence_callback: None,
        }
    }

    pub fn with_low_confidence_callback(mut self, cb: LowConfidenceCallback) -> Self {
        self.low_confidence_callback = Some(cb);
        self
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    /// Pure classification helper exposed for callers that want to decide
    /// whether a line is worth starting a conversation for before calling
    /// `start_conversation`.
    pub fn classify_line(line: &str) -> DetectedCommand {
        classify(line)
    }

    pub async fn active_conversation_id(&self) -> Option<String> {
        let state = self.state.lock().await;
        if state.active_id.is_empty() {
            None
        } else {
            Some(state.active_id.clone())
        }
    }

    pub async fn conversations(&self) -> Vec<LlmConversation> {
        let state = self.state.lock().await;
        state.conversations.values().cloned().collect()
    }

    pub async fn start_conversation(&self, detected: &DetectedCommand) -> Result<String> {
        let conversation_id = uuid::Uuid::new_v4().to_string();
        let mut conv = LlmConversation::new(
            &conversation_id,
            &self.tab_id,
            &detected.provider,
            detected.command_type,
            self.autorespond,
        );

        if !detected.initial_prompt.is_empty() {
            conv.turns.push(ConversationTurn::user(
                detected.initial_prompt.clone(),
                detected.provider.clone(),
                detected.initial_prompt.clone(),
            ));
        }

        persist_conversation(&self.am_dir, &conv).await?;

        let mut state = self.state.lock().await;
        state.conversations.insert(conversation_id.clone(), conv);
        state.active_id = conversation_id.clone();
        state.pending_user.clear();
        state.pending_assistant.clear();
        drop(state);

        self.bus.publish(
            LayerEvent::new(EventKind::LlmStart, LAYER_PTY)
                .with_tab_id(self.tab_id.clone())
                .with_conversation_id(conversation_id.clone())
                .with_provider(detected.provider.clone()),
        );

        Ok(conversation_id)
    }

    pub async fn add_user_input(&self, raw: &str) {
        let should_flush = {
            let mut state = self.state.lock().await;
            state.pending_user.push_str(raw);
            state.last_input_time = Instant::now();
            raw.contains('\r') || raw.contains('\n')
        };
        if should_flush {
            let _ = self.flush_user_input().await;
        }
    }

    pub async fn flush_user_input(&self) -> Result<()> {
        let pending_assistant = {
            let state = self.state.lock().await;
            !state.pending_assistant.is_empty() && !state.active_id.is_empty()
        };
        if pending_assistant {
            // A new user turn must never follow another user turn (§3); if
            // assistant bytes are still buffered, flush them into a turn
            // first so this user turn lands after it, not beside it.
            self.flush_output().await?;
        }

        let mut state = self.state.lock().await;
        let raw = std::mem::take(&mut state.pending_user);
        let cleaned = clean_user_input(&raw);
        if cleaned.is_empty() {
            return Ok(());
        }

        let Some(conv) = state.active_mut() else {
            return Ok(());
        };

        let provider = conv.provider.clone();
        conv.turns
            .push(ConversationTurn::user(cleaned.clone(), provider, raw));

        let turn_count = conv.turns.len();
        let suggested: String = cleaned.chars().take(SUGGESTED_PROMPT_MAX_CHARS).collect();
        conv.recovery.last_saved_turn = Some(turn_count - 1);
        conv.recovery.can_restore = true;
        conv.recovery.suggested_restore_prompt = Some(suggested);

        let conv_snapshot = conv.clone();
        drop(state);
        persist_conversation(&self.am_dir, &conv_snapshot).await
    }

    pub async fn add_assistant_output(&self, raw: &str) {
        let mut state = self.state.lock().await;
        state.pending_assistant.push_str(raw);
        state.last_output_time = Instant::now();
    }

    pub async fn should_flush_output(&self, threshold: Duration) -> bool {
        let state = self.state.lock().await;
        !state.pending_assistant.is_empty()
            && !state.active_id.is_empty()
            && state.last_output_time.elapsed() > threshold
    }

    pub async fn flush_output(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let raw = std::mem::take(&mut state.pending_assistant);
        if raw.is_empty() {
            return Ok(());
        }

        let Some(conv) = state.active_mut() else {
            return Ok(());
        };

        let provider = conv.provider.clone();
        let (content, confidence) = parse_assistant_output(&raw, &provider);
        if content.is_empty() {
            return Ok(());
        }

        conv.turns
            .push(ConversationTurn::assistant(content, provider, raw.clone(), confidence));

        let conv_snapshot = conv.clone();
        let autorespond = self.autorespond;
        drop(state);

        if confidence < 0.8 && autorespond {
            if let Some(cb) = &self.low_confidence_callback {
                cb(&raw);
            }
        }

        persist_conversation(&self.am_dir, &conv_snapshot).await
    }

    /// Idempotent: calling this with no active conversation is a no-op.
    pub async fn end_conversation(&self) -> Result<()> {
        self.flush_output().await?;

        let mut state = self.state.lock().await;
        if state.active_id.is_empty() {
            return Ok(());
        }
        let active_id = std::mem::take(&mut state.active_id);
        let Some(conv) = state.conversations.get_mut(&active_id) else {
            return Ok(());
        };
        conv.complete = true;
        conv.end_time = Some(chrono::Utc::now());
        let provider = conv.provider.clone();
        let conv_snapshot = conv.clone();
        drop(state);

        persist_conversation(&self.am_dir, &conv_snapshot).await?;

        self.bus.publish(
            LayerEvent::new(EventKind::LlmEnd, LAYER_PTY)
                .with_tab_id(self.tab_id.clone())
                .with_conversation_id(active_id)
                .with_provider(provider),
        );

        Ok(())
    }
}

#[allow(dead_code)]
fn assert_roles_never_double_user(turns: &[ConversationTurn]) -> bool {
    turns
        .windows(2)
        .all(|pair| !(pair[0].role == Role::User && pair[1].role == Role::User))
}
