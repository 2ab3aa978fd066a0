//! Chat history and in-flight requests.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use super::client::{ChatMessage, ChatModel, Role};
use super::executor::{execute, Answer};
use super::plan::{extract_block, parse_plan, system_prompt};
use crate::analysis::ChartData;
use crate::data::Table;
use crate::error::{AnalystError, Result};

/// History marker appended when an answer carries a chart
pub const CHART_MARKER: &str = "(Chart Generated)";

/// Warning shown when a plan ran but produced nothing to show
pub const NO_OUTPUT: &str = "Query ran but produced no output. Try asking for a value or a chart.";

/// A reply still being computed on a worker thread
pub struct PendingReply {
    question: String,
    receiver: Receiver<Result<String>>,
}

/// Conversation state for the chat page
#[derive(Default)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
    last_plan: Option<String>,
    last_chart: Option<ChartData>,
    pending: Option<PendingReply>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn last_plan(&self) -> Option<&str> {
        self.last_plan.as_deref()
    }

    pub fn last_chart(&self) -> Option<&ChartData> {
        self.last_chart.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.last_plan = None;
        self.last_chart = None;
        self.pending = None;
    }

    /// Messages sent for one question: the table-aware system prompt plus the question
    pub fn build_request(table: &Table, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(system_prompt(table)),
            ChatMessage::user(question),
        ]
    }

    /// Record the question and start the model call on a worker thread
    pub fn submit(&mut self, model: Arc<dyn ChatModel>, table: &Table, question: &str) {
        let messages = Self::build_request(table, question);
        self.history.push(ChatMessage::user(question));

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(model.complete(&messages));
        });

        info!(question, "chat question submitted");
        self.pending = Some(PendingReply {
            question: question.to_string(),
            receiver: rx,
        });
    }

    /// Collect a finished reply, if any, and apply it to `table`.
    ///
    /// Returns `None` while the worker is still running.
    pub fn poll(&mut self, table: &Table) -> Option<Result<Answer>> {
        let pending = self.pending.as_ref()?;
        let reply = match pending.receiver.try_recv() {
            Ok(reply) => reply,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                Err(AnalystError::Llm("worker stopped without a reply".into()))
            }
        };
        let question = pending.question.clone();
        self.pending = None;

        Some(reply.and_then(|raw| self.apply_reply(&question, &raw, table)))
    }

    /// Ask synchronously; used by the headless `ask` command
    pub fn ask_blocking(&mut self, model: &dyn ChatModel, table: &Table, question: &str) -> Result<Answer> {
        let messages = Self::build_request(table, question);
        self.history.push(ChatMessage::user(question));
        let raw = model.complete(&messages)?;
        self.apply_reply(question, &raw, table)
    }

    /// Parse and run a raw model reply, updating history
    fn apply_reply(&mut self, question: &str, raw: &str, table: &Table) -> Result<Answer> {
        self.last_plan = Some(extract_block(raw).to_string());
        let answer = parse_plan(raw).and_then(|plan| execute(&plan, table));

        match &answer {
            Ok(answer) => {
                if let Some(text) = answer.text.as_deref().filter(|t| !t.is_empty()) {
                    self.history.push(ChatMessage::assistant(text));
                }
                if let Some(chart) = &answer.chart {
                    self.history.push(ChatMessage::assistant(CHART_MARKER));
                    self.last_chart = Some(chart.clone());
                }
                if answer.is_empty() {
                    warn!(question, "plan produced no output");
                }
            }
            Err(e) => warn!(question, error = %e, "chat reply could not be executed"),
        }

        answer
    }

    /// Number of assistant messages so far
    pub fn assistant_turns(&self) -> usize {
        self.history.iter().filter(|m| m.role == Role::Assistant).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_csv;
    use std::time::{Duration, Instant};

    struct CannedModel(String);

    impl ChatModel for CannedModel {
        fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn table() -> Table {
        read_csv("region,sales\nNorth,10\nSouth,30\n".as_bytes()).unwrap()
    }

    #[test]
    fn test_build_request_has_system_then_user() {
        let msgs = ChatSession::build_request(&table(), "total?");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1], ChatMessage::user("total?"));
    }

    #[test]
    fn test_ask_blocking_records_text_and_chart() {
        let model = CannedModel(
            "```json\n{\"op\":\"aggregate\",\"column\":\"sales\",\"func\":\"sum\",\"group_by\":\"region\",\"chart\":\"bar\"}\n```".into(),
        );
        let mut session = ChatSession::new();
        let answer = session.ask_blocking(&model, &table(), "sales by region").unwrap();

        assert!(answer.chart.is_some());
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history()[2].content, CHART_MARKER);
        assert_eq!(session.assistant_turns(), 2);
        assert!(session.last_plan().unwrap().starts_with("{\"op\""));
        assert!(session.last_chart().is_some());
    }

    #[test]
    fn test_bad_reply_keeps_history_consistent() {
        let model = CannedModel("I cannot help with that".into());
        let mut session = ChatSession::new();
        let result = session.ask_blocking(&model, &table(), "??");
        assert!(matches!(result, Err(AnalystError::Plan(_))));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_submit_then_poll() {
        let model: Arc<dyn ChatModel> =
            Arc::new(CannedModel(r#"{"op":"count"}"#.into()));
        let mut session = ChatSession::new();
        let t = table();
        session.submit(model, &t, "how many rows?");
        assert!(session.is_pending());

        let deadline = Instant::now() + Duration::from_secs(5);
        let answer = loop {
            if let Some(result) = session.poll(&t) {
                break result.unwrap();
            }
            assert!(Instant::now() < deadline, "reply never arrived");
            std::thread::sleep(Duration::from_millis(10));
        };

        assert_eq!(answer.text.as_deref(), Some("Rows: 2"));
        assert!(!session.is_pending());
        assert_eq!(session.history().last().unwrap().content, "Rows: 2");
    }
}
