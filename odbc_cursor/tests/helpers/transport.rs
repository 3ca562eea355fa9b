//! In-memory engine for integration tests: replies are queued up front and
//! every command sent is recorded.

use odbc_cursor::{Connection, Credentials, DriverConfig, DriverContext, Reply, Result, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct Script {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

struct ScriptedTransport(Script);

impl Transport for ScriptedTransport {
    fn exchange(&mut self, command: &str) -> Result<Reply> {
        self.0.sent.lock().unwrap().push(command.to_string());
        Ok(self
            .0
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::ok("")))
    }
}

#[allow(dead_code)]
impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply. Once the queue is empty every command gets
    /// an empty success.
    pub fn reply(&self, text: &str) -> &Self {
        self.replies.lock().unwrap().push_back(Reply::ok(text));
        self
    }

    pub fn fail(&self, status: i32, text: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::error(status, text));
        self
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn connection(&self, config: DriverConfig) -> Connection {
        let context = DriverContext::new(config, Credentials::new("tester", "secret"));
        Connection::open(Box::new(ScriptedTransport(self.clone())), context)
            .expect("scripted connection")
    }
}
