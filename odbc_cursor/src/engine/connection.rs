use crate::config::{Credentials, DriverContext};
use crate::error::{DriverError, Result};
use crate::observability::StructuredLogger;
use log::Level;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// Status code and body of one round trip. Status 0 means success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: i32,
    pub text: String,
}

impl Reply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            status: 0,
            text: text.into(),
        }
    }

    pub fn error(status: i32, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }
}

/// Carries command text to the engine and brings the reply back.
pub trait Transport: Send {
    fn exchange(&mut self, command: &str) -> Result<Reply>;

    fn authenticate(&mut self, _credentials: &Credentials) -> Result<()> {
        Ok(())
    }
}

type SharedTransport = Arc<Mutex<Box<dyn Transport>>>;

/// Exclusive right to talk to the engine. Released when dropped.
pub struct AccessToken<'a> {
    transport: MutexGuard<'a, Box<dyn Transport>>,
}

impl AccessToken<'_> {
    pub fn exchange(&mut self, command: &str) -> Result<Reply> {
        self.transport.exchange(command)
    }
}

/// Handle to one engine session. Clones share the transport and its token.
#[derive(Clone)]
pub struct Connection {
    transport: SharedTransport,
    context: Arc<DriverContext>,
    logger: StructuredLogger,
}

impl Connection {
    pub fn open(mut transport: Box<dyn Transport>, context: DriverContext) -> Result<Self> {
        context.config.validate()?;
        let logger = StructuredLogger::new(context.config.logging);
        if let Err(e) = transport.authenticate(&context.credentials) {
            logger.log_connection(Level::Warn, &context.credentials.user, "rejected");
            return Err(e);
        }
        logger.log_connection(Level::Info, &context.credentials.user, "opened");
        Ok(Self {
            transport: Arc::new(Mutex::new(transport)),
            context: Arc::new(context),
            logger,
        })
    }

    pub fn context(&self) -> &DriverContext {
        &self.context
    }

    pub fn logger(&self) -> StructuredLogger {
        self.logger
    }

    /// Takes the token without waiting; a token held elsewhere is `Busy`.
    pub fn acquire(&self) -> Result<AccessToken<'_>> {
        match self.transport.try_lock() {
            Ok(guard) => Ok(AccessToken { transport: guard }),
            Err(TryLockError::WouldBlock) => Err(DriverError::Busy(
                "Connection is in use by another statement".to_string(),
            )),
            Err(TryLockError::Poisoned(_)) => {
                Err(DriverError::InternalError("Lock poisoned".to_string()))
            }
        }
    }

    /// One round trip under the token. A non-zero status becomes
    /// `DriverError::Backend`.
    pub fn exchange(&self, command: &str) -> Result<Reply> {
        let reply = {
            let mut token = self.acquire()?;
            token.exchange(command)?
        };
        self.logger.log_exchange(
            if reply.status == 0 {
                Level::Debug
            } else {
                Level::Warn
            },
            command,
            &[("status", reply.status.to_string())],
        );
        if reply.status != 0 {
            return Err(DriverError::Backend {
                status: reply.status,
                message: reply.text,
            });
        }
        Ok(reply)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Canned {
        replies: VecDeque<Reply>,
        sent: Arc<Mutex<Vec<String>>>,
        accept: bool,
    }

    impl Transport for Canned {
        fn exchange(&mut self, command: &str) -> Result<Reply> {
            self.sent.lock().unwrap().push(command.to_string());
            self.replies
                .pop_front()
                .ok_or_else(|| DriverError::InternalError("no reply".to_string()))
        }

        fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
            if self.accept && credentials.password() == "pw" {
                Ok(())
            } else {
                Err(DriverError::Backend {
                    status: 1045,
                    message: "Access denied".to_string(),
                })
            }
        }
    }

    fn open(replies: Vec<Reply>) -> (Connection, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = Canned {
            replies: replies.into(),
            sent: sent.clone(),
            accept: true,
        };
        let ctx = DriverContext::new(Default::default(), Credentials::new("app", "pw"));
        (Connection::open(Box::new(transport), ctx).unwrap(), sent)
    }

    #[test]
    fn test_exchange_status() {
        let (conn, sent) = open(vec![Reply::ok("a\n"), Reply::error(1064, "syntax")]);
        assert_eq!(conn.exchange("SELECT a").unwrap().text, "a\n");
        match conn.exchange("SELEC") {
            Err(DriverError::Backend { status, message }) => {
                assert_eq!(status, 1064);
                assert_eq!(message, "syntax");
            }
            other => panic!("Expected Backend, got {:?}", other),
        }
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_token_busy_then_released() {
        let (conn, _) = open(vec![Reply::ok("")]);
        let other = conn.clone();
        {
            let _held = conn.acquire().unwrap();
            assert!(matches!(other.exchange("x"), Err(DriverError::Busy(_))));
        }
        assert!(other.exchange("x").is_ok());
    }

    #[test]
    fn test_token_released_after_error() {
        let (conn, _) = open(vec![Reply::error(1, "bad")]);
        assert!(conn.exchange("x").is_err());
        assert!(conn.acquire().is_ok());
    }

    #[test]
    fn test_open_rejected() {
        let transport = Canned {
            replies: VecDeque::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
            accept: false,
        };
        let ctx = DriverContext::new(Default::default(), Credentials::new("app", "pw"));
        assert!(Connection::open(Box::new(transport), ctx).is_err());
    }
}
