//! The wire protocol spoken with learner clients.
//!
//! Requests are textual and unframed, one message per socket read: `mq
//! <word>` asks whether the target accepts the word, `eq <bytes>` carries a
//! serialized hypothesis automaton for an equivalence check, `end` terminates
//! the session. Anything else is answered with `Not a query` and the session
//! continues.

use automata::codec;
use automata::Word;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::oracle::{DfaOracle, Oracle};
use crate::server::ServerConfig;

/// One request message, classified by its leading token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// `mq <word>`: does the target accept the word?
    Membership(&'a [u8]),
    /// `eq <bytes>`: a serialized hypothesis to test for equivalence.
    Equivalence(&'a [u8]),
    /// `end`: terminate the session.
    End,
    /// The message matches no recognized query.
    Unknown,
}

impl<'a> Request<'a> {
    /// Classifies a raw message by its leading token.
    pub fn classify(message: &'a [u8]) -> Self {
        if let Some(word) = message.strip_prefix(b"mq ") {
            Request::Membership(word)
        } else if let Some(hypothesis) = message.strip_prefix(b"eq ") {
            Request::Equivalence(hypothesis)
        } else if message.starts_with(b"end") {
            Request::End
        } else {
            Request::Unknown
        }
    }
}

/// The reply to a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Membership verdict, written as `true` or `false`.
    Membership(bool),
    /// Equivalence verdict: the counterexample word, or the literal `None`
    /// when the search found no disagreement. An empty-word counterexample
    /// renders as an empty response body.
    Counterexample(Option<Word>),
    /// The message matched no recognized query.
    NotAQuery,
    /// The membership word contains symbols outside the target's alphabet.
    InvalidWord,
    /// The hypothesis bytes did not decode to an automaton.
    InvalidAutomaton,
}

impl Response {
    /// Renders the response body as it is written to the socket.
    pub fn render(&self) -> String {
        match self {
            Response::Membership(accepted) => accepted.to_string(),
            Response::Counterexample(Some(word)) => word.to_string(),
            Response::Counterexample(None) => "None".to_string(),
            Response::NotAQuery => "Not a query".to_string(),
            Response::InvalidWord => "Not a valid word".to_string(),
            Response::InvalidAutomaton => "Not a valid automaton".to_string(),
        }
    }
}

/// Answers one classified request against the oracle. Returns `None` for
/// [`Request::End`], which closes the session without a response body.
pub fn dispatch(oracle: &DfaOracle, request: Request<'_>) -> Option<Response> {
    match request {
        Request::Membership(raw) => {
            let Ok(text) = std::str::from_utf8(raw) else {
                return Some(Response::InvalidWord);
            };
            match oracle.target().alphabet().parse_word(text.trim_end()) {
                Ok(word) => Some(Response::Membership(oracle.output(&word))),
                Err(error) => {
                    debug!(%error, "rejecting membership query");
                    Some(Response::InvalidWord)
                }
            }
        }
        Request::Equivalence(raw) => match codec::decode(raw) {
            Ok(hypothesis) => Some(Response::Counterexample(
                oracle.equivalence(&hypothesis).err(),
            )),
            Err(error) => {
                debug!(%error, "rejecting undecodable hypothesis");
                Some(Response::InvalidAutomaton)
            }
        },
        Request::End => None,
        Request::Unknown => Some(Response::NotAQuery),
    }
}

/// Failure of a single connection. Handled at the connection boundary: the
/// listener logs it and keeps serving every other connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Reading from or writing to the socket failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// No request arrived within the configured read timeout.
    #[error("timed out waiting for a request")]
    TimedOut,
}

/// Serves one connection: reads a message into a connection-scoped buffer,
/// classifies it, queries the oracle and writes the response, until the
/// client sends `end`, closes the socket, or a connection-level failure
/// occurs.
pub async fn handle_connection(
    oracle: &DfaOracle,
    stream: &mut TcpStream,
    config: &ServerConfig,
) -> Result<(), ConnectionError> {
    let mut buffer = vec![0u8; config.read_buffer_size];
    loop {
        let received = match config.read_timeout {
            Some(limit) => tokio::time::timeout(limit, stream.read(&mut buffer))
                .await
                .map_err(|_| ConnectionError::TimedOut)??,
            None => stream.read(&mut buffer).await?,
        };
        if received == 0 {
            debug!("client closed the connection");
            return Ok(());
        }

        let Some(response) = dispatch(oracle, Request::classify(&buffer[..received])) else {
            debug!("session ended by client");
            return Ok(());
        };
        stream.write_all(response.render().as_bytes()).await?;
    }
}
