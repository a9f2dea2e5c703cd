//! Per-connection LDAP session loop.
//!
//! A session reads one message at a time, dispatches it to the shared
//! [`DirectoryHandler`] and writes the responses before reading the next
//! message. The only state kept is the name of the last successful bind.

use std::io::Write;

use tracing::{debug, warn};

use crate::directory::DirectoryHandler;
use crate::protocol::{
    BindCredentials, BindRequest, LdapMessage, LdapResult, MessageReader, ProtocolError, Request,
    Response, ResultCode, SearchRequest, write_response,
};
use crate::transport::{ConnectionHandler, ConnectionStream};

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Serves LDAP sessions on accepted connections.
pub(crate) struct LdapConnectionHandler<H> {
    handler: H,
}

impl<H> LdapConnectionHandler<H> {
    pub(crate) const fn new(handler: H) -> Self {
        Self { handler }
    }
}

impl<H> ConnectionHandler for LdapConnectionHandler<H>
where
    H: DirectoryHandler + 'static,
{
    fn handle(&self, mut stream: ConnectionStream) {
        let peer = stream.peer();
        debug!(target: SESSION_TARGET, peer = %peer, "session opened");
        let mut session = Session::new(&self.handler);
        let mut reader = MessageReader::new();

        loop {
            let envelope = match reader.read_message(&mut stream) {
                Ok(Some(envelope)) => envelope,
                Ok(None) => break,
                Err(error) => {
                    if !error.is_disconnect() {
                        warn!(
                            target: SESSION_TARGET,
                            peer = %peer,
                            error = %error,
                            "failed to read message; closing connection"
                        );
                    }
                    break;
                }
            };
            let message = match LdapMessage::try_from(envelope) {
                Ok(message) => message,
                Err(error) => {
                    warn!(
                        target: SESSION_TARGET,
                        peer = %peer,
                        error = %error,
                        "unacceptable message; closing connection"
                    );
                    break;
                }
            };

            let message_id = message.message_id;
            let step = session.respond(message);
            if let Err(error) = write_responses(&mut stream, message_id, step.responses) {
                warn!(
                    target: SESSION_TARGET,
                    peer = %peer,
                    error = %error,
                    "failed to write response"
                );
                break;
            }
            if step.finished {
                break;
            }
        }

        self.handler.close(session.bind_dn());
        debug!(target: SESSION_TARGET, peer = %peer, "session closed");
    }
}

fn write_responses(
    stream: &mut ConnectionStream,
    message_id: i32,
    responses: Vec<Response>,
) -> Result<(), ProtocolError> {
    for response in responses {
        write_response(stream, message_id, response)?;
    }
    stream.flush()?;
    Ok(())
}

/// Responses produced for one request.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) responses: Vec<Response>,
    /// The client asked to end the session.
    pub(crate) finished: bool,
}

/// State of one directory session.
pub(crate) struct Session<'a, H: ?Sized> {
    handler: &'a H,
    bind_dn: String,
}

impl<'a, H> Session<'a, H>
where
    H: DirectoryHandler + ?Sized,
{
    pub(crate) fn new(handler: &'a H) -> Self {
        Self {
            handler,
            bind_dn: String::new(),
        }
    }

    /// Name of the last successful bind; empty while anonymous.
    pub(crate) fn bind_dn(&self) -> &str {
        self.bind_dn.as_str()
    }

    pub(crate) fn respond(&mut self, message: LdapMessage) -> Step {
        match message.request {
            Request::Bind(bind) => Step {
                responses: vec![Response::Bind(self.bind(&bind))],
                finished: false,
            },
            Request::Search(search) => Step {
                responses: self.search(&search),
                finished: false,
            },
            Request::Unbind => Step {
                responses: Vec::new(),
                finished: true,
            },
            Request::Abandon { .. } => Step::default(),
            Request::Unsupported(kind) => Step {
                responses: vec![Response::Unsupported {
                    kind,
                    result: LdapResult::new(
                        ResultCode::UnwillingToPerform,
                        format!("{} operations are not supported", kind.as_str()),
                    ),
                }],
                finished: false,
            },
        }
    }

    fn bind(&mut self, request: &BindRequest) -> LdapResult {
        // A failed bind leaves the session anonymous.
        self.bind_dn.clear();
        let BindCredentials::Simple(password) = &request.credentials else {
            return LdapResult::new(
                ResultCode::AuthMethodNotSupported,
                "only simple authentication is supported",
            );
        };

        match self.handler.bind(&request.name, password) {
            Ok(()) => {
                self.bind_dn.clone_from(&request.name);
                LdapResult::success()
            }
            Err(error) => LdapResult::new(error.result_code(), error.to_string()),
        }
    }

    fn search(&self, request: &SearchRequest) -> Vec<Response> {
        match self.handler.search(&self.bind_dn, request) {
            Ok(outcome) => {
                let mut responses: Vec<Response> = outcome
                    .entries
                    .into_iter()
                    .map(Response::SearchEntry)
                    .collect();
                responses.push(Response::SearchDone(LdapResult::new(
                    outcome.result_code,
                    String::new(),
                )));
                responses
            }
            Err(error) => vec![Response::SearchDone(LdapResult::new(
                error.result_code(),
                error.to_string(),
            ))],
        }
    }
}
