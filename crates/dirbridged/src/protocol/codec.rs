//! Blocking framing over `ldap3_proto`'s BER codec.

use std::io::{self, Read, Write};

use bytes::BytesMut;
use ldap3_proto::LdapCodec;
use ldap3_proto::proto::LdapMsg;
use tokio_util::codec::{Decoder, Encoder};

use super::ProtocolError;
use super::message::Response;

/// Largest message the bridge buffers before closing the connection.
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Reads whole `LDAPMessage` envelopes from a blocking stream.
///
/// Bytes left over after one message stay buffered for the next call, so a
/// client may pipeline requests.
pub struct MessageReader {
    codec: LdapCodec,
    buffer: BytesMut,
}

impl MessageReader {
    /// Builds a reader with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codec: LdapCodec::default(),
            buffer: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    /// Reads the next complete message from `stream`.
    ///
    /// Returns `Ok(None)` when the stream ends between messages.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] for I/O failures, malformed envelopes and
    /// messages larger than [`MAX_MESSAGE_BYTES`].
    pub fn read_message<R: Read>(
        &mut self,
        stream: &mut R,
    ) -> Result<Option<LdapMsg>, ProtocolError> {
        let mut chunk = [0_u8; READ_CHUNK];
        loop {
            if let Some(message) = self
                .codec
                .decode(&mut self.buffer)
                .map_err(ProtocolError::codec)?
            {
                return Ok(Some(message));
            }
            if self.buffer.len() > MAX_MESSAGE_BYTES {
                return Err(ProtocolError::MessageTooLarge {
                    buffered: self.buffer.len(),
                    limit: MAX_MESSAGE_BYTES,
                });
            }

            let read = match stream.read(&mut chunk) {
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error.into()),
            };
            let Some(received) = chunk.get(..read).filter(|bytes| !bytes.is_empty()) else {
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(io::Error::from(io::ErrorKind::UnexpectedEof).into())
                };
            };
            self.buffer.extend_from_slice(received);
        }
    }
}

impl Default for MessageReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes one envelope into its BER bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::Codec`] when the codec refuses the message.
pub fn encode_message(message: LdapMsg) -> Result<BytesMut, ProtocolError> {
    let mut buffer = BytesMut::new();
    LdapCodec::default()
        .encode(message, &mut buffer)
        .map_err(ProtocolError::codec)?;
    Ok(buffer)
}

/// Writes `response` to `stream` as the answer to `message_id`.
///
/// # Errors
///
/// Returns [`ProtocolError`] when encoding or writing fails.
pub fn write_response<W: Write>(
    stream: &mut W,
    message_id: i32,
    response: Response,
) -> Result<(), ProtocolError> {
    let bytes = encode_message(response.into_message(message_id))?;
    stream.write_all(&bytes)?;
    Ok(())
}
