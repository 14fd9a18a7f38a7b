//! Length-prefixed framing
//!
//! Every unit on the wire is a frame:
//!
//! ```text
//! +----------------------+---------------------+
//! | length (u32, BE)     | payload (length B)  |
//! +----------------------+---------------------+
//! ```
//!
//! The payload is one logical text line with no terminator. This layer
//! never looks inside the payload.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, Result};
use crate::protocol::constants::FRAME_HEADER_SIZE;

/// Build a complete frame (header + payload) in one buffer
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Write one frame, retrying short writes until the whole frame is out
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload);
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Write an already-encoded frame
pub async fn write_encoded<W>(writer: &mut W, frame: &Bytes) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame
///
/// `max` is the receiver's buffer capacity: a declared length `>= max` is
/// rejected before any payload byte is read. EOF anywhere inside the frame
/// surfaces as an I/O error.
pub async fn read_frame<R>(reader: &mut R, max: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await?;
    if len as usize >= max {
        return Err(ProtocolError::FrameTooLarge { len, max }.into());
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;

    tracing::trace!(len = len, "Frame decoded");

    Ok(Bytes::from(payload))
}
