//! Host socket packet framing
//!
//! Every packet is `u8 kind`, `u16` little-endian payload length, then the
//! payload. DATA carries one encoded dictionary frame and is answered by the
//! receiver with ACK (empty) or NACK (UTF-8 reason).

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::domain::frame::MAX_FRAME_BYTES;
use crate::domain::text::{truncate_str, MAX_TEXT_BYTES};

const KIND_DATA: u8 = 1;
const KIND_ACK: u8 = 2;
const KIND_NACK: u8 = 3;

/// Packet errors
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("Unknown packet kind: {0}")]
    UnknownKind(u8),

    #[error("Packet payload of {size} bytes exceeds limit of {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("ACK packet carries {0} payload bytes")]
    UnexpectedPayload(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PacketError {
    /// Whether the stream is still aligned on a packet boundary
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// One packet on the host socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Encoded dictionary frame
    Data(Vec<u8>),
    /// Delivery confirmed
    Ack,
    /// Delivery refused, with a reason
    Nack(String),
}

impl Packet {
    fn kind(&self) -> u8 {
        match self {
            Self::Data(_) => KIND_DATA,
            Self::Ack => KIND_ACK,
            Self::Nack(_) => KIND_NACK,
        }
    }

    /// Serialize into header plus payload. NACK reasons are cut to fit.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let payload: &[u8] = match self {
            Self::Data(bytes) => {
                if bytes.len() > MAX_FRAME_BYTES {
                    return Err(PacketError::TooLarge {
                        size: bytes.len(),
                        limit: MAX_FRAME_BYTES,
                    });
                }
                bytes
            }
            Self::Ack => &[],
            Self::Nack(reason) => truncate_str(reason, MAX_TEXT_BYTES).as_bytes(),
        };

        let mut out = Vec::with_capacity(3 + payload.len());
        out.push(self.kind());
        // Bounded above by MAX_FRAME_BYTES
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        Ok(out)
    }
}

/// Read one packet. `Ok(None)` means the peer closed the stream cleanly.
///
/// An oversized payload is consumed before [`PacketError::TooLarge`] is
/// returned, so the next read starts at the following header.
pub async fn read_packet<R>(reader: &mut R) -> Result<Option<Packet>, PacketError>
where
    R: AsyncRead + Unpin,
{
    let kind = match reader.read_u8().await {
        Ok(kind) => kind,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let len = reader.read_u16_le().await? as usize;
    if len > MAX_FRAME_BYTES {
        let mut excess = (&mut *reader).take(len as u64);
        let skipped = tokio::io::copy(&mut excess, &mut tokio::io::sink()).await?;
        if skipped < len as u64 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        return Err(PacketError::TooLarge {
            size: len,
            limit: MAX_FRAME_BYTES,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    match kind {
        KIND_DATA => Ok(Some(Packet::Data(payload))),
        KIND_ACK if payload.is_empty() => Ok(Some(Packet::Ack)),
        KIND_ACK => Err(PacketError::UnexpectedPayload(payload.len())),
        KIND_NACK => Ok(Some(Packet::Nack(
            String::from_utf8_lossy(&payload).into_owned(),
        ))),
        other => Err(PacketError::UnknownKind(other)),
    }
}

/// Write one packet and flush
pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), PacketError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = packet.encode()?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
