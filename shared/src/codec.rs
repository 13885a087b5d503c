//! Length-prefixed framing for [`Packet`] over any reliable byte stream.
//!
//! Each frame is a big-endian `u32` payload length followed by the bincode
//! encoding of one packet.

use crate::Packet;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame payload.
pub const MAX_FRAME_LEN: u32 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error("frame of {0} bytes exceeds the 1 MiB limit")]
    FrameTooLarge(u32),
    #[error("malformed packet: {0}")]
    Codec(#[from] bincode::Error),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, ProtocolError> {
    let payload = bincode::serialize(packet)?;
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_LEN)
        .ok_or(ProtocolError::FrameTooLarge(u32::MAX))?;

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes a frame payload (without its length prefix).
pub fn decode_packet(payload: &[u8]) -> Result<Packet, ProtocolError> {
    Ok(bincode::deserialize(payload)?)
}

pub async fn read_packet<R>(reader: &mut R) -> Result<Packet, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    // EOF before the first header byte is a clean close; after it, a truncated frame
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended inside a frame header",
            )
            .into());
        }
        filled += n;
    }
    let len = u32::from_be_bytes(header);

    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    decode_packet(&payload)
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_packet(packet)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Snapshot;
    use assert_approx_eq::assert_approx_eq;
    use tokio_test::io::Builder;

    #[test]
    fn test_encode_prefixes_length() {
        let frame = encode_packet(&Packet::Identity { player_id: 3 }).unwrap();
        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
        assert_eq!(len as usize, frame.len() - 4);
    }

    #[tokio::test]
    async fn test_read_packet_from_stream() {
        let frame = encode_packet(&Packet::Input {
            target_x: 320.5,
            target_y: 64.0,
        })
        .unwrap();
        let mut stream = Builder::new().read(&frame).build();

        match read_packet(&mut stream).await.unwrap() {
            Packet::Input { target_x, target_y } => {
                assert_approx_eq!(target_x, 320.5);
                assert_approx_eq!(target_y, 64.0);
            }
            other => panic!("Unexpected packet: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_packet_split_across_reads() {
        let frame = encode_packet(&Packet::Hello {
            name: "splitter".to_string(),
        })
        .unwrap();
        let (head, tail) = frame.split_at(6);
        let mut stream = Builder::new().read(head).read(tail).build();

        let packet = read_packet(&mut stream).await.unwrap();
        assert_eq!(
            packet,
            Packet::Hello {
                name: "splitter".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_clean_eof_is_connection_closed() {
        let mut stream = Builder::new().build();
        let err = read_packet(&mut stream).await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_partial_header_is_io_error() {
        let mut stream = Builder::new().read(&[0, 0]).build();
        let err = read_packet(&mut stream).await.unwrap_err();
        match err {
            ProtocolError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("Expected i/o error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_header_split_across_reads() {
        let frame = encode_packet(&Packet::Identity { player_id: 8 }).unwrap();
        let mut stream = Builder::new()
            .read(&frame[..1])
            .read(&frame[1..3])
            .read(&frame[3..])
            .build();
        assert_eq!(
            read_packet(&mut stream).await.unwrap(),
            Packet::Identity { player_id: 8 }
        );
    }

    #[tokio::test]
    async fn test_truncated_payload_is_io_error() {
        let frame = encode_packet(&Packet::Identity { player_id: 1 }).unwrap();
        let mut stream = Builder::new().read(&frame[..frame.len() - 1]).build();
        let err = read_packet(&mut stream).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let header = (MAX_FRAME_LEN + 1).to_be_bytes();
        let mut stream = Builder::new().read(&header).build();
        let err = read_packet(&mut stream).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge(len) if len == MAX_FRAME_LEN + 1));
    }

    #[tokio::test]
    async fn test_garbage_payload_is_codec_error() {
        let mut frame = 4u32.to_be_bytes().to_vec();
        frame.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);
        let mut stream = Builder::new().read(&frame).build();
        let err = read_packet(&mut stream).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Codec(_)));
    }

    #[tokio::test]
    async fn test_write_packet_emits_frame() {
        let packet = Packet::StateUpdate(Snapshot {
            time_left: 299,
            ..Snapshot::default()
        });
        let expected = encode_packet(&packet).unwrap();
        let mut stream = Builder::new().write(&expected).build();

        write_packet(&mut stream, &packet).await.unwrap();
    }
}
