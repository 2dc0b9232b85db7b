//! Length-prefixed framing for packets on a byte stream
//!
//! Every frame is a big-endian `u32` payload length followed by the bincode
//! encoding of one [`Packet`]. Both directions enforce [`MAX_FRAME_LEN`].

use crate::{Packet, MAX_FRAME_LEN};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Could not encode or decode packet: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("Frame of {0} bytes exceeds the maximum frame length")]
    FrameTooLarge(usize),
}

/// Encodes a packet and writes it as a single frame, then flushes.
pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let payload = bincode::serialize(packet)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the next frame from the stream.
///
/// Returns `Ok(None)` when the peer closed the stream between frames. A
/// stream that ends inside a payload is reported as an I/O error.
pub async fn read_packet<R>(reader: &mut R) -> Result<Option<Packet>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(bincode::deserialize(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;
    use tokio_test::io::Builder;

    fn encode_frame(packet: &Packet) -> Vec<u8> {
        let payload = bincode::serialize(packet).unwrap();
        let mut frame = (payload.len() as u32).to_be_bytes().to_vec();
        frame.extend_from_slice(&payload);
        frame
    }

    #[tokio::test]
    async fn test_write_packet_produces_length_prefixed_frame() {
        let packet = Packet::Chat {
            text: "hi".to_string(),
        };
        let mut writer = Builder::new().write(&encode_frame(&packet)).build();

        write_packet(&mut writer, &packet).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_packet_from_split_reads() {
        let packet = Packet::Message(ChatMessage::new("alice", "hi"));
        let frame = encode_frame(&packet);
        let (head, tail) = frame.split_at(3);
        let mut reader = Builder::new().read(head).read(tail).build();

        let received = read_packet(&mut reader).await.unwrap();
        assert_eq!(received, Some(packet));
    }

    #[tokio::test]
    async fn test_read_packet_clean_eof() {
        let mut reader = Builder::new().build();

        let received = read_packet(&mut reader).await.unwrap();
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn test_read_packet_truncated_payload_is_error() {
        let frame = encode_frame(&Packet::Chat {
            text: "truncated".to_string(),
        });
        let mut reader = Builder::new().read(&frame[..frame.len() - 2]).build();

        match read_packet(&mut reader).await {
            Err(ProtocolError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("Expected truncated frame error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_packet_rejects_oversized_frame() {
        let header = ((MAX_FRAME_LEN + 1) as u32).to_be_bytes();
        let mut reader = Builder::new().read(&header).build();

        match read_packet(&mut reader).await {
            Err(ProtocolError::FrameTooLarge(len)) => assert_eq!(len, MAX_FRAME_LEN + 1),
            other => panic!("Expected oversized frame error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_packet_rejects_oversized_payload() {
        let packet = Packet::Chat {
            text: "x".repeat(MAX_FRAME_LEN + 1),
        };
        let mut writer = Builder::new().build();

        let result = write_packet(&mut writer, &packet).await;
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge(_))));
    }

    #[tokio::test]
    async fn test_multiple_packets_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        let packets = vec![
            Packet::Login {
                user: "alice".to_string(),
                secret: "pw1".to_string(),
            },
            Packet::Chat {
                text: "first".to_string(),
            },
            Packet::Chat {
                text: "second".to_string(),
            },
        ];

        for packet in &packets {
            write_packet(&mut a, packet).await.unwrap();
        }
        drop(a);

        for expected in packets {
            assert_eq!(read_packet(&mut b).await.unwrap(), Some(expected));
        }
        assert!(read_packet(&mut b).await.unwrap().is_none());
    }
}
