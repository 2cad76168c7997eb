use crate::audio::AudioOutput;
use crate::error::{ComToneError, Result};
use crate::modulation::FskModulator;
use crate::Config;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, error, info};
use std::io::Cursor;
use std::net::UdpSocket;

pub const DEFAULT_PORT: u16 = 1967;
pub const DATAGRAM_HEADER: &[u8; 4] = b"COM\n";
pub const PACKET_SIZE: usize = 2;
pub const MAX_PACKETS: usize = 100;

/// Parse a `"COM\n"` datagram into packet values. Returns `None` for
/// anything malformed: wrong header, empty or odd-length body, or more
/// than `MAX_PACKETS` packets. Callers drop such datagrams silently.
pub fn parse_datagram(payload: &[u8]) -> Option<Vec<u64>> {
    if payload.len() <= DATAGRAM_HEADER.len() {
        return None;
    }

    let (header, body) = payload.split_at(DATAGRAM_HEADER.len());
    if header != DATAGRAM_HEADER {
        return None;
    }
    if body.len() % PACKET_SIZE != 0 {
        return None;
    }

    let count = body.len() / PACKET_SIZE;
    if count > MAX_PACKETS {
        return None;
    }

    let mut cursor = Cursor::new(body);
    let mut packets = Vec::with_capacity(count);
    for _ in 0..count {
        packets.push(u64::from(cursor.read_u16::<BigEndian>().ok()?));
    }
    Some(packets)
}

/// Format a packet batch as a datagram a listener will accept. Values are
/// truncated to 16 bits, matching the encoder's own masking.
pub fn encode_datagram(packets: &[u64]) -> Result<Vec<u8>> {
    if packets.is_empty() {
        return Err(ComToneError::InvalidPacketBatch(
            "at least one packet is required".into(),
        ));
    }
    if packets.len() > MAX_PACKETS {
        return Err(ComToneError::InvalidPacketBatch(format!(
            "{} packets exceed the per-datagram limit of {}",
            packets.len(),
            MAX_PACKETS
        )));
    }

    let mut data = Vec::with_capacity(DATAGRAM_HEADER.len() + packets.len() * PACKET_SIZE);
    data.extend_from_slice(DATAGRAM_HEADER);
    for &packet in packets {
        data.write_u16::<BigEndian>((packet & 0xFFFF) as u16).unwrap();
    }
    Ok(data)
}

/// Post one packet batch to a running listener.
pub fn post(addr: &str, packets: &[u64]) -> Result<()> {
    let payload = encode_datagram(packets)?;
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.send_to(&payload, addr)?;
    Ok(())
}

/// Listen for packet datagrams and play each valid batch to the default
/// output device. Each batch is fully transmitted before the next datagram
/// is received. Malformed datagrams are dropped without a reply.
pub fn serve(port: u16, config: Config) -> Result<()> {
    let modulator = FskModulator::new(config)?;
    let output = AudioOutput::new()?;
    let socket = UdpSocket::bind(("0.0.0.0", port))?;
    info!("Listening for packet datagrams on port {}", port);

    let mut buf = [0u8; 2048];
    loop {
        let (len, from) = socket.recv_from(&mut buf)?;

        let packets = match parse_datagram(&buf[..len]) {
            Some(packets) => packets,
            None => {
                debug!("Dropping malformed datagram ({} bytes) from {}", len, from);
                continue;
            }
        };

        info!("Transmitting {} packets for {}", packets.len(), from);
        match modulator.synthesize(&packets) {
            Ok(waveform) => {
                if let Err(err) = output.play(waveform) {
                    error!("Playback failed: {}", err);
                }
            }
            Err(err) => error!("Synthesis failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_datagram() {
        let payload = b"COM\n\x12\x34\xAB\xCD";
        let packets = parse_datagram(payload).unwrap();
        assert_eq!(packets, vec![0x1234, 0xABCD]);
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        assert!(parse_datagram(b"XOM\n\x12\x34").is_none());
        assert!(parse_datagram(b"COM\0\x12\x34").is_none());
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        // header alone, and an odd-length body
        assert!(parse_datagram(b"COM\n").is_none());
        assert!(parse_datagram(b"COM\n\x12").is_none());
        assert!(parse_datagram(b"COM\n\x12\x34\x56").is_none());
    }

    #[test]
    fn test_parse_rejects_oversized_batch() {
        let mut payload = b"COM\n".to_vec();
        payload.extend(std::iter::repeat(0u8).take((MAX_PACKETS + 1) * PACKET_SIZE));
        assert!(parse_datagram(&payload).is_none());

        payload.truncate(DATAGRAM_HEADER.len() + MAX_PACKETS * PACKET_SIZE);
        assert_eq!(parse_datagram(&payload).unwrap().len(), MAX_PACKETS);
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        let packets = [0x0000u64, 0x0001, 0x8000, 0xFFFF];
        let payload = encode_datagram(&packets).unwrap();
        assert_eq!(parse_datagram(&payload).unwrap(), packets);
    }

    #[test]
    fn test_encode_masks_high_bits() {
        let payload = encode_datagram(&[0x1_FFFFu64]).unwrap();
        assert_eq!(parse_datagram(&payload).unwrap(), vec![0xFFFF]);
    }

    #[test]
    fn test_encode_rejects_bad_batches() {
        assert!(matches!(
            encode_datagram(&[]),
            Err(ComToneError::InvalidPacketBatch(_))
        ));
        assert!(matches!(
            encode_datagram(&vec![0u64; MAX_PACKETS + 1]),
            Err(ComToneError::InvalidPacketBatch(_))
        ));
    }
}
