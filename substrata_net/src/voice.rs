//! UDP voice receiver (§4.N): per-avatar Opus decode, drop-if-stale
//! reordering, and a drop-front ring buffer that prefers freshness over
//! continuity under backpressure.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use opus::{Channels, Decoder as OpusDecoder};
use parking_lot::Mutex;
use substrata_protocol::Uid;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{trace, warn};

use crate::error::NetError;

pub const VOICE_PACKET_TYPE: u32 = 1;
pub const VOICE_HEADER_LEN: usize = 12;
pub const SAMPLE_RATE: u32 = 48_000;

/// Ring buffer drop-front thresholds, in samples (~85 ms / ~43 ms @ 48 kHz).
pub const RING_BUFFER_HIGH_WATER: usize = 4096;
pub const RING_BUFFER_RETAIN: usize = 2048;

/// Maximum Opus frame size decoded at once (120 ms @ 48 kHz mono).
const MAX_FRAME_SAMPLES: usize = 5760;

/// Destination for decoded PCM, implemented by the audio mixer. Kept as a
/// trait so this crate never depends on the mixer itself.
pub trait VoiceSink: Send {
    fn push_samples(&mut self, avatar_uid: Uid, samples: &[f32]);
}

/// Appends `samples` to `ring`, then drops from the front once the high
/// water mark is exceeded, retaining only the newest `RING_BUFFER_RETAIN`.
pub fn append_with_drop_front(ring: &mut Vec<f32>, samples: &[f32]) {
    ring.extend_from_slice(samples);
    if ring.len() > RING_BUFFER_HIGH_WATER {
        let excess = ring.len() - RING_BUFFER_RETAIN;
        ring.drain(0..excess);
    }
}

/// True iff a packet with this sequence number should be decoded: it must
/// not be older than the next expected sequence. Updates `next_expected` on
/// acceptance. Out-of-order-but-newer packets (e.g. 7 before 6) are still
/// accepted; only packets older than what's already been consumed are
/// dropped (scenario 5).
pub fn accept_sequence(next_expected: &mut u32, seq: u32) -> bool {
    if seq < *next_expected {
        false
    } else {
        *next_expected = seq + 1;
        true
    }
}

struct AvatarDecodeState {
    decoder: OpusDecoder,
    next_expected_seq: u32,
}

impl AvatarDecodeState {
    fn new() -> Result<Self, opus::Error> {
        Ok(Self {
            decoder: OpusDecoder::new(SAMPLE_RATE, Channels::Mono)?,
            next_expected_seq: 0,
        })
    }
}

/// Dedicated task bound to a UDP socket. Verifies the source IP, reconciles
/// a decoder per avatar, drops stale-sequence packets, and feeds decoded PCM
/// into the sink's ring buffer.
pub struct VoiceReceiver {
    decoders: Mutex<HashMap<Uid, AvatarDecodeState>>,
}

impl Default for VoiceReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceReceiver {
    pub fn new() -> Self {
        Self {
            decoders: Mutex::new(HashMap::new()),
        }
    }

    /// Drops the decoder for an avatar that left the world, matching the
    /// `world_state.avatars_changed` reconciliation in §4.N.
    pub fn remove_avatar(&self, uid: Uid) {
        self.decoders.lock().remove(&uid);
    }

    fn handle_packet(&self, packet: &[u8], sink: &mut dyn VoiceSink) -> Result<(), NetError> {
        if packet.len() < VOICE_HEADER_LEN {
            return Err(NetError::VoicePacketTooShort(packet.len()));
        }
        let packet_type = u32::from_le_bytes(packet[0..4].try_into().unwrap());
        if packet_type != VOICE_PACKET_TYPE {
            trace!("voice: ignoring packet with unexpected type {packet_type}");
            return Ok(());
        }
        let avatar_id = u32::from_le_bytes(packet[4..8].try_into().unwrap());
        let seq = u32::from_le_bytes(packet[8..12].try_into().unwrap());
        let payload = &packet[VOICE_HEADER_LEN..];
        let avatar_uid = Uid(avatar_id as u64);

        let mut decoders = self.decoders.lock();
        let state = match decoders.get_mut(&avatar_uid) {
            Some(s) => s,
            None => {
                let new_state = AvatarDecodeState::new()?;
                decoders.entry(avatar_uid).or_insert(new_state)
            }
        };

        if !accept_sequence(&mut state.next_expected_seq, seq) {
            trace!("voice: dropping stale packet seq {seq} for avatar {avatar_uid}");
            return Ok(());
        }

        let mut pcm = [0f32; MAX_FRAME_SAMPLES];
        let decoded = state.decoder.decode_float(payload, &mut pcm, false)?;
        sink.push_samples(avatar_uid, &pcm[..decoded]);
        Ok(())
    }
}

/// Runs the receive loop until `shutdown` fires. The main thread can also
/// interrupt a blocked `recv_from` by closing `socket`'s underlying fd out
/// from under this task; that path surfaces here as an `Err` and is treated
/// as a normal shutdown rather than logged as a failure.
pub async fn run(
    socket: UdpSocket,
    server_addr: SocketAddr,
    receiver: Arc<VoiceReceiver>,
    mut sink: impl VoiceSink,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = [0u8; 4096];
    loop {
        let recv = tokio::select! {
            r = socket.recv_from(&mut buf) => r,
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
                continue;
            }
        };

        let (len, from) = match recv {
            Ok(v) => v,
            Err(e) => {
                if *shutdown.borrow() {
                    return;
                }
                trace!("voice: recv_from cancelled or failed: {e}");
                tokio::time::sleep(Duration::from_millis(10)).await;
                continue;
            }
        };

        if from.ip() != server_addr.ip() {
            warn!("voice: dropping packet from unexpected source {from}");
            continue;
        }

        if let Err(e) = receiver.handle_packet(&buf[..len], &mut sink) {
            warn!("voice: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        pushes: Vec<(Uid, usize)>,
    }

    impl VoiceSink for RecordingSink {
        fn push_samples(&mut self, avatar_uid: Uid, samples: &[f32]) {
            self.pushes.push((avatar_uid, samples.len()));
        }
    }

    // Scenario 5: packets [4,5,7,6,8] leave next_expected=9 and seq 6 is
    // dropped because it arrives after 7 has already advanced the cursor.
    #[test]
    fn reorder_drops_stale_sequence_scenario_5() {
        let mut next_expected = 4;
        let arrivals = [4u32, 5, 7, 6, 8];
        let mut accepted = Vec::new();
        for seq in arrivals {
            if accept_sequence(&mut next_expected, seq) {
                accepted.push(seq);
            }
        }
        assert_eq!(accepted, vec![4, 5, 7, 8]);
        assert_eq!(next_expected, 9);
    }

    #[test]
    fn ring_buffer_drops_front_once_over_high_water() {
        let mut ring = vec![0.0f32; RING_BUFFER_HIGH_WATER];
        append_with_drop_front(&mut ring, &[1.0, 2.0, 3.0]);
        assert_eq!(ring.len(), RING_BUFFER_RETAIN + 3);
    }

    #[test]
    fn ring_buffer_untouched_under_high_water() {
        let mut ring = vec![0.0f32; 10];
        append_with_drop_front(&mut ring, &[1.0, 2.0]);
        assert_eq!(ring.len(), 12);
    }

    #[test]
    fn header_too_short_is_rejected() {
        let receiver = VoiceReceiver::new();
        let mut sink = RecordingSink::default();
        let err = receiver.handle_packet(&[0u8; 4], &mut sink).unwrap_err();
        assert!(matches!(err, NetError::VoicePacketTooShort(4)));
    }
}
