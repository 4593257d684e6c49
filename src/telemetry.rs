//! Debug telemetry frame
//!
//! A fixed, ordered set of f32 channels sent to the plotting tool in the
//! JustFloat layout: every value as its native four bytes, then the
//! `00 00 80 7F` trailer.

/// Frame trailer
pub const TAIL: [u8; 4] = [0x00, 0x00, 0x80, 0x7F];

/// Number of channels in a frame
pub const CHANNEL_COUNT: usize = 23;

/// Encoded size of a full frame [bytes]
pub const FRAME_SIZE: usize = CHANNEL_COUNT * 4 + TAIL.len();

/// Telemetry channels, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    Vd = 0,
    Vq,
    MechTheta,
    SvpwmAlpha,
    SvpwmBeta,
    Ccr1,
    Ccr2,
    Ccr3,
    Sector,
    Iu,
    Iv,
    Iw,
    IAlpha,
    IBeta,
    Id,
    Iq,
    IdRef,
    IqRef,
    PosTarget,
    PosActual,
    /// Free slot, carries the sampled w-phase current
    Debug,
    SpeedActual,
    SpeedTarget,
}

impl Channel {
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// The output buffer cannot hold the frame
    BufferTooSmall,
}

/// One snapshot of all channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryFrame {
    values: [f32; CHANNEL_COUNT],
}

impl TelemetryFrame {
    pub const fn new() -> Self {
        Self {
            values: [0.0; CHANNEL_COUNT],
        }
    }

    pub fn set(&mut self, channel: Channel, value: f32) {
        self.values[channel.index()] = value;
    }

    pub fn get(&self, channel: Channel) -> f32 {
        self.values[channel.index()]
    }

    pub fn values(&self) -> &[f32; CHANNEL_COUNT] {
        &self.values
    }

    /// Encode into `buf`, returning the number of bytes written
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, TelemetryError> {
        encode_frame(&self.values, buf)
    }
}

impl Default for TelemetryFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode any number of channels as a JustFloat frame
pub fn encode_frame(values: &[f32], buf: &mut [u8]) -> Result<usize, TelemetryError> {
    let len = values.len() * 4 + TAIL.len();
    if buf.len() < len {
        return Err(TelemetryError::BufferTooSmall);
    }

    for (chunk, value) in buf.chunks_exact_mut(4).zip(values.iter()) {
        chunk.copy_from_slice(&value.to_ne_bytes());
    }
    buf[len - TAIL.len()..len].copy_from_slice(&TAIL);

    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_channel_frame() {
        let mut buf = [0u8; 16];
        let len = encode_frame(&[1.0, -2.5], &mut buf).unwrap();
        assert_eq!(len, 12);
        assert_eq!(&buf[0..4], &1.0f32.to_ne_bytes());
        assert_eq!(&buf[4..8], &(-2.5f32).to_ne_bytes());
        assert_eq!(&buf[8..12], &TAIL);
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buf = [0u8; 11];
        assert_eq!(
            encode_frame(&[1.0, -2.5], &mut buf),
            Err(TelemetryError::BufferTooSmall)
        );
    }

    #[test]
    fn test_full_frame_layout() {
        let mut frame = TelemetryFrame::new();
        frame.set(Channel::Vd, 0.5);
        frame.set(Channel::SpeedTarget, 1500.0);

        let mut buf = [0u8; FRAME_SIZE];
        assert_eq!(frame.encode(&mut buf), Ok(FRAME_SIZE));
        assert_eq!(FRAME_SIZE, 96);
        assert_eq!(&buf[0..4], &0.5f32.to_ne_bytes());
        assert_eq!(&buf[88..92], &1500.0f32.to_ne_bytes());
        assert_eq!(&buf[92..96], &TAIL);
    }

    #[test]
    fn test_channel_order() {
        assert_eq!(Channel::Sector.index(), 8);
        assert_eq!(Channel::Debug.index(), 20);
        assert_eq!(Channel::SpeedTarget.index(), CHANNEL_COUNT - 1);
    }
}
