use crate::error::{ComToneError, Result};
use crate::protocol::build_frame;
use crate::Config;
use std::f64::consts::PI;

/// Finished, interleaved 16-bit PCM artifact. `sample_count` is the number
/// of per-channel sample frames; `samples.len()` is that times `channels`.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<i16>,
    pub sample_count: usize,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn duration_ms(&self) -> f64 {
        self.sample_count as f64 * 1000.0 / f64::from(self.sample_rate)
    }
}

/// Walks a list of pre-built frames bit by bit, one call per output sample.
/// Holds the mark bit through the lead-in, then each frame bit for one bit
/// period, then the mark bit again through the lead-out.
pub struct BitSequencer {
    frames: Vec<u64>,
    samples_per_bit: u32,
    bits_per_frame: u32,
    leadout_samples: u32,
    bit_lifetime: u32,
    bits_remaining: u32,
    frame: u64,
    bit_index: u32,
    frame_index: usize,
    reached_leadout: bool,
}

impl BitSequencer {
    pub fn new(frames: Vec<u64>, config: &Config) -> Self {
        Self {
            frames,
            samples_per_bit: config.samples_per_bit(),
            bits_per_frame: config.bits_per_frame(),
            leadout_samples: config.leadout_samples(),
            // idle mark held for the whole lead-in
            bit_lifetime: config.leadin_samples(),
            bits_remaining: 0,
            frame: 1,
            bit_index: 0,
            frame_index: 0,
            reached_leadout: false,
        }
    }

    pub fn reached_leadout(&self) -> bool {
        self.reached_leadout
    }

    pub fn next_bit(&mut self) -> Result<u8> {
        if self.bit_lifetime == 0 {
            self.bit_lifetime = self.samples_per_bit;
            if self.bits_remaining == 0 {
                match self.frames.get(self.frame_index) {
                    Some(&frame) => {
                        self.frame = frame;
                        self.bit_index = 0;
                        self.bits_remaining = self.bits_per_frame;
                        self.frame_index += 1;
                    }
                    None => {
                        // all frames consumed, hold the mark bit for the lead-out
                        self.frame = 1;
                        self.bit_index = 0;
                        self.bits_remaining = 1;
                        self.bit_lifetime = self.leadout_samples;
                        self.reached_leadout = true;
                    }
                }
            } else {
                self.bit_index += 1;
            }
            self.bits_remaining -= 1;
        }
        self.bit_lifetime -= 1;

        let remaining = self.frame >> self.bit_index;
        if remaining == 0 {
            return Err(ComToneError::FrameUnderflow);
        }
        Ok((remaining & 1) as u8)
    }
}

/// Continuous-phase two-tone oscillator. The phase accumulator is never
/// reset between bits, so frequency changes are click-free.
pub struct ToneOscillator {
    angle: f64,
    upper_delta: f64,
    lower_delta: f64,
}

impl ToneOscillator {
    pub fn new(config: &Config) -> Self {
        let step = (2.0 * PI) / f64::from(config.sample_rate);
        Self {
            angle: 0.0,
            upper_delta: step * config.upper_frequency,
            lower_delta: step * config.lower_frequency,
        }
    }

    pub fn next_sample(&mut self, bit: u8) -> i16 {
        self.angle += if bit != 0 { self.upper_delta } else { self.lower_delta };
        // single-step wrap is enough, both deltas are below one full turn
        if self.angle > 2.0 * PI {
            self.angle -= 2.0 * PI;
        }
        (self.angle.sin() * f64::from(i16::MAX - 1) + 0.5).floor() as i16
    }
}

pub struct FskModulator {
    config: Config,
}

impl FskModulator {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Encode a batch of packets into a finished waveform: lead-in carrier,
    /// one framed burst per packet, lead-out carrier.
    pub fn synthesize(&self, packets: &[u64]) -> Result<Waveform> {
        self.config.validate()?;

        let frames: Vec<u64> = packets
            .iter()
            .map(|&packet| build_frame(packet, &self.config))
            .collect();

        let frame_bits = frames.len() * self.config.bits_per_frame() as usize;
        let sample_count = self.config.leadin_samples() as usize
            + self.config.leadout_samples() as usize
            + frame_bits * self.config.samples_per_bit() as usize;

        render(&self.config, frames, sample_count)
    }
}

fn render(config: &Config, frames: Vec<u64>, sample_count: usize) -> Result<Waveform> {
    let slots = sample_count * config.channel_count as usize;
    let mut samples: Vec<i16> = Vec::new();
    samples
        .try_reserve_exact(slots)
        .map_err(|_| ComToneError::Allocation)?;

    let mut sequencer = BitSequencer::new(frames, config);
    let mut oscillator = ToneOscillator::new(config);

    for _ in 0..sample_count {
        let bit = sequencer.next_bit()?;
        let value = oscillator.next_sample(bit);
        for _ in 0..config.channel_count {
            samples.push(value);
        }
    }

    if !sequencer.reached_leadout() {
        return Err(ComToneError::LeadoutNotReached);
    }

    Ok(Waveform {
        samples,
        sample_count,
        channels: config.channel_count,
        sample_rate: config.sample_rate,
    })
}
