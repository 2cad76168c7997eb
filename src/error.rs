use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComToneError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sample rate {sample_rate} Hz cannot carry the signal band up to {band_edge} Hz")]
    SampleRateTooLow { sample_rate: u32, band_edge: f64 },

    #[error("Sample buffer allocation failed")]
    Allocation,

    #[error("Frame register exhausted before all bits were consumed")]
    FrameUnderflow,

    #[error("Waveform ended before the lead-out was reached")]
    LeadoutNotReached,

    #[error("Invalid packet batch: {0}")]
    InvalidPacketBatch(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ComToneError>;
