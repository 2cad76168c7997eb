use crate::error::Result;
use crate::modulation::Waveform;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Write a waveform to a standard 16-bit PCM WAV file for offline
/// inspection. Channel interleaving is preserved as-is.
pub fn write_waveform(path: &Path, waveform: &Waveform) -> Result<()> {
    let spec = WavSpec {
        channels: waveform.channels,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in &waveform.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}
