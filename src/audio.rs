use crate::error::{ComToneError, Result};
use crate::modulation::Waveform;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, StreamConfig};
use std::sync::{Arc, Mutex};

pub struct AudioOutput {
    device: Device,
}

impl AudioOutput {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| ComToneError::AudioDevice("No output device found".into()))?;

        Ok(Self { device })
    }

    /// Stream a finished waveform to the device and block until it has
    /// drained. The buffer is already interleaved, so the callback copies
    /// slots straight through.
    pub fn play(&self, waveform: Waveform) -> Result<()> {
        let config = StreamConfig {
            channels: waveform.channels,
            sample_rate: cpal::SampleRate(waveform.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let slots = Arc::new(waveform.samples);
        let position = Arc::new(Mutex::new(0usize));
        let finished = Arc::new(Mutex::new(false));

        let slots_clone = Arc::clone(&slots);
        let position_clone = Arc::clone(&position);
        let finished_clone = Arc::clone(&finished);

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let mut pos = position_clone.lock().unwrap();

                    for sample in data.iter_mut() {
                        if *pos < slots_clone.len() {
                            *sample = slots_clone[*pos];
                            *pos += 1;
                        } else {
                            *sample = 0;
                            *finished_clone.lock().unwrap() = true;
                        }
                    }
                },
                |err| log::error!("Audio output error: {}", err),
                None,
            )
            .map_err(|e| ComToneError::AudioDevice(e.to_string()))?;

        stream
            .play()
            .map_err(|e| ComToneError::AudioDevice(e.to_string()))?;

        loop {
            std::thread::sleep(std::time::Duration::from_millis(10));
            if *finished.lock().unwrap() {
                break;
            }
        }

        // let the device drain its last buffer before the stream drops
        std::thread::sleep(std::time::Duration::from_millis(100));

        Ok(())
    }
}

pub fn list_audio_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let Ok(name) = device.name() {
                devices.push(name);
            }
        }
    }

    devices
}
