use anyhow::Result;
use clap::{Parser, Subcommand};
use comtone_core::{
    audio::{list_audio_devices, AudioOutput},
    modulation::FskModulator,
    net, wav, Config,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "comtone")]
#[command(about = "FSK packet transmitter for audio-coupled control links", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode packets and play them on the default audio output
    Play {
        /// Output sample rate in Hz
        #[arg(long, default_value = "48000")]
        sample_rate: u32,

        /// Number of interleaved output channels
        #[arg(long, default_value = "1")]
        channels: u16,

        /// Packet values, decimal or 0x-prefixed hex
        #[arg(required = true)]
        packets: Vec<String>,
    },

    /// Encode packets into a 16-bit PCM WAV file
    Wav {
        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Output sample rate in Hz
        #[arg(long, default_value = "48000")]
        sample_rate: u32,

        /// Number of interleaved output channels
        #[arg(long, default_value = "1")]
        channels: u16,

        /// Packet values, decimal or 0x-prefixed hex
        #[arg(required = true)]
        packets: Vec<String>,
    },

    /// Listen for packet datagrams and play each valid batch
    Listen {
        /// UDP port to bind
        #[arg(long, default_value = "1967")]
        port: u16,

        /// Output sample rate in Hz
        #[arg(long, default_value = "48000")]
        sample_rate: u32,

        /// Number of interleaved output channels
        #[arg(long, default_value = "1")]
        channels: u16,
    },

    /// Send a packet datagram to a running listener
    Post {
        /// Listener address
        #[arg(long, default_value = "127.0.0.1:1967")]
        addr: String,

        /// Packet values, decimal or 0x-prefixed hex
        #[arg(required = true)]
        packets: Vec<String>,
    },

    /// List available audio output devices
    Devices,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            sample_rate,
            channels,
            packets,
        } => {
            let packets = parse_packets(&packets)?;
            let config = Config {
                sample_rate,
                channel_count: channels,
                ..Default::default()
            };

            let modulator = FskModulator::new(config)?;
            let waveform = modulator.synthesize(&packets)?;
            eprintln!(
                "Encoded {} packets into {} samples ({:.1} ms)",
                packets.len(),
                waveform.sample_count,
                waveform.duration_ms()
            );

            let output = AudioOutput::new()?;
            eprintln!("Transmitting...");
            output.play(waveform)?;
            eprintln!("Transmission complete!");
        }

        Commands::Wav {
            output,
            sample_rate,
            channels,
            packets,
        } => {
            let packets = parse_packets(&packets)?;
            let config = Config {
                sample_rate,
                channel_count: channels,
                ..Default::default()
            };

            let modulator = FskModulator::new(config)?;
            let waveform = modulator.synthesize(&packets)?;
            wav::write_waveform(&output, &waveform)?;
            eprintln!(
                "Wrote {} samples ({:.1} ms) to {}",
                waveform.sample_count,
                waveform.duration_ms(),
                output.display()
            );
        }

        Commands::Listen {
            port,
            sample_rate,
            channels,
        } => {
            let config = Config {
                sample_rate,
                channel_count: channels,
                ..Default::default()
            };
            net::serve(port, config)?;
        }

        Commands::Post { addr, packets } => {
            let packets = parse_packets(&packets)?;
            net::post(&addr, &packets)?;
            eprintln!("Posted {} packets to {}", packets.len(), addr);
        }

        Commands::Devices => {
            println!("Available audio output devices:");
            for device in list_audio_devices() {
                println!("  {}", device);
            }
        }
    }

    Ok(())
}

fn parse_packet(text: &str) -> Result<u64> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|_| anyhow::anyhow!("invalid packet value: {}", text))
}

fn parse_packets(texts: &[String]) -> Result<Vec<u64>> {
    texts.iter().map(|text| parse_packet(text)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_packet_bases() {
        assert_eq!(parse_packet("42").unwrap(), 42);
        assert_eq!(parse_packet("0x2A").unwrap(), 42);
        assert_eq!(parse_packet("0X2a").unwrap(), 42);
        assert!(parse_packet("forty-two").is_err());
        assert!(parse_packet("0x").is_err());
    }
}
