//! Audio output using cpal
//!
//! `OutputDevice` is the production `AudioDevice`: the source is decoded with
//! symphonia, resampled to the device rate with rubato, and streamed through a
//! cpal output stream that reads a shared transport cursor and applies the
//! shared volume.
//!
//! cpal streams are not `Send`, so the stream is built on a dedicated thread
//! that keeps it alive until the `OutputDevice` is dropped.

use crate::audio::decoder::SimpleDecoder;
use crate::audio::device::AudioDevice;
use crate::audio::resampler::Resampler;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Playback cursor over the decoded source
#[derive(Debug, Default)]
struct Transport {
    /// Interleaved stereo samples at the output rate
    samples: Arc<Vec<f32>>,
    /// Next sample index to emit
    position: usize,
    /// Whether the stream callback advances the cursor
    playing: bool,
}

impl Transport {
    /// Next stereo frame, or None when stopped or the source is exhausted
    fn next_frame(&mut self) -> Option<(f32, f32)> {
        if !self.playing {
            return None;
        }
        match self.samples.get(self.position..self.position + 2) {
            Some(&[left, right]) => {
                self.position += 2;
                Some((left, right))
            }
            _ => {
                self.playing = false;
                None
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stream facts reported back by the output thread
struct StreamInfo {
    device_name: String,
    sample_rate: u32,
}

/// cpal-backed audio device playing a single source file.
pub struct OutputDevice {
    transport: Arc<Mutex<Transport>>,
    volume: Arc<Mutex<f32>>,
    /// Set by the stream error callback
    error_flag: Arc<AtomicBool>,
    sample_rate: u32,
    device_name: String,
    source: Option<PathBuf>,
    loaded: bool,
    /// Dropping the sender ends the output thread and its stream
    _shutdown: mpsc::Sender<()>,
}

impl OutputDevice {
    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open the output device and start a (silent) stream.
    ///
    /// Falls back to the default device when `device_name` is not found.
    /// The source is loaded eagerly; a load failure is logged and retried on
    /// the next `play()`.
    pub fn open(device_name: Option<&str>, source: Option<PathBuf>) -> Result<Self> {
        let transport = Arc::new(Mutex::new(Transport::default()));
        let volume = Arc::new(Mutex::new(0.0_f32));
        let error_flag = Arc::new(AtomicBool::new(false));

        let (info_tx, info_rx) = mpsc::channel::<Result<StreamInfo>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let requested = device_name.map(str::to_string);
        let thread_transport = Arc::clone(&transport);
        let thread_volume = Arc::clone(&volume);
        let thread_error_flag = Arc::clone(&error_flag);

        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let started = start_stream(
                    requested.as_deref(),
                    thread_transport,
                    thread_volume,
                    thread_error_flag,
                );
                let stream = match started {
                    Ok((stream, info)) => {
                        let _ = info_tx.send(Ok(info));
                        stream
                    }
                    Err(e) => {
                        let _ = info_tx.send(Err(e));
                        return;
                    }
                };

                // Blocks until the OutputDevice (sender) is dropped
                let _ = shutdown_rx.recv();
                drop(stream);
                info!("Audio output stopped");
            })
            .map_err(|e| Error::AudioOutput(format!("Failed to spawn output thread: {}", e)))?;

        let stream_info = info_rx
            .recv()
            .map_err(|_| Error::AudioOutput("Output thread exited during startup".to_string()))??;

        info!(
            "Audio output ready on '{}' at {}Hz",
            stream_info.device_name, stream_info.sample_rate
        );

        let mut device = Self {
            transport,
            volume,
            error_flag,
            sample_rate: stream_info.sample_rate,
            device_name: stream_info.device_name,
            source: None,
            loaded: false,
            _shutdown: shutdown_tx,
        };

        if let Some(path) = source {
            if let Err(e) = device.load(&path) {
                warn!("Audio source not loaded yet ({}); will retry on play", e);
            }
            device.source = Some(path);
        }

        Ok(device)
    }

    /// Output device name
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Check if the stream has reported an error.
    pub fn has_error(&self) -> bool {
        self.error_flag.load(Ordering::SeqCst)
    }
}

impl AudioDevice for OutputDevice {
    fn load(&mut self, source: &Path) -> Result<()> {
        let decoded = SimpleDecoder::decode_file(source)?;
        let samples = Resampler::resample(&decoded.samples, decoded.sample_rate, self.sample_rate)?;

        info!(
            "Loaded {} ({}ms)",
            source.display(),
            decoded.duration_ms()
        );

        {
            let mut transport = lock(&self.transport);
            transport.samples = Arc::new(samples);
            transport.position = 0;
            transport.playing = false;
        }

        self.source = Some(source.to_path_buf());
        self.loaded = true;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.has_error() {
            return Err(Error::DeviceUnavailable(format!(
                "Output stream on '{}' reported an error",
                self.device_name
            )));
        }

        if !self.loaded {
            let source = self
                .source
                .clone()
                .ok_or_else(|| Error::DeviceUnavailable("No audio source configured".to_string()))?;
            self.load(&source)
                .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;
        }

        let mut transport = lock(&self.transport);
        transport.position = 0;
        transport.playing = true;
        debug!("Playback started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut transport = lock(&self.transport);
        transport.playing = false;
        transport.position = 0;
        debug!("Playback stopped");
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        let clamped = volume.clamp(0.0, 1.0);
        *lock(&self.volume) = clamped;
        debug!("Volume set to {:.2}", clamped);
        Ok(())
    }

    fn get_volume(&self) -> f32 {
        *lock(&self.volume)
    }
}

/// Select the device, build the stream and start it. Runs on the output thread.
fn start_stream(
    device_name: Option<&str>,
    transport: Arc<Mutex<Transport>>,
    volume: Arc<Mutex<f32>>,
    error_flag: Arc<AtomicBool>,
) -> Result<(Stream, StreamInfo)> {
    let device = select_device(device_name)?;
    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let supported = device
        .default_output_config()
        .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
    let sample_format = supported.sample_format();
    let config = supported.config();

    debug!(
        "Audio config: sample_rate={}, channels={}, format={:?}",
        config.sample_rate.0, config.channels, sample_format
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, transport, volume, error_flag)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, transport, volume, error_flag)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, transport, volume, error_flag)?,
        other => {
            return Err(Error::AudioOutput(format!(
                "Unsupported sample format: {:?}",
                other
            )));
        }
    };

    stream
        .play()
        .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

    Ok((
        stream,
        StreamInfo {
            device_name: name,
            sample_rate: config.sample_rate.0,
        },
    ))
}

fn select_device(device_name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();

    if let Some(name) = device_name {
        let mut devices = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

        if let Some(dev) = devices.find(|d| d.name().ok().as_deref() == Some(name)) {
            info!("Found requested audio device: {}", name);
            return Ok(dev);
        }
        warn!("Requested device '{}' not found, falling back to default device", name);
    }

    host.default_output_device()
        .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    transport: Arc<Mutex<Transport>>,
    volume: Arc<Mutex<f32>>,
    error_flag: Arc<AtomicBool>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut transport = lock(&transport);
                let gain = *lock(&volume);

                for frame in data.chunks_mut(channels) {
                    let (left, right) = transport.next_frame().unwrap_or((0.0, 0.0));
                    let left = (left * gain).clamp(-1.0, 1.0);
                    let right = (right * gain).clamp(-1.0, 1.0);

                    for (ch, out) in frame.iter_mut().enumerate() {
                        let sample = if ch % 2 == 0 { left } else { right };
                        *out = T::from_sample(sample);
                    }
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                error_flag.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport_with(samples: Vec<f32>) -> Transport {
        Transport {
            samples: Arc::new(samples),
            position: 0,
            playing: true,
        }
    }

    #[test]
    fn test_transport_emits_frames_then_stops() {
        let mut transport = transport_with(vec![0.1, 0.2, 0.3, 0.4]);

        assert_eq!(transport.next_frame(), Some((0.1, 0.2)));
        assert_eq!(transport.next_frame(), Some((0.3, 0.4)));
        assert_eq!(transport.next_frame(), None);
        assert!(!transport.playing);
    }

    #[test]
    fn test_stopped_transport_is_silent() {
        let mut transport = transport_with(vec![0.5, 0.5]);
        transport.playing = false;

        assert_eq!(transport.next_frame(), None);
        assert_eq!(transport.position, 0);
    }

    #[test]
    fn test_list_devices() {
        // Requires audio hardware; only verify it does not panic
        let result = OutputDevice::list_devices();
        assert!(result.is_ok() || result.is_err());
    }
}
