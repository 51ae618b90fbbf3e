use rodio::Source;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to open track {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("failed to seek current track: {0}")]
    Seek(String),
    #[error("{0} is not supported by this audio backend")]
    Unsupported(&'static str),
    #[error("no media loaded")]
    NotLoaded,
}

/// Synchronous façade over an audio output.
///
/// Only `load`, `play`, `pause` and `stop` are mandatory. The remaining
/// capabilities have fallback defaults so callers can tell at the call site
/// what happens when a backend lacks them: `resume` and `seek` report
/// [`MediaError::Unsupported`], `position` and `duration` report nothing,
/// and `set_volume` is ignored.
pub trait AudioBackend {
    fn load(&mut self, location: &Path) -> Result<(), MediaError>;
    fn play(&mut self, looping: bool);
    fn pause(&mut self);
    fn stop(&mut self);

    fn resume(&mut self) -> Result<(), MediaError> {
        Err(MediaError::Unsupported("resume"))
    }

    fn seek(&mut self, _position: Duration) -> Result<(), MediaError> {
        Err(MediaError::Unsupported("seek"))
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn position(&self) -> Option<Duration> {
        None
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn name(&self) -> &str;
}

pub struct RodioAudioBackend {
    stream: OutputStream,
    sink: Sink,
    pending: Option<Box<dyn Source + Send>>,
    current: Option<PathBuf>,
    track_duration: Option<Duration>,
    volume: f32,
}

impl RodioAudioBackend {
    pub fn new() -> Result<Self, MediaError> {
        let mut stream = with_silenced_stderr(|| {
            OutputStreamBuilder::from_default_device()
                .and_then(|builder| builder.with_error_callback(|_| {}).open_stream_or_fallback())
        })
        .map_err(|err| MediaError::Output(err.to_string()))?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());

        Ok(Self {
            stream,
            sink,
            pending: None,
            current: None,
            track_duration: None,
            volume: 1.0,
        })
    }
}

impl AudioBackend for RodioAudioBackend {
    fn load(&mut self, location: &Path) -> Result<(), MediaError> {
        self.stop();
        self.sink = Sink::connect_new(self.stream.mixer());

        let file = File::open(location).map_err(|source| MediaError::Open {
            path: location.to_path_buf(),
            source,
        })?;
        let source = Decoder::try_from(file).map_err(|err| MediaError::Decode {
            path: location.to_path_buf(),
            message: err.to_string(),
        })?;
        self.track_duration = source
            .total_duration()
            .filter(|duration| !duration.is_zero());
        self.pending = Some(Box::new(source));
        self.current = Some(location.to_path_buf());
        Ok(())
    }

    fn play(&mut self, looping: bool) {
        if let Some(source) = self.pending.take() {
            if looping {
                self.sink.append(source.repeat_infinite());
            } else {
                self.sink.append(source);
            }
        }
        self.sink.set_volume(self.volume);
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.pending = None;
        self.current = None;
        self.track_duration = None;
    }

    fn resume(&mut self) -> Result<(), MediaError> {
        if self.current.is_none() {
            return Err(MediaError::NotLoaded);
        }
        self.sink.play();
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), MediaError> {
        if self.current.is_none() {
            return Err(MediaError::NotLoaded);
        }
        self.sink
            .try_seek(position)
            .map_err(|err| MediaError::Seek(format!("{err:?}")))
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn name(&self) -> &str {
        "System default output (rodio)"
    }
}


#[derive(Debug, Clone, Copy)]
enum Clock {
    Held(Duration),
    Running { since: Instant, base: Duration },
}

impl Clock {
    fn read(self) -> Duration {
        match self {
            Self::Held(at) => at,
            Self::Running { since, base } => base.saturating_add(since.elapsed()),
        }
    }
}

/// Silent backend that only keeps time; used when no output device opens.
#[derive(Debug)]
pub struct NullAudioBackend {
    loaded: Option<PathBuf>,
    clock: Clock,
    length: Option<Duration>,
    volume: f32,
}

impl NullAudioBackend {
    pub fn new() -> Self {
        Self {
            loaded: None,
            clock: Clock::Held(Duration::ZERO),
            length: None,
            volume: 1.0,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn current(&self) -> Option<&Path> {
        self.loaded.as_deref()
    }

    fn probe_length(location: &Path) -> Option<Duration> {
        let decoder = Decoder::try_from(File::open(location).ok()?).ok()?;
        decoder.total_duration().filter(|length| !length.is_zero())
    }

    fn elapsed(&self) -> Duration {
        let at = self.clock.read();
        self.length.map_or(at, |length| at.min(length))
    }
}

impl Default for NullAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for NullAudioBackend {
    fn load(&mut self, location: &Path) -> Result<(), MediaError> {
        self.length = Self::probe_length(location);
        self.loaded = Some(location.to_path_buf());
        self.clock = Clock::Held(Duration::ZERO);
        Ok(())
    }

    fn play(&mut self, _looping: bool) {
        if self.loaded.is_some() {
            self.clock = Clock::Running {
                since: Instant::now(),
                base: self.clock.read(),
            };
        }
    }

    fn pause(&mut self) {
        self.clock = Clock::Held(self.elapsed());
    }

    fn stop(&mut self) {
        self.loaded = None;
        self.length = None;
        self.clock = Clock::Held(Duration::ZERO);
    }

    fn resume(&mut self) -> Result<(), MediaError> {
        if self.loaded.is_none() {
            return Err(MediaError::NotLoaded);
        }
        if let Clock::Held(base) = self.clock {
            self.clock = Clock::Running {
                since: Instant::now(),
                base,
            };
        }
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), MediaError> {
        if self.loaded.is_none() {
            return Err(MediaError::NotLoaded);
        }
        let target = self.length.map_or(position, |length| position.min(length));
        self.clock = match self.clock {
            Clock::Held(_) => Clock::Held(target),
            Clock::Running { .. } => Clock::Running {
                since: Instant::now(),
                base: target,
            },
        };
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn position(&self) -> Option<Duration> {
        self.loaded.as_ref().map(|_| self.elapsed())
    }

    fn duration(&self) -> Option<Duration> {
        self.length
    }

    fn name(&self) -> &str {
        "silent (no output device)"
    }
}

/// Points fd 2 at /dev/null until dropped; audio host probing is noisy there.
#[cfg(unix)]
struct StderrSilencer {
    saved: libc::c_int,
}

#[cfg(unix)]
impl StderrSilencer {
    fn engage() -> Option<Self> {
        let null = CString::new("/dev/null").ok()?;
        // SAFETY: plain descriptor calls on fds owned by this process.
        unsafe {
            let saved = libc::dup(libc::STDERR_FILENO);
            if saved < 0 {
                return None;
            }
            let sink = libc::open(null.as_ptr(), libc::O_WRONLY);
            if sink >= 0 {
                libc::dup2(sink, libc::STDERR_FILENO);
                libc::close(sink);
            }
            Some(Self { saved })
        }
    }
}

#[cfg(unix)]
impl Drop for StderrSilencer {
    fn drop(&mut self) {
        // SAFETY: `saved` came from dup() in `engage` and is closed exactly once.
        unsafe {
            libc::dup2(self.saved, libc::STDERR_FILENO);
            libc::close(self.saved);
        }
    }
}

#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let _guard = StderrSilencer::engage();
    operation()
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

#[cfg(test)]
mod tests {
    use super::{AudioBackend, MediaError, NullAudioBackend};
    use std::fs;
    use std::path::Path;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Mono 16-bit PCM silence at 8 kHz.
    fn silent_wav(path: &Path, millis: u32) {
        const RATE: u32 = 8_000;
        let samples = RATE * millis / 1_000;
        let data_len = samples * 2;

        let riff_len = (36 + data_len).to_le_bytes();
        let byte_rate = (RATE * 2).to_le_bytes();
        let header: [&[u8]; 12] = [
            b"RIFF",
            &riff_len,
            b"WAVEfmt ",
            &16u32.to_le_bytes(),
            &1u16.to_le_bytes(),
            &1u16.to_le_bytes(),
            &RATE.to_le_bytes(),
            &byte_rate,
            &2u16.to_le_bytes(),
            &16u16.to_le_bytes(),
            b"data",
            &data_len.to_le_bytes(),
        ];
        let mut wav = header.concat();
        wav.resize(wav.len() + data_len as usize, 0);
        fs::write(path, wav).expect("write wav");
    }

    fn nap() {
        thread::sleep(Duration::from_millis(15));
    }

    struct Minimal;

    impl AudioBackend for Minimal {
        fn load(&mut self, _location: &Path) -> Result<(), MediaError> {
            Ok(())
        }
        fn play(&mut self, _looping: bool) {}
        fn pause(&mut self) {}
        fn stop(&mut self) {}
        fn name(&self) -> &str {
            "minimal"
        }
    }

    #[test]
    fn default_capabilities_fall_back() {
        let mut backend = Minimal;
        assert!(matches!(
            backend.resume(),
            Err(MediaError::Unsupported("resume"))
        ));
        assert!(matches!(
            backend.seek(Duration::from_secs(1)),
            Err(MediaError::Unsupported("seek"))
        ));
        assert_eq!(backend.position(), None);
        assert_eq!(backend.duration(), None);
    }

    #[test]
    fn null_clock_runs_only_while_playing() {
        let mut backend = NullAudioBackend::new();
        backend.load(Path::new("absent.ogg")).expect("load");
        nap();
        assert_eq!(backend.position(), Some(Duration::ZERO));

        backend.play(false);
        nap();
        let playing = backend.position().expect("position");
        assert!(playing > Duration::ZERO);

        backend.pause();
        let held = backend.position().expect("position");
        nap();
        assert_eq!(backend.position(), Some(held));

        backend.resume().expect("resume");
        nap();
        assert!(backend.position().expect("position") > held);
    }

    #[test]
    fn null_seek_requires_media() {
        let mut backend = NullAudioBackend::new();
        assert!(matches!(backend.resume(), Err(MediaError::NotLoaded)));
        assert!(matches!(
            backend.seek(Duration::from_secs(3)),
            Err(MediaError::NotLoaded)
        ));

        backend.load(Path::new("absent.ogg")).expect("load");
        backend.seek(Duration::from_secs(3)).expect("seek");
        assert_eq!(backend.position(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn null_backend_reads_wav_length() {
        let dir = tempdir().expect("tempdir");
        let track = dir.path().join("silence.wav");
        silent_wav(&track, 400);

        let mut backend = NullAudioBackend::new();
        backend.load(&track).expect("load");
        let length = backend.duration().expect("length");
        assert!(length >= Duration::from_millis(350) && length <= Duration::from_millis(450));

        backend.seek(Duration::from_secs(10)).expect("seek");
        assert_eq!(backend.position(), Some(length));

        backend.stop();
        assert_eq!(backend.duration(), None);
        assert_eq!(backend.position(), None);
    }

    #[test]
    fn null_backend_clamps_volume() {
        let mut backend = NullAudioBackend::new();
        backend.set_volume(1.7);
        assert_eq!(backend.volume(), 1.0);
        backend.set_volume(-1.0);
        assert_eq!(backend.volume(), 0.0);
    }
}
