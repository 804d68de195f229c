//! Piper-backed speech engine: text is piped to a Piper process that
//! writes a WAV file, which is then played through a `rodio` sink. A
//! watcher thread owns the output stream for the lifetime of the
//! utterance and reports drain as [`EngineEvent::Finished`].

use std::{
    collections::HashMap,
    fs,
    io::{BufReader, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::{mpsc::Sender, Arc},
    thread,
};

use anyhow::Context;
use log::{debug, error, info, warn};
use rodio::{Decoder, OutputStream, Sink};
use serde_json::Value;
use walkdir::WalkDir;

use super::{EngineError, EngineEvent, SpeechEngine, Utterance, UtteranceId, Voice};

struct ActiveSink {
    id: UtteranceId,
    sink: Arc<Sink>,
}

pub struct PiperEngine {
    voices_dir: PathBuf,
    output_dir: PathBuf,
    events: Sender<EngineEvent>,
    models: HashMap<String, PathBuf>,
    active: Option<ActiveSink>,
}

impl PiperEngine {
    /// Builds the engine from the environment (`READER_VOICES_DIR`,
    /// `READER_OUTPUT_DIR`) and publishes the initial voice list.
    pub fn new(events: Sender<EngineEvent>) -> anyhow::Result<Self> {
        let voices_dir = std::env::var("READER_VOICES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("assets/voices"));
        let output_dir = std::env::var("READER_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("runtime/output"));
        Self::with_dirs(voices_dir, output_dir, events)
    }

    pub fn with_dirs(
        voices_dir: PathBuf,
        output_dir: PathBuf,
        events: Sender<EngineEvent>,
    ) -> anyhow::Result<Self> {
        fs::create_dir_all(&output_dir).with_context(|| {
            format!("unable to create output directory {}", output_dir.display())
        })?;
        let mut engine = Self {
            voices_dir,
            output_dir,
            events,
            models: HashMap::new(),
            active: None,
        };
        engine.publish_voices();
        Ok(engine)
    }

    fn publish_voices(&mut self) {
        let voices = self.scan_voices();
        info!("discovered {} voice(s)", voices.len());
        let _ = self.events.send(EngineEvent::VoicesChanged(voices));
    }

    fn scan_voices(&mut self) -> Vec<Voice> {
        let mut models = HashMap::new();
        let mut voices = Vec::new();
        if self.voices_dir.exists() {
            for entry in WalkDir::new(&self.voices_dir)
                .into_iter()
                .filter_map(Result::ok)
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("onnx") {
                    continue;
                }
                if let Some(name) = path.file_stem().map(|stem| stem.to_string_lossy()) {
                    let name = name.into_owned();
                    voices.push(Voice {
                        name: name.clone(),
                        locale: sidecar_locale(path).unwrap_or_default(),
                    });
                    models.insert(name, path.to_path_buf());
                }
            }
        }
        voices.sort_by(|a, b| a.name.cmp(&b.name));
        self.models = models;
        voices
    }

    fn build_command() -> Result<Command, EngineError> {
        if let Some(raw) = std::env::var_os("READER_PIPER_COMMAND") {
            let raw = raw.to_string_lossy().into_owned();
            let mut parts = shlex::Shlex::new(&raw);
            let program = parts
                .next()
                .ok_or_else(|| EngineError::Spawn("READER_PIPER_COMMAND is empty".to_string()))?;
            let mut command = Command::new(program);
            for part in parts {
                command.arg(part);
            }
            Ok(command)
        } else if cfg!(target_os = "windows") {
            Ok(Command::new("runtime/piper/piper.exe"))
        } else {
            let mut command = Command::new("python");
            command.args(["-m", "piper"]);
            Ok(command)
        }
    }

    fn synthesize(&self, utterance: &Utterance) -> Result<PathBuf, EngineError> {
        let model = self
            .models
            .get(&utterance.voice.name)
            .ok_or_else(|| EngineError::VoiceNotFound(utterance.voice.name.clone()))?;
        let wav_path = self
            .output_dir
            .join(format!("utterance-{}.wav", utterance.id.0));

        debug!(
            "synthesizing utterance {:?}: rate={} pitch={} volume={}",
            utterance.id, utterance.rate, utterance.pitch, utterance.volume
        );

        let mut command = Self::build_command()?;
        command.arg("--model");
        command.arg(model);
        command.arg("--output_file");
        command.arg(&wav_path);
        if utterance.rate > 0.0 && (utterance.rate - 1.0).abs() > f32::EPSILON {
            command.arg("--length_scale");
            command.arg((1.0 / utterance.rate).to_string());
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|err| EngineError::Spawn(err.to_string()))?;
        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| EngineError::Spawn("failed to access Piper stdin".to_string()))?;
            stdin
                .write_all(utterance.text.as_bytes())
                .map_err(|err| EngineError::Spawn(err.to_string()))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|err| EngineError::Spawn(err.to_string()))?;

        if !output.status.success() {
            let status = output.status.code().unwrap_or_default();
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("Piper exited with status {status}: {stderr}");
            return Err(EngineError::Synthesis { status, stderr });
        }

        if !wav_path.exists() {
            warn!(
                "Piper succeeded but the expected output {} was not created",
                wav_path.display()
            );
        }
        Ok(wav_path)
    }

    fn start_playback(
        &mut self,
        id: UtteranceId,
        wav_path: PathBuf,
        volume: f32,
    ) -> Result<(), EngineError> {
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let events = self.events.clone();

        thread::Builder::new()
            .name(format!("playback-{}", id.0))
            .spawn(move || {
                let prepared = (|| -> Result<(OutputStream, Arc<Sink>), EngineError> {
                    let file = fs::File::open(&wav_path)
                        .map_err(|err| EngineError::Output(err.to_string()))?;
                    let decoder = Decoder::new(BufReader::new(file))
                        .map_err(|err| EngineError::Output(err.to_string()))?;
                    let (stream, handle) = OutputStream::try_default()
                        .map_err(|err| EngineError::Output(err.to_string()))?;
                    let sink = Sink::try_new(&handle)
                        .map_err(|err| EngineError::Output(err.to_string()))?;
                    sink.set_volume(volume);
                    sink.append(decoder);
                    Ok((stream, Arc::new(sink)))
                })();
                match prepared {
                    Ok((stream, sink)) => {
                        if ready_tx.send(Ok(Arc::clone(&sink))).is_err() {
                            return;
                        }
                        let _ = events.send(EngineEvent::Started(id));
                        sink.sleep_until_end();
                        // The stream must outlive the sink it feeds.
                        drop(stream);
                        let _ = events.send(EngineEvent::Finished(id));
                    }
                    Err(err) => {
                        // When nobody is waiting on the handshake any more,
                        // the failure still has to surface somewhere.
                        if let Err(unsent) = ready_tx.send(Err(err)) {
                            if let Err(err) = unsent.0 {
                                let _ = events.send(EngineEvent::Errored {
                                    id,
                                    message: err.to_string(),
                                });
                            }
                        }
                    }
                }
            })
            .map_err(|err| EngineError::Output(err.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(sink)) => {
                self.active = Some(ActiveSink { id, sink });
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(EngineError::Output("playback thread exited".to_string())),
        }
    }
}

impl SpeechEngine for PiperEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), EngineError> {
        let wav_path = self.synthesize(utterance)?;
        self.cancel();
        self.start_playback(utterance.id, wav_path, utterance.volume)
    }

    fn pause(&mut self) {
        if let Some(active) = &self.active {
            active.sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(active) = &self.active {
            active.sink.play();
        }
    }

    fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("cancelling utterance {:?}", active.id);
            active.sink.stop();
        }
    }

    fn request_voice_list(&mut self) {
        self.publish_voices();
    }
}

fn sidecar_locale(model_path: &Path) -> Option<String> {
    let mut sidecar = model_path.to_path_buf();
    sidecar.set_extension("onnx.json");
    let contents = fs::read_to_string(&sidecar).ok()?;
    let metadata: Value = serde_json::from_str(&contents)
        .map_err(|err| {
            warn!("failed to parse metadata {}: {err}", sidecar.display());
            err
        })
        .ok()?;
    metadata
        .get("language")
        .and_then(|language| language.get("code"))
        .and_then(Value::as_str)
        .map(|code| code.to_string())
}
