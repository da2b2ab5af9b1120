//! Synthesizer → player pipeline.
//!
//! Equivalent to `echo TEXT | piper --model ... --output-raw | aplay -r 16000 -f S16_LE -t raw -`
//! but wired up directly: the synthesizer's stdout becomes the player's stdin
//! and the text is written to the synthesizer's stdin. No shell is involved,
//! so display names and post content are never interpreted as commands.

use std::process::Stdio;
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{SpeechError, Speaker};
use crate::config::SpeechConfig;

pub struct PiperSpeaker {
    config: SpeechConfig,
}

impl PiperSpeaker {
    pub fn new(config: SpeechConfig) -> Self {
        Self { config }
    }
}

impl Speaker for PiperSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let t0 = Instant::now();
        let synth_name = &self.config.synthesizer;
        let player_name = &self.config.player;

        let mut synth = Command::new(synth_name)
            .args(&self.config.synthesizer_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: synth_name.clone(),
                source,
            })?;

        let audio: Stdio = match synth.stdout.take() {
            Some(stdout) => stdout.try_into().map_err(|source| SpeechError::Spawn {
                program: player_name.clone(),
                source,
            })?,
            None => Stdio::null(),
        };

        let mut player = Command::new(player_name)
            .args(&self.config.player_args)
            .stdin(audio)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: player_name.clone(),
                source,
            })?;

        // Piper reads one utterance per line; dropping stdin sends EOF.
        if let Some(mut stdin) = synth.stdin.take() {
            let line = format!("{text}\n");
            stdin
                .write_all(line.as_bytes())
                .await
                .map_err(|source| SpeechError::Stdin {
                    program: synth_name.clone(),
                    source,
                })?;
        }

        let synth_status = synth.wait().await.map_err(|source| SpeechError::Spawn {
            program: synth_name.clone(),
            source,
        })?;
        let player_status = player.wait().await.map_err(|source| SpeechError::Spawn {
            program: player_name.clone(),
            source,
        })?;

        if !synth_status.success() {
            return Err(SpeechError::Exited {
                program: synth_name.clone(),
                status: synth_status,
            });
        }
        if !player_status.success() {
            return Err(SpeechError::Exited {
                program: player_name.clone(),
                status: player_status,
            });
        }

        debug!("Spoke {} chars in {}ms", text.len(), t0.elapsed().as_millis());
        Ok(())
    }
}
