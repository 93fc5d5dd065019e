//! Speech-to-text capabilities

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::DictationError;

/// Platform speech-to-text
///
/// `listen` runs one single-utterance, final-results-only session and
/// returns the transcript. It must stop promptly once `cancel` fires.
#[async_trait]
pub trait SpeechCapability: Send + Sync {
    fn is_available(&self) -> bool;

    async fn listen(&self, language: &str, cancel: CancellationToken) -> Result<String, DictationError>;
}

/// Capability for systems without speech recognition
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

#[async_trait]
impl SpeechCapability for Unsupported {
    fn is_available(&self) -> bool {
        false
    }

    async fn listen(&self, _language: &str, _cancel: CancellationToken) -> Result<String, DictationError> {
        Err(DictationError::CapabilityUnavailable)
    }
}

/// Recognizer backed by an external command
///
/// The command prints the transcript on stdout and exits 0. On failure it
/// exits non-zero with an error code (`no-speech`, `audio-capture`,
/// `not-allowed`) as the first line of stderr. `{language}` in any argument
/// is replaced with the recognition language. The process is killed when
/// the session is cancelled.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a whitespace-separated command line
    pub fn parse(command_line: &str) -> Option<Self> {
        debug!(%command_line, "CommandRecognizer::parse: called");
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn resolve_program(&self) -> Option<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file().then(|| program.to_path_buf());
        }

        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    }
}

#[async_trait]
impl SpeechCapability for CommandRecognizer {
    fn is_available(&self) -> bool {
        self.resolve_program().is_some()
    }

    async fn listen(&self, language: &str, cancel: CancellationToken) -> Result<String, DictationError> {
        debug!(program = %self.program, %language, "CommandRecognizer::listen: called");
        let args: Vec<String> = self.args.iter().map(|a| a.replace("{language}", language)).collect();

        let child = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                warn!(program = %self.program, error = %e, "CommandRecognizer::listen: spawn failed");
                match e.kind() {
                    std::io::ErrorKind::NotFound => DictationError::CapabilityUnavailable,
                    _ => DictationError::Unknown(e.to_string()),
                }
            })?;

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(program = %self.program, "CommandRecognizer::listen: cancelled, killing recognizer");
                return Err(DictationError::Unknown("cancelled".to_string()));
            }
            output = child.wait_with_output() => {
                output.map_err(|e| DictationError::Unknown(e.to_string()))?
            }
        };

        if output.status.success() {
            let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
            debug!(len = transcript.len(), "CommandRecognizer::listen: transcript received");
            return Ok(transcript);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = stderr.lines().next().unwrap_or_default().trim();
        debug!(exit_code = ?output.status.code(), %code, "CommandRecognizer::listen: recognizer failed");
        if code.is_empty() {
            return Err(DictationError::Unknown(format!("exit status {}", output.status)));
        }
        Err(DictationError::from_platform_code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn sh(script: &str) -> CommandRecognizer {
        CommandRecognizer::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_unsupported_is_never_available() {
        let capability = Unsupported;
        assert!(!capability.is_available());
        let result = capability.listen("en-US", CancellationToken::new()).await;
        assert_eq!(result, Err(DictationError::CapabilityUnavailable));
    }

    #[test]
    fn test_parse_command_line() {
        let recognizer = CommandRecognizer::parse("whisper-listen --lang {language}").unwrap();
        assert_eq!(recognizer.program(), "whisper-listen");
        assert_eq!(recognizer.args, vec!["--lang".to_string(), "{language}".to_string()]);

        assert!(CommandRecognizer::parse("   ").is_none());
    }

    #[test]
    fn test_missing_program_unavailable() {
        let recognizer = CommandRecognizer::new("definitely-not-a-real-recognizer-xyz", vec![]);
        assert!(!recognizer.is_available());
        assert!(sh("true").is_available());
    }

    #[tokio::test]
    async fn test_transcript_from_stdout() {
        let result = sh("echo '  what is my bmi  '").listen("en-US", CancellationToken::new()).await;
        assert_eq!(result, Ok("what is my bmi".to_string()));
    }

    #[tokio::test]
    async fn test_language_placeholder_substituted() {
        let recognizer = CommandRecognizer::new("echo", vec!["{language}".to_string()]);
        let result = recognizer.listen("de-DE", CancellationToken::new()).await;
        assert_eq!(result, Ok("de-DE".to_string()));
    }

    #[tokio::test]
    async fn test_error_code_from_stderr() {
        let result = sh("echo audio-capture >&2; exit 1").listen("en-US", CancellationToken::new()).await;
        assert_eq!(result, Err(DictationError::NoMicrophoneFound));

        let result = sh("echo not-allowed >&2; exit 2").listen("en-US", CancellationToken::new()).await;
        assert_eq!(result, Err(DictationError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_unavailable() {
        let recognizer = CommandRecognizer::new("definitely-not-a-real-recognizer-xyz", vec![]);
        let result = recognizer.listen("en-US", CancellationToken::new()).await;
        assert_eq!(result, Err(DictationError::CapabilityUnavailable));
    }

    #[tokio::test]
    async fn test_cancel_stops_recognizer() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = sh("sleep 30").listen("en-US", cancel).await;
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
