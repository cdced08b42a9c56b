//! Production `Verifier`: shells out to an external model-checker binary.
//!
//! The binary itself (its invocation contract is fixed by the pipeline's XML
//! input and newline-delimited output formats) is not shipped by this crate
//! — only the plumbing to call one, write its input to a temp file, and
//! parse its output.

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rms_repair_pipeline::errors::ExternalError;
use rms_repair_pipeline::synth::dialect::Property;
use rms_repair_pipeline::verifier::{VerifierOutcome, Verifier, parse_output};

pub struct ProcessVerifier {
    pub command: String,
}

/// Deletes the model file it guards on drop, so every exit path (including
/// an early return on error) cleans up the temp file without a manual
/// cleanup call at each return site.
struct TempModelFile(PathBuf);

impl Drop for TempModelFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

impl Verifier for ProcessVerifier {
    fn verify(&self, model_xml: &str, properties: &[Property], timeout: Duration) -> Result<VerifierOutcome, ExternalError> {
        let path = std::env::temp_dir().join(format!("rms-repair-pipeline-{}.xml", std::process::id()));
        let mut file = std::fs::File::create(&path).map_err(|e| ExternalError::VerifierFailed(e.to_string()))?;
        file.write_all(model_xml.as_bytes()).map_err(|e| ExternalError::VerifierFailed(e.to_string()))?;
        let guard = TempModelFile(path.clone());

        let mut child = std::process::Command::new(&self.command)
            .arg(&path)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| ExternalError::VerifierFailed(e.to_string()))?;

        let start = Instant::now();
        loop {
            if child.try_wait().map_err(|e| ExternalError::VerifierFailed(e.to_string()))?.is_some() {
                break;
            }
            if start.elapsed() > timeout {
                let _ = child.kill();
                return Err(ExternalError::Timeout(timeout));
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        let output = child.wait_with_output().map_err(|e| ExternalError::VerifierFailed(e.to_string()))?;
        drop(guard);

        if !output.status.success() {
            return Err(ExternalError::VerifierFailed(String::from_utf8_lossy(&output.stderr).to_string()));
        }

        let log = String::from_utf8_lossy(&output.stdout);
        parse_output(&log, properties)
    }
}
