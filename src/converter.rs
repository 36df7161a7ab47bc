use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Converter exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a directory of slice files into volumes written to `output`.
pub trait VolumeConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConverterError>;
}

/// Runs `dcm2niix -o <output> <input>`.
#[derive(Debug, Clone)]
pub struct Dcm2NiixConverter {
    program: PathBuf,
}

impl Dcm2NiixConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for Dcm2NiixConverter {
    fn default() -> Self {
        Self::new("dcm2niix")
    }
}

impl VolumeConverter for Dcm2NiixConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConverterError> {
        fs::create_dir_all(output)?;
        info!(
            program = %self.program.display(),
            input = %input.display(),
            output = %output.display(),
            "running volume converter"
        );

        let result = Command::new(&self.program)
            .arg("-o")
            .arg(output)
            .arg(input)
            .output()
            .map_err(|source| ConverterError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(ConverterError::Failed {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
