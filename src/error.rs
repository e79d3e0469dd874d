use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgudieError {
    #[error("Failed to open {}: {reason}", .path.display())]
    Open { path: PathBuf, reason: String },

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Config parsing error: {0}")]
    Config(#[from] toml::de::Error),
}

impl AgudieError {
    /// Wrap an engine failure for `path`, keeping the whole context chain.
    pub fn open(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        AgudieError::Open {
            path: path.into(),
            reason: format!("{:#}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, AgudieError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn open_error_keeps_context_chain() {
        let inner: anyhow::Result<()> =
            Err(anyhow::anyhow!("No video stream found")).context("Failed to probe media");
        let err = AgudieError::open("/tmp/clip.mp4", &inner.unwrap_err());
        assert_eq!(
            err.to_string(),
            "Failed to open /tmp/clip.mp4: Failed to probe media: No video stream found"
        );
    }
}
