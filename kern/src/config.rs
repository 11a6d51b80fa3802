use snapshot_core::ArtifactNames;

use crate::param::{NFRAMES, NPROC};

/// What happens to a process after it has been checkpointed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AfterCheckpoint {
    /// The process keeps running from where it was captured.
    Continue,
    /// The process is killed and reaped before the process table is unlocked.
    Terminate,
}

impl Default for AfterCheckpoint {
    fn default() -> Self {
        AfterCheckpoint::Continue
    }
}

/// Boot-time configuration of a [`Kernel`](crate::Kernel).
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of physical frames in the pool.
    pub frames: usize,
    pub max_processes: usize,
    /// Names of the snapshot artifacts.
    pub artifacts: ArtifactNames,
    pub after_checkpoint: AfterCheckpoint,
    /// Remove the manifest once a snapshot has been restored, so the same
    /// snapshot cannot be loaded twice.
    pub consume_on_restore: bool,
}

impl Config {
    pub fn frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    pub fn max_processes(mut self, max: usize) -> Self {
        self.max_processes = max;
        self
    }

    pub fn artifacts(mut self, artifacts: ArtifactNames) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn after_checkpoint(mut self, after: AfterCheckpoint) -> Self {
        self.after_checkpoint = after;
        self
    }

    pub fn consume_on_restore(mut self, consume: bool) -> Self {
        self.consume_on_restore = consume;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            frames: NFRAMES,
            max_processes: NPROC,
            artifacts: ArtifactNames::default(),
            after_checkpoint: AfterCheckpoint::default(),
            consume_on_restore: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::default()
            .frames(16)
            .artifacts(ArtifactNames::with_prefix("snap/"))
            .after_checkpoint(AfterCheckpoint::Terminate)
            .consume_on_restore(false);

        assert_eq!(config.frames, 16);
        assert_eq!(config.max_processes, NPROC);
        assert_eq!(config.artifacts.prefix(), "snap/");
        assert_eq!(config.after_checkpoint, AfterCheckpoint::Terminate);
        assert!(!config.consume_on_restore);
    }
}
