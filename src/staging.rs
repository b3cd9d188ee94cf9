//! Filesystem staging for downloaded outputs.
use crate::config::StagingConfig;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Output directory `<temp_root>/<plugin_name>/<command>` shared by all cases of a command.
///
/// The directory is removed (best effort) when the object is dropped, that is, once the last case
/// holding it has finished.
#[derive(Debug)]
pub struct CommandStaging {
    command: String,
    dir: PathBuf,
}

impl CommandStaging {
    pub fn create(config: &StagingConfig, command: &str) -> io::Result<Self> {
        let dir = config
            .temp_root
            .join(&config.plugin_name)
            .join(command);
        info!(
            command,
            "Create directory ({}) for command tests outputs",
            dir.display()
        );
        fs::create_dir_all(&dir)?;

        Ok(Self {
            command: command.to_string(),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates a new uniquely named directory for a single case.
    pub fn stage_case(&self) -> io::Result<PathBuf> {
        let case_dir = self.dir.join(Uuid::new_v4().to_string());
        fs::create_dir(&case_dir)?;
        debug!(command = %self.command, "staged {}", case_dir.display());
        Ok(case_dir)
    }
}

impl Drop for CommandStaging {
    fn drop(&mut self) {
        info!(
            command = %self.command,
            "Remove directory ({}) for command tests outputs",
            self.dir.display()
        );
        if let Err(err) = fs::remove_dir_all(&self.dir) {
            warn!(command = %self.command, %err, "could not remove {}", self.dir.display());
        }
    }
}
