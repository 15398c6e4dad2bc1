use std::io::{self, Read, Write as _};
use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use chrono::NaiveDateTime;
use tracing::debug;

use crate::document::KubeConfig;

/// Reads a kubeconfig from a stream, such as one piped into stdin.
pub fn read_source(mut reader: impl Read) -> anyhow::Result<Option<KubeConfig>> {
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .context("Reading kube config")?;
    KubeConfig::from_yaml(&input).context("Parsing kube config")
}

/// Reads the kubeconfig at `path`. A file that does not exist yet is `None`,
/// the same as an empty one.
pub fn read_config(path: impl AsRef<Path>) -> anyhow::Result<Option<KubeConfig>> {
    let path = path.as_ref();
    let input = match fs::read_to_string(path) {
        Ok(input) => input,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no kube config yet");
            return Ok(None);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Opening kube config {}", path.display()))
        }
    };
    KubeConfig::from_yaml(&input)
        .with_context(|| format!("Parsing kube config {}", path.display()))
}

/// Replaces the file at `path` with `kc`. The document goes to a temporary
/// file next to it first, so a failed write leaves the old file intact.
/// Symlinks are written through and the old file's permissions are kept.
pub fn write_config(kc: &KubeConfig, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let yaml = kc.to_yaml().context("Encoding kube config")?;

    let target = match fs::canonicalize(path) {
        Ok(target) => target,
        Err(err) if err.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(err) => {
            return Err(err).with_context(|| format!("Resolving kube config {}", path.display()))
        }
    };
    if target != path {
        debug!(path = %path.display(), target = %target.display(), "writing through link");
    }

    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Creating {}", dir.display()))?;

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Opening kube config {}", target.display()))?;
    if let Ok(meta) = fs::metadata(&target) {
        file.as_file()
            .set_permissions(meta.permissions())
            .with_context(|| format!("Copying permissions of {}", target.display()))?;
    }
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Writing kube config {}", target.display()))?;
    file.persist(&target)
        .map_err(|err| err.error)
        .with_context(|| format!("Writing kube config {}", target.display()))?;

    Ok(())
}

/// Path a backup of `path` taken at `now` is stored under,
/// e.g. `~/.kube/config_20240102T030405`.
pub fn backup_path(path: &Path, now: NaiveDateTime) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "config".into());
    name.push(format!("_{}", now.format("%Y%m%dT%H%M%S")));
    path.with_file_name(name)
}

/// Copies the kubeconfig at `path` aside. Returns `None` when there was
/// nothing to back up.
pub fn backup_config(path: &Path, now: NaiveDateTime) -> anyhow::Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let backup = backup_path(path, now);
    fs::copy(path, &backup)
        .with_context(|| format!("Backing up {} to {}", path.display(), backup.display()))?;
    Ok(Some(backup))
}
