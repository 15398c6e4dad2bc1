pub mod document;
pub mod error;
pub mod merge;
pub mod persist;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

pub use document::{KubeConfig, Named, NamedAuthInfo, NamedCluster, NamedContext};
pub use error::MergeError;
pub use merge::{merge, Collision, Import, MergeOptions, Merged, RecordKind};
pub use persist::{backup_config, read_config, read_source, write_config};

pub fn kube_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var_os("HOME").context("HOME is not set")?;
    Ok(Path::new(&home).join(".kube"))
}

/// Picks the kubeconfig to write to: the first entry of a `KUBECONFIG`-style
/// path list, or `~/.kube/config`.
pub fn resolve_destination(kubeconfig: Option<&OsStr>) -> anyhow::Result<PathBuf> {
    let from_list = kubeconfig
        .and_then(|paths| std::env::split_paths(paths).find(|p| !p.as_os_str().is_empty()));

    match from_list {
        Some(path) => Ok(path),
        None => Ok(kube_dir()?.join("config")),
    }
}
