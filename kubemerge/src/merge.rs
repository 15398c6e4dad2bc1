//! Importing the active context of one kubeconfig into another.

use std::fmt;

use tracing::{debug, warn};

use crate::document::{KubeConfig, Named, NamedAuthInfo, NamedCluster, NamedContext};
use crate::error::MergeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Prefix the imported context, cluster and user are renamed with.
    /// An empty string means no renaming.
    pub rename: Option<String>,
    /// Overwrite records that already exist in the destination.
    pub force: bool,
    /// Point `current-context` of the result at the imported context.
    pub set_current_context: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            rename: None,
            force: false,
            set_current_context: true,
        }
    }
}

impl MergeOptions {
    fn rename_prefix(&self) -> Option<&str> {
        self.rename.as_deref().filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Context,
    Cluster,
    AuthInfo,
}

impl RecordKind {
    fn describe(self) -> &'static str {
        match self {
            RecordKind::Context => "context",
            RecordKind::Cluster => "cluster information",
            RecordKind::AuthInfo => "authentication information",
        }
    }
}

/// An imported record that was skipped because the destination already has
/// one with the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub kind: RecordKind,
    pub name: String,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} having the same name ({}) already exists",
            self.kind.describe(),
            self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub config: KubeConfig,
    /// Records left untouched because `force` was off.
    pub collisions: Vec<Collision>,
}

/// The active context of a kubeconfig together with the cluster and user it
/// points at.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub context: NamedContext,
    pub cluster: NamedCluster,
    pub auth_info: NamedAuthInfo,
}

impl Import {
    pub fn resolve(source: &KubeConfig) -> Result<Import, MergeError> {
        let current = source.current_context.as_deref().unwrap_or_default();
        let context = source
            .find_context(current)
            .ok_or_else(|| MergeError::ContextNotFound(current.to_owned()))?;
        let cluster = source
            .find_cluster(&context.context.cluster)
            .ok_or_else(|| MergeError::ClusterNotFound(context.context.cluster.clone()))?;
        let auth_info = source
            .find_auth_info(&context.context.auth_info)
            .ok_or_else(|| MergeError::AuthInfoNotFound(context.context.auth_info.clone()))?;

        Ok(Import {
            context: context.clone(),
            cluster: cluster.clone(),
            auth_info: auth_info.clone(),
        })
    }

    /// Renames all three records at once: the context becomes `prefix`, the
    /// cluster and user become `prefix-<old name>`, and the context keeps
    /// pointing at them.
    pub fn renamed(mut self, prefix: &str) -> Import {
        let cluster = format!("{prefix}-{}", self.cluster.name);
        let auth_info = format!("{prefix}-{}", self.auth_info.name);

        self.context.set_name(prefix.to_owned());
        self.context.context.cluster = cluster.clone();
        self.context.context.auth_info = auth_info.clone();
        self.cluster.set_name(cluster);
        self.auth_info.set_name(auth_info);
        self
    }
}

/// Inserts `incoming` at the end of `records`, or over the entry of the same
/// name when `force` is set. Returns the collision when an existing entry was
/// kept instead.
fn reconcile<T: Named>(
    records: &mut Vec<T>,
    incoming: T,
    kind: RecordKind,
    force: bool,
) -> Option<Collision> {
    match records.iter().position(|r| r.name() == incoming.name()) {
        Some(idx) if force => {
            debug!(kind = kind.describe(), name = incoming.name(), "overwriting");
            records[idx] = incoming;
            None
        }
        Some(_) => {
            let collision = Collision {
                kind,
                name: incoming.name().to_owned(),
            };
            warn!("{collision}");
            Some(collision)
        }
        None => {
            records.push(incoming);
            None
        }
    }
}

/// Merges the active context of `source` (with its cluster and user) into a
/// copy of `destination`.
pub fn merge(
    source: Option<&KubeConfig>,
    destination: &KubeConfig,
    options: &MergeOptions,
) -> Result<Merged, MergeError> {
    let source = source.ok_or(MergeError::EmptySource)?;

    let mut import = Import::resolve(source)?;
    if let Some(prefix) = options.rename_prefix() {
        import = import.renamed(prefix);
    }
    let Import {
        context,
        cluster,
        auth_info,
    } = import;
    let context_name = context.name.clone();

    let mut config = destination.clone();
    let collisions = [
        reconcile(&mut config.contexts, context, RecordKind::Context, options.force),
        reconcile(&mut config.clusters, cluster, RecordKind::Cluster, options.force),
        reconcile(&mut config.users, auth_info, RecordKind::AuthInfo, options.force),
    ]
    .into_iter()
    .flatten()
    .collect();

    if options.set_current_context {
        config.current_context = Some(context_name);
    }

    Ok(Merged { config, collisions })
}
