mod diff;

use std::ffi::OsString;
use std::io::{self, Write as _};
use std::str::FromStr;

use anyhow::Context as _;
use chrono::Local;
use clap::{ArgAction, CommandFactory, Parser};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use kubemerge::{merge, read_config, read_source, write_config, KubeConfig, MergeOptions};

const LOG_ENV: &str = "KUBE_CTX_IMPORT_LOG";

/// `kube-ctx-import` is a utility to merge kubernetes contexts to a single kubeconfig.
/// It imports the current context of the kubeconfig piped into stdin either to
/// `~/.kube/config` or to the file defined by the `KUBECONFIG` environment variable.
#[derive(Parser, Debug)]
#[command(
    name = "kube-ctx-import",
    version,
    disable_help_flag = true,
    after_help = "Example:\n    cat /some/kubeconfig | kube-ctx-import"
)]
struct Cli {
    /// Overwrite contexts, clusters and users that already exist
    #[arg(long)]
    force: bool,

    /// Renames the context for the import; cluster and user become <NAME>-<old name>
    #[arg(long, value_name = "NAME", default_value = "")]
    name: String,

    /// Set current context to the imported context
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    set_current_context: bool,

    /// Print the result to stdout instead of writing it to the kubeconfig
    #[arg(long)]
    stdout: bool,

    /// Copy the kubeconfig to <file>_<timestamp> before overwriting it
    #[arg(long)]
    backup: bool,

    /// Show the changes made to the kubeconfig on stderr
    #[arg(long)]
    diff: bool,

    /// Kubeconfig to import into
    #[arg(long, env = "KUBECONFIG", value_name = "PATH")]
    kubeconfig: Option<OsString>,

    /// Display this help and exit
    #[arg(short, long)]
    help: bool,
}

impl Cli {
    fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            rename: Some(self.name.clone()).filter(|name| !name.is_empty()),
            force: self.force,
            set_current_context: self.set_current_context,
        }
    }
}

/// Writes the `--help` text; `main` sends it to stderr.
fn write_usage(mut out: impl io::Write) -> io::Result<()> {
    writeln!(out, "{}", Cli::command().render_help())
}

fn init_tracing() {
    let env = std::env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::from_str(&env).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.help {
        write_usage(io::stderr())?;
        return Ok(());
    }

    init_tracing();

    let destination_path = kubemerge::resolve_destination(cli.kubeconfig.as_deref())?;
    debug!(path = %destination_path.display(), "destination");

    let source = read_source(io::stdin().lock()).context("Reading source from stdin")?;
    let destination = read_config(&destination_path)?.unwrap_or_else(KubeConfig::empty);

    let merged = merge(source.as_ref(), &destination, &cli.merge_options())?;
    let rendered = merged.config.to_yaml().context("Encoding kube config")?;

    if cli.diff {
        let before = destination.to_yaml().context("Encoding kube config")?;
        eprint!("{}", diff::render(&before, &rendered));
    }

    if cli.stdout {
        io::stdout().write_all(rendered.as_bytes())?;
        return Ok(());
    }

    if cli.backup {
        if let Some(backup) =
            kubemerge::backup_config(&destination_path, Local::now().naive_local())?
        {
            info!(path = %backup.display(), "backed up kube config");
        }
    }

    write_config(&merged.config, &destination_path)?;
    info!(
        path = %destination_path.display(),
        context = merged.config.current_context.as_deref().unwrap_or_default(),
        skipped = merged.collisions.len(),
        "imported context"
    );

    Ok(())
}
