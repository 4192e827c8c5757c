//! # Migrate Subcommand
//!
//! Migrates a Chainpoint proof into a timestamp graph and, when chain data
//! is supplied, resolves every Bitcoin placeholder before printing the
//! graph. Nothing is printed if resolution fails part way.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use c2ots_bitcoin::{
    pending_placeholders, MemoryBlockSource, Resolver, ResolverConfig, Sources,
};
use c2ots_chainpoint::migrate;
use c2ots_core::encode_hex;

use crate::read_document;

/// Arguments for the migrate subcommand.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Path to the Chainpoint proof (JSON).
    #[arg(long)]
    pub chainpoint: PathBuf,

    /// Chain snapshot used to resolve placeholders (JSON).
    #[arg(long)]
    pub chain_data: Option<PathBuf>,

    /// Skip the full node and resolve through the lite source.
    #[arg(long)]
    pub prefer_lite: bool,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl MigrateArgs {
    /// Environment configuration with command-line overrides applied.
    fn resolver_config(&self) -> Result<ResolverConfig> {
        let mut config = ResolverConfig::from_env()?;
        if let Some(secs) = self.timeout_secs {
            anyhow::ensure!(secs > 0, "--timeout-secs must be positive");
            config.request_timeout = Duration::from_secs(secs);
        }
        if self.prefer_lite {
            config.prefer_lite = true;
        }
        Ok(config)
    }
}

/// Execute the migrate subcommand.
pub async fn run_migrate(args: &MigrateArgs, out: &mut impl Write) -> Result<u8> {
    let document = read_document(&args.chainpoint)?;
    let mut migration = migrate(&document)?;

    let pending = pending_placeholders(&migration.graph, migration.root)?;
    for placeholder in &pending {
        tracing::info!(
            leaf = %placeholder.leaf,
            tx_hash = %placeholder.tx_hash,
            message = %encode_hex(&placeholder.message),
            "pending placeholder"
        );
    }

    match &args.chain_data {
        Some(path) if !pending.is_empty() => {
            let input = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let snapshot = MemoryBlockSource::from_json(path.display().to_string(), &input)?;
            let sources = Sources {
                full_node: None,
                lite: Arc::new(snapshot),
            };
            let resolver = Resolver::new(sources, args.resolver_config()?);
            let resolved = resolver
                .resolve_all(&mut migration.graph, migration.root)
                .await
                .context("attestation resolution failed")?;
            tracing::info!(resolved = resolved.len(), "placeholders resolved");
        }
        Some(_) => tracing::info!("no placeholders to resolve"),
        None if !pending.is_empty() => {
            tracing::warn!(
                placeholders = pending.len(),
                "no chain data given, placeholders left unresolved"
            );
        }
        None => {}
    }

    write!(out, "{}", migration.render()?)?;
    writeln!(out)?;
    writeln!(out, "attestations:")?;
    for (node, attestation) in migration.graph.all_attestations(migration.root)? {
        writeln!(
            out,
            "  {} {attestation}",
            encode_hex(migration.graph.message(node)?)
        )?;
    }
    Ok(0)
}
