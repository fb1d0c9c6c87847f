//! The `pupline storage` command for inspecting the upload backend.

use clap::{Args, Subcommand};
use pupline_core::{ObjectStore, Policy, SupabaseStore};

/// Arguments for the `storage` command.
#[derive(Args, Debug)]
pub struct StorageArgs {
    #[command(subcommand)]
    pub command: StorageCommand,
}

/// Subcommands for storage management.
#[derive(Subcommand, Debug)]
pub enum StorageCommand {
    /// Check that the configured bucket is reachable
    Check,
}

/// Execute the storage command.
pub async fn execute(args: StorageArgs, policy: Policy) -> anyhow::Result<()> {
    match args.command {
        StorageCommand::Check => {
            let store = SupabaseStore::from_config(&policy.storage)?;
            if !store.is_available().await {
                anyhow::bail!(
                    "Bucket '{}' is not reachable with the configured credentials.",
                    policy.storage.bucket
                );
            }
            println!("{}: bucket '{}' is available", store.name(), policy.storage.bucket);
            if !policy.storage.enabled {
                println!("Uploads are disabled in config; pass --upload to `pupline process` to use it.");
            }
        }
    }
    Ok(())
}
