//! The `pupline clean` command: remove every derivative of one item.

use clap::Args;
use pupline_core::pipeline::naming::sanitize;
use pupline_core::{ObjectStore, Policy, Processor, SupabaseStore};
use std::sync::Arc;

/// Arguments for the `clean` command.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Item slug or folder name (e.g. spitz-branco-macho)
    pub slug: String,

    /// Also delete the item's objects from storage
    #[arg(long)]
    pub remote: bool,
}

/// Execute the clean command.
pub async fn execute(args: CleanArgs, policy: Policy) -> anyhow::Result<()> {
    let slug = sanitize(&args.slug);
    if slug.is_empty() {
        anyhow::bail!("{:?} does not contain any usable slug characters", args.slug);
    }

    let storage = policy.storage.clone();
    let processor = Processor::new(Arc::new(policy));
    let dir = processor.policy().item_dir(&slug);
    processor.cleanup_old_images(&slug)?;
    println!("Removed local derivatives in {}", dir.display());

    if args.remote {
        let store = SupabaseStore::from_config(&storage)?;
        let removed = store.delete_all(&slug).await?;
        println!("Removed {removed} object(s) from {}/{slug}/", storage.bucket);
    }
    Ok(())
}
