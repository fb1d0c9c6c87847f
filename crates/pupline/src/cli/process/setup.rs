//! Processor setup: policy overrides, store creation, runner assembly.

use std::sync::Arc;

use pupline_core::{
    BatchOptions, BatchRunner, DisabledStore, ObjectStore, Policy, SupabaseStore,
};

use super::{ProcessArgs, ProcessContext};

/// Validate input, apply CLI overrides and assemble everything needed for
/// a batch run.
pub fn setup_runner(args: &ProcessArgs, policy: Policy) -> anyhow::Result<ProcessContext> {
    let policy = apply_overrides(policy, args)?;

    let input = args.input.clone().unwrap_or_else(|| policy.input_root());
    if !input.is_dir() {
        anyhow::bail!(
            "Input root does not exist: {:?}\n\n  Hint: pass a directory containing one folder per item, \
             or set paths.input_root in the config.",
            input
        );
    }

    let upload = args.upload || policy.storage.enabled;
    let store = if upload { Some(create_store(&policy)) } else { None };

    let options = BatchOptions {
        parallel: policy.processing.parallel_workers,
        timeout_ms: policy.processing.image_timeout_ms,
        clean: !args.no_clean,
        gate: args.gate,
    };

    let policy = Arc::new(policy);
    let mut runner = BatchRunner::new(policy.clone(), options);
    if let Some(store) = store {
        runner = runner.with_store(store);
    }

    Ok(ProcessContext {
        policy,
        runner,
        input,
        uploading: upload,
    })
}

/// Apply command-line overrides and re-validate.
fn apply_overrides(mut policy: Policy, args: &ProcessArgs) -> anyhow::Result<Policy> {
    if let Some(output) = &args.output {
        policy.paths.output_root = output.clone();
    }
    if let Some(parallel) = args.parallel {
        policy.processing.parallel_workers = parallel;
    }
    policy.validate()?;
    Ok(policy)
}

/// Build the configured object store. A misconfigured store becomes a
/// [`DisabledStore`] so uploads fail per derivative instead of aborting.
fn create_store(policy: &Policy) -> Arc<dyn ObjectStore> {
    match SupabaseStore::from_config(&policy.storage) {
        Ok(store) => {
            tracing::info!("Uploading to bucket '{}'", policy.storage.bucket);
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!("Uploads will fail: {e}");
            Arc::new(DisabledStore::new(e.to_string()))
        }
    }
}
