//! Object storage for publishing derivatives.
//!
//! Uploads are optional and run after local processing. Every backend
//! implements [`ObjectStore`]; failures surface as [`UploadResult::Failed`]
//! values rather than errors.

pub mod disabled;
pub mod provider;
pub mod supabase;

pub use disabled::DisabledStore;
pub use provider::{object_key, resolve_env_var, ObjectStore, UploadResult};
pub use supabase::SupabaseStore;
