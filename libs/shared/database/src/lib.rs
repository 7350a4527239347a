pub mod error;
pub mod memory;
pub mod postgrest;
pub mod supabase;

pub use error::DatabaseError;
pub use memory::ReferenceTracker;
pub use postgrest::QueryBuilder;
pub use supabase::SupabaseClient;
