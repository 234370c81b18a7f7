pub mod error;
pub mod oauth;
pub mod redirect;
pub mod session;
pub mod storage;
pub mod supabase;
pub mod traits;

pub use error::AuthError;
pub use redirect::{RedirectResolver, RuntimeEnv};
pub use session::{Session, User};
pub use supabase::SupabaseSessionStore;
pub use traits::SessionStore;
