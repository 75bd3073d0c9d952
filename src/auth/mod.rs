pub mod memory;
pub mod provider;

pub use memory::MemoryAuth;
pub use provider::{AuthError, AuthProvider, AuthSession, SignUp, User};
