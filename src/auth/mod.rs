pub mod claims;
pub mod extractor;
pub mod jwt;
pub mod policy;
pub mod principal;
pub mod provider;

pub use claims::Claims;
pub use extractor::AuthenticatedUser;
pub use jwt::JwtService;
pub use policy::{AccessGate, AccessPolicy, Action};
pub use principal::{Capabilities, Principal};
pub use provider::{AuthProvider, InMemoryAuthProvider};
