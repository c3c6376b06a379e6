/*
[INPUT]:  Credentials or a pre-issued session token
[OUTPUT]: Valid X-Auth-Token values and auth errors
[POS]:    Auth layer - handles Primary API authentication
[UPDATE]: When auth flow or token handling change
*/

pub mod provider;
pub mod token;

pub use provider::{AUTH_HEADER, AuthProvider, PasswordAuth, StaticTokenAuth};
pub use token::{TokenData, TokenStore};
