mod http;
mod traits;

pub use http::HttpProvider;
pub use traits::{OAuthProvider, Profile, TokenSet};
