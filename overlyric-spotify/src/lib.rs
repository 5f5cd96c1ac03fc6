pub mod auth;
pub mod error;
pub mod source;

pub use auth::SpotifyAuth;
pub use error::SpotifyError;
pub use source::SpotifySource;
