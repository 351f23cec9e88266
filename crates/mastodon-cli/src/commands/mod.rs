//! Command implementations for mastodon-cli

pub mod account;
pub mod login;
pub mod post;
pub mod register;
pub mod stream;
pub mod timeline;

pub use account::{account, followers, following};
pub use login::login;
pub use post::post;
pub use register::register;
pub use stream::stream;
pub use timeline::timeline;
