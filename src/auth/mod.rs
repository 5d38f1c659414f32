//! Authentication primitives: the in-memory token store, the cookie-backed
//! anti-forgery reader, single-flight renewal coordination, and the
//! collaborator seams touched during session teardown.

pub mod cookies;
pub mod renewal;
pub mod store;
pub mod teardown;

pub use cookies::{CookieSource, JarCookies};
pub use renewal::RenewalCoordinator;
pub use store::TokenStore;
pub use teardown::{SignInNavigator, StaySignedIn};
