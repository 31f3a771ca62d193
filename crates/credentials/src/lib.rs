pub mod broker;
pub mod interceptor;
pub mod store;

pub use broker::{CredentialEvent, CredentialHandle, CredentialService};
pub use interceptor::{CookieCause, CookieChange, Header, RequestDetails};
pub use store::CredentialStore;
