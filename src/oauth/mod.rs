//! OAuth2 module
//!
//! Authorization-code flow on behalf of datasources that need delegated
//! credentials: state tokens, the provider token exchange, the credential
//! store hand-off and the orchestrator tying them together.

mod credentials;
mod exchange;
mod flow;
mod state;
mod types;

pub use credentials::{CredentialStore, InMemoryCredentialStore};
pub use exchange::{ExchangeRequest, HttpTokenExchange, TokenExchange};
pub use flow::{AuthorizationFlow, FlowSettings};
pub use state::{StateClaims, StateLedger, StateSigner};
pub use types::{AccessTokenResult, AuthorizationOutcome, CallbackParams, FlowState};
