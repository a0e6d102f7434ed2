// Composition root for the back-office HTTP surface.
//
// Responsibilities
// - Wire engines over concrete adapters into AppState.
// - Extract the authenticated principal from request headers.
// - Render every response through the JSON envelope.

pub mod auth;
pub mod disputes_http;
pub mod envelope;
pub mod http;
pub mod state;
pub mod wallet_http;
