//! Built-in node attestors

pub mod join_token;
pub mod mock;

pub use join_token::{JoinToken, JoinTokenAttestor};
pub use mock::MockAttestor;
