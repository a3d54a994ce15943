//! Recorder gateway: the control plane in front of a non-reentrant tuner and
//! recording backend.
//!
//! Hardware-affine operations are serialized on a single
//! [`apartment::ApartmentDispatcher`] thread; pure queries are answered from
//! the [`session::SessionRegistry`]. [`gateway::RecorderGateway`] exposes the
//! operations and [`web`] serves them over HTTP.

pub mod apartment;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod notifier;
pub mod session;
pub mod sweeper;
pub mod web;

pub use apartment::ApartmentDispatcher;
pub use error::{BackendError, ConfigError, DispatchError, GatewayError};
pub use gateway::RecorderGateway;
pub use session::SessionRegistry;
