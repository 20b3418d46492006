//! Navbridge: Server-Driven Navigation Client
//!
//! Decodes the packed reference-graph JSON a server-rendered application sends
//! and drives navigation from its responses: ordered fetches, frame
//! transitions, overlays that escalate to their parent, history and redirects.

pub mod browser;
pub mod cli;
pub mod config;
pub mod dirty_form;
pub mod error;
pub mod frame;
pub mod logging;
pub mod navigation;
pub mod response;
pub mod transport;
pub mod unpack;

pub use error::{ClientError, DecodeError, NavigationError};
pub use navigation::{ControllerBuilder, NavigationController, ResponseHandler};
pub use response::{RenderResponse, Response};
pub use unpack::{unpack, TypeRegistry, Value};
