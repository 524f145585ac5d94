//! # SIMGATE Core
//!
//! Core plumbing shared by the SIMGATE simulator bridge:
//!
//! - **Errors**: one central error enum for every component
//! - **Bus**: publisher/subscriber traits plus an in-process `Hub`
//! - **Nodes**: the lifecycle trait implemented by periodic components
//!
//! The real deployment publishes onto an external message bus; the traits in
//! [`bus`] are the seam, and [`bus::Hub`] is the in-process implementation
//! used by tests and the demo binary.
//!
//! ```rust,no_run
//! use simgate_core::{Hub, Node};
//!
//! struct ExampleNode {
//!     output: Hub<String>,
//! }
//!
//! impl Node for ExampleNode {
//!     fn name(&self) -> &'static str { "example" }
//!
//!     fn tick(&mut self) {
//!         let _ = self.output.send("hello".into());
//!     }
//! }
//! ```

pub mod bus;
pub mod error;
pub mod node;

// Re-export commonly used types for easy access
pub use bus::{Hub, HubSubscriber, Publisher, Subscriber};
pub use error::{GateError, GateResult};
pub use node::Node;
