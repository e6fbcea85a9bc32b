//! Product extraction for vendor pages: URL classification, a rule-driven
//! document walk, field validation and durable id issuance.

pub mod batch;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod database;
pub mod error;
pub mod extractors;
pub mod id_issuer;
pub mod logging;
pub mod page;
pub mod validator;
pub mod vendors;

pub use coordinator::{Analysis, Coordinator, Outcome, PageState, Report};
pub use error::{IssuanceError, RejectReason, ScriptError, TreeWalkError};
pub use id_issuer::{IdIssuer, MemoryIdIssuer, ProductId, SqliteIdIssuer};
pub use page::{Metadata, PageDescriptor, ParseResult};
