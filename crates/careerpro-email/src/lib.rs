//! CareerPro Email - outbound templated email
//!
//! A dependency-injected sender with its template set cached inside the
//! service instance. Sends can be gated on a user's stored notification
//! preference: a gated-off send is skipped and reported as `false`, not
//! as an error.

pub mod error;
pub mod service;
pub mod template;

pub use error::EmailError;
pub use service::{EmailConfig, EmailService, NotificationKind};
pub use template::{RenderedEmail, TemplateSet};
