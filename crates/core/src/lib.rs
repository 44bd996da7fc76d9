//! Domain types and client-side processing for plant registration.
//!
//! - [`draft`] holds the transient [`PlantDraft`](draft::PlantDraft) a
//!   registration flow fills in, its input validation, and the
//!   creation request body sent to the backend.
//! - [`image_prep`] shrinks a captured photo into a JPEG that fits an
//!   upload size ceiling.

pub mod draft;
pub mod error;
pub mod image_prep;
