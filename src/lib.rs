//! Asset Reference Finder
//!
//! Scans a live object graph (scene components and their fields) for every
//! place a chosen asset or object is referenced, and reports the owning
//! component, the field, and a best-effort source line for that field.
//!
//! ## Pipeline
//!
//! ```text
//! selection ─► SearchRequest ─► scan ─► Vec<ReferencePair> ─► locate ─► SearchResponse
//!                                 │
//!                                 ├─ is_compatible  (declared field type vs target type)
//!                                 └─ are_equal      (field value vs target)
//! ```
//!
//! A texture is treated as referenced by a sprite field whose sprite wraps
//! that texture, both when checking types and when comparing values.

pub mod config;
pub mod error;
pub mod locate;
pub mod model;
pub mod reference;
pub mod resolve;
pub mod scan;
pub mod session;

pub use config::{FinderConfig, LocatorConfig, OutputFormat};
pub use error::{FinderError, Result};
pub use locate::{locate, locate_all, FsScriptStore, MemoryScriptStore, ScriptStore, TextLines};
pub use model::{
    FieldDescriptor, FieldValue, ObjectModel, ObjectRef, Scene, TypeDecl, TypeId, TypeKind,
    TypeRegistry, TypeToken,
};
pub use reference::{ReferencePair, ScriptSource, SearchRequest, SearchResponse};
pub use resolve::{are_equal, is_compatible};
pub use scan::scan;
pub use session::{build_request, Session};
