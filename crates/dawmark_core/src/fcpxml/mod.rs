//! FCPXML timeline model.
//!
//! This module reads Final Cut Pro XML documents and resolves, for any story
//! element, where it starts on the top-level timeline and which roles apply
//! to it.
//!
//! # Features
//!
//! - **Classification**: tag names to structure, story and resource kinds
//! - **Resources**: one-pass ID-keyed table of formats, assets, media, effects
//! - **Timing**: absolute start by folding the ancestor chain outside in
//! - **Roles**: assigned, inherited and defaulted roles flattened per class
//! - **Extraction**: whole-document pass with per-element diagnostics
//!
//! # Usage
//!
//! ```
//! use dawmark_core::config::Settings;
//! use dawmark_core::fcpxml::FcpxmlDocument;
//!
//! let xml = r#"<fcpxml version="1.11">
//!     <resources><format id="r1" frameDuration="1/25s"/></resources>
//!     <library><event><project name="P">
//!         <sequence format="r1" tcStart="3600s"><spine>
//!             <gap name="G" offset="3610s" duration="5s"/>
//!         </spine></sequence>
//!     </project></event></library>
//! </fcpxml>"#;
//!
//! let doc = FcpxmlDocument::parse(xml).unwrap();
//! let extraction = doc.extract(&Settings::default());
//! let gap = extraction.elements.iter().find(|e| e.element.tag == "gap").unwrap();
//! assert_eq!(gap.absolute_start.unwrap().to_string(), "01:00:10:00");
//! ```

mod attributes;
mod breadcrumbs;
mod diagnostics;
mod document;
mod element_type;
mod error;
mod resources;
mod role_resolver;
mod roles;
mod timing;

// Re-export types
pub use attributes::{MalformedAttribute, TimeAttr, TimecodeFormat};
pub use breadcrumbs::Breadcrumb;
pub use diagnostics::{
    Diagnostic, DiagnosticReason, ElementIdentity, Unresolved, UnresolvedReason,
};
pub use document::{ExtractedElement, Extraction, FcpxmlDocument, MarkerExtraction};
pub use element_type::{
    AnnotationType, ClipType, ElementType, ResourceKind, StoryElementType, StructureElementType,
};
pub use error::{FcpxmlError, FcpxmlResult, ResourceLookupError};
pub use resources::{
    AssetResource, EffectResource, FormatResource, LocatorResource, MediaResource,
    ObjectTrackerResource, Resource, ResourceTable, TrackingShapeResource,
};
pub use role_resolver::{
    AncestorRoles, DefaultRoles, FlattenedRoles, LocalRoleSource, RoleLayer, RoleResolver,
    RoleRule,
};
pub use roles::{AudioRole, CaptionRole, InterpolatedRole, Role, RoleType, VideoRole};
pub use timing::{Accumulated, TimelineResolver};

// Re-export functions
pub use attributes::{flag, is_effectively_disabled, is_enabled, lane, tc_format, time_attr};
pub use breadcrumbs::breadcrumbs;
pub use role_resolver::role_rule;
pub use timing::{aggregate_offset, nearest_start};
