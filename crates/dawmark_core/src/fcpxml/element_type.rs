//! Element classification.
//!
//! Maps an element's tag name to a closed `ElementType`. Tags outside the
//! recognised set classify as `None` and are passed through opaquely by the
//! resolvers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Elements that organise the document but carry no timeline position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureElementType {
    Root,
    Library,
    Event,
    Project,
    Resources,
}

/// Timeline-bearing clip kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipType {
    AssetClip,
    Audio,
    Clip,
    Gap,
    McClip,
    RefClip,
    SyncClip,
    Title,
    Video,
    Audition,
    LiveDrawing,
}

/// Annotations attached to a clip or sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    Marker,
    ChapterMarker,
    Caption,
    Keyword,
}

/// Elements that live inside a project's story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryElementType {
    Sequence,
    Spine,
    Clip(ClipType),
    Annotation(AnnotationType),
}

/// Shared definitions inside `<resources>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Asset,
    Media,
    Format,
    Effect,
    Locator,
    ObjectTracker,
    TrackingShape,
}

/// Classification of a document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Structure(StructureElementType),
    Story(StoryElementType),
    Resource(ResourceKind),
}

impl ElementType {
    /// Classify a tag name. Unknown tags return `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        use AnnotationType as A;
        use ClipType as C;
        use StoryElementType as S;
        use StructureElementType as St;

        let element_type = match tag {
            "fcpxml" => Self::Structure(St::Root),
            "library" => Self::Structure(St::Library),
            "event" => Self::Structure(St::Event),
            "project" => Self::Structure(St::Project),
            "resources" => Self::Structure(St::Resources),

            "sequence" => Self::Story(S::Sequence),
            "spine" => Self::Story(S::Spine),

            "asset-clip" => Self::Story(S::Clip(C::AssetClip)),
            "audio" => Self::Story(S::Clip(C::Audio)),
            "clip" => Self::Story(S::Clip(C::Clip)),
            "gap" => Self::Story(S::Clip(C::Gap)),
            "mc-clip" => Self::Story(S::Clip(C::McClip)),
            "ref-clip" => Self::Story(S::Clip(C::RefClip)),
            "sync-clip" => Self::Story(S::Clip(C::SyncClip)),
            "title" => Self::Story(S::Clip(C::Title)),
            "video" => Self::Story(S::Clip(C::Video)),
            "audition" => Self::Story(S::Clip(C::Audition)),
            "live-drawing" => Self::Story(S::Clip(C::LiveDrawing)),

            "marker" => Self::Story(S::Annotation(A::Marker)),
            "chapter-marker" => Self::Story(S::Annotation(A::ChapterMarker)),
            "caption" => Self::Story(S::Annotation(A::Caption)),
            "keyword" => Self::Story(S::Annotation(A::Keyword)),

            "asset" => Self::Resource(ResourceKind::Asset),
            "media" => Self::Resource(ResourceKind::Media),
            "format" => Self::Resource(ResourceKind::Format),
            "effect" => Self::Resource(ResourceKind::Effect),
            "locator" => Self::Resource(ResourceKind::Locator),
            "object-tracker" => Self::Resource(ResourceKind::ObjectTracker),
            "tracking-shape" => Self::Resource(ResourceKind::TrackingShape),

            _ => return None,
        };
        Some(element_type)
    }

    /// Classify a parsed node. Non-element nodes return `None`.
    pub fn of(node: roxmltree::Node<'_, '_>) -> Option<Self> {
        if !node.is_element() {
            return None;
        }
        Self::from_tag(node.tag_name().name())
    }

    /// The element's tag name.
    pub fn tag(&self) -> &'static str {
        use AnnotationType as A;
        use ClipType as C;
        use StoryElementType as S;
        use StructureElementType as St;

        match self {
            Self::Structure(St::Root) => "fcpxml",
            Self::Structure(St::Library) => "library",
            Self::Structure(St::Event) => "event",
            Self::Structure(St::Project) => "project",
            Self::Structure(St::Resources) => "resources",
            Self::Story(S::Sequence) => "sequence",
            Self::Story(S::Spine) => "spine",
            Self::Story(S::Clip(C::AssetClip)) => "asset-clip",
            Self::Story(S::Clip(C::Audio)) => "audio",
            Self::Story(S::Clip(C::Clip)) => "clip",
            Self::Story(S::Clip(C::Gap)) => "gap",
            Self::Story(S::Clip(C::McClip)) => "mc-clip",
            Self::Story(S::Clip(C::RefClip)) => "ref-clip",
            Self::Story(S::Clip(C::SyncClip)) => "sync-clip",
            Self::Story(S::Clip(C::Title)) => "title",
            Self::Story(S::Clip(C::Video)) => "video",
            Self::Story(S::Clip(C::Audition)) => "audition",
            Self::Story(S::Clip(C::LiveDrawing)) => "live-drawing",
            Self::Story(S::Annotation(A::Marker)) => "marker",
            Self::Story(S::Annotation(A::ChapterMarker)) => "chapter-marker",
            Self::Story(S::Annotation(A::Caption)) => "caption",
            Self::Story(S::Annotation(A::Keyword)) => "keyword",
            Self::Resource(ResourceKind::Asset) => "asset",
            Self::Resource(ResourceKind::Media) => "media",
            Self::Resource(ResourceKind::Format) => "format",
            Self::Resource(ResourceKind::Effect) => "effect",
            Self::Resource(ResourceKind::Locator) => "locator",
            Self::Resource(ResourceKind::ObjectTracker) => "object-tracker",
            Self::Resource(ResourceKind::TrackingShape) => "tracking-shape",
        }
    }

    pub fn clip_type(&self) -> Option<ClipType> {
        match self {
            Self::Story(StoryElementType::Clip(clip)) => Some(*clip),
            _ => None,
        }
    }

    pub fn annotation_type(&self) -> Option<AnnotationType> {
        match self {
            Self::Story(StoryElementType::Annotation(annotation)) => Some(*annotation),
            _ => None,
        }
    }

    pub fn is_clip(&self) -> bool {
        self.clip_type().is_some()
    }

    pub fn is_annotation(&self) -> bool {
        self.annotation_type().is_some()
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Story(StoryElementType::Sequence))
    }

    pub fn is_spine(&self) -> bool {
        matches!(self, Self::Story(StoryElementType::Spine))
    }

    /// Elements whose position in the parent is an `offset` and whose local
    /// timeline origin is a `start`. Captions are positioned like clips.
    pub fn is_positioned(&self) -> bool {
        self.is_clip() || matches!(self.annotation_type(), Some(AnnotationType::Caption))
    }

    /// Attribute holding this element's position within its parent.
    ///
    /// Markers and keywords are placed with `start`; everything else
    /// positioned in a parent timeline uses `offset`.
    pub fn position_attribute(&self) -> &'static str {
        match self.annotation_type() {
            Some(AnnotationType::Marker | AnnotationType::ChapterMarker | AnnotationType::Keyword) => {
                "start"
            }
            _ => "offset",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
