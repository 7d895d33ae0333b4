//! Audio, video and caption roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Audio,
    Video,
    Caption,
}

impl RoleType {
    pub const ALL: [RoleType; 3] = [RoleType::Audio, RoleType::Video, RoleType::Caption];
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioRole {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subrole: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoRole {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subrole: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptionRole {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_format: Option<String>,
}

/// A role of one classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Role {
    Audio(AudioRole),
    Video(VideoRole),
    Caption(CaptionRole),
}

/// Built-in role names as written by the application.
const BUILT_IN_ROLES: [&str; 5] = ["Dialogue", "Music", "Effects", "Video", "Titles"];

impl Role {
    /// Parse an audio role string (`main[.sub]`).
    pub fn audio(value: &str) -> Option<Role> {
        let (role, subrole) = parse_main_sub(value)?;
        Some(Role::Audio(AudioRole { role, subrole }))
    }

    /// Parse a video role string (`main[.sub]`).
    pub fn video(value: &str) -> Option<Role> {
        let (role, subrole) = parse_main_sub(value)?;
        Some(Role::Video(VideoRole { role, subrole }))
    }

    /// Parse a caption role string (`name[?captionFormat=FMT]`).
    pub fn caption(value: &str) -> Option<Role> {
        let value = value.trim();
        let (role, query) = match value.split_once('?') {
            Some((role, query)) => (role, Some(query)),
            None => (value, None),
        };
        if role.is_empty() {
            return None;
        }
        let caption_format = match query {
            Some(query) => Some(
                query
                    .strip_prefix("captionFormat=")
                    .filter(|f| !f.is_empty())?
                    .to_string(),
            ),
            None => None,
        };
        Some(Role::Caption(CaptionRole {
            role: role.to_string(),
            caption_format,
        }))
    }

    /// Parse a role string of the given classification.
    pub fn parse(role_type: RoleType, value: &str) -> Option<Role> {
        match role_type {
            RoleType::Audio => Self::audio(value),
            RoleType::Video => Self::video(value),
            RoleType::Caption => Self::caption(value),
        }
    }

    /// A built-in role with no subrole.
    pub fn built_in(role_type: RoleType, name: &str) -> Role {
        let role = name.to_string();
        match role_type {
            RoleType::Audio => Role::Audio(AudioRole { role, subrole: None }),
            RoleType::Video => Role::Video(VideoRole { role, subrole: None }),
            RoleType::Caption => Role::Caption(CaptionRole {
                role,
                caption_format: None,
            }),
        }
    }

    pub fn role_type(&self) -> RoleType {
        match self {
            Self::Audio(_) => RoleType::Audio,
            Self::Video(_) => RoleType::Video,
            Self::Caption(_) => RoleType::Caption,
        }
    }

    /// Main role name.
    pub fn main_role(&self) -> &str {
        match self {
            Self::Audio(r) => &r.role,
            Self::Video(r) => &r.role,
            Self::Caption(r) => &r.role,
        }
    }

    pub fn subrole(&self) -> Option<&str> {
        match self {
            Self::Audio(r) => r.subrole.as_deref(),
            Self::Video(r) => r.subrole.as_deref(),
            Self::Caption(_) => None,
        }
    }

    pub fn is_built_in(&self) -> bool {
        BUILT_IN_ROLES.contains(&self.main_role())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio(AudioRole { role, subrole }) | Self::Video(VideoRole { role, subrole }) => {
                match subrole {
                    Some(sub) => write!(f, "{}.{}", role, sub),
                    None => f.write_str(role),
                }
            }
            Self::Caption(CaptionRole {
                role,
                caption_format,
            }) => match caption_format {
                Some(format) => write!(f, "{}?captionFormat={}", role, format),
                None => f.write_str(role),
            },
        }
    }
}

/// A role tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "provenance", content = "role", rename_all = "snake_case")]
pub enum InterpolatedRole {
    /// Set on the element itself.
    Assigned(Role),
    /// Taken from an ancestor.
    Inherited(Role),
    /// Built-in default for the element kind.
    Defaulted(Role),
}

impl InterpolatedRole {
    pub fn role(&self) -> &Role {
        match self {
            Self::Assigned(role) | Self::Inherited(role) | Self::Defaulted(role) => role,
        }
    }

    pub fn into_role(self) -> Role {
        match self {
            Self::Assigned(role) | Self::Inherited(role) | Self::Defaulted(role) => role,
        }
    }

    pub fn role_type(&self) -> RoleType {
        self.role().role_type()
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }

    /// Same role re-tagged as inherited.
    pub fn inherited(&self) -> InterpolatedRole {
        Self::Inherited(self.role().clone())
    }
}

/// Split `main[.sub]`, normalising built-in names.
fn parse_main_sub(value: &str) -> Option<(String, Option<String>)> {
    let value = value.trim();
    let (main, sub) = match value.split_once('.') {
        Some((main, sub)) => (main, Some(sub)),
        None => (value, None),
    };
    if main.is_empty() || sub.is_some_and(str::is_empty) {
        return None;
    }
    Some((normalize(main), sub.map(normalize)))
}

/// `dialogue` → `Dialogue`, `dialogue-1` → `Dialogue-1`; other names are
/// kept verbatim.
fn normalize(name: &str) -> String {
    for built_in in BUILT_IN_ROLES {
        let lower = built_in.to_ascii_lowercase();
        if let Some(rest) = name.strip_prefix(lower.as_str()) {
            if rest.is_empty() || rest.starts_with('-') {
                return format!("{}{}", built_in, rest);
            }
        }
    }
    name.to_string()
}
