//! Search request and result records

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::ObjectRef;

/// What to search for: the selection plus every object standing in for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub selected_object: ObjectRef,
    /// Unique by identity; the selection first, then its components
    pub target_objects: Vec<ObjectRef>,
}

impl SearchRequest {
    /// A request targeting only `selected_object`
    pub fn single(selected_object: ObjectRef) -> Self {
        Self {
            selected_object,
            target_objects: vec![selected_object],
        }
    }
}

/// Handle to the loaded text of an owner's script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSource {
    pub path: PathBuf,
}

/// One field of one owner that holds a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePair {
    pub owner_object: ObjectRef,
    pub target_object: ObjectRef,
    pub field_name: String,
    /// Set iff the matched field is a container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_script_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_source: Option<ScriptSource>,
    /// 1-based; set only when the script resolved and a line matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_line_number: Option<u32>,
}

impl ReferencePair {
    pub fn new(
        owner_object: ObjectRef,
        target_object: ObjectRef,
        field_name: impl Into<String>,
        array_index: Option<usize>,
    ) -> Self {
        Self {
            owner_object,
            target_object,
            field_name: field_name.into(),
            array_index,
            owner_script_path: None,
            script_source: None,
            field_line_number: None,
        }
    }

    /// No navigable source was found for the owner
    pub fn is_internal_type(&self) -> bool {
        self.owner_script_path.as_deref().map_or(true, str::is_empty)
    }

    /// Where a "jump to" action should land, when both parts are known
    pub fn jump_target(&self) -> Option<(&Path, u32)> {
        let path = self.owner_script_path.as_deref().filter(|p| !p.is_empty())?;
        Some((Path::new(path), self.field_line_number?))
    }

    pub(crate) fn clear_location(&mut self) {
        self.owner_script_path = None;
        self.script_source = None;
        self.field_line_number = None;
    }
}

impl std::fmt::Display for ReferencePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field_name)?;
        if let Some(index) = self.array_index {
            write!(f, " (At array index: {})", index)?;
        }
        match (&self.owner_script_path, self.field_line_number) {
            (Some(path), Some(line)) if !path.is_empty() => write!(f, " at {}:{}", path, line),
            (Some(path), None) if !path.is_empty() => write!(f, " at {}", path),
            _ => write!(f, " (internal type)"),
        }
    }
}

/// Result of one search, replaced wholesale by the next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub request: SearchRequest,
    /// Discovery order: components, then fields, then targets
    pub reference_pairs: Vec<ReferencePair>,
}

impl SearchResponse {
    pub fn len(&self) -> usize {
        self.reference_pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference_pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_label() {
        let mut pair = ReferencePair::new(ObjectRef(1), ObjectRef(2), "icons", Some(1));
        assert_eq!(pair.to_string(), "icons (At array index: 1) (internal type)");
        assert!(pair.is_internal_type());
        assert_eq!(pair.jump_target(), None);

        pair.owner_script_path = Some("Assets/Scripts/Holder.cs".to_string());
        assert_eq!(pair.to_string(), "icons (At array index: 1) at Assets/Scripts/Holder.cs");
        assert!(!pair.is_internal_type());
        assert_eq!(pair.jump_target(), None);

        pair.field_line_number = Some(12);
        assert_eq!(pair.to_string(), "icons (At array index: 1) at Assets/Scripts/Holder.cs:12");
        assert_eq!(
            pair.jump_target(),
            Some((Path::new("Assets/Scripts/Holder.cs"), 12))
        );
    }

    #[test]
    fn test_scalar_pair_serializes_without_index() {
        let pair = ReferencePair::new(ObjectRef(1), ObjectRef(2), "target", None);
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["owner_object"], 1);
        assert!(json.get("array_index").is_none());
    }
}
