//! In-memory Scene
//!
//! A concrete [`ObjectModel`] holding objects in insertion order. Scenes are
//! built in code or loaded from a JSON snapshot:
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "Texture2D", "kind": "raw_asset" },
//!     { "name": "Sprite", "kind": "wrapped_asset", "wraps": "Texture2D" },
//!     { "name": "Enemy", "kind": "component",
//!       "fields": [ { "name": "icons", "type": "Sprite[]", "visibility": "private" } ] }
//!   ],
//!   "objects": [
//!     { "id": 1, "name": "hero.png", "type": "Texture2D" },
//!     { "id": 2, "type": "Sprite", "wraps": 1 },
//!     { "id": 3, "type": "Enemy", "fields": { "icons": [ null, { "ref": 2 } ] } }
//!   ]
//! }
//! ```
//!
//! Object references inside `fields` are written as `{ "ref": <id> }`; any
//! other JSON value is stored as primitive data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{FieldDescriptor, FieldValue, ObjectModel, ObjectRef, TypeDecl, TypeId, TypeKind, TypeRegistry};
use crate::error::{FinderError, Result};

/// Serialized form of a scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub objects: Vec<ObjectDecl>,
}

/// Serialized form of one object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDecl {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    /// Raw asset id, for wrapped assets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wraps: Option<u64>,
    /// Attached component ids; present only on composite entities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
struct SceneObject {
    ty: TypeId,
    name: Option<String>,
    payload: Option<ObjectRef>,
    components: Option<Vec<ObjectRef>>,
    fields: HashMap<String, FieldValue>,
}

/// In-memory live object graph
#[derive(Debug, Clone)]
pub struct Scene {
    types: TypeRegistry,
    order: Vec<ObjectRef>,
    objects: HashMap<ObjectRef, SceneObject>,
}

impl Scene {
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            types,
            order: Vec::new(),
            objects: HashMap::new(),
        }
    }

    /// Load a scene from a JSON snapshot file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let snapshot: SceneSnapshot = serde_json::from_str(content)?;
        Self::from_snapshot(snapshot)
    }

    pub fn from_snapshot(snapshot: SceneSnapshot) -> Result<Self> {
        let types = TypeRegistry::builder().extend(snapshot.types).build()?;
        let mut scene = Scene::new(types);

        // Spawn everything first so references may point forward
        for decl in &snapshot.objects {
            let obj = scene.spawn(decl.id, &decl.ty)?;
            if let Some(name) = &decl.name {
                scene.set_name(obj, name.clone())?;
            }
        }

        for decl in snapshot.objects {
            let obj = ObjectRef(decl.id);
            if let Some(raw) = decl.wraps {
                scene.set_payload(obj, ObjectRef(raw))?;
            }
            if let Some(components) = decl.components {
                scene.make_composite(obj)?;
                for comp in components {
                    scene.attach(obj, ObjectRef(comp))?;
                }
            }
            for (field, value) in &decl.fields {
                if let Some(value) = decode_value(value)? {
                    scene.set_field(obj, field, value)?;
                }
            }
        }

        tracing::debug!(
            types = scene.types.len(),
            objects = scene.len(),
            "scene loaded"
        );
        Ok(scene)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, obj: ObjectRef) -> bool {
        self.objects.contains_key(&obj)
    }

    /// Create an object of a registered type
    pub fn spawn(&mut self, id: u64, type_name: &str) -> Result<ObjectRef> {
        let ty = self
            .types
            .lookup(type_name)
            .ok_or_else(|| FinderError::UnknownType(type_name.to_string()))?;
        let obj = ObjectRef(id);
        if self.objects.contains_key(&obj) {
            return Err(FinderError::DuplicateObject(id));
        }
        self.objects.insert(
            obj,
            SceneObject {
                ty,
                name: None,
                payload: None,
                components: None,
                fields: HashMap::new(),
            },
        );
        self.order.push(obj);
        Ok(obj)
    }

    pub fn set_name(&mut self, obj: ObjectRef, name: impl Into<String>) -> Result<()> {
        self.object_mut(obj)?.name = Some(name.into());
        Ok(())
    }

    /// Point a wrapped asset at the raw asset it refers into
    pub fn set_payload(&mut self, obj: ObjectRef, raw: ObjectRef) -> Result<()> {
        self.require(raw)?;
        if self.type_kind(obj) != Some(TypeKind::WrappedAsset) {
            return Err(FinderError::InvalidSnapshot(format!(
                "{} is not a wrapped asset",
                obj
            )));
        }
        if self.type_kind(raw) != Some(TypeKind::RawAsset) {
            return Err(FinderError::InvalidSnapshot(format!(
                "{} is not a raw asset",
                raw
            )));
        }
        self.object_mut(obj)?.payload = Some(raw);
        Ok(())
    }

    /// Mark `obj` as a composite entity, even with no components yet
    pub fn make_composite(&mut self, obj: ObjectRef) -> Result<()> {
        let object = self.object_mut(obj)?;
        object.components.get_or_insert_with(Vec::new);
        Ok(())
    }

    pub fn attach(&mut self, entity: ObjectRef, component: ObjectRef) -> Result<()> {
        if self.type_kind(component) != Some(TypeKind::Component) {
            return Err(FinderError::InvalidSnapshot(format!(
                "{} is not a component",
                component
            )));
        }
        let object = self.object_mut(entity)?;
        let components = object.components.get_or_insert_with(Vec::new);
        if !components.contains(&component) {
            components.push(component);
        }
        Ok(())
    }

    /// Store a field value. The field must exist on the object's type and
    /// every referenced object must exist.
    pub fn set_field(&mut self, owner: ObjectRef, field: &str, value: FieldValue) -> Result<()> {
        let ty = self.object(owner)?.ty;
        if !self.types.fields_of(ty).iter().any(|f| f.name == field) {
            return Err(FinderError::UnknownField {
                ty: self.types.name(ty).unwrap_or("?").to_string(),
                field: field.to_string(),
            });
        }
        match &value {
            FieldValue::Object(obj) => self.require(*obj)?,
            FieldValue::List(items) => {
                for obj in items.iter().flatten() {
                    self.require(*obj)?;
                }
            }
            FieldValue::Primitive => {}
        }
        self.object_mut(owner)?.fields.insert(field.to_string(), value);
        Ok(())
    }

    /// Resolve a query (`#id`, id, name, or case-insensitive name) to an object
    pub fn resolve(&self, query: &str) -> Option<ObjectRef> {
        let query = query.trim();
        let digits = query.strip_prefix('#').unwrap_or(query);
        if let Ok(id) = digits.parse::<u64>() {
            let obj = ObjectRef(id);
            if self.contains(obj) {
                return Some(obj);
            }
        }

        if let Some(obj) = self
            .order
            .iter()
            .find(|o| self.object_name(**o) == Some(query))
        {
            return Some(*obj);
        }

        let query_lower = query.to_lowercase();
        self.order
            .iter()
            .find(|o| {
                self.object_name(**o)
                    .map(|n| n.to_lowercase() == query_lower)
                    .unwrap_or(false)
            })
            .copied()
    }

    /// Names of objects fuzzily matching `query`, best first
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();
        let mut results: Vec<(i64, &str)> = self
            .order
            .iter()
            .filter_map(|o| self.object_name(*o))
            .filter_map(|name| matcher.fuzzy_match(name, query).map(|score| (score, name)))
            .collect();

        results.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        results.dedup_by(|a, b| a.1 == b.1);
        results
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Display label: name if set, otherwise type and id
    pub fn label(&self, obj: ObjectRef) -> String {
        match (self.object_name(obj), self.type_name(obj)) {
            (Some(name), Some(ty)) => format!("{} ({})", name, ty),
            (None, Some(ty)) => format!("{} {}", ty, obj),
            _ => obj.to_string(),
        }
    }

    fn object(&self, obj: ObjectRef) -> Result<&SceneObject> {
        self.objects
            .get(&obj)
            .ok_or_else(|| FinderError::UnknownObject(obj.to_string()))
    }

    fn object_mut(&mut self, obj: ObjectRef) -> Result<&mut SceneObject> {
        self.objects
            .get_mut(&obj)
            .ok_or_else(|| FinderError::UnknownObject(obj.to_string()))
    }

    fn require(&self, obj: ObjectRef) -> Result<()> {
        self.object(obj).map(|_| ())
    }
}

impl ObjectModel for Scene {
    fn types(&self) -> &TypeRegistry {
        &self.types
    }

    fn runtime_type(&self, obj: ObjectRef) -> Option<TypeId> {
        self.objects.get(&obj).map(|o| o.ty)
    }

    fn object_name(&self, obj: ObjectRef) -> Option<&str> {
        self.objects.get(&obj).and_then(|o| o.name.as_deref())
    }

    fn enumerate_all_components(&self) -> Vec<ObjectRef> {
        self.order
            .iter()
            .filter(|o| self.type_kind(**o) == Some(TypeKind::Component))
            .copied()
            .collect()
    }

    fn read_field(&self, owner: ObjectRef, field: &FieldDescriptor) -> Option<FieldValue> {
        self.objects.get(&owner)?.fields.get(&field.name).cloned()
    }

    fn wrapped_payload(&self, obj: ObjectRef) -> Option<ObjectRef> {
        self.objects.get(&obj).and_then(|o| o.payload)
    }

    fn attached_components(&self, obj: ObjectRef) -> Option<Vec<ObjectRef>> {
        self.objects.get(&obj).and_then(|o| o.components.clone())
    }
}

/// Decode a snapshot field value; `null` means no value
fn decode_value(value: &serde_json::Value) -> Result<Option<FieldValue>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(_) => Ok(Some(match decode_ref(value)? {
            Some(obj) => FieldValue::Object(obj),
            None => FieldValue::Primitive,
        })),
        serde_json::Value::Array(items) => {
            let mut refs = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    serde_json::Value::Null => refs.push(None),
                    serde_json::Value::Object(_) => match decode_ref(item)? {
                        Some(obj) => refs.push(Some(obj)),
                        None => return Ok(Some(FieldValue::Primitive)),
                    },
                    _ => return Ok(Some(FieldValue::Primitive)),
                }
            }
            Ok(Some(FieldValue::List(refs)))
        }
        _ => Ok(Some(FieldValue::Primitive)),
    }
}

/// `{ "ref": <id> }` as an object handle; other objects are plain data
fn decode_ref(value: &serde_json::Value) -> Result<Option<ObjectRef>> {
    let Some(obj) = value.as_object() else {
        return Ok(None);
    };
    if obj.len() != 1 {
        return Ok(None);
    }
    match obj.get("ref") {
        Some(id) => id
            .as_u64()
            .map(|id| Some(ObjectRef(id)))
            .ok_or_else(|| FinderError::InvalidSnapshot(format!("invalid ref: {}", id))),
        None => Ok(None),
    }
}
