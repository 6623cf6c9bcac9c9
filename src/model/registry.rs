//! Type Registry
//!
//! Explicit per-type field tables standing in for runtime reflection.
//! Types are declared by name (so fields may reference types declared later)
//! and resolved into dense [`TypeId`]s when the registry is built.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{FinderError, Result};

/// Index of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Closed set of type tags the resolvers distinguish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A base resource, e.g. a texture
    RawAsset,
    /// A handle onto a region of a raw asset, e.g. a sprite
    WrappedAsset,
    /// A component attached to a scene entity
    Component,
    /// Anything else (entities, primitives, plain assets)
    Generic,
}

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeToken {
    Single(TypeId),
    ArrayOf(TypeId),
}

impl TypeToken {
    pub fn is_container(self) -> bool {
        matches!(self, TypeToken::ArrayOf(_))
    }

    /// The element type for containers, the type itself otherwise
    pub fn element(self) -> TypeId {
        match self {
            TypeToken::Single(ty) | TypeToken::ArrayOf(ty) => ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// One entry of a type's field table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared: TypeToken,
    pub visibility: Visibility,
}

impl FieldDescriptor {
    pub fn is_container(&self) -> bool {
        self.declared.is_container()
    }
}

/// A resolved type record
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    pub base: Option<TypeId>,
    /// Raw asset type a wrapped asset refers into
    pub wraps: Option<TypeId>,
    pub fields: Vec<FieldDescriptor>,
}

/// Unresolved field declaration (`type` is `Name` or `Name[]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Unresolved type declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wraps: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDecl>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base: None,
            wraps: None,
            fields: Vec::new(),
        }
    }

    pub fn raw_asset(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::RawAsset)
    }

    pub fn wrapped_asset(name: impl Into<String>, wraps: impl Into<String>) -> Self {
        let mut decl = Self::new(name, TypeKind::WrappedAsset);
        decl.wraps = Some(wraps.into());
        decl
    }

    pub fn component(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Component)
    }

    pub fn generic(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Generic)
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn field(self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.field_with(name, ty, Visibility::Public)
    }

    pub fn private_field(self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.field_with(name, ty, Visibility::Private)
    }

    fn field_with(mut self, name: impl Into<String>, ty: impl Into<String>, visibility: Visibility) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            ty: ty.into(),
            visibility,
        });
        self
    }
}

/// Collects type declarations and resolves them into a [`TypeRegistry`]
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    decls: Vec<TypeDecl>,
}

impl TypeRegistryBuilder {
    pub fn declare(mut self, decl: TypeDecl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn extend(mut self, decls: impl IntoIterator<Item = TypeDecl>) -> Self {
        self.decls.extend(decls);
        self
    }

    pub fn build(self) -> Result<TypeRegistry> {
        let mut by_name = HashMap::with_capacity(self.decls.len());
        for (idx, decl) in self.decls.iter().enumerate() {
            if by_name.insert(decl.name.clone(), TypeId(idx as u32)).is_some() {
                return Err(FinderError::DuplicateType(decl.name.clone()));
            }
        }

        let mut registry = TypeRegistry {
            types: Vec::with_capacity(self.decls.len()),
            by_name,
        };

        // Kinds first, so wrap targets can be checked while resolving
        let kinds: Vec<TypeKind> = self.decls.iter().map(|d| d.kind).collect();

        for (idx, decl) in self.decls.iter().enumerate() {
            let base = decl.base.as_deref().map(|b| registry.require(b)).transpose()?;
            let wraps = match decl.wraps.as_deref() {
                Some(w) => {
                    let target = registry.require(w)?;
                    if decl.kind != TypeKind::WrappedAsset || kinds[target.index()] != TypeKind::RawAsset {
                        return Err(FinderError::InvalidWrap {
                            name: decl.name.clone(),
                            wraps: w.to_string(),
                        });
                    }
                    Some(target)
                }
                None => None,
            };
            let fields = decl
                .fields
                .iter()
                .map(|f| {
                    Ok(FieldDescriptor {
                        name: f.name.clone(),
                        declared: registry.parse_token(&f.ty)?,
                        visibility: f.visibility,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            registry.types.push(TypeInfo {
                id: TypeId(idx as u32),
                name: decl.name.clone(),
                kind: decl.kind,
                base,
                wraps,
                fields,
            });
        }

        registry.check_base_cycles()?;
        Ok(registry)
    }
}

/// The resolved set of host types
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<TypeInfo>,
    by_name: HashMap<String, TypeId>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeInfo> {
        self.types.get(id.index())
    }

    pub fn kind(&self, id: TypeId) -> Option<TypeKind> {
        self.get(id).map(|t| t.kind)
    }

    pub fn name(&self, id: TypeId) -> Option<&str> {
        self.get(id).map(|t| t.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.iter()
    }

    /// Parse `Name` or `Name[]` against the registered types
    pub fn parse_token(&self, text: &str) -> Result<TypeToken> {
        let text = text.trim();
        let (name, container) = match text.strip_suffix("[]") {
            Some(inner) => (inner.trim_end(), true),
            None => (text, false),
        };
        if name.is_empty() || name.contains('[') || name.contains(']') {
            return Err(FinderError::InvalidTypeToken(text.to_string()));
        }
        let id = self.require(name)?;
        Ok(if container {
            TypeToken::ArrayOf(id)
        } else {
            TypeToken::Single(id)
        })
    }

    /// Every instance field visible on `id`: its own fields of any
    /// visibility, then the public fields of each base, nearest first.
    pub fn fields_of(&self, id: TypeId) -> Vec<&FieldDescriptor> {
        let Some(info) = self.get(id) else {
            return Vec::new();
        };
        let mut fields: Vec<&FieldDescriptor> = info.fields.iter().collect();
        let mut base = info.base;
        while let Some(base_id) = base {
            let Some(base_info) = self.get(base_id) else { break };
            fields.extend(
                base_info
                    .fields
                    .iter()
                    .filter(|f| f.visibility == Visibility::Public),
            );
            base = base_info.base;
        }
        fields
    }

    /// Nominal assignability: `candidate` is `declared` or derives from it.
    pub fn is_assignable(&self, declared: TypeId, candidate: TypeId) -> bool {
        let mut current = Some(candidate);
        while let Some(id) = current {
            if id == declared {
                return true;
            }
            current = self.get(id).and_then(|t| t.base);
        }
        false
    }

    fn require(&self, name: &str) -> Result<TypeId> {
        self.lookup(name)
            .ok_or_else(|| FinderError::UnknownType(name.to_string()))
    }

    fn check_base_cycles(&self) -> Result<()> {
        for info in &self.types {
            let mut seen = HashSet::new();
            let mut current = Some(info.id);
            while let Some(id) = current {
                if !seen.insert(id) {
                    return Err(FinderError::TypeCycle(info.name.clone()));
                }
                current = self.get(id).and_then(|t| t.base);
            }
        }
        Ok(())
    }
}
