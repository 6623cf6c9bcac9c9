//! Graph Scanner
//!
//! Walks every live component, every field of its type, and every requested
//! target, emitting a [`ReferencePair`] for each field slot that holds a
//! target. Output order is components, then fields, then targets; nothing
//! is deduplicated.

use tracing::{debug, info};

use crate::model::{FieldValue, ObjectModel, ObjectRef};
use crate::reference::{ReferencePair, SearchRequest, SearchResponse};
use crate::resolve::{are_equal, is_compatible};

/// Find every field of `all_components` that references a target of `request`.
///
/// Unknown component types contribute no fields, targets of unknown type
/// are skipped, and unreadable field values never match.
pub fn scan<M: ObjectModel + ?Sized>(
    model: &M,
    all_components: &[ObjectRef],
    request: SearchRequest,
) -> SearchResponse {
    let types = model.types();
    let targets: Vec<_> = request
        .target_objects
        .iter()
        .filter_map(|t| model.runtime_type(*t).map(|ty| (*t, ty)))
        .collect();

    let mut reference_pairs = Vec::new();

    for &owner in all_components {
        let Some(owner_ty) = model.runtime_type(owner) else {
            continue;
        };

        for field in types.fields_of(owner_ty) {
            for &(target, target_ty) in &targets {
                let compatible = is_compatible(types, field.declared, target_ty);
                if !compatible {
                    continue;
                }

                if field.is_container() {
                    if let Some(FieldValue::List(items)) = model.read_field(owner, field) {
                        for (index, item) in items.iter().enumerate() {
                            if are_equal(model, *item, Some(target)) {
                                debug!(%owner, field = %field.name, index, %target, "container reference");
                                reference_pairs.push(ReferencePair::new(
                                    owner,
                                    target,
                                    field.name.as_str(),
                                    Some(index),
                                ));
                            }
                        }
                    }
                }

                // Evaluated independently of the container path
                if let Some(FieldValue::Object(value)) = model.read_field(owner, field) {
                    if are_equal(model, Some(value), Some(target)) {
                        debug!(%owner, field = %field.name, %target, "field reference");
                        reference_pairs.push(ReferencePair::new(
                            owner,
                            target,
                            field.name.as_str(),
                            None,
                        ));
                    }
                }
            }
        }
    }

    info!(
        components = all_components.len(),
        targets = targets.len(),
        references = reference_pairs.len(),
        "scan complete"
    );

    SearchResponse {
        request,
        reference_pairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Scene, TypeDecl, TypeRegistry};

    fn types() -> TypeRegistry {
        TypeRegistry::builder()
            .declare(TypeDecl::raw_asset("RawAsset"))
            .declare(TypeDecl::wrapped_asset("WrappedAsset", "RawAsset"))
            .declare(TypeDecl::generic("int"))
            .declare(TypeDecl::component("Empty"))
            .declare(
                TypeDecl::component("Holder")
                    .field("single", "RawAsset")
                    .private_field("many", "RawAsset[]")
                    .field("count", "int"),
            )
            .build()
            .unwrap()
    }

    fn scene() -> Scene {
        let mut scene = Scene::new(types());
        let a = scene.spawn(1, "RawAsset").unwrap();
        let b = scene.spawn(2, "RawAsset").unwrap();
        let c = scene.spawn(3, "RawAsset").unwrap();
        let holder = scene.spawn(10, "Holder").unwrap();
        scene.spawn(11, "Empty").unwrap();
        scene
            .set_field(holder, "many", FieldValue::List(vec![Some(a), Some(b), Some(c)]))
            .unwrap();
        scene.set_field(holder, "count", FieldValue::Primitive).unwrap();
        scene
    }

    #[test]
    fn test_container_match_reports_index() {
        let scene = scene();
        let response = scan(&scene, &scene.enumerate_all_components(), SearchRequest::single(ObjectRef(2)));
        assert_eq!(
            response.reference_pairs,
            vec![ReferencePair::new(ObjectRef(10), ObjectRef(2), "many", Some(1))]
        );
    }

    #[test]
    fn test_container_and_scalar_both_reported() {
        let mut scene = scene();
        scene
            .set_field(ObjectRef(10), "single", FieldValue::Object(ObjectRef(2)))
            .unwrap();
        let response = scan(&scene, &scene.enumerate_all_components(), SearchRequest::single(ObjectRef(2)));
        assert_eq!(
            response.reference_pairs,
            vec![
                ReferencePair::new(ObjectRef(10), ObjectRef(2), "single", None),
                ReferencePair::new(ObjectRef(10), ObjectRef(2), "many", Some(1)),
            ]
        );
    }

    #[test]
    fn test_repeated_elements_each_reported() {
        let mut scene = scene();
        scene
            .set_field(
                ObjectRef(10),
                "many",
                FieldValue::List(vec![Some(ObjectRef(1)), None, Some(ObjectRef(1))]),
            )
            .unwrap();
        let response = scan(&scene, &scene.enumerate_all_components(), SearchRequest::single(ObjectRef(1)));
        let indices: Vec<_> = response.reference_pairs.iter().map(|p| p.array_index).collect();
        assert_eq!(indices, vec![Some(0), Some(2)]);
    }

    #[test]
    fn test_zero_fields_or_targets_yield_nothing() {
        let scene = scene();
        let response = scan(&scene, &[ObjectRef(11)], SearchRequest::single(ObjectRef(2)));
        assert!(response.is_empty());

        let request = SearchRequest {
            selected_object: ObjectRef(2),
            target_objects: Vec::new(),
        };
        let response = scan(&scene, &scene.enumerate_all_components(), request);
        assert!(response.is_empty());
    }

    #[test]
    fn test_unreadable_and_unknown_are_skipped() {
        let scene = scene();
        // "single" was never set, 99 does not exist
        let request = SearchRequest {
            selected_object: ObjectRef(99),
            target_objects: vec![ObjectRef(99), ObjectRef(3)],
        };
        let response = scan(&scene, &[ObjectRef(99), ObjectRef(10)], request.clone());
        assert_eq!(response.request, request);
        assert_eq!(
            response.reference_pairs,
            vec![ReferencePair::new(ObjectRef(10), ObjectRef(3), "many", Some(2))]
        );
    }

    #[test]
    fn test_scan_is_deterministic() {
        let scene = scene();
        let components = scene.enumerate_all_components();
        let request = SearchRequest {
            selected_object: ObjectRef(1),
            target_objects: vec![ObjectRef(3), ObjectRef(1), ObjectRef(2)],
        };
        let first = scan(&scene, &components, request.clone());
        let second = scan(&scene, &components, request);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        let targets: Vec<_> = first.reference_pairs.iter().map(|p| p.target_object).collect();
        assert_eq!(targets, vec![ObjectRef(3), ObjectRef(1), ObjectRef(2)]);
    }
}
