//! Search Session
//!
//! Turns a selection into a [`SearchRequest`], runs the scanner over every
//! live component, annotates the results with script locations, and keeps
//! the latest response until the next search replaces it.

use tracing::{debug, info};

use crate::locate::{locate_all, ScriptStore};
use crate::model::{ObjectModel, ObjectRef};
use crate::reference::{SearchRequest, SearchResponse};
use crate::scan::scan;

/// Build the request for `selection`.
///
/// A composite entity targets itself followed by its directly attached
/// components; anything else targets only itself. Objects the model does
/// not know yield no request.
pub fn build_request<M: ObjectModel + ?Sized>(model: &M, selection: ObjectRef) -> Option<SearchRequest> {
    model.runtime_type(selection)?;

    let mut request = SearchRequest::single(selection);
    if let Some(components) = model.attached_components(selection) {
        for comp in components {
            if !request.target_objects.contains(&comp) {
                request.target_objects.push(comp);
            }
        }
    }
    Some(request)
}

/// Selection state plus the last search result
pub struct Session<'a, M: ?Sized, S: ?Sized> {
    model: &'a M,
    store: &'a S,
    selection: Option<ObjectRef>,
    last_response: Option<SearchResponse>,
}

impl<'a, M, S> Session<'a, M, S>
where
    M: ObjectModel + ?Sized,
    S: ScriptStore + ?Sized,
{
    pub fn new(model: &'a M, store: &'a S) -> Self {
        Self {
            model,
            store,
            selection: None,
            last_response: None,
        }
    }

    /// Replace the selection. Unknown objects clear it; returns whether a
    /// search is now possible.
    pub fn update_selection(&mut self, selection: Option<ObjectRef>) -> bool {
        self.selection = selection.filter(|obj| self.model.runtime_type(*obj).is_some());
        if selection.is_some() && self.selection.is_none() {
            debug!(selection = ?selection, "selection is not a known object");
        }
        self.selection.is_some()
    }

    pub fn can_search(&self) -> bool {
        self.selection.is_some()
    }

    /// Search for the current selection. Without a valid selection nothing
    /// happens and the previous response is kept.
    pub fn search(&mut self) -> Option<&SearchResponse> {
        let request = build_request(self.model, self.selection?)?;
        info!(
            selection = %request.selected_object,
            targets = request.target_objects.len(),
            "searching references"
        );

        let components = self.model.enumerate_all_components();
        let mut response = scan(self.model, &components, request);
        locate_all(self.model, self.store, &mut response);

        self.last_response = Some(response);
        self.last_response.as_ref()
    }

    /// Select `selection` and search for it
    pub fn search_for(&mut self, selection: ObjectRef) -> Option<&SearchResponse> {
        if !self.update_selection(Some(selection)) {
            return None;
        }
        self.search()
    }

    pub fn last_response(&self) -> Option<&SearchResponse> {
        self.last_response.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::MemoryScriptStore;
    use crate::model::{FieldValue, Scene, TypeDecl, TypeRegistry};

    fn scene() -> Scene {
        let types = TypeRegistry::builder()
            .declare(TypeDecl::generic("GameObject"))
            .declare(TypeDecl::component("Transform"))
            .declare(TypeDecl::component("Follow").field("target", "Transform").field("owner", "GameObject"))
            .build()
            .unwrap();
        let mut scene = Scene::new(types);
        let player = scene.spawn(1, "GameObject").unwrap();
        let transform = scene.spawn(2, "Transform").unwrap();
        let camera = scene.spawn(3, "GameObject").unwrap();
        let follow = scene.spawn(4, "Follow").unwrap();
        scene.attach(player, transform).unwrap();
        scene.attach(camera, follow).unwrap();
        scene.set_field(follow, "target", FieldValue::Object(transform)).unwrap();
        scene.set_field(follow, "owner", FieldValue::Object(player)).unwrap();
        scene
    }

    #[test]
    fn test_composite_request_lists_self_first() {
        let scene = scene();
        let request = build_request(&scene, ObjectRef(1)).unwrap();
        assert_eq!(request.selected_object, ObjectRef(1));
        assert_eq!(request.target_objects, vec![ObjectRef(1), ObjectRef(2)]);
    }

    #[test]
    fn test_plain_object_request() {
        let scene = scene();
        let request = build_request(&scene, ObjectRef(2)).unwrap();
        assert_eq!(request.target_objects, vec![ObjectRef(2)]);
    }

    #[test]
    fn test_unknown_selection_yields_no_request() {
        let scene = scene();
        assert!(build_request(&scene, ObjectRef(42)).is_none());

        let store = MemoryScriptStore::new();
        let mut session = Session::new(&scene, &store);
        assert!(!session.update_selection(Some(ObjectRef(42))));
        assert!(!session.can_search());
        assert!(session.search().is_none());
        assert!(session.last_response().is_none());
    }

    #[test]
    fn test_search_covers_entity_and_components() {
        let scene = scene();
        let mut store = MemoryScriptStore::new();
        store.insert("Assets/Follow.cs", "class Follow {\n  public Transform target;\n  public GameObject owner;\n}\n");
        let mut session = Session::new(&scene, &store);

        let response = session.search_for(ObjectRef(1)).unwrap();
        let rows: Vec<_> = response
            .reference_pairs
            .iter()
            .map(|p| (p.field_name.as_str(), p.target_object, p.field_line_number))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("target", ObjectRef(2), Some(2)),
                ("owner", ObjectRef(1), Some(3)),
            ]
        );
    }

    #[test]
    fn test_new_search_replaces_previous_response() {
        let scene = scene();
        let store = MemoryScriptStore::new();
        let mut session = Session::new(&scene, &store);

        assert_eq!(session.search_for(ObjectRef(1)).map(|r| r.len()), Some(2));
        assert_eq!(session.search_for(ObjectRef(3)).map(|r| r.len()), Some(0));
        assert_eq!(
            session.last_response().map(|r| r.request.selected_object),
            Some(ObjectRef(3))
        );

        // an invalid selection leaves the last response in place
        assert!(session.search_for(ObjectRef(42)).is_none());
        assert_eq!(
            session.last_response().map(|r| r.request.selected_object),
            Some(ObjectRef(3))
        );
    }
}
