//! Source Locator
//!
//! Best-effort mapping from a reference's owner to its script file and the
//! line declaring the field. The line search is a plain substring match from
//! the top of the file, so a comment or a longer identifier that contains the
//! field name wins if it appears first.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::model::{ObjectModel, TypeKind};
use crate::reference::{ReferencePair, ScriptSource, SearchResponse};

/// Lazily read lines of a loaded script; the handle closes when dropped
pub struct TextLines<'a> {
    pub source: ScriptSource,
    pub lines: Box<dyn Iterator<Item = String> + 'a>,
}

/// Host service that finds and reads script artifacts
pub trait ScriptStore {
    /// Project-relative path of the first script named `type_name`
    fn find_script_artifact(&self, type_name: &str) -> Option<String>;

    /// Open a script found by [`find_script_artifact`](Self::find_script_artifact)
    fn read_text_lines(&self, path: &str) -> Option<TextLines<'_>>;
}

/// Scripts on disk under `<project_root>/<content_dir>`
#[derive(Debug, Clone)]
pub struct FsScriptStore {
    project_root: PathBuf,
    content_dir: String,
    extensions: Vec<String>,
}

impl FsScriptStore {
    pub fn new(project_root: impl Into<PathBuf>, content_dir: impl Into<String>, extensions: Vec<String>) -> Self {
        Self {
            project_root: project_root.into(),
            content_dir: content_dir.into(),
            extensions: normalize_extensions(extensions),
        }
    }

    pub fn content_root(&self) -> PathBuf {
        self.project_root.join(&self.content_dir)
    }

    /// Every script under the content root, in search order
    pub fn script_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(self.content_root())
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| has_script_extension(e.path(), &self.extensions))
            .map(|e| e.into_path())
    }
}

impl ScriptStore for FsScriptStore {
    fn find_script_artifact(&self, type_name: &str) -> Option<String> {
        let found = self
            .script_paths()
            .find(|p| p.file_stem().and_then(|s| s.to_str()) == Some(type_name))?;

        let relative = found.strip_prefix(&self.project_root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Some(parts.join("/"))
    }

    fn read_text_lines(&self, path: &str) -> Option<TextLines<'_>> {
        let full_path = self.project_root.join(path);
        let file = match File::open(&full_path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %full_path.display(), error = %e, "script not readable");
                return None;
            }
        };
        // Invalid UTF-8 is replaced rather than ending the read
        let lines = BufReader::new(file)
            .split(b'\n')
            .map_while(|l| l.ok())
            .map(|bytes| {
                let mut line = String::from_utf8_lossy(&bytes).into_owned();
                if line.ends_with('\r') {
                    line.pop();
                }
                line
            });
        Some(TextLines {
            source: ScriptSource { path: full_path },
            lines: Box::new(lines),
        })
    }
}

/// Scripts held in memory, keyed by project-relative path.
/// A script registered without text is found but unreadable.
#[derive(Debug, Clone)]
pub struct MemoryScriptStore {
    scripts: BTreeMap<String, Option<String>>,
    extensions: Vec<String>,
}

impl Default for MemoryScriptStore {
    fn default() -> Self {
        Self::with_extensions(vec!["cs".to_string()])
    }
}

impl MemoryScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self {
            scripts: BTreeMap::new(),
            extensions: normalize_extensions(extensions),
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.scripts.insert(path.into(), Some(text.into()));
    }

    pub fn insert_unreadable(&mut self, path: impl Into<String>) {
        self.scripts.insert(path.into(), None);
    }
}

impl ScriptStore for MemoryScriptStore {
    fn find_script_artifact(&self, type_name: &str) -> Option<String> {
        self.scripts
            .keys()
            .map(|p| (p, Path::new(p.as_str())))
            .filter(|(_, path)| has_script_extension(path, &self.extensions))
            .find(|(_, path)| path.file_stem().and_then(|s| s.to_str()) == Some(type_name))
            .map(|(p, _)| p.clone())
    }

    fn read_text_lines(&self, path: &str) -> Option<TextLines<'_>> {
        let text = self.scripts.get(path)?.as_deref()?;
        Some(TextLines {
            source: ScriptSource { path: PathBuf::from(path) },
            lines: Box::new(text.lines().map(str::to_string)),
        })
    }
}

fn normalize_extensions(extensions: Vec<String>) -> Vec<String> {
    extensions
        .into_iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect()
}

fn has_script_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Annotate `pair` with its owner's script path and the first line
/// mentioning the field. Owners that are not components are left alone.
pub fn locate<M, S>(model: &M, store: &S, pair: &mut ReferencePair)
where
    M: ObjectModel + ?Sized,
    S: ScriptStore + ?Sized,
{
    pair.clear_location();

    if model.type_kind(pair.owner_object) != Some(TypeKind::Component) {
        return;
    }
    let Some(type_name) = model.type_name(pair.owner_object) else {
        return;
    };
    let Some(path) = store.find_script_artifact(type_name) else {
        debug!(owner = %pair.owner_object, type_name, "no script found");
        return;
    };
    pair.owner_script_path = Some(path.clone());

    let Some(text) = store.read_text_lines(&path) else {
        return;
    };
    pair.script_source = Some(text.source);
    pair.field_line_number = first_line_containing(text.lines, &pair.field_name);
}

/// Locate every pair of a response, in order
pub fn locate_all<M, S>(model: &M, store: &S, response: &mut SearchResponse)
where
    M: ObjectModel + ?Sized,
    S: ScriptStore + ?Sized,
{
    for pair in &mut response.reference_pairs {
        locate(model, store, pair);
    }
}

/// 1-based number of the first line containing `needle`
fn first_line_containing(lines: impl Iterator<Item = String>, needle: &str) -> Option<u32> {
    lines
        .enumerate()
        .find(|(_, line)| line.contains(needle))
        .and_then(|(idx, _)| u32::try_from(idx + 1).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjectRef, Scene, TypeDecl, TypeRegistry};

    const ENEMY_SCRIPT: &str = "using UnityEngine;\n\
        \n\
        public class Enemy : MonoBehaviour\n\
        {\n\
            // the target sprite is assigned in the inspector\n\
            public Sprite target;\n\
        }\n";

    fn scene() -> Scene {
        let types = TypeRegistry::builder()
            .declare(TypeDecl::raw_asset("Texture2D"))
            .declare(TypeDecl::component("Enemy").field("target", "Texture2D"))
            .declare(TypeDecl::component("Collider").field("target", "Texture2D"))
            .build()
            .unwrap();
        let mut scene = Scene::new(types);
        scene.spawn(1, "Texture2D").unwrap();
        scene.spawn(2, "Enemy").unwrap();
        scene.spawn(3, "Collider").unwrap();
        scene
    }

    #[test]
    fn test_first_line_containing() {
        let lines = ["a", "bb", "abc"].iter().map(|s| s.to_string());
        assert_eq!(first_line_containing(lines, "b"), Some(2));
        let lines = ["a"].iter().map(|s| s.to_string());
        assert_eq!(first_line_containing(lines, "z"), None);
    }

    #[test]
    fn test_comment_match_wins() {
        let scene = scene();
        let mut store = MemoryScriptStore::new();
        store.insert("Assets/Scripts/Enemy.cs", ENEMY_SCRIPT);

        let mut pair = ReferencePair::new(ObjectRef(2), ObjectRef(1), "target", None);
        locate(&scene, &store, &mut pair);
        assert_eq!(pair.owner_script_path.as_deref(), Some("Assets/Scripts/Enemy.cs"));
        assert_eq!(pair.field_line_number, Some(5));
        assert!(pair.script_source.is_some());
    }

    #[test]
    fn test_missing_script_leaves_pair_unannotated() {
        let scene = scene();
        let store = MemoryScriptStore::new();
        let mut pair = ReferencePair::new(ObjectRef(3), ObjectRef(1), "target", None);
        locate(&scene, &store, &mut pair);
        assert_eq!(pair.owner_script_path, None);
        assert_eq!(pair.field_line_number, None);
        assert!(pair.is_internal_type());
    }

    #[test]
    fn test_unreadable_script_keeps_path_only() {
        let scene = scene();
        let mut store = MemoryScriptStore::new();
        store.insert_unreadable("Assets/Collider.cs");
        let mut pair = ReferencePair::new(ObjectRef(3), ObjectRef(1), "target", None);
        locate(&scene, &store, &mut pair);
        assert_eq!(pair.owner_script_path.as_deref(), Some("Assets/Collider.cs"));
        assert_eq!(pair.script_source, None);
        assert_eq!(pair.field_line_number, None);
    }

    #[test]
    fn test_field_not_in_text() {
        let scene = scene();
        let mut store = MemoryScriptStore::new();
        store.insert("Assets/Enemy.cs", "class Enemy {}\n");
        let mut pair = ReferencePair::new(ObjectRef(2), ObjectRef(1), "target", None);
        locate(&scene, &store, &mut pair);
        assert_eq!(pair.owner_script_path.as_deref(), Some("Assets/Enemy.cs"));
        assert_eq!(pair.field_line_number, None);
    }

    #[test]
    fn test_non_component_owner_skipped() {
        let scene = scene();
        let mut store = MemoryScriptStore::new();
        store.insert("Assets/Texture2D.cs", "target\n");
        let mut pair = ReferencePair::new(ObjectRef(1), ObjectRef(1), "target", None);
        locate(&scene, &store, &mut pair);
        assert_eq!(pair.owner_script_path, None);
    }

    #[test]
    fn test_fs_store_finds_first_script_by_path_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("Assets/B")).unwrap();
        std::fs::create_dir_all(root.join("Assets/A")).unwrap();
        std::fs::write(root.join("Assets/B/Enemy.cs"), "second").unwrap();
        std::fs::write(root.join("Assets/A/Enemy.cs"), "first").unwrap();
        std::fs::write(root.join("Assets/A/Enemy.txt"), "not a script").unwrap();
        std::fs::write(root.join("Enemy.cs"), "outside content root").unwrap();

        let store = FsScriptStore::new(root, "Assets", vec![".cs".to_string()]);
        let path = store.find_script_artifact("Enemy").unwrap();
        assert_eq!(path, "Assets/A/Enemy.cs");
        assert_eq!(store.find_script_artifact("Player"), None);

        let text = store.read_text_lines(&path).unwrap();
        assert_eq!(text.source.path, root.join("Assets/A/Enemy.cs"));
        assert_eq!(text.lines.collect::<Vec<_>>(), vec!["first".to_string()]);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_stop_search() {
        let scene = scene();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Assets")).unwrap();
        std::fs::write(
            dir.path().join("Assets/Enemy.cs"),
            b"// caf\xE9\nclass Enemy {\n  public Texture2D target;\n}\n",
        )
        .unwrap();

        let store = FsScriptStore::new(dir.path(), "Assets", vec!["cs".to_string()]);
        let mut pair = ReferencePair::new(ObjectRef(2), ObjectRef(1), "target", None);
        locate(&scene, &store, &mut pair);
        assert_eq!(pair.owner_script_path.as_deref(), Some("Assets/Enemy.cs"));
        assert_eq!(pair.field_line_number, Some(3));
    }

    #[test]
    fn test_fs_store_strips_carriage_returns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Assets")).unwrap();
        std::fs::write(dir.path().join("Assets/Enemy.cs"), "a\r\nb\r\n").unwrap();

        let store = FsScriptStore::new(dir.path(), "Assets", vec!["cs".to_string()]);
        let text = store.read_text_lines("Assets/Enemy.cs").unwrap();
        assert_eq!(text.lines.collect::<Vec<_>>(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_fs_store_lists_scripts_in_search_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("Assets/UI")).unwrap();
        std::fs::write(root.join("Assets/UI/Hud.CS"), "").unwrap();
        std::fs::write(root.join("Assets/Enemy.cs"), "").unwrap();
        std::fs::write(root.join("Assets/notes.md"), "").unwrap();

        let store = FsScriptStore::new(root, "Assets", vec!["cs".to_string()]);
        let paths: Vec<_> = store.script_paths().collect();
        assert_eq!(paths, vec![root.join("Assets/Enemy.cs"), root.join("Assets/UI/Hud.CS")]);
    }

    #[test]
    fn test_memory_store_requires_script_extension() {
        let scene = scene();
        let mut store = MemoryScriptStore::new();
        store.insert("Assets/Enemy.txt", "target\n");
        let mut pair = ReferencePair::new(ObjectRef(2), ObjectRef(1), "target", None);
        locate(&scene, &store, &mut pair);
        assert_eq!(pair.owner_script_path, None);

        let mut store = MemoryScriptStore::with_extensions(vec![".txt".to_string()]);
        store.insert("Assets/Enemy.txt", "target\n");
        locate(&scene, &store, &mut pair);
        assert_eq!(pair.owner_script_path.as_deref(), Some("Assets/Enemy.txt"));
        assert_eq!(pair.field_line_number, Some(1));
    }

    #[test]
    fn test_fs_store_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsScriptStore::new(dir.path(), "Assets", vec!["cs".to_string()]);
        assert_eq!(store.find_script_artifact("Enemy"), None);
        assert!(store.read_text_lines("Assets/Enemy.cs").is_none());
    }
}
