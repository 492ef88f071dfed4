//! Integration tests for the internalization pass.

use std::fs;
use std::path::PathBuf;

use openapi_internalize::{
    emit, find_one, internalize, internalized, load_document, location, parse_yaml,
    CatalogConfig, Format, FsIndexProvider, InternalizeError, Node, COMPONENT_TYPES,
};
use tempfile::TempDir;

// Helper to write a document under the temp dir
fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn provider() -> FsIndexProvider {
    FsIndexProvider::new(CatalogConfig::new(".").remote_lookup(false))
}

/// Load `spec.yaml` from the dir and internalize it in place.
fn run(dir: &TempDir, root_text: &str) -> Result<(Node, openapi_internalize::Report), InternalizeError> {
    let path = write(dir, "spec.yaml", root_text);
    let root = load_document(&path).unwrap();
    let report = internalize(&root, &location::from_path(&path), &provider())?;
    Ok((root, report))
}

fn str_at(root: &Node, path: &str) -> Option<String> {
    find_one(root, path).unwrap().and_then(|n| n.as_str())
}

fn as_yaml(root: &Node) -> serde_yaml::Value {
    serde_yaml::from_str(&emit(root, Format::Yaml).unwrap()).unwrap()
}

const ROOT_WITH_REMOTE_FOO: &str = r#"
openapi: 3.0.0
paths:
  /foo:
    get:
      responses:
        "200":
          $ref: "other.yaml#/components/schemas/Foo"
"#;

mod scenarios {
    use super::*;

    #[test]
    fn basic_internalization() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "other.yaml",
            "components:\n  schemas:\n    Foo:\n      type: string\n",
        );

        let (root, report) = run(&dir, ROOT_WITH_REMOTE_FOO).unwrap();

        assert_eq!(
            str_at(&root, "$.components.schemas.Foo.type").as_deref(),
            Some("string")
        );
        assert_eq!(
            str_at(&root, "$.paths['/foo'].get.responses.200.$ref").as_deref(),
            Some("#/components/schemas/Foo")
        );
        assert_eq!(report.mapping.len(), 1);
        assert_eq!(report.rewritten, 1);
        assert!(report.untouched.is_empty());
    }

    #[test]
    fn collision_renames_with_suffix() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "other.yaml",
            "components:\n  schemas:\n    Foo:\n      type: string\n",
        );
        let root_text = format!(
            "{}components:\n  schemas:\n    Foo:\n      type: integer\n",
            ROOT_WITH_REMOTE_FOO.trim_start()
        );

        let (root, _) = run(&dir, &root_text).unwrap();

        assert_eq!(
            str_at(&root, "$.components.schemas.Foo.type").as_deref(),
            Some("integer")
        );
        assert_eq!(
            str_at(&root, "$.components.schemas.FooX.type").as_deref(),
            Some("string")
        );
        assert_eq!(
            str_at(&root, "$.paths['/foo'].get.responses.200.$ref").as_deref(),
            Some("#/components/schemas/FooX")
        );
    }

    #[test]
    fn multi_hop_resolves_against_origin_document() {
        let dir = TempDir::new().unwrap();
        // other.yaml lives in a subdirectory, so its pointer to third.yaml
        // only resolves against lib/, never against the root's directory
        write(
            &dir,
            "lib/other.yaml",
            "components:\n  schemas:\n    Foo:\n      type: array\n      items:\n        $ref: 'third.yaml#/components/schemas/Bar'\n",
        );
        write(
            &dir,
            "lib/third.yaml",
            "components:\n  schemas:\n    Bar:\n      type: integer\n",
        );
        // a decoy with the same relative name next to the root
        write(
            &dir,
            "third.yaml",
            "components:\n  schemas:\n    Bar:\n      type: boolean\n",
        );
        let root_text = ROOT_WITH_REMOTE_FOO.replace("other.yaml", "lib/other.yaml");

        let (root, report) = run(&dir, &root_text).unwrap();

        assert_eq!(
            str_at(&root, "$.components.schemas.Bar.type").as_deref(),
            Some("integer")
        );
        assert_eq!(
            str_at(&root, "$.components.schemas.Foo.items.$ref").as_deref(),
            Some("#/components/schemas/Bar")
        );
        assert_eq!(
            str_at(&root, "$.paths['/foo'].get.responses.200.$ref").as_deref(),
            Some("#/components/schemas/Foo")
        );
        assert_eq!(report.mapping.len(), 2);
        assert_eq!(report.rewritten, 2);
    }

    #[test]
    fn multi_hop_with_collision_uses_renamed_target() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "other.yaml",
            "components:\n  schemas:\n    Foo:\n      items:\n        $ref: 'third.yaml#/components/schemas/Bar'\n",
        );
        write(
            &dir,
            "third.yaml",
            "components:\n  schemas:\n    Bar:\n      type: integer\n",
        );
        let root_text = format!(
            "{}components:\n  schemas:\n    Bar:\n      type: string\n",
            ROOT_WITH_REMOTE_FOO.trim_start()
        );

        let (root, _) = run(&dir, &root_text).unwrap();

        assert_eq!(
            str_at(&root, "$.components.schemas.BarX.type").as_deref(),
            Some("integer")
        );
        assert_eq!(
            str_at(&root, "$.components.schemas.Foo.items.$ref").as_deref(),
            Some("#/components/schemas/BarX")
        );
    }

    /// Known gap: remote pointers outside `components` are only checked,
    /// never internalized.
    #[test]
    fn non_component_remote_pointer_is_left_unchanged() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "paths.yaml",
            "paths:\n  /pets:\n    get:\n      responses:\n        \"200\":\n          description: ok\n",
        );
        let root_text = "openapi: 3.0.0\npaths:\n  /pets:\n    $ref: 'paths.yaml#/paths/~1pets'\n";

        let (root, report) = run(&dir, root_text).unwrap();

        assert_eq!(
            str_at(&root, "$.paths['/pets'].$ref").as_deref(),
            Some("paths.yaml#/paths/~1pets")
        );
        assert!(find_one(&root, "$.components").unwrap().is_none());
        assert!(report.mapping.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.untouched, vec!["paths.yaml#/paths/~1pets"]);
    }

    #[test]
    fn root_pointer_next_to_merged_subdirectory_component() {
        let dir = TempDir::new().unwrap();
        write(&dir, "common.yaml", "definitions:\n  C:\n    type: string\n");
        write(
            &dir,
            "sub/other.yaml",
            "components:\n  schemas:\n    Foo:\n      $ref: 'defs.yaml#/definitions/D'\n",
        );
        write(&dir, "sub/defs.yaml", "definitions:\n  D:\n    type: integer\n");
        let root_text = r#"
openapi: 3.0.0
paths:
  /foo:
    $ref: "sub/other.yaml#/components/schemas/Foo"
components:
  schemas:
    Local:
      $ref: "common.yaml#/definitions/C"
"#;

        let (root, report) = run(&dir, root_text).unwrap();

        assert_eq!(
            str_at(&root, "$.paths['/foo'].$ref").as_deref(),
            Some("#/components/schemas/Foo")
        );
        assert_eq!(
            str_at(&root, "$.components.schemas.Local.$ref").as_deref(),
            Some("common.yaml#/definitions/C")
        );
        assert_eq!(
            str_at(&root, "$.components.schemas.Foo.$ref").as_deref(),
            Some("defs.yaml#/definitions/D")
        );
        assert_eq!(report.rewritten, 1);
        assert_eq!(report.untouched.len(), 2);
    }

    #[test]
    fn escaped_component_name_stays_escaped() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "other.yaml",
            "components:\n  schemas:\n    a/b:\n      type: string\n",
        );
        let root_text = "x:\n  $ref: 'other.yaml#/components/schemas/a~1b'\n";

        let (root, report) = run(&dir, root_text).unwrap();

        assert_eq!(
            str_at(&root, "$.x.$ref").as_deref(),
            Some("#/components/schemas/a~1b")
        );
        assert_eq!(
            report.mapping.values().collect::<Vec<_>>(),
            vec!["#/components/schemas/a~1b"]
        );
        assert_eq!(
            str_at(&root, "$.components.schemas.a/b.type").as_deref(),
            Some("string")
        );
    }

    #[test]
    fn unresolvable_non_component_pointer_is_left_unchanged() {
        let dir = TempDir::new().unwrap();
        write(&dir, "paths.yaml", "paths: {}\n");
        let root_text = "paths:\n  /pets:\n    $ref: 'paths.yaml#/paths/~1nope'\n";

        let (root, report) = run(&dir, root_text).unwrap();

        assert_eq!(
            str_at(&root, "$.paths['/pets'].$ref").as_deref(),
            Some("paths.yaml#/paths/~1nope")
        );
        assert_eq!(report.untouched.len(), 1);
    }
}

mod properties {
    use super::*;

    fn fixture(dir: &TempDir) -> String {
        write(
            dir,
            "a.yaml",
            "components:\n  schemas:\n    Pet:\n      type: object\n      properties:\n        owner:\n          $ref: 'b.yaml#/components/schemas/Pet'\n  parameters:\n    Limit:\n      name: limit\n      in: query\n",
        );
        write(
            dir,
            "b.yaml",
            "components:\n  schemas:\n    Pet:\n      type: string\n",
        );
        r#"
openapi: 3.0.0
paths:
  /pets:
    get:
      parameters:
        - $ref: "a.yaml#/components/parameters/Limit"
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: "a.yaml#/components/schemas/Pet"
components:
  schemas:
    Pet:
      type: integer
"#
        .to_string()
    }

    #[test]
    fn names_are_unique_per_component_type() {
        let dir = TempDir::new().unwrap();
        let (root, _) = run(&dir, &fixture(&dir)).unwrap();

        for component_type in COMPONENT_TYPES {
            let Some(registry) = find_one(&root, &format!("$.components.{}", component_type))
                .unwrap()
            else {
                continue;
            };
            let mut keys = registry.keys().unwrap();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), total, "duplicate names in {}", component_type);
        }

        let schemas = find_one(&root, "$.components.schemas").unwrap().unwrap();
        assert_eq!(schemas.keys().unwrap(), vec!["Pet", "PetX", "PetXX"]);
    }

    #[test]
    fn suffixes_are_assigned_deterministically() {
        let first = {
            let dir = TempDir::new().unwrap();
            let (root, _) = run(&dir, &fixture(&dir)).unwrap();
            emit(&root, Format::Yaml).unwrap()
        };
        for _ in 0..3 {
            let dir = TempDir::new().unwrap();
            let (root, _) = run(&dir, &fixture(&dir)).unwrap();
            assert_eq!(emit(&root, Format::Yaml).unwrap(), first);
        }
    }

    #[test]
    fn nested_pointer_follows_renamed_target() {
        let dir = TempDir::new().unwrap();
        let (root, _) = run(&dir, &fixture(&dir)).unwrap();

        // a.yaml#Pet sorts before b.yaml#Pet, so it claims PetX
        assert_eq!(
            str_at(&root, "$.paths['/pets'].get.responses.200.content['application/json'].schema.$ref")
                .as_deref(),
            Some("#/components/schemas/PetX")
        );
        assert_eq!(
            str_at(&root, "$.components.schemas.PetX.properties.owner.$ref").as_deref(),
            Some("#/components/schemas/PetXX")
        );
        assert_eq!(
            str_at(&root, "$.components.schemas.PetXX.type").as_deref(),
            Some("string")
        );
    }

    #[test]
    fn output_is_a_fixed_point() {
        let dir = TempDir::new().unwrap();
        let (root, _) = run(&dir, &fixture(&dir)).unwrap();
        let once = emit(&root, Format::Yaml).unwrap();

        let again = parse_yaml(&once).unwrap();
        let location = location::from_path(&dir.path().join("spec.yaml"));
        let report = internalize(&again, &location, &provider()).unwrap();

        assert!(report.mapping.is_empty());
        assert_eq!(report.rewritten, 0);
        assert_eq!(emit(&again, Format::Yaml).unwrap(), once);
    }

    #[test]
    fn merged_component_keeps_identity_and_shape() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.yaml",
            "components:\n  schemas:\n    Pet:\n      type: object\n      required: [name]\n      properties:\n        name:\n          type: string\n",
        );
        let original = load_document(&a).unwrap();
        let root_text = "x:\n  $ref: 'a.yaml#/components/schemas/Pet'\n";

        let (root, _) = run(&dir, root_text).unwrap();

        let merged = find_one(&root, "$.components.schemas.Pet").unwrap().unwrap();
        let expected = find_one(&original, "$.components.schemas.Pet").unwrap().unwrap();
        assert!(merged.structurally_eq(&expected));
    }

    #[test]
    fn component_types_go_to_their_own_registry() {
        let dir = TempDir::new().unwrap();
        let (root, _) = run(&dir, &fixture(&dir)).unwrap();

        assert_eq!(
            str_at(&root, "$.components.parameters.Limit.name").as_deref(),
            Some("limit")
        );
        assert_eq!(
            str_at(&root, "$.paths['/pets'].get.parameters.0.$ref"),
            Some("#/components/parameters/Limit".to_string())
        );
    }
}

mod all_or_nothing {
    use super::*;

    #[test]
    fn internalized_leaves_input_untouched() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "other.yaml",
            "components:\n  schemas:\n    Foo:\n      type: string\n",
        );
        let path = write(&dir, "spec.yaml", ROOT_WITH_REMOTE_FOO);
        let root = load_document(&path).unwrap();
        let before = as_yaml(&root);

        let (output, report) =
            internalized(&root, &location::from_path(&path), &provider()).unwrap();

        assert_eq!(as_yaml(&root), before);
        assert_eq!(report.mapping.len(), 1);
        assert!(find_one(&output, "$.components.schemas.Foo").unwrap().is_some());
    }

    #[test]
    fn ambiguous_registry_aborts() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "other.yaml",
            "components:\n  schemas:\n    Foo:\n      type: string\n",
        );
        let path = write(&dir, "spec.yaml", ROOT_WITH_REMOTE_FOO);
        let root = load_document(&path).unwrap();
        // duplicate keys cannot come out of the YAML parser; add one by hand
        let top = root.document_child().unwrap();
        top.push_pair("components", Node::empty_mapping());
        top.push_pair("components", Node::empty_mapping());

        let result = internalized(&root, &location::from_path(&path), &provider());
        assert!(matches!(result, Err(InternalizeError::Merge { .. })));
    }

    #[test]
    fn missing_referenced_document_aborts() {
        let dir = TempDir::new().unwrap();
        let result = run(&dir, ROOT_WITH_REMOTE_FOO);
        match result {
            Err(e) => {
                assert!(matches!(e, InternalizeError::Catalog(_)));
                assert_eq!(e.exit_code(), 3);
            }
            Ok(_) => panic!("expected a catalog error"),
        }
    }

    #[test]
    fn alias_aborts() {
        let root = Node::document(Node::mapping(vec![
            ("openapi", Node::string("3.0.0")),
            ("x", Node::alias("anchor")),
        ]));
        let result = internalize(&root, "/spec.yaml", &provider());
        assert!(matches!(result, Err(InternalizeError::Catalog(_))));
    }
}
