use std::fs;
use std::rc::Rc;

use apiref::config::ResolverConfig;
use apiref::errors::{ApiRefError, ResolveError};
use apiref::loader::{load_document, parse_document};
use apiref::resolution::resolve_document;
use tempfile::TempDir;

const PETSTORE: &str = r##"{
  "openapi": "3.1.0",
  "info": { "title": "Petstore", "version": "1.0.0" },
  "tags": [{ "name": "pets", "description": "Everything about pets" }],
  "paths": {
    "/pets": {
      "get": {
        "tags": ["pets", "store"],
        "operationId": "listPets",
        "parameters": [
          { "$ref": "#/components/parameters/limit" },
          { "$ref": "#/components/parameters/offset" },
          { "$ref": "shared.json#/components/parameters/trace" }
        ],
        "responses": {
          "200": {
            "description": "A list of pets",
            "content": {
              "application/json": {
                "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Pet" } }
              }
            }
          },
          "default": { "$ref": "#/components/responses/Error" }
        },
        "security": [{ "oauth2": ["read:pets"] }]
      },
      "post": {
        "requestBody": { "$ref": "#/components/requestBodies/NewPet" },
        "responses": { "201": { "description": "Created" } }
      }
    }
  },
  "components": {
    "schemas": {
      "Pet": {
        "type": "object",
        "properties": {
          "id": { "type": "integer" },
          "category": { "$ref": "#/components/schemas/Category" }
        }
      },
      "Category": { "type": "string" }
    },
    "parameters": {
      "limit": { "name": "limit", "in": "query", "schema": { "type": "integer" } }
    },
    "requestBodies": {
      "NewPet": {
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
      }
    },
    "responses": {
      "Error": { "description": "Unexpected error" }
    },
    "securitySchemes": {
      "oauth2": { "type": "oauth2", "flows": {} }
    }
  }
}"##;

#[test]
fn test_parse_and_resolve_document() {
    let mut doc = parse_document(PETSTORE, Some("petstore.json")).unwrap();
    assert_eq!(doc.location.as_deref(), Some("petstore.json"));

    let config = ResolverConfig::default();
    let diagnostics = resolve_document(&mut doc, &config);

    assert_eq!(diagnostics.len(), 1, "unexpected: {:?}", diagnostics);
    let diagnostic = diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.location, "#/paths/~1pets/get/parameters/1");
    assert_eq!(
        diagnostic.to_string(),
        "#/paths/~1pets/get/parameters/1: no parameters component named 'offset' (#/components/parameters/offset)"
    );

    let components = doc.components.as_ref().unwrap();
    let pet = components.schemas["Pet"].clone();
    assert!(Rc::ptr_eq(&pet.properties["category"], &components.schemas["Category"]));

    let item = doc.paths["/pets"].target().unwrap().borrow();
    let get = item.get.as_ref().unwrap();
    assert!(!get.parameters[0].is_unresolved());
    assert!(get.parameters[1].is_unresolved());
    assert!(get.parameters[2].is_unresolved());
    assert!(get.tags.iter().all(|tag| !tag.is_unresolved()));
    assert!(!get.responses["default"].is_unresolved());
    assert!(!get.security[0].schemes[0].0.is_unresolved());

    let post = item.post.as_ref().unwrap();
    let body = post.request_body.as_ref().unwrap().target().unwrap().borrow();
    let schema = body.content["application/json"].schema.as_ref().unwrap();
    assert!(Rc::ptr_eq(schema, &pet));
}

#[test]
fn test_strict_mode_reports_external_references() {
    let mut doc = parse_document(PETSTORE, None).unwrap();
    let config = ResolverConfig {
        strict: true,
        ..ResolverConfig::default()
    };
    let diagnostics = resolve_document(&mut doc, &config);

    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d.error, ResolveError::ExternalUnsupported { .. })));
}

#[test]
fn test_resolved_document_serializes_with_pointers() {
    let mut doc = parse_document(PETSTORE, None).unwrap();
    let config = ResolverConfig::default();
    resolve_document(&mut doc, &config);

    let value = serde_json::to_value(&doc).unwrap();
    let get = &value["paths"]["/pets"]["get"];
    assert_eq!(get["parameters"][0]["$ref"], "#/components/parameters/limit");
    assert_eq!(get["tags"], serde_json::json!(["pets", "store"]));
    assert_eq!(get["security"][0]["oauth2"][0], "read:pets");
    assert_eq!(
        get["responses"]["200"]["content"]["application/json"]["schema"]["items"]["type"],
        "object"
    );
}

#[test]
fn test_load_document_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("petstore.json");
    fs::write(&path, PETSTORE).unwrap();

    let doc = load_document(&path).unwrap();
    assert_eq!(doc.info.title, "Petstore");
    assert_eq!(doc.location, Some(path.display().to_string()));
}

#[test]
fn test_missing_file_is_a_file_error() {
    let dir = TempDir::new().unwrap();
    let err = load_document(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ApiRefError::File { .. }));
}

#[test]
fn test_malformed_document_is_a_parse_error() {
    let err = parse_document(r#"{ "openapi": "3.1.0" }"#, Some("broken.json")).unwrap_err();
    match err {
        ApiRefError::Parse { path, .. } => assert_eq!(path, "broken.json"),
        other => panic!("expected parse error, got {:?}", other),
    }
}
