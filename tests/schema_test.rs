use std::rc::Rc;

use apiref::schema::*;
use apiref::types::Document;
use serde_json::json;

#[test]
fn test_schema_locator_strips_fragment_marker() {
    assert_eq!(
        schema_locator(DEFAULT_SCHEMA_AUTHORITY, "#/components/schemas/Pet"),
        "http://everything.json/components/schemas/Pet"
    );
    assert_eq!(
        schema_locator("http://example.test/", "#/components/schemas/Pet"),
        "http://example.test/components/schemas/Pet"
    );
    assert_eq!(
        schema_locator("http://example.test", "components/schemas/Pet"),
        "http://example.test/components/schemas/Pet"
    );
}

#[test]
fn test_registry_from_document() {
    let mut doc = Document::new("Schemas", "1.0.0");
    let pet = Rc::new(SchemaNode::typed("object"));
    doc.components_mut().schemas.insert("Pet".to_string(), pet.clone());

    let registry = InMemorySchemaRegistry::from_document(&doc, DEFAULT_SCHEMA_AUTHORITY);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.authority(), DEFAULT_SCHEMA_AUTHORITY);

    let found = registry
        .get("http://everything.json/components/schemas/Pet")
        .expect("Pet should be registered");
    assert!(Rc::ptr_eq(&found, &pet));
    assert!(registry.get("http://everything.json/components/schemas/Dog").is_none());
}

#[test]
fn test_registry_holds_sub_schemas_under_their_pointers() {
    let mut doc = Document::new("Schemas", "1.0.0");
    let name = Rc::new(SchemaNode::typed("string"));
    let tags = Rc::new(SchemaNode::typed("array").with_items(name.clone()));
    doc.components_mut().schemas.insert(
        "Pet".to_string(),
        Rc::new(
            SchemaNode::typed("object")
                .with_property("name", name.clone())
                .with_property("a/b", tags),
        ),
    );

    let registry = InMemorySchemaRegistry::from_document(&doc, DEFAULT_SCHEMA_AUTHORITY);
    assert_eq!(registry.len(), 4);
    let found = registry
        .get("http://everything.json/components/schemas/Pet/properties/name")
        .expect("nested schema should be registered");
    assert!(Rc::ptr_eq(&found, &name));
    assert!(registry
        .get("http://everything.json/components/schemas/Pet/properties/a~1b/items")
        .is_some());
}

#[test]
fn test_pointers_lists_every_ref_in_the_subtree() {
    let node = SchemaNode::typed("object")
        .with_property("owner", Rc::new(SchemaNode::pointer("#/components/schemas/Owner")))
        .with_items(Rc::new(
            SchemaNode::typed("array").with_items(Rc::new(SchemaNode::pointer("#/components/schemas/Tag"))),
        ));

    assert_eq!(
        node.pointers(),
        vec!["#/components/schemas/Tag", "#/components/schemas/Owner"]
    );
}

#[test]
fn test_register_by_pointer() {
    let mut registry = InMemorySchemaRegistry::new("http://example.test");
    assert!(registry.is_empty());
    registry.register("#/$defs/Id", Rc::new(SchemaNode::typed("string")));
    assert!(registry.get("http://example.test/$defs/Id").is_some());
}

#[test]
fn test_map_children_keeps_identity_when_nothing_changes() {
    let node = SchemaNode::typed("object")
        .with_property("name", Rc::new(SchemaNode::typed("string")))
        .with_items(Rc::new(SchemaNode::typed("integer")));

    let mut visited = Vec::new();
    let rebuilt = node.map_children(|slot, child| {
        visited.extend(slot.segments());
        child.clone()
    });

    assert!(rebuilt.is_none());
    assert_eq!(visited, vec!["items", "properties", "name"]);
}

#[test]
fn test_map_children_rebuilds_with_replaced_child() {
    let replacement = Rc::new(SchemaNode::typed("string"));
    let node = SchemaNode::typed("object")
        .with_keyword("description", json!("A pet"))
        .with_property("name", Rc::new(SchemaNode::pointer("#/components/schemas/Name")));

    let rebuilt = node
        .map_children(|_, child| {
            if child.is_reference() {
                replacement.clone()
            } else {
                child.clone()
            }
        })
        .expect("a child changed");

    assert!(Rc::ptr_eq(&rebuilt.properties["name"], &replacement));
    assert_eq!(rebuilt.keywords["type"], json!("object"));
    assert_eq!(rebuilt.keywords["description"], json!("A pet"));
    assert!(node.properties["name"].is_reference());
}

#[test]
fn test_rebuild_keeps_boolean_additional_properties() {
    let node = SchemaNode {
        additional_properties: Some(AdditionalProperties::Allowed(false)),
        ..SchemaNode::typed("object")
    };
    let rebuilt = node.rebuild(node.children());
    assert_eq!(
        rebuilt.additional_properties,
        Some(AdditionalProperties::Allowed(false))
    );
}

#[test]
fn test_schema_deserializes_keywords_and_composition() {
    let schema: SchemaNode = serde_json::from_value(json!({
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": { "type": "string" },
            "owner": { "$ref": "#/components/schemas/Owner" }
        },
        "allOf": [{ "$ref": "#/components/schemas/Base" }],
        "additionalProperties": { "type": "integer" }
    }))
    .unwrap();

    assert_eq!(schema.keywords["type"], json!("object"));
    assert_eq!(schema.keywords["required"], json!(["name"]));
    assert!(!schema.is_reference());
    assert!(schema.properties["owner"].is_reference());
    assert_eq!(
        schema.all_of[0].reference.as_deref(),
        Some("#/components/schemas/Base")
    );
    assert!(matches!(
        schema.additional_properties,
        Some(AdditionalProperties::Schema(_))
    ));

    let value = serde_json::to_value(&schema).unwrap();
    assert_eq!(value["properties"]["owner"], json!({ "$ref": "#/components/schemas/Owner" }));
    assert_eq!(value["additionalProperties"], json!({ "type": "integer" }));
}
