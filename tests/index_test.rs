use std::rc::Rc;

use apiref::errors::ResolveError;
use apiref::reference::Reference;
use apiref::resolution::{ComponentCategory, Entity, ReferenceIndex};
use apiref::types::*;

fn index_with_limit() -> (ReferenceIndex, Shared<Parameter>) {
    let limit = shared(Parameter::new("limit", ParameterLocation::Query));
    let mut index = ReferenceIndex::new();
    index.register("limit", limit.clone());
    (index, limit)
}

#[test]
fn test_resolve_returns_registered_object() {
    let (index, limit) = index_with_limit();
    let reference = Reference::component(ComponentCategory::Parameters, "limit");

    let resolved = index.resolve::<Parameter>(&reference).unwrap();
    assert!(Rc::ptr_eq(&resolved, &limit));
    assert!(index.is_registered("limit", &resolved));
}

#[test]
fn test_resolve_entity_is_keyed_by_category() {
    let (mut index, _limit) = index_with_limit();
    index.register("limit", shared(Header::default()));
    assert_eq!(index.len(), 2);

    let entity = index
        .resolve_entity(
            ComponentCategory::Headers,
            &Reference::component(ComponentCategory::Headers, "limit"),
        )
        .unwrap();
    assert_eq!(entity.category(), ComponentCategory::Headers);
    assert!(matches!(entity, Entity::Header(_)));
}

#[test]
fn test_missing_identifier_fails_with_reference() {
    let (index, _limit) = index_with_limit();
    let reference = Reference::component(ComponentCategory::Parameters, "offset");

    let error = index.resolve::<Parameter>(&reference).unwrap_err();
    assert_eq!(
        error,
        ResolveError::NotFound {
            category: ComponentCategory::Parameters,
            reference: reference.clone(),
        }
    );
    assert_eq!(error.reference(), Some(&reference));
    assert_eq!(error.pointer(), "#/components/parameters/offset");
    assert_eq!(
        error.to_string(),
        "no parameters component named 'offset' (#/components/parameters/offset)"
    );
}

#[test]
fn test_pointer_naming_another_category_is_rejected() {
    let (index, _limit) = index_with_limit();
    let reference = Reference::new("#/components/headers/limit");

    let error = index.resolve::<Parameter>(&reference).unwrap_err();
    assert!(matches!(
        error,
        ResolveError::CategoryMismatch {
            expected: ComponentCategory::Parameters,
            ..
        }
    ));
}

#[test]
fn test_pointer_into_a_component_is_not_the_component() {
    let (index, _limit) = index_with_limit();
    let reference = Reference::new("#/components/parameters/limit/schema");

    let error = index.resolve::<Parameter>(&reference).unwrap_err();
    assert!(matches!(
        error,
        ResolveError::NotFound {
            category: ComponentCategory::Parameters,
            ..
        }
    ));
}

#[test]
fn test_from_document_registers_components_and_tags() {
    let mut doc = Document::new("Index", "1.0.0");
    doc.tags.push(RefOr::item(Tag::named("pets")));
    let components = doc.components_mut();
    components.parameters.insert(
        "limit".to_string(),
        RefOr::item(Parameter::new("limit", ParameterLocation::Query)),
    );
    components.parameters.insert(
        "max".to_string(),
        RefOr::Ref(Reference::component(ComponentCategory::Parameters, "alias")),
    );
    components.parameters.insert(
        "alias".to_string(),
        RefOr::Ref(Reference::component(ComponentCategory::Parameters, "limit")),
    );
    components.parameters.insert(
        "loop".to_string(),
        RefOr::Ref(Reference::component(ComponentCategory::Parameters, "loop")),
    );
    components.parameters.insert(
        "remote".to_string(),
        RefOr::Ref(Reference::new("shared.json#/components/parameters/limit")),
    );
    components.security_schemes.insert(
        "oauth2".to_string(),
        RefOr::item(SecurityScheme {
            kind: "oauth2".to_string(),
            ..SecurityScheme::default()
        }),
    );

    let index = ReferenceIndex::from_document(&doc);
    assert_eq!(index.len(), 5);

    let tag = index.resolve::<Tag>(&Reference::tag("pets")).unwrap();
    assert!(Rc::ptr_eq(&tag, doc.tags[0].target().unwrap()));

    let components = doc.components.as_ref().unwrap();
    let limit = index
        .resolve::<Parameter>(&Reference::component(ComponentCategory::Parameters, "limit"))
        .unwrap();
    assert!(Rc::ptr_eq(&limit, components.parameters["limit"].target().unwrap()));

    for alias in ["alias", "max"] {
        let resolved = index
            .resolve::<Parameter>(&Reference::component(ComponentCategory::Parameters, alias))
            .unwrap();
        assert!(Rc::ptr_eq(&resolved, &limit), "{} should share limit", alias);
    }
    for unsettled in ["loop", "remote"] {
        assert!(index
            .resolve::<Parameter>(&Reference::component(ComponentCategory::Parameters, unsettled))
            .is_err());
    }
}

#[test]
fn test_empty_index() {
    let index = ReferenceIndex::new();
    assert!(index.is_empty());
    assert!(index.resolve::<Tag>(&Reference::tag("pets")).is_err());
}
