use lumio_engine::{
    filter_documents_and_links_by_query, filter_documents_and_links_data_by_query,
    filter_documents_and_links_ids_from_json, EngineOptions, FilterInput,
};
use lumio_model::{
    AttributeFilter, Collection, ConditionType, ConditionValue, ConstraintConditionValue,
    ConstraintData, Document, LinkInstance, LinkType, Query, QueryStem, User,
};
use serde_json::{json, Value};

// ============================================================================
// Fixture
// ============================================================================

fn documents() -> Vec<Document> {
    serde_json::from_value(json!([
        {"collectionId": "c1", "id": "d1",
         "data": {"a1": "IBM", "a2": "Lala", "a100": "40", "a101": "2019-04-01T00:00:00.000Z"}},
        {"collectionId": "c1", "id": "d2",
         "data": {"a1": "Red Hat", "a2": "aturing@lumeer.io", "a100": "100", "a101": "2019-04-02T00:00:00.000Z"},
         "metaData": {"parentId": "d1"}},
        {"collectionId": "c1", "id": "d3",
         "data": {"a1": "JBoss", "a2": "Lala", "a100": "-10", "a101": "2019-04-10T00:00:00.000Z"},
         "metaData": {"parentId": "d2"}},
        {"collectionId": "c1", "id": "d4",
         "data": {"a1": "SoftLayer", "a2": "Lala", "a100": "55"},
         "metaData": {"parentId": "d1"}},
        {"collectionId": "c1", "id": "d5",
         "data": {"a1": "Microsoft", "a2": "Lala", "a101": "2019-04-06T10:00:00.000Z"}},
        {"collectionId": "c1", "id": "d6",
         "data": {"a1": "LinkedIn", "a2": "Lala", "a100": "98", "a101": "2019-04-11T00:00:00.000Z"},
         "metaData": {"parentId": "d5"}},
        {"collectionId": "c2", "id": "d7", "data": {"a1": "Red Hot Chili Peppers", "a2": "music@lumeer.io"}},
        {"collectionId": "c2", "id": "d8", "data": {"a1": "Linkin Park", "a2": "music@lumeer.io"}},
        {"collectionId": "c2", "id": "d9", "data": {"a1": "Without l1", "a2": "email@lumeer.io"}},
        {"collectionId": "c2", "id": "d10", "data": {"a1": "Without l2", "a2": "email@lumeer.io"}}
    ]))
    .unwrap()
}

fn collections() -> Vec<Collection> {
    serde_json::from_value(json!([
        {"id": "c1", "attributes": [
            {"id": "a1", "name": "a1"},
            {"id": "a2", "name": "a2", "constraint": {"type": "User", "config": {}}},
            {"id": "a100", "name": "a100", "constraint": {"type": "Number", "config": {}}},
            {"id": "a101", "name": "a101", "constraint": {"type": "DateTime", "config": {"format": "DD.MM.YYYY"}}}
        ]},
        {"id": "c2", "attributes": [
            {"id": "a1", "name": "a1"},
            {"id": "a2", "name": "a2", "constraint": {"type": "User", "config": {}}}
        ]}
    ]))
    .unwrap()
}

fn link_types() -> Vec<LinkType> {
    vec![LinkType::new("lt1", ["c1", "c2"], vec![])]
}

fn link_instances() -> Vec<LinkInstance> {
    vec![
        LinkInstance::new("li1", "lt1", ["d2", "d7"]),
        LinkInstance::new("li2", "lt1", ["d3", "d8"]),
    ]
}

fn turing() -> User {
    User::with_email("aturing@lumeer.io")
}

fn music() -> User {
    User::with_email("music@lumeer.io")
}

fn constraint_data(current_user: Option<User>) -> ConstraintData {
    ConstraintData {
        users: vec![turing(), music()],
        current_user,
        ..Default::default()
    }
}

struct Fixture {
    documents: Vec<Document>,
    collections: Vec<Collection>,
    link_types: Vec<LinkType>,
    link_instances: Vec<LinkInstance>,
    data: ConstraintData,
}

impl Fixture {
    fn new() -> Self {
        Self::with_user(Some(turing()))
    }

    fn with_user(current_user: Option<User>) -> Self {
        Self {
            documents: documents(),
            collections: collections(),
            link_types: link_types(),
            link_instances: link_instances(),
            data: constraint_data(current_user),
        }
    }

    fn input(&self) -> FilterInput<'_> {
        FilterInput::new(&self.documents, &self.collections, &self.data)
    }

    fn linked_input(&self) -> FilterInput<'_> {
        self.input().with_links(&self.link_types, &self.link_instances)
    }

    fn ids(&self, query: &Query, options: EngineOptions) -> Vec<String> {
        let (documents, _) = filter_documents_and_links_by_query(self.input(), query, &options);
        documents.into_iter().map(|d| d.id.clone()).collect()
    }

    fn linked_ids(&self, query: &Query, options: EngineOptions) -> (Vec<String>, Vec<String>) {
        let (documents, links) = filter_documents_and_links_by_query(self.linked_input(), query, &options);
        (
            documents.into_iter().map(|d| d.id.clone()).collect(),
            links.into_iter().map(|l| l.id.clone()).collect(),
        )
    }
}

fn filter(attribute: &str, condition: ConditionType, value: Value) -> AttributeFilter {
    AttributeFilter::new(attribute, condition, vec![ConditionValue::literal(value)])
}

fn current_user_filter(condition: ConditionType) -> AttributeFilter {
    AttributeFilter::new(
        "a2",
        condition,
        vec![ConditionValue::symbolic(ConstraintConditionValue::CurrentUser)],
    )
}

fn is_current_user() -> AttributeFilter {
    current_user_filter(ConditionType::Equals)
}

fn stem_query(collection: &str, filter: AttributeFilter) -> Query {
    Query::with_stems(vec![QueryStem::new(collection).with_filter(collection, filter)])
}

fn children() -> EngineOptions {
    EngineOptions {
        include_children: true,
        ..Default::default()
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Empty queries
// ============================================================================

#[test]
fn empty_query_returns_input_unchanged() {
    let fixture = Fixture::new();
    let all: Vec<String> = fixture.documents.iter().map(|d| d.id.clone()).collect();
    assert_eq!(fixture.ids(&Query::default(), EngineOptions::default()), all);

    let empty = Fixture {
        documents: Vec::new(),
        ..Fixture::new()
    };
    assert!(empty.ids(&Query::default(), EngineOptions::default()).is_empty());
}

#[test]
fn empty_query_still_paginates() {
    let fixture = Fixture::new();
    let query = Query {
        page: Some(1),
        page_size: Some(3),
        ..Default::default()
    };
    let (documents, links) = fixture.linked_ids(&query, EngineOptions::default());
    assert_eq!(documents, ids(&["d4", "d5", "d6"]));
    assert_eq!(links, ids(&["li1", "li2"]));
}

#[test]
fn stems_without_filters_select_their_collections() {
    let fixture = Fixture::new();
    let both = Query::with_stems(vec![QueryStem::new("c1"), QueryStem::new("c2")]);
    assert_eq!(fixture.ids(&both, EngineOptions::default()).len(), 10);
    let first = Query::with_stems(vec![QueryStem::new("c1")]);
    assert_eq!(fixture.ids(&first, EngineOptions::default()).len(), 6);
}

// ============================================================================
// Attribute filters
// ============================================================================

#[test]
fn filter_by_attribute_value() {
    let fixture = Fixture::new();
    let query = stem_query("c1", filter("a1", ConditionType::Equals, json!("IBM")));
    assert_eq!(fixture.ids(&query, EngineOptions::default()), ids(&["d1"]));
}

#[test]
fn filter_on_unknown_attribute_is_dropped() {
    let fixture = Fixture::new();
    let query = stem_query("c1", filter("a404", ConditionType::Equals, json!("IBM")));
    assert_eq!(fixture.ids(&query, EngineOptions::default()).len(), 6);
}

#[test]
fn filter_by_current_user() {
    let query = stem_query("c1", is_current_user());
    assert_eq!(Fixture::new().ids(&query, EngineOptions::default()), ids(&["d2"]));
    assert!(Fixture::with_user(None).ids(&query, EngineOptions::default()).is_empty());

    let other = stem_query("c2", is_current_user());
    assert!(Fixture::new().ids(&other, EngineOptions::default()).is_empty());
    assert_eq!(
        Fixture::with_user(Some(music())).ids(&other, EngineOptions::default()),
        ids(&["d7", "d8"])
    );
}

#[test]
fn negated_current_user_filters_need_a_user() {
    for condition in [ConditionType::NotEquals, ConditionType::HasNoneOf] {
        let query = stem_query("c1", current_user_filter(condition));
        assert_eq!(
            Fixture::new().ids(&query, EngineOptions::default()),
            ids(&["d1", "d3", "d4", "d5", "d6"]),
            "{condition:?}"
        );
        assert!(
            Fixture::with_user(None).ids(&query, EngineOptions::default()).is_empty(),
            "{condition:?}"
        );
    }
}

#[test]
fn filter_by_number() {
    let fixture = Fixture::new();
    let cases = [
        (ConditionType::Equals, "-10", vec!["d3"]),
        (ConditionType::NotEquals, "-10", vec!["d1", "d2", "d4", "d5", "d6"]),
        (ConditionType::GreaterThan, "40", vec!["d2", "d4", "d6"]),
        (ConditionType::LowerThanEquals, "40", vec!["d1", "d3"]),
    ];
    for (condition, value, expected) in cases {
        let query = stem_query("c1", filter("a100", condition, json!(value)));
        assert_eq!(fixture.ids(&query, EngineOptions::default()), ids(&expected), "{condition:?} {value}");
    }
}

#[test]
fn filter_by_date_at_day_precision() {
    let fixture = Fixture::new();
    let day = "2019-04-06T00:00:00.000Z";
    let cases = [
        (ConditionType::Equals, day, vec!["d5"]),
        (ConditionType::NotEquals, day, vec!["d1", "d2", "d3", "d4", "d6"]),
        (ConditionType::LowerThan, day, vec!["d1", "d2"]),
        (ConditionType::GreaterThanEquals, day, vec!["d3", "d5", "d6"]),
        (ConditionType::GreaterThanEquals, "bla bla bla", vec![]),
        (ConditionType::Equals, "06.04.2019", vec!["d5"]),
    ];
    for (condition, value, expected) in cases {
        let query = stem_query("c1", filter("a101", condition, json!(value)));
        assert_eq!(fixture.ids(&query, EngineOptions::default()), ids(&expected), "{condition:?} {value}");
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn children_follow_accepted_parents() {
    let fixture = Fixture::new();
    let ibm = stem_query("c1", filter("a1", ConditionType::Equals, json!("IBM")));
    assert_eq!(fixture.ids(&ibm, children()), ids(&["d1", "d2", "d4", "d3"]));

    let red_hat = stem_query("c1", filter("a1", ConditionType::Equals, json!("Red Hat")));
    assert_eq!(fixture.ids(&red_hat, children()), ids(&["d2", "d3"]));

    assert_eq!(fixture.ids(&stem_query("c1", is_current_user()), children()), ids(&["d2", "d3"]));
}

#[test]
fn children_pull_in_their_own_links() {
    let fixture = Fixture::new();
    let query = Query::with_stems(vec![QueryStem::new("c1")
        .with_link_types(&["lt1"])
        .with_filter("c1", is_current_user())]);
    let (documents, links) = fixture.linked_ids(&query, children());
    assert_eq!(documents, ids(&["d7", "d2", "d8", "d3"]));
    assert_eq!(links, ids(&["li1", "li2"]));
}

#[test]
fn stage_matrices_group_by_hop() {
    let fixture = Fixture::new();
    let query = Query::with_stems(vec![QueryStem::new("c1")
        .with_link_types(&["lt1"])
        .with_filter("c1", is_current_user())]);
    let data = filter_documents_and_links_data_by_query(fixture.linked_input(), &query, &children());
    let stem = &data.data_by_stems[0];
    let hop = |row: &Vec<&Document>| row.iter().map(|d| d.id.clone()).collect::<Vec<_>>();
    assert_eq!(hop(&stem.pipeline_documents[0]), ids(&["d2", "d3"]));
    assert_eq!(hop(&stem.pipeline_documents[1]), ids(&["d7", "d8"]));
    assert_eq!(stem.pipeline_link_instances[0].len(), 2);
}

// ============================================================================
// Links
// ============================================================================

#[test]
fn unlinked_documents_on_request() {
    let fixture = Fixture::new();
    let query = Query::with_stems(vec![QueryStem::new("c1").with_link_types(&["lt1"]).with_filter(
        "c2",
        filter("a1", ConditionType::Contains, json!("Without l")),
    )]);
    let options = EngineOptions {
        include_non_linked_documents: true,
        ..Default::default()
    };
    let (documents, links) = fixture.linked_ids(&query, options);
    assert_eq!(documents, ids(&["d9", "d10"]));
    assert!(links.is_empty());

    let (documents, _) = fixture.linked_ids(&query, EngineOptions::default());
    assert!(documents.is_empty());
}

#[test]
fn pinned_document_keeps_its_link() {
    let fixture = Fixture::new();
    let nobody = filter("a1", ConditionType::Equals, json!("Nobody"));
    let stem = QueryStem::new("c1").with_link_types(&["lt1"]).with_filter("c2", nobody);

    let (documents, links) = fixture.linked_ids(&Query::with_stems(vec![stem.clone()]), EngineOptions::default());
    assert!(documents.is_empty());
    assert!(links.is_empty());

    let pinned = Query::with_stems(vec![stem.with_document_ids(&["d2"])]);
    let (documents, links) = fixture.linked_ids(&pinned, EngineOptions::default());
    assert_eq!(documents, ids(&["d2"]));
    assert_eq!(links, ids(&["li1"]));
}

#[test]
fn linked_filter_selects_through_the_join() {
    let fixture = Fixture::new();
    let query = Query::with_stems(vec![QueryStem::new("c1")
        .with_link_types(&["lt1"])
        .with_filter("c2", filter("a1", ConditionType::StartsWith, json!("linkin")))]);
    let (documents, links) = fixture.linked_ids(&query, EngineOptions::default());
    assert_eq!(documents, ids(&["d8", "d3"]));
    assert_eq!(links, ids(&["li2"]));
}

// ============================================================================
// Fulltext
// ============================================================================

#[test]
fn fulltext_across_collections() {
    let fixture = Fixture::new();
    assert_eq!(fixture.ids(&Query::with_fulltexts(&["link"]), EngineOptions::default()), ids(&["d6", "d8"]));
    assert_eq!(fixture.ids(&Query::with_fulltexts(&["red"]), EngineOptions::default()), ids(&["d2", "d7"]));

    let mut single = Query::with_fulltexts(&["link"]);
    single.stems = vec![QueryStem::new("c1")];
    assert_eq!(fixture.ids(&single, EngineOptions::default()), ids(&["d6"]));
}

#[test]
fn fulltext_with_children() {
    let fixture = Fixture::new();
    assert_eq!(fixture.ids(&Query::with_fulltexts(&["IBM"]), children()), ids(&["d1", "d2", "d4", "d3"]));
    assert_eq!(fixture.ids(&Query::with_fulltexts(&["red"]), children()), ids(&["d2", "d3", "d7"]));
}

#[test]
fn fulltext_ignores_accents_and_case() {
    let fixture = Fixture::new();
    assert_eq!(fixture.ids(&Query::with_fulltexts(&["MÍcrosoft"]), EngineOptions::default()), ids(&["d5"]));
}

// ============================================================================
// Merging and envelope
// ============================================================================

#[test]
fn stems_merge_first_wins() {
    let fixture = Fixture::new();
    let ibm = filter("a1", ConditionType::Equals, json!("IBM"));
    let query = Query::with_stems(vec![
        QueryStem::new("c1").with_filter("c1", ibm.clone()),
        QueryStem::new("c2").with_filter("c2", filter("a1", ConditionType::Contains, json!("park"))),
        QueryStem::new("c1").with_filter("c1", ibm),
    ]);
    assert_eq!(fixture.ids(&query, EngineOptions::default()), ids(&["d1", "d8"]));
}

#[test]
fn merged_documents_are_paginated() {
    let fixture = Fixture::new();
    let mut query = Query::with_stems(vec![QueryStem::new("c1"), QueryStem::new("c2")]);
    query.page = Some(2);
    query.page_size = Some(4);
    assert_eq!(fixture.ids(&query, EngineOptions::default()), ids(&["d9", "d10"]));
}

#[test]
fn envelope_round_trip() {
    let fixture = Fixture::new();
    let envelope = json!({
        "documents": fixture.documents,
        "linkInstances": fixture.link_instances,
        "collections": fixture.collections,
        "linkTypes": fixture.link_types,
        "query": {"stems": [{"collectionId": "c1", "linkTypeIds": ["lt1"], "filters": [
            {"collectionId": "c1", "attributeId": "a2", "condition": "eq", "conditionValues": [{"type": "currentUser"}]}
        ]}]},
        "collectionsPermissions": {},
        "linkTypePermissions": null,
        "constraintData": {"users": [{"email": "aturing@lumeer.io"}], "currentUser": {"email": "aturing@lumeer.io"}},
        "includeChildren": true,
        "includeNonLinkedDocuments": false,
        "language": "en"
    });
    let ids_out = filter_documents_and_links_ids_from_json(&envelope.to_string()).unwrap();
    assert_eq!(ids_out.documents_ids, ids(&["d7", "d2", "d8", "d3"]));
    assert_eq!(ids_out.link_instances_ids, ids(&["li1", "li2"]));
}
