//! Document and link filtering.
//!
//! Each query stem becomes a stage chain: its base collection, then for every
//! link type the link type and the collection on its other side. Records are
//! accepted depth-first:
//!
//! - **Stage 0**: every base document meeting the stage filters tries to
//!   extend into stage 1, credited with its own fulltext match
//! - **Extend**: candidates of the next stage are the connected records that
//!   meet that stage's filters; a candidate is accepted when its own extension
//!   succeeds or when it is pinned by the stem's document ids
//! - **Terminal**: past the last stage the chain holds when the anchor is
//!   pinned (or nothing is pinned) and the fulltext requirement is met
//!
//! Children of accepted base documents and unlinked downstream documents are
//! admitted on request. Stems are merged first-wins by id and the merged
//! documents paginated.

use crate::evaluate::{RecordEvaluator, ResourceSchema};
use crate::options::EngineOptions;
use ahash::{AHashMap, AHashSet};
use lumio_model::{
    AllowedPermissions, AttributeFilter, AttributesResource, Collection, ConstraintData,
    DataResource, Document, LanguageTag, LinkInstance, LinkType, Query, QueryStem,
};
use lumio_values::text::{escape_html, fold_fulltext};
use std::collections::VecDeque;
use tracing::{debug, trace};

// ============================================================================
// Input and output
// ============================================================================

/// Everything a query is evaluated against. Nothing here is mutated.
#[derive(Debug, Clone, Copy)]
pub struct FilterInput<'a> {
    pub documents: &'a [Document],
    pub collections: &'a [Collection],
    pub link_types: &'a [LinkType],
    pub link_instances: &'a [LinkInstance],
    pub collections_permissions: Option<&'a AHashMap<String, AllowedPermissions>>,
    pub link_types_permissions: Option<&'a AHashMap<String, AllowedPermissions>>,
    pub data: &'a ConstraintData,
}

impl<'a> FilterInput<'a> {
    pub fn new(documents: &'a [Document], collections: &'a [Collection], data: &'a ConstraintData) -> Self {
        Self {
            documents,
            collections,
            link_types: &[],
            link_instances: &[],
            collections_permissions: None,
            link_types_permissions: None,
            data,
        }
    }

    pub fn with_links(mut self, link_types: &'a [LinkType], link_instances: &'a [LinkInstance]) -> Self {
        self.link_types = link_types;
        self.link_instances = link_instances;
        self
    }

    pub fn with_permissions(
        mut self,
        collections: &'a AHashMap<String, AllowedPermissions>,
        link_types: &'a AHashMap<String, AllowedPermissions>,
    ) -> Self {
        self.collections_permissions = Some(collections);
        self.link_types_permissions = Some(link_types);
        self
    }
}

/// What one stem accepted.
#[derive(Debug, Clone, Default)]
pub struct StemData<'a> {
    pub stem: QueryStem,
    pub documents: Vec<&'a Document>,
    pub link_instances: Vec<&'a LinkInstance>,
    /// Accepted documents per collection stage (stage index / 2).
    pub pipeline_documents: Vec<Vec<&'a Document>>,
    /// Accepted link instances per link type stage (stage index / 2).
    pub pipeline_link_instances: Vec<Vec<&'a LinkInstance>>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentsAndLinksData<'a> {
    pub documents: Vec<&'a Document>,
    pub link_instances: Vec<&'a LinkInstance>,
    /// Empty when the query had nothing to evaluate.
    pub data_by_stems: Vec<StemData<'a>>,
}

// ============================================================================
// Entry points
// ============================================================================

pub fn filter_documents_and_links_by_query<'a>(
    input: FilterInput<'a>,
    query: &Query,
    options: &EngineOptions,
) -> (Vec<&'a Document>, Vec<&'a LinkInstance>) {
    let data = filter_documents_and_links_data_by_query(input, query, options);
    (data.documents, data.link_instances)
}

pub fn filter_documents_and_links_data_by_query<'a>(
    input: FilterInput<'a>,
    query: &Query,
    options: &EngineOptions,
) -> DocumentsAndLinksData<'a> {
    if query.is_empty_except_pagination() {
        return DocumentsAndLinksData {
            documents: paginate(input.documents.iter().collect(), query),
            link_instances: input.link_instances.iter().collect(),
            data_by_stems: Vec::new(),
        };
    }

    let stems: Vec<QueryStem> = if query.stems.is_empty() {
        input
            .collections
            .iter()
            .map(|collection| QueryStem::new(collection.id.clone()))
            .collect()
    } else {
        query.stems.clone()
    };
    let fulltexts = prepare_fulltexts(&query.fulltexts);
    let language = options.language.unwrap_or_else(|| input.data.locale());
    let records = RecordsIndex::new(&input);

    let mut merged = DocumentsAndLinksData::default();
    let mut seen_documents: AHashSet<&str> = AHashSet::new();
    let mut seen_links: AHashSet<&str> = AHashSet::new();

    for stem in &stems {
        let stages = build_stages(&input, stem, &records, language);
        let stem_data = filter_stem(stem, &stages, &fulltexts, input.data, options);
        for document in stem_data.documents.iter().copied() {
            if seen_documents.insert(document.id.as_str()) {
                merged.documents.push(document);
            }
        }
        for link in stem_data.link_instances.iter().copied() {
            if seen_links.insert(link.id.as_str()) {
                merged.link_instances.push(link);
            }
        }
        merged.data_by_stems.push(stem_data);
    }

    merged.documents = paginate(merged.documents, query);
    merged
}

/// The `[page * size, (page + 1) * size)` window when the query is paginated.
pub fn paginate<T>(items: Vec<T>, query: &Query) -> Vec<T> {
    if !query.is_paginated() {
        return items;
    }
    let page = query.page.unwrap_or(0);
    let size = query.page_size.unwrap_or(0);
    items.into_iter().skip(page.saturating_mul(size)).take(size).collect()
}

/// HTML-escaped, accent-folded, lowercased terms; blank terms are ignored.
pub(crate) fn prepare_fulltexts(fulltexts: &[String]) -> Vec<String> {
    fulltexts
        .iter()
        .map(|term| fold_fulltext(&escape_html(term)))
        .filter(|term| !term.is_empty())
        .collect()
}

// ============================================================================
// Stage chain
// ============================================================================

struct RecordsIndex<'a> {
    documents: AHashMap<&'a str, Vec<DataResource<'a>>>,
    links: AHashMap<&'a str, Vec<DataResource<'a>>>,
}

impl<'a> RecordsIndex<'a> {
    fn new(input: &FilterInput<'a>) -> Self {
        let mut documents: AHashMap<&'a str, Vec<DataResource<'a>>> = AHashMap::new();
        for document in input.documents {
            documents
                .entry(document.collection_id.as_str())
                .or_default()
                .push(DataResource::Document(document));
        }
        let mut links: AHashMap<&'a str, Vec<DataResource<'a>>> = AHashMap::new();
        for link in input.link_instances {
            links
                .entry(link.link_type_id.as_str())
                .or_default()
                .push(DataResource::Link(link));
        }
        Self { documents, links }
    }

    fn records(&self, resource: AttributesResource<'_>) -> Vec<DataResource<'a>> {
        let group = match resource {
            AttributesResource::Collection(c) => self.documents.get(c.id.as_str()),
            AttributesResource::LinkType(l) => self.links.get(l.id.as_str()),
        };
        group.cloned().unwrap_or_default()
    }
}

struct Stage<'a> {
    schema: ResourceSchema<'a>,
    /// Filters whose attribute exists on the stage resource.
    filters: Vec<AttributeFilter>,
    records: Vec<DataResource<'a>>,
    permissions: Option<&'a AllowedPermissions>,
}

/// Base collection, then link type and far collection per link type id. The
/// chain stops at the first link type that is unknown or does not touch the
/// collection reached so far.
fn stage_resources<'a>(input: &FilterInput<'a>, stem: &QueryStem) -> Vec<AttributesResource<'a>> {
    let Some(base) = input.collections.iter().find(|c| c.id == stem.collection_id) else {
        trace!(collection = %stem.collection_id, "stem collection not found");
        return Vec::new();
    };
    let mut resources = vec![AttributesResource::Collection(base)];
    let mut current = base;
    for link_type_id in &stem.link_type_ids {
        let Some(link_type) = input
            .link_types
            .iter()
            .find(|l| &l.id == link_type_id && l.collection_ids.contains(&current.id))
        else {
            trace!(link_type = %link_type_id, "stem link type not reachable");
            break;
        };
        let other_id = link_type.other_collection_id(&current.id);
        let Some(other) = input.collections.iter().find(|c| c.id == other_id) else {
            break;
        };
        resources.push(AttributesResource::LinkType(link_type));
        resources.push(AttributesResource::Collection(other));
        current = other;
    }
    resources
}

fn build_stages<'a>(
    input: &FilterInput<'a>,
    stem: &QueryStem,
    records: &RecordsIndex<'a>,
    language: LanguageTag,
) -> Vec<Stage<'a>> {
    stage_resources(input, stem)
        .into_iter()
        .map(|resource| {
            let schema = ResourceSchema::new(resource, language);
            let declared: Vec<&AttributeFilter> = match resource {
                AttributesResource::Collection(c) => stem
                    .filters
                    .iter()
                    .filter(|f| f.collection_id == c.id)
                    .map(|f| &f.filter)
                    .collect(),
                AttributesResource::LinkType(l) => stem
                    .link_filters
                    .iter()
                    .filter(|f| f.link_type_id == l.id)
                    .map(|f| &f.filter)
                    .collect(),
            };
            let filters = declared
                .into_iter()
                .filter(|filter| {
                    let known = schema.has_attribute(&filter.attribute_id);
                    if !known {
                        trace!(
                            attribute = %filter.attribute_id,
                            resource = %resource.id(),
                            "filter on unknown attribute dropped"
                        );
                    }
                    known
                })
                .cloned()
                .collect();
            let permissions = match resource {
                AttributesResource::Collection(c) => input.collections_permissions.and_then(|m| m.get(&c.id)),
                AttributesResource::LinkType(l) => input.link_types_permissions.and_then(|m| m.get(&l.id)),
            };
            Stage {
                schema,
                filters,
                records: records.records(resource),
                permissions,
            }
        })
        .collect()
}

// ============================================================================
// Stem evaluation
// ============================================================================

struct StemRun<'s, 'a> {
    stages: &'s [Stage<'a>],
    pins: AHashSet<&'s str>,
    fulltexts: &'s [String],
    data: &'a ConstraintData,
    /// Ids accepted per stage.
    pushed: Vec<AHashSet<&'a str>>,
    seen_documents: AHashSet<&'a str>,
    seen_links: AHashSet<&'a str>,
    result: StemData<'a>,
}

impl<'s, 'a: 's> StemRun<'s, 'a> {
    fn evaluator(&self, index: usize, record: DataResource<'a>) -> RecordEvaluator<'s> {
        let stages = self.stages;
        let stage = &stages[index];
        RecordEvaluator::new(&stage.schema, record, self.data).with_permissions(stage.permissions)
    }

    fn meets_filters(&self, index: usize, record: DataResource<'a>) -> bool {
        let stages = self.stages;
        self.evaluator(index, record).meets_filters(&stages[index].filters)
    }

    fn meets_fulltexts(&self, index: usize, record: DataResource<'a>) -> bool {
        self.evaluator(index, record).meets_fulltexts(self.fulltexts)
    }

    fn any_filters_from(&self, index: usize) -> bool {
        self.stages[index..].iter().any(|stage| !stage.filters.is_empty())
    }

    /// Documents by id, link instances by either endpoint.
    fn is_pinned(&self, record: DataResource<'a>) -> bool {
        if self.pins.is_empty() {
            return false;
        }
        match record {
            DataResource::Document(document) => self.pins.contains(document.id.as_str()),
            DataResource::Link(link) => link.document_ids.iter().any(|id| self.pins.contains(id.as_str())),
        }
    }

    fn accept(&mut self, index: usize, record: DataResource<'a>) {
        if !self.pushed[index].insert(record.id()) {
            return;
        }
        let slot = index / 2;
        match record {
            DataResource::Document(document) => {
                if self.seen_documents.insert(document.id.as_str()) {
                    self.result.documents.push(document);
                }
                push_to_matrix(&mut self.result.pipeline_documents, slot, document);
            }
            DataResource::Link(link) => {
                if self.seen_links.insert(link.id.as_str()) {
                    self.result.link_instances.push(link);
                }
                push_to_matrix(&mut self.result.pipeline_link_instances, slot, link);
            }
        }
    }

    fn extend(&mut self, anchor: DataResource<'a>, index: usize, fulltext_found: bool) -> bool {
        if index >= self.stages.len() {
            let pinned = self.pins.is_empty() || self.pins.contains(anchor.id());
            return pinned && (self.fulltexts.is_empty() || fulltext_found);
        }

        let stages = self.stages;
        let candidates: Vec<DataResource<'a>> = stages[index]
            .records
            .iter()
            .copied()
            .filter(|record| connected(anchor, *record) && self.meets_filters(index, *record))
            .collect();
        if candidates.is_empty() && self.any_filters_from(index) {
            return false;
        }

        let mut accepted = (self.fulltexts.is_empty() || fulltext_found) && candidates.is_empty();
        for candidate in candidates {
            let found = fulltext_found || self.meets_fulltexts(index, candidate);
            if self.extend(candidate, index + 1, found) || self.is_pinned(candidate) {
                trace!(stage = index, id = %candidate.id(), "accepted");
                accepted = true;
                self.accept(index, candidate);
            }
        }
        accepted
    }
}

fn connected(anchor: DataResource<'_>, candidate: DataResource<'_>) -> bool {
    match (anchor, candidate) {
        (DataResource::Document(document), DataResource::Link(link))
        | (DataResource::Link(link), DataResource::Document(document)) => link.connects(&document.id),
        _ => false,
    }
}

fn push_to_matrix<T>(matrix: &mut Vec<Vec<T>>, index: usize, value: T) {
    if matrix.len() <= index {
        matrix.resize_with(index + 1, Vec::new);
    }
    matrix[index].push(value);
}

fn filter_stem<'a>(
    stem: &QueryStem,
    stages: &[Stage<'a>],
    fulltexts: &[String],
    data: &'a ConstraintData,
    options: &EngineOptions,
) -> StemData<'a> {
    if stages.is_empty() {
        return StemData {
            stem: stem.clone(),
            ..Default::default()
        };
    }

    let pins: AHashSet<&str> = stem.document_ids.iter().map(String::as_str).collect();
    let mut run = StemRun {
        stages,
        pins,
        fulltexts,
        data,
        pushed: vec![AHashSet::new(); stages.len()],
        seen_documents: AHashSet::new(),
        seen_links: AHashSet::new(),
        result: StemData::default(),
    };

    let base: Vec<&'a Document> = stages[0]
        .records
        .iter()
        .filter_map(|record| match record {
            DataResource::Document(document) => Some(*document),
            DataResource::Link(_) => None,
        })
        .collect();
    let children = if options.include_children {
        children_map(&base)
    } else {
        AHashMap::new()
    };

    for document in base.iter().copied() {
        let record = DataResource::Document(document);
        if run.pushed[0].contains(document.id.as_str()) || !run.meets_filters(0, record) {
            continue;
        }
        let found = fulltexts.is_empty() || run.meets_fulltexts(0, record);
        if !(run.extend(record, 1, found) || run.is_pinned(record)) {
            continue;
        }
        run.accept(0, record);

        if options.include_children {
            for child in descendants(document, &children) {
                if run.pushed[0].contains(child.id.as_str()) {
                    continue;
                }
                let child_record = DataResource::Document(child);
                let found = fulltexts.is_empty() || run.meets_fulltexts(0, child_record);
                run.extend(child_record, 1, found);
                run.accept(0, child_record);
            }
        }
    }

    if options.include_non_linked_documents {
        for index in (2..stages.len()).step_by(2) {
            for record in stages[index].records.iter().copied() {
                if run.pushed[index].contains(record.id()) {
                    continue;
                }
                if run.meets_filters(index, record) && run.meets_fulltexts(index, record) {
                    run.accept(index, record);
                }
            }
        }
    }

    debug!(
        collection = %stem.collection_id,
        stages = stages.len(),
        documents = run.result.documents.len(),
        links = run.result.link_instances.len(),
        "stem filtered"
    );
    StemData {
        stem: stem.clone(),
        ..run.result
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

pub(crate) fn children_map<'a>(documents: &[&'a Document]) -> AHashMap<&'a str, Vec<&'a Document>> {
    let mut map: AHashMap<&'a str, Vec<&'a Document>> = AHashMap::new();
    for document in documents.iter().copied() {
        if let Some(parent_id) = document.parent_id() {
            map.entry(parent_id).or_default().push(document);
        }
    }
    map
}

/// Transitive children of `root` in breadth-first order. Cyclic parent
/// chains end where they revisit a document.
pub(crate) fn descendants<'a>(
    root: &'a Document,
    children: &AHashMap<&'a str, Vec<&'a Document>>,
) -> Vec<&'a Document> {
    let mut visited: AHashSet<&str> = AHashSet::new();
    visited.insert(root.id.as_str());
    let mut queue = VecDeque::from([root]);
    let mut found = Vec::new();
    while let Some(document) = queue.pop_front() {
        for child in children.get(document.id.as_str()).into_iter().flatten() {
            if visited.insert(child.id.as_str()) {
                found.push(*child);
                queue.push_back(*child);
            }
        }
    }
    found
}
