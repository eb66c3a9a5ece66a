//! Pipeline documents: persisting a filter list + parameter maps to JSON and
//! restoring it through an explicit factory registry.
//!
//! A document records each filter's stable class name, positional index, and
//! parameter map. The registry maps class names back to constructors;
//! restoring a document with an unregistered name fails loudly rather than
//! silently dropping the filter.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::GrainpipeError;

use super::core::FilterPipeline;
use super::filter::Filter;
use super::params::ParameterValue;

/// A const for the document version, ensuring consistency.
const DOCUMENT_VERSION: u32 = 1;

//==================================================================================
// Document model
//==================================================================================

/// One filter entry in a pipeline document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FilterRecord {
    pub filter: String,
    pub index: usize,
    /// BTreeMap keeps the serialized parameter order deterministic.
    pub parameters: BTreeMap<String, ParameterValue>,
}

/// The serializable form of a whole pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PipelineDocument {
    pub document_version: u32,
    pub filters: Vec<FilterRecord>,
}

//==================================================================================
// Registry
//==================================================================================

type FilterFactory = fn() -> Box<dyn Filter>;

/// Maps stable filter class names to constructors.
#[derive(Default)]
pub struct FilterRegistry {
    factories: HashMap<&'static str, FilterFactory>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with every filter this crate ships.
    pub fn with_builtin_filters() -> Self {
        let mut registry = Self::new();
        registry.register("FindCentroids", || {
            Box::new(crate::filters::FindCentroids::new())
        });
        registry.register("FindSizes", || Box::new(crate::filters::FindSizes::new()));
        registry.register("FindNeighborhoods", || {
            Box::new(crate::filters::FindNeighborhoods::new())
        });
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: FilterFactory) {
        self.factories.insert(name, factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Filter>, GrainpipeError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| GrainpipeError::UnknownFilter(name.to_string()))
    }
}

//==================================================================================
// Serialization entry points
//==================================================================================

/// Captures a pipeline's filter list and parameter values as a document.
pub fn to_document(pipeline: &FilterPipeline) -> PipelineDocument {
    let mut records = Vec::with_capacity(pipeline.len());
    for index in 0..pipeline.len() {
        let filter = pipeline.filter(index);
        let mut parameters = BTreeMap::new();
        for descriptor in filter.parameters() {
            if let Some(value) = filter.parameter(descriptor.name) {
                parameters.insert(descriptor.name.to_string(), value);
            }
        }
        records.push(FilterRecord {
            filter: filter.name().to_string(),
            index,
            parameters,
        });
    }
    PipelineDocument {
        document_version: DOCUMENT_VERSION,
        filters: records,
    }
}

pub fn to_json(pipeline: &FilterPipeline) -> Result<String, GrainpipeError> {
    Ok(serde_json::to_string_pretty(&to_document(pipeline))?)
}

/// Restores a pipeline from a document, instantiating filters through the
/// registry and replaying their parameter maps. Records are applied in
/// positional order regardless of their order in the document.
pub fn from_document(
    document: &PipelineDocument,
    registry: &FilterRegistry,
    config: Arc<PipelineConfig>,
) -> Result<FilterPipeline, GrainpipeError> {
    let mut records: Vec<&FilterRecord> = document.filters.iter().collect();
    records.sort_by_key(|r| r.index);

    let mut pipeline = FilterPipeline::with_config(config);
    for record in records {
        let mut filter = registry.create(&record.filter)?;
        for (name, value) in &record.parameters {
            filter.set_parameter(name, value.clone())?;
        }
        pipeline.push_back(filter);
    }
    Ok(pipeline)
}

pub fn from_json(
    json: &str,
    registry: &FilterRegistry,
) -> Result<FilterPipeline, GrainpipeError> {
    let document: PipelineDocument = serde_json::from_str(json)?;
    from_document(&document, registry, Arc::new(PipelineConfig::default()))
}
