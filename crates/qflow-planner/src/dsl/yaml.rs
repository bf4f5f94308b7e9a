//! Minimal YAML -> `Query<Value>` parser for *linear* pipelines over JSON
//! documents.
//!
//! Example:
//! ```yaml
//! config: { max_lookup_elements: 100000 }
//! steps:
//!   - op: source
//!     name: orders
//!   - op: filter
//!     pointer: /amount
//!     cmp: ">"
//!     value: 10
//!   - op: join
//!     inner: customers
//!     outer_key: /customer
//!     inner_key: /name
//!     ignore_case: true
//!   - op: select
//!     fields: { id: /outer/id, customer: /inner/name }
//! ```
//!
//! Keys are compared by their text: strings as-is, everything else as its
//! JSON rendering. Missing pointers read as `null`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use qflow_core::comparer::{ignore_ascii_case, Comparer};
use qflow_core::config::EngineConfig;
use qflow_operators::callback::Selector;
use qflow_operators::group::Grouping;

use crate::query::Query;

#[derive(Debug, Error)]
pub enum DslError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pipeline: {0}")]
    Invalid(String),

    #[error("invalid json pointer `{0}` (must be empty or start with '/')")]
    Pointer(String),

    #[error("pipeline references unknown source `{0}`")]
    UnknownSource(String),

    #[error(transparent)]
    Build(#[from] qflow_core::error::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub config: Option<PipelineConfig>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Step {
    Source {
        name: String,
    },

    Filter {
        pointer: String,
        cmp: Comparison,
        value: Value,
    },

    /// Project into an object: output field name -> pointer into the input.
    Select {
        fields: BTreeMap<String, String>,
    },

    Join {
        inner: String,
        outer_key: String,
        inner_key: String,
        #[serde(default)]
        ignore_case: bool,
    },

    GroupJoin {
        inner: String,
        outer_key: String,
        inner_key: String,
        #[serde(default)]
        ignore_case: bool,
    },

    GroupBy {
        key: String,
        #[serde(default)]
        ignore_case: bool,
    },

    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

/// Per-pipeline overrides of `EngineConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_lookup_elements: Option<usize>,
    pub lookup_capacity_hint: Option<usize>,
    pub trace_elements: Option<bool>,
}

impl PipelineConfig {
    pub fn apply(&self, mut cfg: EngineConfig) -> EngineConfig {
        if let Some(v) = self.max_lookup_elements {
            cfg.max_lookup_elements = Some(v);
        }
        if let Some(v) = self.lookup_capacity_hint {
            cfg.lookup_capacity_hint = v;
        }
        if let Some(v) = self.trace_elements {
            cfg.trace_elements = v;
        }
        cfg
    }
}

#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub source: String,
    pub steps: Vec<Step>,
    pub config: PipelineConfig,
}

pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<ParsedPipeline, DslError> {
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;
    let mut steps = doc.steps.into_iter();

    let source = match steps.next() {
        Some(Step::Source { name }) => name,
        Some(other) => {
            return Err(DslError::Invalid(format!(
                "first step must be 'source', got {:?}",
                other
            )))
        }
        None => return Err(DslError::Invalid("empty pipeline".into())),
    };

    let steps: Vec<Step> = steps.collect();
    for step in &steps {
        match step {
            Step::Source { .. } => {
                return Err(DslError::Invalid("multiple sources not supported".into()))
            }
            Step::Filter { pointer, .. } | Step::GroupBy { key: pointer, .. } => {
                check_pointer(pointer)?
            }
            Step::Select { fields } => {
                for p in fields.values() {
                    check_pointer(p)?;
                }
            }
            Step::Join {
                outer_key,
                inner_key,
                ..
            }
            | Step::GroupJoin {
                outer_key,
                inner_key,
                ..
            } => {
                check_pointer(outer_key)?;
                check_pointer(inner_key)?;
            }
            Step::Count => {}
        }
    }

    Ok(ParsedPipeline {
        source,
        steps,
        config: doc.config.unwrap_or_default(),
    })
}

impl ParsedPipeline {
    /// Every source name the pipeline reads, outer source first.
    pub fn source_names(&self) -> Vec<&str> {
        let mut names = vec![self.source.as_str()];
        for step in &self.steps {
            if let Step::Join { inner, .. } | Step::GroupJoin { inner, .. } = step {
                if !names.contains(&inner.as_str()) {
                    names.push(inner);
                }
            }
        }
        names
    }

    pub fn engine_config(&self, base: EngineConfig) -> EngineConfig {
        self.config.apply(base)
    }

    /// Bind the pipeline to named in-memory sources. Building evaluates
    /// nothing; the sources are only read when the query is enumerated.
    pub fn build(&self, sources: &HashMap<String, Vec<Value>>) -> Result<Query<Value>, DslError> {
        let open = |name: &str| -> Result<Query<Value>, DslError> {
            let items = sources
                .get(name)
                .ok_or_else(|| DslError::UnknownSource(name.to_string()))?;
            Ok(Query::from_vec(name, items.clone()))
        };

        let mut q = open(&self.source)?;
        for step in &self.steps {
            q = match step {
                Step::Source { .. } => {
                    return Err(DslError::Invalid("multiple sources not supported".into()))
                }
                Step::Filter {
                    pointer,
                    cmp,
                    value,
                } => {
                    let (pointer, cmp, value) = (pointer.clone(), *cmp, value.clone());
                    q.filter(Selector::sync(move |v: Value| {
                        compare(v.pointer(&pointer), cmp, &value)
                    }))?
                }
                Step::Select { fields } => {
                    let fields = fields.clone();
                    q.select(Selector::sync(move |v: Value| {
                        let obj = fields
                            .iter()
                            .map(|(name, p)| {
                                let field = v.pointer(p).cloned().unwrap_or(Value::Null);
                                (name.clone(), field)
                            })
                            .collect();
                        Value::Object(obj)
                    }))?
                }
                Step::Join {
                    inner,
                    outer_key,
                    inner_key,
                    ignore_case,
                } => q.join_with(
                    open(inner)?,
                    key_selector(outer_key),
                    key_selector(inner_key),
                    Selector::sync(|(o, i): (Value, Value)| json!({ "outer": o, "inner": i })),
                    comparer(*ignore_case),
                )?,
                Step::GroupJoin {
                    inner,
                    outer_key,
                    inner_key,
                    ignore_case,
                } => q.group_join_with(
                    open(inner)?,
                    key_selector(outer_key),
                    key_selector(inner_key),
                    Selector::sync(|(o, is): (Value, Vec<Value>)| {
                        json!({ "outer": o, "inner": is })
                    }),
                    comparer(*ignore_case),
                )?,
                Step::GroupBy { key, ignore_case } => q
                    .group_by_with(key_selector(key), comparer(*ignore_case))?
                    .select(Selector::sync(|g: Grouping<String, Value>| {
                        json!({ "key": g.key, "elements": g.elements })
                    }))?,
                Step::Count => q.count()?.select(Selector::sync(Value::from))?,
            };
        }
        Ok(q)
    }
}

fn check_pointer(p: &str) -> Result<(), DslError> {
    if p.is_empty() || p.starts_with('/') {
        Ok(())
    } else {
        Err(DslError::Pointer(p.to_string()))
    }
}

fn key_text(v: &Value, pointer: &str) -> String {
    match v.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    }
}

fn key_selector(pointer: &str) -> Selector<Value, String> {
    let pointer = pointer.to_string();
    Selector::sync(move |v: Value| key_text(&v, &pointer))
}

fn comparer(ignore_case: bool) -> Comparer<String> {
    Comparer::resolve(ignore_case.then(ignore_ascii_case))
}

fn compare(actual: Option<&Value>, cmp: Comparison, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    let ord = match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    };
    match cmp {
        Comparison::Eq => ord == Some(Ordering::Equal),
        Comparison::Ne => ord != Some(Ordering::Equal),
        Comparison::Lt => ord == Some(Ordering::Less),
        Comparison::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        Comparison::Gt => ord == Some(Ordering::Greater),
        Comparison::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
    }
}
