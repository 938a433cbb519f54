//! YAML merge pipelines.
//!
//! Example:
//! ```yaml
//! config: { check_sorted: true }
//! schema:
//!   [ {name: "ts",  type: "Timestamp"},
//!     {name: "uid", type: "Utf8", case_insensitive: true},
//!     {name: "lat", type: "Float64"} ]
//! inputs:
//!   - { source: "data/east.csv" }
//!   - { source: "data/west.csv" }
//! keys:
//!   - { name: "uid" }
//!   - { name: "ts", ascending: false }
//! sink: { destination: "out/merged.csv", format: "csv" }
//! ```
//!
//! A top-level `schema` applies to every input that does not declare its own.

use serde::{Deserialize, Serialize};

use smerge_core::config::MergeConfig;
use smerge_core::key::SortKey;
use smerge_core::schema::{Collation, DataType, Field, Schema};

use crate::descriptor::SortedMergeDescriptor;
use crate::error::{DescriptorError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub config: Option<PipelineConfig>,
    #[serde(default)]
    pub schema: Vec<FieldDef>,
    pub inputs: Vec<InputDef>,
    #[serde(default)]
    pub keys: Vec<SortKey>,
    pub sink: SinkDef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDef {
    pub source: String,
    #[serde(default)]
    pub schema: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkDef {
    pub destination: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "csv".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub case_insensitive: bool,
}

fn default_nullable() -> bool {
    true
}

/// Overrides from the pipeline's `config:` block. Unset entries leave the
/// surrounding configuration alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub check_sorted: Option<bool>,
    pub strict_descriptor: Option<bool>,
    pub channel_capacity: Option<usize>,
    pub batch_size: Option<usize>,
}

impl PipelineConfig {
    pub fn apply(&self, cfg: &mut MergeConfig) {
        if let Some(v) = self.check_sorted {
            cfg.check_sorted = v;
        }
        if let Some(v) = self.strict_descriptor {
            cfg.strict_descriptor = v;
        }
        if let Some(v) = self.channel_capacity {
            cfg.channel_capacity = v.max(1);
        }
        if let Some(v) = self.batch_size {
            cfg.batch_size = v.max(1);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinkFormat {
    Csv,
    Jsonl,
}

impl SinkFormat {
    pub fn parse(s: &str) -> Option<SinkFormat> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(SinkFormat::Csv),
            "jsonl" | "ndjson" => Some(SinkFormat::Jsonl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub source: String,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinkSpec {
    pub destination: String,
    pub format: SinkFormat,
}

#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub descriptor: SortedMergeDescriptor,
    pub inputs: Vec<InputSpec>,
    pub sink: SinkSpec,
    pub config: PipelineConfig,
}

impl ParsedPipeline {
    pub fn input_names(&self) -> Vec<String> {
        self.inputs.iter().map(|i| i.source.clone()).collect()
    }

    /// The reference schema (input 0), if any input is declared.
    pub fn reference_schema(&self) -> Option<&Schema> {
        self.inputs.first().map(|i| &i.schema)
    }
}

pub fn to_schema(fields: &[FieldDef]) -> Result<Schema> {
    fields
        .iter()
        .map(|f| {
            let data_type = DataType::parse(&f.data_type)
                .ok_or_else(|| DescriptorError::UnknownType(f.data_type.clone()))?;
            let mut field = Field::new(f.name.clone(), data_type, f.nullable)
                .with_case_insensitive(f.case_insensitive);
            if let Some(c) = &f.collation {
                let collation = Collation::parse(c).ok_or_else(|| {
                    DescriptorError::Malformed(format!("unknown collation '{c}' on '{}'", f.name))
                })?;
                field = field.with_collation(collation);
            }
            Ok(field)
        })
        .collect::<Result<Vec<_>>>()
        .map(Schema::new)
}

/// Parse a YAML merge pipeline.
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<ParsedPipeline> {
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;

    let shared = to_schema(&doc.schema)?;
    let inputs = doc
        .inputs
        .into_iter()
        .map(|input| {
            let schema = if input.schema.is_empty() {
                shared.clone()
            } else {
                to_schema(&input.schema)?
            };
            if schema.is_empty() {
                return Err(DescriptorError::Malformed(format!(
                    "input '{}' has no schema",
                    input.source
                )));
            }
            Ok(InputSpec {
                source: input.source,
                schema,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let format = SinkFormat::parse(&doc.sink.format).ok_or_else(|| {
        DescriptorError::Malformed(format!("unknown sink format '{}'", doc.sink.format))
    })?;

    Ok(ParsedPipeline {
        descriptor: SortedMergeDescriptor::new(doc.keys),
        inputs,
        sink: SinkSpec {
            destination: doc.sink.destination,
            format,
        },
        config: doc.config.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPELINE: &str = r#"
config: { check_sorted: true, channel_capacity: 8 }
schema:
  - { name: k, type: Int64, nullable: false }
  - { name: tag, type: Utf8, collation: rtrim }
inputs:
  - { source: a.csv }
  - source: b.csv
    schema:
      - { name: k, type: Int32 }
      - { name: tag, type: Utf8 }
keys:
  - { name: k }
  - { name: tag, ascending: false }
sink: { destination: out.jsonl, format: jsonl }
"#;

    #[test]
    fn parses_full_pipeline() {
        let p = parse_yaml_pipeline(PIPELINE).unwrap();
        assert_eq!(p.inputs.len(), 2);
        assert_eq!(p.inputs[0].schema.fields[1].collation, Some(Collation::Rtrim));
        assert!(!p.inputs[0].schema.fields[0].nullable);
        assert_eq!(p.inputs[1].schema.fields[0].data_type, DataType::Int32);
        assert_eq!(
            p.descriptor.fields,
            vec![SortKey::asc("k"), SortKey::desc("tag")]
        );
        assert_eq!(p.sink.format, SinkFormat::Jsonl);
        assert_eq!(p.input_names(), vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn config_block_overrides_only_what_it_sets() {
        let p = parse_yaml_pipeline(PIPELINE).unwrap();
        let mut cfg = MergeConfig {
            check_sorted: false,
            batch_size: 17,
            ..MergeConfig::default()
        };
        p.config.apply(&mut cfg);
        assert!(cfg.check_sorted);
        assert_eq!(cfg.channel_capacity, 8);
        assert_eq!(cfg.batch_size, 17);
    }

    #[test]
    fn unknown_type_is_reported() {
        let src = r#"
inputs: [ { source: a.csv, schema: [ {name: k, type: Uuid} ] } ]
sink: { destination: out.csv }
"#;
        match parse_yaml_pipeline(src) {
            Err(DescriptorError::UnknownType(t)) => assert_eq!(t, "Uuid"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn input_without_any_schema_is_malformed() {
        let src = r#"
inputs: [ { source: a.csv } ]
sink: { destination: out.csv }
"#;
        assert!(matches!(
            parse_yaml_pipeline(src),
            Err(DescriptorError::Malformed(_))
        ));
    }

    #[test]
    fn bad_yaml_is_a_yaml_error() {
        assert!(matches!(
            parse_yaml_pipeline("inputs: [ {"),
            Err(DescriptorError::Yaml(_))
        ));
    }
}
