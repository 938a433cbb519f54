//! Plain-text plan rendering for `smerge explain`.

use std::fmt::Write;

use smerge_core::config::MergeConfig;
use smerge_core::hash::hash_serde;

use crate::descriptor::TransformMeta;
use crate::dsl::yaml::ParsedPipeline;

pub fn explain(pipeline: &ParsedPipeline, config: &MergeConfig) -> String {
    let mut out = String::new();
    let desc = &pipeline.descriptor;

    let _ = writeln!(out, "Sorted Merge Plan");
    let _ = writeln!(out, "=================");
    if let Ok(hash) = hash_serde(&desc.key_spec()) {
        let _ = writeln!(out, "Descriptor: {}", hash.short());
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Keys:");
    if desc.fields.is_empty() {
        let _ = writeln!(out, "  (none: inputs are concatenated in order)");
    }
    for (i, key) in desc.fields.iter().enumerate() {
        let dir = if key.ascending { "asc" } else { "desc" };
        let ci = if key.case_insensitive { ", case-insensitive" } else { "" };
        let _ = writeln!(out, "  {}. {} {dir}{ci}", i + 1, key.name);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Inputs ({}):", pipeline.inputs.len());
    for (i, input) in pipeline.inputs.iter().enumerate() {
        let cols: Vec<String> = input
            .schema
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.name, f.data_type))
            .collect();
        let _ = writeln!(out, "  #{i} {} [{}]", input.source, cols.join(", "));
    }
    let _ = writeln!(out);

    if let Some(reference) = pipeline.reference_schema() {
        let output = desc.resolve_output_schema(reference);
        let _ = writeln!(out, "Output schema (from input #0):");
        for f in &output.fields {
            let sorted = match f.sorted {
                Some(d) if d.is_ascending() => "  sorted asc",
                Some(_) => "  sorted desc",
                None => "",
            };
            let _ = writeln!(out, "  {}: {}{sorted}", f.name, f.data_type);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Sink: {} ({:?})", pipeline.sink.destination, pipeline.sink.format);
    let _ = writeln!(
        out,
        "Config: check_sorted={} strict_descriptor={} channel_capacity={} batch_size={}",
        config.check_sorted, config.strict_descriptor, config.channel_capacity, config.batch_size
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Checks:");
    for remark in desc.validate(pipeline.reference_schema(), &pipeline.input_names()) {
        let _ = writeln!(out, "  {remark}");
    }
    out
}
