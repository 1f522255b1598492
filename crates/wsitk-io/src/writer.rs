use std::io::Write;
use serde_json::{Map, Value};
use wsitk_core::{ParametricTransform, TransformSequence};
use crate::error::{LoaderError, Result};

/// Serialise a sequence in the stage-keyed format.
///
/// Each stage becomes a list under keys `"0"`, `"1"`, ... in ascending stage
/// order. The sequence's output grid, including any `set_output_spacing`,
/// is written into the last transform, where the loader reads it from.
/// Reading the result back yields the same transforms, composite order and
/// output grid.
pub fn sequence_to_value(sequence: &TransformSequence) -> Result<Value> {
    let transforms = sequence.transforms();
    let indices = sequence.stage_indices();
    let last = transforms.len().saturating_sub(1);
    let mut stages = Map::new();
    let mut previous: Option<usize> = None;
    let mut start = 0;

    while start < indices.len() {
        let stage = indices[start];
        if previous.is_some_and(|p| stage <= p) {
            return Err(LoaderError::UnorderedStage(stage));
        }
        let run = indices[start..].iter().take_while(|&&s| s == stage).count();
        let mut entries = Vec::with_capacity(run);
        for (position, t) in transforms.iter().enumerate().skip(start).take(run) {
            let definition = if position == last {
                ParametricTransform::clone(t).with_geometry(*sequence.output_geometry()?).to_definition()
            } else {
                t.to_definition()
            };
            entries.push(serde_json::to_value(definition)?);
        }
        stages.insert(stages.len().to_string(), Value::Array(entries));
        previous = Some(stage);
        start += run;
    }

    Ok(Value::Object(stages))
}

pub fn write_sequence<W: Write>(sequence: &TransformSequence, writer: W) -> Result<()> {
    let value = sequence_to_value(sequence)?;
    serde_json::to_writer_pretty(writer, &value)?;
    tracing::debug!("Wrote {} transforms", sequence.len());
    Ok(())
}
