//! Stage-keyed sequence loader.
//!
//! The input is a mapping from stage name to one parameter map or a list of
//! them. Keys are read in document order and each key opens a new stage
//! index. `"initial"` holds user-supplied pre-registration transforms.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use serde_json::Value;
use wsitk_core::{InverseConfig, ParametricTransform, TransformDefinition, TransformSequence};
use crate::error::{LoaderError, Result};

/// Key holding pre-registration transforms.
pub const INITIAL_KEY: &str = "initial";

/// How the entries of an `"initial"` list are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialGrouping {
    /// Each entry gets its own stage index, so the list is applied as
    /// written and never reversed.
    #[default]
    PerTransform,
    /// The whole list shares one stage index, like a registration stage.
    Shared,
}

/// Loader settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoaderConfig {
    pub initial_grouping: InitialGrouping,
    /// Passed to every free-form transform built from the file.
    pub inverse_config: InverseConfig,
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_grouping(mut self, grouping: InitialGrouping) -> Self {
        self.initial_grouping = grouping;
        self
    }

    pub fn with_inverse_config(mut self, config: InverseConfig) -> Self {
        self.inverse_config = config;
        self
    }
}

/// Parameter maps in file order with their stage indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedSequence {
    pub definitions: Vec<TransformDefinition>,
    pub stage_indices: Vec<usize>,
    /// Key each definition was read from.
    pub stage_names: Vec<String>,
    inverse_config: InverseConfig,
}

impl ParsedSequence {
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Validate every definition into a transform.
    pub fn transforms(&self) -> Result<Vec<ParametricTransform>> {
        self.definitions
            .iter()
            .zip(&self.stage_names)
            .enumerate()
            .map(|(position, (def, stage))| {
                ParametricTransform::from_definition_with(def, self.inverse_config).map_err(|source| {
                    LoaderError::Transform {
                        position,
                        stage: stage.clone(),
                        source,
                    }
                })
            })
            .collect()
    }

    /// Build a sequence holding these transforms.
    pub fn into_sequence(self) -> Result<TransformSequence> {
        let transforms = self.transforms()?;
        Ok(TransformSequence::from_transforms(transforms, &self.stage_indices)?)
    }

    /// Add these transforms to an existing sequence, after its own stages.
    pub fn append_to(&self, sequence: &mut TransformSequence) -> Result<()> {
        let transforms = self.transforms()?;
        sequence.add_transforms(transforms, &self.stage_indices)?;
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn push(parsed: &mut ParsedSequence, stage: &str, def: TransformDefinition, index: usize) {
    parsed.definitions.push(def);
    parsed.stage_indices.push(index);
    parsed.stage_names.push(stage.to_string());
}

fn definition(stage: &str, value: &Value) -> Result<TransformDefinition> {
    if !value.is_object() {
        return Err(LoaderError::Malformed(format!(
            "entries under '{}' must be mappings, found {}",
            stage,
            type_name(value)
        )));
    }
    serde_json::from_value(value.clone()).map_err(|source| LoaderError::Definition {
        stage: stage.to_string(),
        source,
    })
}

/// Flatten a stage-keyed mapping into definitions and stage indices.
pub fn parse_sequence(value: &Value, config: &LoaderConfig) -> Result<ParsedSequence> {
    let stages = value.as_object().ok_or_else(|| {
        LoaderError::Malformed(format!("top level must be a mapping, found {}", type_name(value)))
    })?;

    let mut parsed = ParsedSequence {
        inverse_config: config.inverse_config,
        ..ParsedSequence::default()
    };
    let mut stage_index = 0;

    for (stage, entry) in stages {
        match entry {
            Value::Object(_) => {
                push(&mut parsed, stage, definition(stage, entry)?, stage_index);
                stage_index += 1;
            }
            Value::Array(items) if stage == INITIAL_KEY && config.initial_grouping == InitialGrouping::PerTransform => {
                for item in items {
                    push(&mut parsed, stage, definition(stage, item)?, stage_index);
                    stage_index += 1;
                }
            }
            Value::Array(items) => {
                for item in items {
                    push(&mut parsed, stage, definition(stage, item)?, stage_index);
                }
                if !items.is_empty() {
                    stage_index += 1;
                }
            }
            other => {
                return Err(LoaderError::Malformed(format!(
                    "stage '{}' must be a mapping or a list of mappings, found {}",
                    stage,
                    type_name(other)
                )));
            }
        }
    }

    tracing::info!(
        "Parsed {} transform definitions in {} stages",
        parsed.len(),
        stage_index
    );
    Ok(parsed)
}

pub fn parse_sequence_str(text: &str, config: &LoaderConfig) -> Result<ParsedSequence> {
    let value: Value = serde_json::from_str(text)?;
    parse_sequence(&value, config)
}

pub fn read_sequence<R: Read>(reader: R, config: &LoaderConfig) -> Result<ParsedSequence> {
    let value: Value = serde_json::from_reader(reader)?;
    parse_sequence(&value, config)
}

pub fn read_sequence_file<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> Result<ParsedSequence> {
    let file = File::open(path.as_ref())?;
    tracing::debug!("Reading transform sequence from {}", path.as_ref().display());
    read_sequence(BufReader::new(file), config)
}

/// Read a file straight into a validated sequence.
pub fn load_sequence_file<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> Result<TransformSequence> {
    read_sequence_file(path, config)?.into_sequence()
}
