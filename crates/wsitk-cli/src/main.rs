use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use wsitk_core::{Accuracy, InverseConfig, Point2, PointMapping, Spacing2, TransformSequence};
use wsitk_io::{load_sequence_file, write_sequence, InitialGrouping, LoaderConfig};

#[derive(Parser)]
#[command(name = "wsitk")]
#[command(about = "Inspect and apply whole-slide registration transform sequences")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SequenceArgs {
    /// Stage-keyed transform sequence (JSON)
    sequence: PathBuf,

    /// Give the whole `initial` list one stage index
    #[arg(long)]
    shared_initial: bool,

    /// Residual at which a B-spline inverse counts as converged
    #[arg(long, default_value_t = 1e-6)]
    inverse_tolerance: f64,

    /// Iteration cap for B-spline inverses
    #[arg(long, default_value_t = 50)]
    inverse_iterations: usize,
}

impl SequenceArgs {
    fn load(&self) -> Result<TransformSequence> {
        let grouping = if self.shared_initial {
            InitialGrouping::Shared
        } else {
            InitialGrouping::PerTransform
        };
        let inverse = InverseConfig::new()
            .with_tolerance(self.inverse_tolerance)
            .with_max_iterations(self.inverse_iterations);
        let config = LoaderConfig::new()
            .with_initial_grouping(grouping)
            .with_inverse_config(inverse);
        load_sequence_file(&self.sequence, &config)
            .with_context(|| format!("Failed to load {}", self.sequence.display()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise the transforms, stages and output grid of a sequence
    Inspect {
        #[command(flatten)]
        input: SequenceArgs,
    },

    /// Map a point set through the inverse of every transform
    MapPoints {
        #[command(flatten)]
        input: SequenceArgs,

        /// JSON list of [x, y] pairs
        #[arg(short, long)]
        points: PathBuf,

        /// Input points are physical coordinates instead of pixel indices
        #[arg(long)]
        physical_input: bool,

        /// Physical size of one input pixel
        #[arg(long, default_value_t = 1.0)]
        resolution: f64,

        /// Report physical coordinates instead of output pixel indices
        #[arg(long)]
        physical_output: bool,

        /// Write results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Describe the sampling grid handed to a resampler
    ResampleGrid {
        #[command(flatten)]
        input: SequenceArgs,

        /// Change the output spacing before describing the grid
        #[arg(long)]
        spacing: Option<f64>,

        /// Write the (possibly rescaled) sequence here
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { input } => {
            let sequence = input.load()?;
            print_json(&inspect(&sequence)?, None)?;
        }
        Commands::MapPoints {
            input,
            points,
            physical_input,
            resolution,
            physical_output,
            output,
        } => {
            let sequence = input.load()?;
            let mapping = if physical_input {
                PointMapping::default().with_physical_input()
            } else {
                PointMapping::default().with_input_pixels(resolution)
            }
            .with_output_pixels(!physical_output);
            let result = map_points(&sequence, &points, &mapping)?;
            print_json(&result, output.as_deref())?;
        }
        Commands::ResampleGrid { input, spacing, write } => {
            let mut sequence = input.load()?;
            if let Some(spacing) = spacing {
                sequence
                    .set_output_spacing(Spacing2::uniform(spacing))
                    .with_context(|| format!("Cannot resample to spacing {}", spacing))?;
            }
            print_json(&resample_grid(&sequence)?, None)?;
            if let Some(path) = write {
                let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
                write_sequence(&sequence, BufWriter::new(file))?;
                info!("Wrote sequence to {}", path.display());
            }
        }
    }

    Ok(())
}

fn print_json(value: &Value, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            info!("Wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

fn inspect(sequence: &TransformSequence) -> Result<Value> {
    let transforms: Vec<Value> = sequence
        .transforms()
        .iter()
        .zip(sequence.stage_indices())
        .map(|(t, stage)| {
            json!({
                "stage": stage,
                "kind": t.kind().name(),
                "parameters": t.parameters().len(),
                "size": t.output_size(),
                "spacing": t.output_spacing().to_vec(),
                "interpolator": t.resample_interpolator().name(),
            })
        })
        .collect();

    Ok(json!({
        "transforms": transforms,
        "composite_order": sequence.composite_order()?,
        "output_size": sequence.output_size()?,
        "output_spacing": sequence.output_spacing()?.to_vec(),
    }))
}

fn map_points(sequence: &TransformSequence, points: &Path, mapping: &PointMapping) -> Result<Value> {
    let file = File::open(points).with_context(|| format!("Failed to open {}", points.display()))?;
    let coords: Vec<[f64; 2]> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a list of [x, y] pairs", points.display()))?;
    let points: Vec<Point2> = coords.into_iter().map(Point2::new).collect();
    info!("Mapping {} points through {} transforms", points.len(), sequence.len());

    let mapped = sequence.transform_points(&points, mapping)?;

    let rows: Vec<Value> = mapped
        .iter()
        .map(|m| {
            let [x, y] = m.point.to_array();
            let mut row = json!({ "x": x, "y": y, "clamped": m.clamped });
            if let Accuracy::Approximate { residual, converged, .. } = m.accuracy {
                row["residual"] = json!(residual);
                row["converged"] = json!(converged);
            }
            row
        })
        .collect();
    Ok(Value::Array(rows))
}

fn resample_grid(sequence: &TransformSequence) -> Result<Value> {
    let descriptor = sequence.resample_descriptor()?;
    let geometry = descriptor.geometry();
    let linear = descriptor.transform().compose_linear().map(|m| {
        (0..3)
            .map(|r| (0..3).map(|c| m[(r, c)]).collect::<Vec<_>>())
            .collect::<Vec<_>>()
    });

    Ok(json!({
        "size": descriptor.size(),
        "spacing": geometry.spacing().to_vec(),
        "origin": geometry.origin().to_vec(),
        "direction": geometry.direction().to_row_major(),
        "interpolator": descriptor.interpolator().name(),
        "default_pixel_value": descriptor.default_pixel_value(),
        "transforms": descriptor.transform().len(),
        "linear_matrix": linear,
    }))
}
