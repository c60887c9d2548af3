//! hdfobj - Inspect HDF object-model datatypes, selections and values.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hdf_object::data::{Attribute, DataBuffer};
use hdf_object::datatype::{self, DatatypeArena, DatatypeClass, TypeId};
use hdf_object::selection::Selection;
use hdf_object::util::{ObjectConfig, RenderConfig};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "hdfobj")]
#[command(about = "Inspect HDF object-model datatypes, selections and values", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable logging to specified file
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the flattened members of a compound datatype
    Flatten {
        /// Datatype expression, e.g. "{a:i32, b:f32[5]}"
        #[arg(value_name = "TYPE")]
        type_expr: String,
    },
    /// Show the default selection over a shape
    Select {
        /// Comma-separated dimensions, e.g. "2,3,4"
        dims: String,
    },
    /// Render values of a datatype as text
    Render {
        /// Datatype expression of the values
        #[arg(long = "type", value_name = "TYPE")]
        type_expr: String,

        /// Text placed between values
        #[arg(long, default_value = ", ")]
        delimiter: String,

        /// Maximum number of values to render
        #[arg(long)]
        max: Option<usize>,

        /// Values in storage order
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_path) = &args.log {
        init_logging(log_path)?;
        tracing::info!("Starting hdfobj");
    }

    let output = match args.command {
        Command::Flatten { type_expr } => flatten(&type_expr)?,
        Command::Select { dims } => select(&dims)?,
        Command::Render {
            type_expr,
            delimiter,
            max,
            values,
        } => {
            let mut config = RenderConfig::with_delimiter(delimiter);
            config.max_items = max;
            render(&type_expr, &values, &config)?
        }
    };
    println!("{}", output);

    if args.log.is_some() {
        tracing::info!("hdfobj exited");
    }
    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn parse_expr(type_expr: &str) -> Result<(DatatypeArena, TypeId)> {
    datatype::parse_type(type_expr).with_context(|| format!("Invalid datatype expression '{}'", type_expr))
}

fn flatten(type_expr: &str) -> Result<String> {
    let (arena, root) = parse_expr(type_expr)?;
    let members = datatype::flatten(&arena, root, ObjectConfig::default().member_separator);
    if members.member_count() == 0 {
        return Ok(format!("{}: no compound members", arena.description(root)));
    }
    let lines: Vec<String> = (0..members.member_count())
        .map(|i| {
            let name = members.display_name(i).unwrap_or_default();
            let description = members.types()[i].map_or_else(|| "Unknown".to_string(), |ty| arena.description(ty));
            let mut line = format!("{}\t{}\t{}", name, description, members.orders()[i]);
            if let Some(dims) = members.member_dims(i) {
                line.push_str(&format!("\t{:?}", dims));
            }
            line
        })
        .collect();
    Ok(lines.join("\n"))
}

fn select(dims: &str) -> Result<String> {
    let dims = dims
        .split(',')
        .map(|d| d.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid dimensions '{}'", dims))?;
    let selection = Selection::new(&dims);
    Ok([
        format!("rank:    {}", selection.rank()),
        format!("start:   {:?}", selection.start()),
        format!("count:   {:?}", selection.count()),
        format!("stride:  {:?}", selection.stride()),
        format!("display: {:?}", selection.display_axes()),
        format!("points:  {}", selection.selected_points()),
        format!("height:  {}", selection.height()),
        format!("width:   {}", selection.width()),
    ]
    .join("\n"))
}

fn parse_int(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .or_else(|_| value.parse::<u64>().map(|v| v as i64))
        .with_context(|| format!("Invalid integer '{}'", value))
}

fn buffer_for(arena: &DatatypeArena, id: TypeId, values: &[String]) -> Result<DataBuffer> {
    let dt = arena.resolve(id)?;
    let buffer = match dt.class {
        DatatypeClass::Integer | DatatypeClass::Enum | DatatypeClass::Char | DatatypeClass::Bitfield => {
            let ints = values.iter().map(|v| parse_int(v)).collect::<Result<Vec<_>>>()?;
            match dt.size {
                1 => DataBuffer::I8(ints.iter().map(|&v| v as i8).collect()),
                2 => DataBuffer::I16(ints.iter().map(|&v| v as i16).collect()),
                4 => DataBuffer::I32(ints.iter().map(|&v| v as i32).collect()),
                _ => DataBuffer::I64(ints),
            }
        }
        DatatypeClass::Float => {
            let floats = values
                .iter()
                .map(|v| v.parse::<f64>().with_context(|| format!("Invalid number '{}'", v)))
                .collect::<Result<Vec<_>>>()?;
            if dt.size == 4 {
                DataBuffer::F32(floats.iter().map(|&v| v as f32).collect())
            } else {
                DataBuffer::F64(floats)
            }
        }
        DatatypeClass::String => DataBuffer::from(values.to_vec()),
        _ => bail!("Values of type '{}' cannot be given on the command line", dt.description()),
    };
    Ok(buffer)
}

fn render(type_expr: &str, values: &[String], config: &RenderConfig) -> Result<String> {
    let (arena, root) = parse_expr(type_expr)?;
    let element = arena.element_id(root);
    let buffer = buffer_for(&arena, element, values)?;
    let mut attribute = Attribute::new("value", arena, element, Some(vec![values.len()]));
    attribute.set_value(buffer);
    tracing::debug!("render {} values of {}", values.len(), type_expr);
    Ok(attribute.to_display_string(config))
}
