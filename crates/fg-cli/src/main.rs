use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use fg_chan::{Channel, ChannelError, StringStream};
use fg_core::AnyObject;

#[derive(Parser)]
#[command(name = "fg", about = "Inspect, convert, and evaluate serialized frame graphs")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical dump of every object in a file
    Show {
        file: PathBuf,

        /// Wire format of the file
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Convert a stream from one wire format to another
    Convert {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        from: Format,

        #[arg(long, value_enum, default_value = "xml")]
        to: Format,
    },

    /// Evaluate the first object in a file on a point
    Apply {
        file: PathBuf,

        /// Comma-separated coordinates, e.g. --point 1.5,2.0
        #[arg(long)]
        point: String,

        /// Apply the inverse transform instead of the forward one
        #[arg(long)]
        inverse: bool,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List the frames of a frame set with their domains
    Domains {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Xml,
    Json,
}

fn open_channel(path: &Path, format: Format) -> Result<Channel> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let stream = StringStream::from_string(contents);
    Ok(match format {
        Format::Text => Channel::text(stream),
        Format::Xml => Channel::xml(stream),
        Format::Json => Channel::json(stream),
    })
}

fn read_all(chan: &mut Channel, path: &Path) -> Result<Vec<AnyObject>> {
    let mut objects = Vec::new();
    loop {
        match chan.read() {
            Ok(obj) => objects.push(obj),
            Err(ChannelError::EndOfStream) => break,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to decode {}", path.display()));
            }
        }
    }
    if objects.is_empty() {
        bail!("{} contains no objects", path.display());
    }
    Ok(objects)
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Show { file, format } => cmd_show(file, *format),
        Commands::Convert {
            input,
            output,
            from,
            to,
        } => cmd_convert(input, output, *from, *to),
        Commands::Apply {
            file,
            point,
            inverse,
            format,
        } => cmd_apply(file, point, *inverse, *format),
        Commands::Domains { file, format } => cmd_domains(file, *format),
    }
}

fn cmd_show(file: &Path, format: Format) -> Result<()> {
    let mut chan = open_channel(file, format)?;
    for obj in read_all(&mut chan, file)? {
        print!("{}", obj.show());
    }
    Ok(())
}

fn cmd_convert(input: &Path, output: &Path, from: Format, to: Format) -> Result<()> {
    let mut in_chan = open_channel(input, from)?;
    let objects = read_all(&mut in_chan, input)?;

    let mut out_chan = match to {
        Format::Text => Channel::text(StringStream::new()),
        Format::Xml => Channel::xml(StringStream::new()),
        Format::Json => Channel::json(StringStream::new()),
    };
    for obj in &objects {
        match obj {
            AnyObject::Frame(x) => out_chan.write(x)?,
            AnyObject::Mapping(x) => out_chan.write(x)?,
            AnyObject::FrameSet(x) => out_chan.write(x)?,
        }
    }
    std::fs::write(output, out_chan.stream().contents())
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("converted {} object(s) to {}", objects.len(), output.display());
    Ok(())
}

fn cmd_apply(file: &Path, point: &str, inverse: bool, format: Format) -> Result<()> {
    let coords: Vec<f64> = point
        .split(',')
        .map(|t| t.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("bad point '{point}'"))?;

    let mut chan = open_channel(file, format)?;
    let obj = read_all(&mut chan, file)?.remove(0);
    let out = match (&obj, inverse) {
        (AnyObject::Frame(f), false) => f.apply_forward_point(&coords),
        (AnyObject::Frame(f), true) => f.apply_inverse_point(&coords),
        (AnyObject::Mapping(m), false) => m.apply_forward_point(&coords),
        (AnyObject::Mapping(m), true) => m.apply_inverse_point(&coords),
        (AnyObject::FrameSet(s), false) => s.apply_forward_point(&coords),
        (AnyObject::FrameSet(s), true) => s.apply_inverse_point(&coords),
    }
    .with_context(|| format!("failed to transform {point}"))?;

    let rendered: Vec<String> = out.iter().map(|v| v.to_string()).collect();
    println!("{}", rendered.join(" "));
    Ok(())
}

fn cmd_domains(file: &Path, format: Format) -> Result<()> {
    let mut chan = open_channel(file, format)?;
    let set = read_all(&mut chan, file)?
        .remove(0)
        .into_frame_set()
        .context("file does not start with a frame set")?;

    for index in 1..=set.n_frame() as i32 {
        let frame = set.get_frame(index)?;
        let domain = if frame.domain().is_empty() {
            "(none)"
        } else {
            frame.domain()
        };
        let mut line = format!("{index:3}  {domain:<16} {} axes", frame.naxes());
        if index == set.base() {
            line.push_str("  [base]");
        }
        if index == set.current() {
            line.push_str("  [current]");
        }
        println!("{line}");
    }
    Ok(())
}
