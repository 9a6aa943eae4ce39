mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use squarify::batch::{BatchDriver, forward_to};
use squarify::config::{self, OutputFormat, SquarifyConfig};
use squarify::framing::{self, BorderColorMode, BorderSizeMode, Color, RustBackend};
use squarify::output::{self, ItemLabel};
use squarify::{export, sources};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "squarify")]
#[command(about = "Frame photos on square canvases")]
#[command(long_about = "\
Frame photos on square canvases

Every photo is placed on a square canvas as large as its longest side,
scaled down to leave room for a border. The border is either a solid
color or a blurred, enlarged copy of the photo.

Border sizes:
  fixed         value is in pixels
  proportional  value is a percentage of the photo's longest side

Settings come from squarify.toml (see 'squarify gen-config'); flags
override the file.")]
#[command(version)]
struct Cli {
    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit diagnostics as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (default: ./squarify.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Flags that override `[border]`.
#[derive(clap::Args, Clone)]
struct BorderArgs {
    /// Border thickness, pixels or percent depending on --size-mode
    #[arg(long)]
    border: Option<f64>,

    #[arg(long, value_enum)]
    size_mode: Option<SizeModeArg>,

    #[arg(long, value_enum)]
    color_mode: Option<ColorModeArg>,

    /// Border color as #rgb, #rrggbb or #rrggbbaa
    #[arg(long)]
    color: Option<Color>,
}

#[derive(Subcommand)]
enum Command {
    /// Frame images and write them to the output directory
    Frame {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "framed")]
        output: PathBuf,

        #[command(flatten)]
        border: BorderArgs,

        /// Pause between images in milliseconds
        #[arg(long)]
        pacing_ms: Option<u64>,

        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Print the layout for a photo size without touching pixels
    Plan {
        width: u32,
        height: u32,

        #[command(flatten)]
        border: BorderArgs,
    },
    /// Print a stock squarify.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum SizeModeArg {
    Fixed,
    Proportional,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorModeArg {
    Color,
    Blur,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
    Webp,
}

impl BorderArgs {
    fn apply(&self, config: &mut SquarifyConfig) {
        if let Some(value) = self.border {
            config.border.value = value;
        }
        if let Some(mode) = self.size_mode {
            config.border.size_mode = match mode {
                SizeModeArg::Fixed => BorderSizeMode::Fixed,
                SizeModeArg::Proportional => BorderSizeMode::Proportional,
            };
        }
        if let Some(mode) = self.color_mode {
            config.border.color_mode = match mode {
                ColorModeArg::Color => BorderColorMode::SolidColor,
                ColorModeArg::Blur => BorderColorMode::BlurredPhoto,
            };
        }
        if let Some(color) = self.color {
            config.border.color = color;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    match cli.command {
        Command::Frame {
            inputs,
            output,
            border,
            pacing_ms,
            format,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            border.apply(&mut config);
            if let Some(ms) = pacing_ms {
                config.batch.pacing_ms = ms;
            }
            if let Some(format) = format {
                config.output.format = match format {
                    FormatArg::Png => OutputFormat::Png,
                    FormatArg::Jpeg => OutputFormat::Jpeg,
                    FormatArg::Webp => OutputFormat::Webp,
                };
            }
            config.validate()?;
            init_thread_pool(&config.processing);
            run_frame(&inputs, &output, &config)?;
        }
        Command::Plan {
            width,
            height,
            border,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            border.apply(&mut config);
            config.validate()?;
            let frame_config = config.frame_config();
            let plan = framing::plan_frame(width, height, &frame_config)?;
            output::print_plan(width, height, &frame_config, &plan);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `--config`, or `./squarify.toml` when present.
fn load_config(explicit: Option<&Path>) -> Result<SquarifyConfig, Box<dyn std::error::Error>> {
    match explicit {
        Some(path) if !path.exists() => {
            Err(format!("config file not found: {}", path.display()).into())
        }
        Some(path) => Ok(config::load_config(path)?),
        None => Ok(config::load_config(Path::new(config::CONFIG_FILE_NAME))?),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn run_frame(
    inputs: &[PathBuf],
    out_dir: &Path,
    config: &SquarifyConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = sources::discover(inputs)?;
    if paths.is_empty() {
        println!("No images found");
        return Ok(());
    }

    std::fs::create_dir_all(out_dir)?;
    let targets = export::output_paths(&paths, out_dir, &config.output);
    let labels: Vec<ItemLabel> = paths
        .iter()
        .zip(&targets)
        .map(|(source, target)| ItemLabel {
            source: source
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string()),
            target: target.display().to_string(),
        })
        .collect();

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_batch_event(&event, &labels) {
                println!("{}", line);
            }
        }
    });

    // Decode one pool-width chunk at a time so only that many photos are resident
    let loader = sources::ChunkedLoader::new(&paths, config::effective_threads(&config.processing));
    let driver = BatchDriver::new(RustBackend::new()).with_pacing(config.pacing());
    let result = driver.frame_stream(
        loader,
        &config.frame_config(),
        forward_to(tx),
        |index, framed| export::save(&framed, &targets[index], &config.output),
    );
    printer.join().map_err(|_| "output thread panicked")?;
    let summary = result?;

    if summary.failed > 0 {
        return Err(format!("{} framed images could not be saved", summary.failed).into());
    }
    Ok(())
}
