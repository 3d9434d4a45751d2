use std::env;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use frame_export_core::export::domain::render_state::RenderState;
use frame_export_core::export::exporter::Exporter;
use frame_export_core::export::infrastructure::png_file_writer::PngFileWriter;
use frame_export_core::shared::constants::{
    DEFAULT_EXPORT_HEIGHT, DEFAULT_EXPORT_WIDTH, DEFAULT_FILE_NAME, IMAGE_FOLDER_NAME,
};
use frame_export_core::scene::infrastructure::scene_renderer::SceneRenderer;
use frame_export_core::shared::rect_size::RectSize;
use frame_export_core::time::domain::clock::Clock;
use frame_export_core::time::infrastructure::simulation_clock::SimulationClock;

#[cfg(feature = "image-sequence")]
use frame_export_core::export::sequence_exporter::SequenceStep;
#[cfg(feature = "image-sequence")]
use frame_export_core::shared::constants::SEQUENCE_FOLDER_NAME;

/// Render the demo scene and export it as PNG files.
#[derive(Parser)]
#[command(name = "frame-export", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a single PNG snapshot.
    Image(ImageArgs),
    /// Export a fixed-timestep sequence of numbered PNG frames.
    #[cfg(feature = "image-sequence")]
    Sequence(SequenceArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Export width in pixels.
    #[arg(long, default_value_t = DEFAULT_EXPORT_WIDTH)]
    width: u32,

    /// Export height in pixels.
    #[arg(long, default_value_t = DEFAULT_EXPORT_HEIGHT)]
    height: u32,

    /// Render on the GPU (falls back to the CPU if no adapter is found).
    #[arg(long)]
    gpu: bool,
}

#[derive(Args)]
struct ImageArgs {
    #[command(flatten)]
    render: RenderArgs,

    /// Folder the PNG is written to.
    #[arg(long, default_value = IMAGE_FOLDER_NAME)]
    output_dir: PathBuf,

    /// File name without extension.
    #[arg(long, default_value = DEFAULT_FILE_NAME)]
    name: String,

    /// Animation time to capture, in seconds.
    #[arg(long, default_value = "0.0")]
    time: f64,

    /// Overwrite an existing file instead of picking a free name.
    #[arg(long)]
    overwrite: bool,
}

#[cfg(feature = "image-sequence")]
#[derive(Args)]
struct SequenceArgs {
    #[command(flatten)]
    render: RenderArgs,

    /// Folder the numbered frames are written to.
    #[arg(long, default_value = SEQUENCE_FOLDER_NAME)]
    output_dir: PathBuf,

    /// Frames per second of animation time.
    #[arg(long, default_value = "30.0")]
    fps: f64,

    /// Start of the exported range, in seconds.
    #[arg(long, default_value = "0.0")]
    from: f64,

    /// End of the exported range, in seconds.
    #[arg(long, default_value = "10.0")]
    to: f64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Image(args) => run_image(args),
        #[cfg(feature = "image-sequence")]
        Command::Sequence(args) => run_sequence(args),
    }
}

fn run_image(args: ImageArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_name(&args.name)?;
    let (mut render_state, mut renderer) = setup(&args.render)?;
    let mut exporter = image_exporter(&env::current_dir()?, &args);

    let mut clock = SimulationClock::new();
    clock.set_time(args.time);

    exporter.begin_image_export(&mut render_state)?;
    renderer.render(render_state.size(), clock.time())?;
    let path = exporter.end_image_export(renderer.source(), &mut render_state)?;

    log::info!("Output written to {}", path.display());
    println!("{}", path.display());
    Ok(())
}

/// Exporter rooted at `root` whose snapshot target is `--output-dir/--name`.
fn image_exporter(root: &Path, args: &ImageArgs) -> Exporter {
    let mut exporter = Exporter::new(root, Box::new(PngFileWriter::new()));
    exporter.set_image_folder(&args.output_dir);
    exporter.set_image_file_name(args.name.clone());
    if args.overwrite {
        if exporter.show_file_exists_warning() {
            log::warn!("Overwriting {}", exporter.image_output_path().display());
        }
    } else {
        exporter.find_available_file_name();
    }
    exporter
}

#[cfg(feature = "image-sequence")]
fn run_sequence(args: SequenceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut render_state, mut renderer) = setup(&args.render)?;
    let mut exporter = sequence_exporter(&env::current_dir()?, &args);

    let mut clock = SimulationClock::new();
    exporter.begin_sequence_export(&mut render_state, &mut clock)?;

    loop {
        renderer.render(render_state.size(), clock.time())?;
        match exporter.update(renderer.source(), &mut render_state, &mut clock)? {
            SequenceStep::Exported { .. } => {
                if let Some(progress) = exporter.sequence().progress() {
                    eprint!(
                        "\r{}, {}   ",
                        progress.label(),
                        progress.remaining_label()
                    );
                }
            }
            SequenceStep::Finished | SequenceStep::Idle => break,
        }
        clock.update();
    }
    eprintln!();

    log::info!("Frames written to {}", args.output_dir.display());
    Ok(())
}

#[cfg(feature = "image-sequence")]
fn sequence_exporter(root: &Path, args: &SequenceArgs) -> Exporter {
    let mut exporter = Exporter::new(root, Box::new(PngFileWriter::new()));
    let settings = exporter.sequence_mut().settings_mut();
    settings.folder = args.output_dir.clone();
    settings.fps = args.fps;
    settings.begin_s = args.from;
    settings.end_s = args.to;
    exporter
}

fn setup(
    args: &RenderArgs,
) -> Result<(RenderState, SceneRenderer), Box<dyn std::error::Error>> {
    let size = RectSize::new(args.width, args.height)?;
    let mut render_state = RenderState::new(size);
    render_state.set_export_size(args.width, args.height)?;

    let renderer = if args.gpu {
        SceneRenderer::gpu_or_cpu(size)
    } else {
        SceneRenderer::cpu(size)
    };
    log::info!(
        "Rendering {size} on the {}",
        if renderer.is_gpu() { "GPU" } else { "CPU" }
    );
    Ok((render_state, renderer))
}

fn validate_name(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    if name.trim().is_empty() {
        return Err("File name must not be empty".into());
    }
    if name.contains(['/', '\\']) {
        return Err(format!("File name must not contain path separators, got '{name}'").into());
    }
    Ok(())
}
