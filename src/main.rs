use clap::Parser;
use clap::error::ErrorKind;
use std::path::PathBuf;

use karyoscan::{DebugOutput, DetectionConfig, DetectionPipeline, DetectionReport, load_image};

#[derive(Parser)]
#[command(name = "karyoscan")]
#[command(about = "Count and classify chromosomes in a stained microscope image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON detection config (missing fields use defaults)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Regions must be larger than this many pixels
    #[arg(long)]
    min_area: Option<u32>,

    /// Regions must be smaller than this many pixels
    #[arg(long)]
    max_area: Option<u32>,

    /// Regions must have height / width above this
    #[arg(long)]
    min_aspect_ratio: Option<f64>,

    /// Fraction of the peak distance that seeds the watershed
    #[arg(long)]
    seed_fraction: Option<f64>,

    /// Erosion/dilation repetitions of the 3x3 opening
    #[arg(long)]
    open_iterations: Option<u8>,

    /// Dilation/erosion repetitions of the 3x3 closing
    #[arg(long)]
    close_iterations: Option<u8>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Save intermediate stage images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

impl Cli {
    fn detection_config(&self) -> anyhow::Result<DetectionConfig> {
        let mut config = match &self.config {
            Some(path) => DetectionConfig::load_json(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))?,
            None => DetectionConfig::default(),
        };

        if let Some(v) = self.min_area {
            config = config.with_min_area(v);
        }
        if let Some(v) = self.max_area {
            config = config.with_max_area(v);
        }
        if let Some(v) = self.min_aspect_ratio {
            config = config.with_min_aspect_ratio(v);
        }
        if let Some(v) = self.seed_fraction {
            config = config.with_seed_fraction(v);
        }
        if self.open_iterations.is_some() || self.close_iterations.is_some() {
            let open = self.open_iterations.unwrap_or(config.open_iterations);
            let close = self.close_iterations.unwrap_or(config.close_iterations);
            config = config.with_morphology(open, close);
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = args.detection_config()?;

    // Prepare the debug directory before doing any work
    let debug = args.debug_out.clone().map(DebugOutput::new).transpose()?;

    log::info!("Loading image: {}", args.image_path.display());
    let img = load_image(&args.image_path)?;
    log::info!("Image loaded: {}x{}", img.width(), img.height());

    let pipeline = DetectionPipeline::new().with_config(config.clone());
    let (result, stages) = pipeline.detect_traced(&img)?;

    if let Some(debug) = &debug {
        let written = debug.save(&stages)?;
        log::info!(
            "Saved {} intermediate images to {}",
            written.len(),
            debug.output_dir.display()
        );
    }

    let report = DetectionReport::new(result, config.outlier_z_threshold);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.summary());

    if !report.result.is_empty() {
        println!(
            "\n{:>4} {:>7} {:>7} {:>5} {:>5} {:>6} {:>6}  {}",
            "id", "area", "perim", "w", "h", "h/w", "c.i.", "class"
        );
        for r in &report.result.records {
            println!(
                "{:>4} {:>7} {:>7.1} {:>5} {:>5} {:>6.2} {:>6.3}  {}",
                r.id,
                r.area,
                r.perimeter,
                r.bounding_width,
                r.bounding_height,
                r.aspect_ratio,
                r.centromeric_index,
                r.classification
            );
        }
    }

    let outliers: Vec<_> = report.outliers().collect();
    if !outliers.is_empty() {
        println!(
            "\nPotential abnormal chromosomes (|z| > {}):",
            config.outlier_z_threshold
        );
        for score in outliers {
            println!("  #{} area={} z={:.2}", score.id, score.area, score.z_score);
        }
    }

    Ok(())
}
