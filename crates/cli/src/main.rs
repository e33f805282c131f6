//! SelvaGis CLI - land-cover classification and deforestation detection

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use selvagis_algorithms::classification::{
    accuracy, confusion_matrix, AnyClassifier, ClassificationReport, Classifier, FeatureSchema,
    MinMaxScaler, SampleSet, TrainedModel,
};
use selvagis_algorithms::imagery::{
    index_difference, ndvi_eps, vegetation_loss, ChangeParams, NDVI_EPSILON,
};
use selvagis_colormap::{
    render_png, save_png, ColorScheme, ColormapParams, LandCoverLegend,
};
use selvagis_core::io::{read_raster, read_stack, write_raster};
use selvagis_core::{BandStack, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "selvagis")]
#[command(author, version, about = "Land-cover classification and deforestation detection", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a multispectral image
    Info {
        /// Input image file
        input: PathBuf,
    },
    /// Spectral index computation
    Index {
        #[command(subcommand)]
        algorithm: IndexCommands,
    },
    /// Train a land-cover classifier from labeled pixels
    Train {
        /// Input multispectral image
        image: PathBuf,
        /// Ground-truth label raster (positive class codes, 0 = unlabeled)
        labels: PathBuf,
        /// Output model artifact (JSON)
        output: PathBuf,
        /// Classifier: rf, tree, knn, logistic, svm
        #[arg(short, long, default_value = "rf")]
        classifier: String,
        /// 0-indexed red band
        #[arg(long, default_value = "2")]
        red: usize,
        /// 0-indexed NIR band
        #[arg(long, default_value = "3")]
        nir: usize,
        /// Cap on training samples after shuffling
        #[arg(long, default_value = "100000")]
        sample_cap: usize,
        /// Fraction of samples used for training
        #[arg(long, default_value = "0.8")]
        train_split: f64,
        /// Random seed for sample shuffling and splitting
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Print the per-class validation report
        #[arg(long)]
        report: bool,
        /// Print the validation confusion matrix
        #[arg(long)]
        confusion: bool,
    },
    /// Train every classifier and compare validation accuracy
    Compare {
        /// Input multispectral image
        image: PathBuf,
        /// Ground-truth label raster
        labels: PathBuf,
        /// 0-indexed red band
        #[arg(long, default_value = "2")]
        red: usize,
        /// 0-indexed NIR band
        #[arg(long, default_value = "3")]
        nir: usize,
        /// Cap on training samples after shuffling
        #[arg(long, default_value = "100000")]
        sample_cap: usize,
        /// Fraction of samples used for training
        #[arg(long, default_value = "0.8")]
        train_split: f64,
        /// Random seed for sample shuffling and splitting
        #[arg(long, default_value = "42")]
        seed: u64,
    },
    /// Classify a full image with a trained model
    Classify {
        /// Input multispectral image
        image: PathBuf,
        /// Trained model artifact (JSON)
        model: PathBuf,
        /// Output class-code raster
        output: PathBuf,
        /// Also render a colored PNG of the classified map
        #[arg(long)]
        png: Option<PathBuf>,
        /// Classify pixels without spectral coverage too
        #[arg(long)]
        unmasked: bool,
    },
    /// Detect vegetation loss between two acquisitions
    Change {
        /// Earlier multispectral image
        before: PathBuf,
        /// Later multispectral image
        after: PathBuf,
        /// Output loss-mask raster (1 = loss, 0 = stable)
        output: PathBuf,
        /// 0-indexed red band
        #[arg(long, default_value = "2")]
        red: usize,
        /// 0-indexed NIR band
        #[arg(long, default_value = "3")]
        nir: usize,
        /// NDVI drop that counts as loss (strictly greater)
        #[arg(short, long, default_value = "0.2")]
        threshold: f64,
        /// Also write the NDVI difference raster (after - before)
        #[arg(long)]
        diff: Option<PathBuf>,
        /// Also render a PNG of the loss mask
        #[arg(long)]
        png: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum IndexCommands {
    /// NDVI: Normalized Difference Vegetation Index
    Ndvi {
        /// Input multispectral image
        image: PathBuf,
        /// Output file
        output: PathBuf,
        /// 0-indexed red band
        #[arg(long, default_value = "2")]
        red: usize,
        /// 0-indexed NIR band
        #[arg(long, default_value = "3")]
        nir: usize,
        /// Also render a PNG with the vegetation ramp
        #[arg(long)]
        png: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("logging already initialized");
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_image(path: &PathBuf) -> Result<BandStack<f64>> {
    let pb = spinner("Reading image...");
    let stack: BandStack<f64> = read_stack(path).context("Failed to read image")?;
    pb.finish_and_clear();
    info!(
        "Input: {} x {}, {} bands",
        stack.cols(),
        stack.rows(),
        stack.bands()
    );
    Ok(stack)
}

fn read_labels(path: &PathBuf) -> Result<Raster<i32>> {
    let pb = spinner("Reading labels...");
    let labels: Raster<i32> = read_raster(path).context("Failed to read label raster")?;
    pb.finish_and_clear();
    Ok(labels)
}

fn write_f64(raster: &Raster<f64>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_raster(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn write_i32(raster: &Raster<i32>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_raster(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn write_u8(raster: &Raster<u8>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_raster(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Two NDVI rasters for one band from each acquisition
fn scene_ndvi(stack: &BandStack<f64>, red: usize, nir: usize) -> Result<Raster<f64>> {
    let red_band = stack.band(red).context("Red band out of range")?;
    let nir_band = stack.band(nir).context("NIR band out of range")?;
    Ok(ndvi_eps(&nir_band, &red_band, NDVI_EPSILON)?)
}

struct TrainingRun {
    schema: FeatureSchema,
    scaler: MinMaxScaler,
    train_x: ndarray::Array2<f64>,
    train_y: ndarray::Array1<i32>,
    val_x: ndarray::Array2<f64>,
    val_y: ndarray::Array1<i32>,
}

/// Shared preparation: feature matrix, sample selection, shuffle, cap,
/// split and scaling. Mirrors the training sequence the models expect.
fn prepare_samples(
    image: &PathBuf,
    labels: &PathBuf,
    red: usize,
    nir: usize,
    sample_cap: usize,
    train_split: f64,
    seed: u64,
) -> Result<TrainingRun> {
    let stack = read_image(image)?;
    let label_grid = read_labels(labels)?;

    let schema = FeatureSchema::bands_with_ndvi(stack.bands(), red, nir)?;
    let matrix = schema.build_matrix(&stack)?;

    let mut set = SampleSet::select_labeled(&matrix, &stack, &label_grid)?;
    if set.is_empty() {
        anyhow::bail!("No labeled pixels with spectral coverage found");
    }
    info!("Selected {} labeled pixels", set.len());

    let mut rng = StdRng::seed_from_u64(seed);
    set.shuffle(&mut rng);
    set.truncate(sample_cap);
    let (train, val) = set.split(train_split, &mut rng)?;
    info!("Training on {}, validating on {}", train.len(), val.len());

    let scaler = MinMaxScaler::fit(&train.features)?;
    let train_x = scaler.transform(&train.features)?;
    let val_x = scaler.transform(&val.features)?;

    Ok(TrainingRun {
        schema,
        scaler,
        train_x,
        train_y: train.labels,
        val_x,
        val_y: val.labels,
    })
}

fn print_confusion(run: &TrainingRun, predicted: &ndarray::Array1<i32>) -> Result<()> {
    let legend = LandCoverLegend::default();
    let codes = legend.codes();
    let matrix = confusion_matrix(&run.val_y, predicted, &codes)?;

    println!("\nConfusion matrix (rows = truth, cols = predicted):");
    print!("{:>6}", "");
    for code in &codes {
        print!("{:>8}", code);
    }
    println!();
    for (i, code) in codes.iter().enumerate() {
        print!("{:>6}", code);
        for j in 0..codes.len() {
            print!("{:>8}", matrix[(i, j)]);
        }
        println!();
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let stack = read_image(&input)?;
            let bounds = stack.bounds();

            println!("File: {}", input.display());
            println!(
                "Dimensions: {} x {} ({} pixels, {} bands)",
                stack.cols(),
                stack.rows(),
                stack.pixels(),
                stack.bands()
            );
            println!("Cell size: {}", stack.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = stack.crs() {
                println!("CRS: {}", crs);
            }

            println!("\nPer-band statistics:");
            for b in 0..stack.bands() {
                let band = stack.band(b)?;
                let stats = band.statistics();
                match (stats.min, stats.max, stats.mean) {
                    (Some(min), Some(max), Some(mean)) => println!(
                        "  band {}: min {:.4}  max {:.4}  mean {:.4}  valid {}",
                        b + 1,
                        min,
                        max,
                        mean,
                        stats.valid_count
                    ),
                    _ => println!("  band {}: no valid pixels", b + 1),
                }
            }
        }

        // ── Index ────────────────────────────────────────────────────
        Commands::Index { algorithm } => match algorithm {
            IndexCommands::Ndvi {
                image,
                output,
                red,
                nir,
                png,
            } => {
                let stack = read_image(&image)?;
                let start = Instant::now();
                let result = scene_ndvi(&stack, red, nir)?;
                let elapsed = start.elapsed();
                write_f64(&result, &output)?;
                done("NDVI", &output, elapsed);

                if let Some(png_path) = png {
                    let params =
                        ColormapParams::with_range(ColorScheme::RedYellowGreen, -1.0, 1.0);
                    render_png(&result, &params, &png_path)
                        .context("Failed to render NDVI PNG")?;
                    println!("  PNG: {}", png_path.display());
                }
            }
        },

        // ── Train ────────────────────────────────────────────────────
        Commands::Train {
            image,
            labels,
            output,
            classifier,
            red,
            nir,
            sample_cap,
            train_split,
            seed,
            report,
            confusion,
        } => {
            let run = prepare_samples(
                &image,
                &labels,
                red,
                nir,
                sample_cap,
                train_split,
                seed,
            )?;

            let mut model = AnyClassifier::by_name(&classifier)?;
            info!("Fitting {}", model.name());
            let start = Instant::now();
            model.fit(&run.train_x, &run.train_y)?;
            let elapsed = start.elapsed();

            let predicted = model.predict(&run.val_x)?;
            let acc = accuracy(&run.val_y, &predicted)?;
            println!("{}: validation accuracy {:.4}", model.name(), acc);

            if report {
                let legend = LandCoverLegend::default();
                let report =
                    ClassificationReport::compute(&run.val_y, &predicted, &legend.named_codes())?;
                println!("\n{}", report);
            }
            if confusion {
                print_confusion(&run, &predicted)?;
            }

            let artifact = TrainedModel::new(run.schema, run.scaler, model);
            artifact.save(&output).context("Failed to save model")?;
            done("Model", &output, elapsed);
        }

        // ── Compare ──────────────────────────────────────────────────
        Commands::Compare {
            image,
            labels,
            red,
            nir,
            sample_cap,
            train_split,
            seed,
        } => {
            let run = prepare_samples(
                &image,
                &labels,
                red,
                nir,
                sample_cap,
                train_split,
                seed,
            )?;

            println!("{:<24} {:>10} {:>12}", "model", "accuracy", "fit time");
            for mut model in AnyClassifier::default_suite() {
                let start = Instant::now();
                model.fit(&run.train_x, &run.train_y)?;
                let elapsed = start.elapsed();

                let predicted = model.predict(&run.val_x)?;
                let acc = accuracy(&run.val_y, &predicted)?;
                println!("{:<24} {:>10.4} {:>12.2?}", model.name(), acc, elapsed);
            }
        }

        // ── Classify ─────────────────────────────────────────────────
        Commands::Classify {
            image,
            model,
            output,
            png,
            unmasked,
        } => {
            let stack = read_image(&image)?;
            let artifact = TrainedModel::load(&model).context("Failed to load model")?;
            info!("Loaded {} model", artifact.classifier().name());

            let start = Instant::now();
            let map = artifact.predict_map(&stack, !unmasked)?;
            let elapsed = start.elapsed();
            write_i32(&map, &output)?;
            done("Classified map", &output, elapsed);

            if let Some(png_path) = png {
                let legend = LandCoverLegend::default();
                let rgba = legend.classified_to_rgba(&map);
                save_png(&png_path, rgba, map.cols(), map.rows())
                    .context("Failed to render classified PNG")?;
                println!("  PNG: {}", png_path.display());
            }
        }

        // ── Change ───────────────────────────────────────────────────
        Commands::Change {
            before,
            after,
            output,
            red,
            nir,
            threshold,
            diff,
            png,
        } => {
            let before_stack = read_image(&before)?;
            let after_stack = read_image(&after)?;

            let start = Instant::now();
            let before_ndvi = scene_ndvi(&before_stack, red, nir)?;
            let after_ndvi = scene_ndvi(&after_stack, red, nir)?;

            let (mask, summary) = vegetation_loss(
                &before_ndvi,
                &after_ndvi,
                ChangeParams {
                    loss_threshold: threshold,
                },
            )?;
            let elapsed = start.elapsed();

            write_u8(&mask, &output)?;
            done("Loss mask", &output, elapsed);
            println!(
                "Vegetation loss: {} of {} pixels ({:.2}%)",
                summary.flagged_pixels,
                summary.total_pixels,
                summary.percent()
            );

            if let Some(diff_path) = diff {
                let difference = index_difference(&before_ndvi, &after_ndvi)?;
                write_f64(&difference, &diff_path)?;
                println!("  NDVI difference: {}", diff_path.display());
            }
            if let Some(png_path) = png {
                let params = ColormapParams::with_range(ColorScheme::Reds, 0.0, 1.0);
                render_png(&mask, &params, &png_path)
                    .context("Failed to render loss-mask PNG")?;
                println!("  PNG: {}", png_path.display());
            }
        }
    }

    Ok(())
}
