use clap::{Parser, Subcommand};
use photofit::config::{self, FixerConfig};
use photofit::imaging::{CropRect, RustEncoder, decode, plan_all_anchors};
use photofit::pipeline::{FixOutcome, fix_image, fix_image_with_crop_area, load_and_analyze};
use photofit::platforms::{self, TargetSpec};
use photofit::output;
use photofit::session::validate_upload;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "photofit")]
#[command(about = "Fit a photo to a submission platform's photo requirements")]
#[command(long_about = "\
Fit a photo to a submission platform's photo requirements

Every destination has a pixel size, an aspect ratio, a byte budget and a list
of accepted formats. photofit checks a JPEG or PNG against them and writes a
conforming copy: orientation-corrected, cropped to the ratio, resized, and
compressed until it fits.

Destinations come from the built-in presets plus any [platforms.<id>] tables
in config.toml. Run 'photofit platforms' to list them and
'photofit gen-config' for a documented config.toml.

Set RUST_LOG=info (or debug) to trace each pipeline stage.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a photo against a platform's requirements
    Analyze {
        file: PathBuf,
        #[arg(long)]
        platform: String,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a conforming copy of one or more photos
    Fix {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        platform: String,
        /// Manual crop rectangle in source pixels: X,Y,W,H
        #[arg(long)]
        crop: Option<CropRect>,
        /// Output directory
        #[arg(long, default_value = ".")]
        output: PathBuf,
        /// Worker threads (default: all cores)
        #[arg(long)]
        jobs: Option<usize>,
        /// Print the fix reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the crop each anchor would cut
    CropOptions {
        file: PathBuf,
        #[arg(long)]
        platform: String,
    },
    /// List known platforms
    Platforms,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// One fixed file, ready to report.
struct Written {
    source: PathBuf,
    destination: PathBuf,
    outcome: FixOutcome,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            file,
            platform,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            let spec = platforms::resolve(&platform, &config)?;
            let (bytes, mime) = read_upload(&file, &config)?;
            let (_, analysis) = load_and_analyze(&bytes, mime, &spec, &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                output::print_analysis(&file.display().to_string(), &spec, &analysis);
            }
        }
        Command::Fix {
            files,
            platform,
            crop,
            output: output_dir,
            jobs,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            let spec = platforms::resolve(&platform, &config)?;
            init_thread_pool(jobs);

            let dirs = output_dirs(&output_dir, &files);
            let results: Vec<Result<Written, String>> = files
                .par_iter()
                .zip(dirs.par_iter())
                .map(|(file, dir)| {
                    fix_file(file, dir, &spec, crop, &config)
                        .map_err(|e| format!("{}: {e}", file.display()))
                })
                .collect();

            let mut failures = 0;
            let mut reports = Vec::new();
            for result in results {
                match result {
                    Ok(written) if json => reports.push(serde_json::json!({
                        "source": written.source,
                        "output": written.destination,
                        "result": written.outcome.result,
                    })),
                    Ok(written) => output::print_fix(
                        &written.source.display().to_string(),
                        &written.destination.display().to_string(),
                        &spec,
                        &written.outcome.result,
                    ),
                    Err(message) => {
                        eprintln!("error: {message}");
                        failures += 1;
                    }
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
            if failures > 0 {
                return Err(format!("{failures} of {} files failed", files.len()).into());
            }
        }
        Command::CropOptions { file, platform } => {
            let config = config::load_config(&cli.config)?;
            let spec = platforms::resolve(&platform, &config)?;
            let (bytes, mime) = read_upload(&file, &config)?;
            let image = decode(&bytes, mime)?;
            let plans = plan_all_anchors(
                image.dimensions(),
                spec.dimensions(),
                spec.target_ratio(),
                config.crop.auto_bias,
            );
            output::print_crop_options(image.dimensions(), &spec, &plans);
        }
        Command::Platforms => {
            let config = config::load_config(&cli.config)?;
            output::print_platforms(&platforms::all(&config));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Decode, fix and write one file into `dir`.
fn fix_file(
    file: &Path,
    dir: &Path,
    spec: &TargetSpec,
    crop: Option<CropRect>,
    config: &FixerConfig,
) -> Result<Written, Box<dyn std::error::Error>> {
    let (bytes, mime) = read_upload(file, config)?;
    let (image, analysis) = load_and_analyze(&bytes, mime, spec, config)?;
    let encoder = RustEncoder::new();
    let outcome = match crop {
        Some(crop) => fix_image_with_crop_area(&encoder, &image, spec, crop, config)?,
        None => fix_image(&encoder, &image, spec, &analysis, config)?,
    };

    std::fs::create_dir_all(dir)?;
    let destination = dir.join(outcome.filename(spec));
    std::fs::write(&destination, &outcome.bytes)?;
    Ok(Written {
        source: file.to_path_buf(),
        destination,
        outcome,
    })
}

/// Read a file and run the upload gate on it. The MIME type comes from the
/// extension.
fn read_upload(
    file: &Path,
    config: &FixerConfig,
) -> Result<(Vec<u8>, &'static str), Box<dyn std::error::Error>> {
    let mime = mime_for(file);
    let size = std::fs::metadata(file)?.len();
    validate_upload(size, mime, &config.upload)?;
    Ok((std::fs::read(file)?, mime))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string())
}

/// Destination directory per input. A single input writes straight into
/// `output_dir`; several get one subdirectory each, named after the file
/// stem with `-2`, `-3`, ... appended when stems repeat.
fn output_dirs(output_dir: &Path, files: &[PathBuf]) -> Vec<PathBuf> {
    if files.len() <= 1 {
        return vec![output_dir.to_path_buf(); files.len()];
    }
    let mut taken = HashSet::new();
    files
        .iter()
        .map(|file| {
            let stem = file_stem(file);
            let mut name = stem.clone();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{stem}-{n}");
                n += 1;
            }
            output_dir.join(name)
        })
        .collect()
}

/// Initialize the rayon thread pool.
///
/// Capped at the number of available cores; `--jobs` can only lower it.
fn init_thread_pool(jobs: Option<usize>) {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let threads = jobs.map_or(cores, |j| j.clamp(1, cores));
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
