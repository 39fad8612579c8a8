use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use stickers::{BoundingBox, DetectorConfig, StickerDetector, load_image, summarize};

#[derive(Parser)]
#[command(name = "stickers")]
#[command(about = "Detect and count colored sticker markers in an image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// JSON file overriding detector thresholds
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ignore a region by its exact bounding box (repeatable)
    #[arg(long, value_name = "X,Y,W,H", value_parser = parse_bbox)]
    exclude: Vec<BoundingBox>,

    /// Save debug outputs to directory (must be empty); the run lands in run_01/
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print every detection, not only the summary
    #[arg(long)]
    detections: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>().map_err(|e| format!("invalid number '{}': {}", p, e)))
        .collect::<Result<_, _>>()?;

    match parts.as_slice() {
        [x, y, width, height] => Ok(BoundingBox {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }),
        _ => Err(format!("expected X,Y,W,H, got '{}'", s)),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => DetectorConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DetectorConfig::default(),
    }
    .with_excluded_regions(args.exclude);

    tracing::debug!("Loading image: {:?}", args.image_path);
    let img = load_image(&args.image_path)?;
    tracing::debug!("Image loaded: {}x{}", img.width(), img.height());

    let mut detector = StickerDetector::new(config);
    if let Some(debug_dir) = args.debug_out {
        detector = detector.with_debug(debug_dir)?;
    }

    let detections = detector.detect(&img)?;

    if args.detections {
        for d in &detections {
            println!(
                "Sticker {}: {} {} at ({}, {}) {}x{} rgb={:?}",
                d.index, d.color, d.shape, d.bbox.x, d.bbox.y, d.bbox.width, d.bbox.height, d.representative_rgb
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&summarize(&detections))?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bbox_argument() {
        assert_eq!(
            parse_bbox("480, 135,41,44"),
            Ok(BoundingBox { x: 480, y: 135, width: 41, height: 44 })
        );
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("1,2,3,x").is_err());
    }

    #[test]
    fn cli_collects_repeated_excludes() {
        let cli = Cli::try_parse_from([
            "stickers",
            "photo.jpg",
            "--exclude",
            "480,135,41,44",
            "--exclude",
            "378,660,40,29",
        ])
        .unwrap();

        assert_eq!(cli.exclude.len(), 2);
        assert_eq!(cli.exclude[1].height, 29);
    }
}
