//! Render a pass from a JSON attendee snapshot to SVG, PNG, JPEG or PDF.
//!
//! ```text
//! render-pass --input ada.json --format png --scale 2 --output ada.png
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use pass_renderer::{render_pass, PassData, PhotoRef, RenderRequest, SiteInfo};
use raster_export::{ExportFormat, ExportRequest, Exporter, ResvgBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "render-pass", about = "Render an event pass to a file")]
struct Args {
    /// JSON file with passId, firstName, lastName and optional copy fields
    #[arg(long)]
    input: PathBuf,

    /// Template key (story, card)
    #[arg(long, default_value = "story")]
    template: String,

    /// Color theme key
    #[arg(long)]
    color: Option<String>,

    /// Selfie to place in the photo slot instead of the QR code
    #[arg(long)]
    photo: Option<PathBuf>,

    /// svg, png, jpg or pdf
    #[arg(long, default_value = "png")]
    format: String,

    #[arg(long, default_value_t = 2.0)]
    scale: f64,

    #[arg(long, default_value = "https://pass.example.org")]
    base_url: String,

    #[arg(long, default_value = "https://www.example.org")]
    site_url: String,

    /// Output path; defaults to <passId>.<format> in the current directory
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let args = Args::parse();
    let format: ExportFormat = args.format.parse()?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let data: PassData = serde_json::from_str(&raw).context("Invalid pass JSON")?;

    let photo = match &args.photo {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mime = image::guess_format(&bytes)
                .context("Unrecognized photo format")?
                .to_mime_type();
            Some(PhotoRef::from_bytes(mime, &bytes))
        }
        None => None,
    };

    let request = RenderRequest::new(&args.template, data, chrono::Local::now().date_naive())
        .with_color(args.color.as_deref())
        .with_photo(photo);
    let site = SiteInfo::new(args.base_url, args.site_url);
    let pass = render_pass(&request, &site)?;

    let exporter = Exporter::new(Arc::new(ResvgBackend::new()));
    let artifact = exporter.export_blocking(&ExportRequest {
        document: pass.svg,
        base_width: pass.width,
        base_height: pass.height,
        scale: args.scale,
        format,
        file_stem: pass.pass_id,
    })?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&artifact.file_name));
    std::fs::write(&output, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Wrote {} ({}x{}, {})",
        output.display(),
        artifact.width,
        artifact.height,
        artifact.content_type
    );
    Ok(())
}
