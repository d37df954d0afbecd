//! panel-tool - bench utility for the cockpit panel HID layer
//!
//! Lists attached panels, recovers fonts from captured upload traffic and
//! drives a short MCDU demo.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cockpit_panels::{
    extract_font_from_capture_lines, Colour, Config, FontSize, Mcdu, McduLed, PanelEvent,
    ResourceRegistry,
};
use hidapi::HidApi;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "panel-tool", about = "MCDU and FCU panel utility")]
struct Cli {
    /// Configuration file (defaults to the per-user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recover a font from a hex capture of upload reports
    ExtractFont {
        /// Capture file, one report per line
        capture: PathBuf,
        /// Write the font JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also write the inferred packet template
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// List attached panels
    List,
    /// Draw a test page on the MCDU and echo key events
    Demo {
        /// How long to run, in seconds
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn extract_font(capture: &Path, out: Option<&Path>, template_out: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(capture)
        .with_context(|| format!("Failed to read capture: {:?}", capture))?;
    let extraction = extract_font_from_capture_lines(text.lines(), template_out.is_some())
        .with_context(|| format!("Failed to parse capture: {:?}", capture))?;

    let font = &extraction.font;
    info!(
        "Recovered {} large and {} small glyphs ({}x{})",
        font.large.len(),
        font.small.len(),
        font.glyph_width,
        font.glyph_height
    );

    let json = font.to_json().context("Failed to serialize font")?;
    match out {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write font: {:?}", path))?,
        None => println!("{}", json),
    }

    if let Some(path) = template_out {
        match &extraction.template {
            Some(template) => {
                let json = template.to_json().context("Failed to serialize template")?;
                std::fs::write(path, json)
                    .with_context(|| format!("Failed to write template: {:?}", path))?;
            }
            None => warn!("No font upload found in capture, template not written"),
        }
    }
    Ok(())
}

fn list(config: &Config) -> Result<()> {
    let api = HidApi::new().context("Failed to initialize HID API")?;
    let known = [("MCDU", &config.mcdu), ("FCU", &config.fcu)];
    let mut found = 0;
    for device in api.device_list() {
        let Some((kind, _)) = known
            .iter()
            .find(|(_, c)| device.vendor_id() == c.vendor_id && device.product_id() == c.product_id)
        else {
            continue;
        };
        found += 1;
        println!(
            "{:<5} {:04x}:{:04x} {} {}",
            kind,
            device.vendor_id(),
            device.product_id(),
            device.product_string().unwrap_or("Unknown"),
            device.path().to_string_lossy()
        );
    }
    if found == 0 {
        println!("No panels found");
    }
    Ok(())
}

async fn demo(config: &Config, seconds: u64) -> Result<()> {
    let api = Arc::new(Mutex::new(HidApi::new().context("Failed to initialize HID API")?));
    let resources = Arc::new(ResourceRegistry::load().context("Failed to load bundled resources")?);
    let mut mcdu = Mcdu::open(&api, config, resources).context("Failed to open MCDU")?;
    mcdu.initialise()?;

    let screen = mcdu.screen_mut();
    screen.centre_line(0, "PANEL TOOL");
    for (line, colour) in Colour::ALL.iter().enumerate() {
        screen.goto(line + 2, 1);
        screen.set_colour(*colour).write(colour.name());
        screen.set_size(FontSize::Small).write(" small");
        screen.set_size(FontSize::Large);
    }
    screen.set_colour(Colour::White).right_align(13, "PRESS A KEY");
    mcdu.refresh_display(false)?;
    mcdu.leds_mut().set(McduLed::Rdy, true);
    mcdu.refresh_leds(false)?;

    let (subscription, mut events) = mcdu.session().events().channel();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(seconds);
    loop {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Some(PanelEvent::Disconnected)) => {
                warn!("MCDU disconnected");
                break;
            }
            Ok(Some(event)) => info!("{:?}", event),
            Ok(None) | Err(_) => break,
        }
    }
    mcdu.unsubscribe(subscription);

    if mcdu.session().is_connected() {
        mcdu.cleanup()?;
    }
    mcdu.shutdown();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::ExtractFont {
            capture,
            out,
            template,
        } => extract_font(&capture, out.as_deref(), template.as_deref()),
        Commands::List => list(&config),
        Commands::Demo { seconds } => demo(&config, seconds).await,
    }
}
