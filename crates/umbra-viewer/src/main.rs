//! Umbra viewer entry point

use clap::Parser;

use umbra_viewer::{Args, ViewerApp};

fn main() -> eframe::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "umbra_viewer=debug,umbra_renderer=debug,umbra_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match args.scene_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if args.print_config {
        match config.to_ron() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                tracing::error!("Failed to serialize configuration: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    tracing::info!("Starting Umbra");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Umbra"),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    let geometry = args.geometry;
    eframe::run_native(
        "umbra",
        native_options,
        Box::new(move |cc| {
            let app = ViewerApp::new(cc, config, geometry)?;
            Ok(Box::new(app))
        }),
    )
}
