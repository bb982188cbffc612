use std::path::PathBuf;

use clap::Parser;
use eframe::egui;

mod catalog;
mod config;
mod persist;
mod ui;

use ui::{AppPaths, WorkbenchApp};

#[derive(Debug, Parser)]
#[command(name = "workbench_gui", about = "Clinical terminology authoring workbench")]
struct Args {
    /// Settings file (defaults to ./workbench.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Entity catalog JSON; the demo catalog is used when omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Data directory for drafts and local state.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Log filter, e.g. "info" or "authoring=debug".
    #[arg(long)]
    log: Option<String>,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(args.config.as_ref());
    if let Some(catalog) = args.catalog {
        settings.catalog_path = Some(catalog);
    }
    if let Some(data_dir) = args.data_dir {
        settings.data_dir = Some(data_dir);
    }
    if let Some(log) = args.log {
        settings.log_filter = log;
    }

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.clone())
        .init();

    let directory = catalog::load(settings.catalog_path.as_ref());
    let paths = match AppPaths::resolve(settings.data_dir.as_ref()) {
        Ok(paths) => paths,
        Err(err) => {
            tracing::error!(%err, "cannot resolve data directory");
            return Err(eframe::Error::AppCreation(err.to_string().into()));
        }
    };
    if let Err(err) = std::fs::create_dir_all(&paths.drafts_dir) {
        tracing::error!(%err, "cannot prepare drafts directory");
        return Err(eframe::Error::AppCreation(err.to_string().into()));
    }
    tracing::info!(
        data_root = %paths.data_root.display(),
        drafts = %paths.drafts_dir.display(),
        "data directories ready"
    );

    let app_name = settings.window_title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(app_name.clone())
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([980.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        &app_name,
        options,
        Box::new(move |_cc| Ok(Box::new(WorkbenchApp::new(&settings, directory, paths)))),
    )
}
