use clap::Parser;
use sitemux::config::Config;
use sitemux::{logger, server, ServeMux, Site};
use std::sync::Arc;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Config::load_from(&cli.config)?;
    logger::init(&cfg.logging)?;

    let site = cfg.site.registry()?.freeze();

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Build { output } => {
            let out_dir = output.unwrap_or_else(|| cfg.site.build_dir.clone());
            site.build(out_dir)?;
            Ok(())
        }
        Commands::Serve { port } => {
            let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
            runtime_builder.enable_all();
            if let Some(workers) = cfg.server.workers {
                runtime_builder.worker_threads(workers);
            }
            let runtime = runtime_builder.build()?;

            let port = port.unwrap_or(cfg.server.port);
            runtime.block_on(serve(site, port, cfg))
        }
    }
}

/// Serve until Ctrl+C/SIGTERM, with page watchers running alongside
async fn serve(site: Site, port: u16, cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut mux = ServeMux::new();
    site.serve_to(&mut mux)?;

    let watchers = site.watch();
    let result = server::run_until(Arc::new(mux), port, cfg, server::shutdown_signal()).await;
    watchers.stop();

    Ok(result?)
}
