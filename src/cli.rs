//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Serve a site, or render every page to disk
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Site configuration file
    #[arg(short = 'C', long, default_value = "site.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve pages, aliases and static mounts over HTTP (default)
    Serve {
        /// Port to listen on; 0 selects 8080
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write every page to `<output>/<pattern>`
    Build {
        /// Output directory (default: site.build_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["sitemux"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_build_output() {
        let cli = Cli::parse_from(["sitemux", "-C", "blog.toml", "build", "-o", "dist"]);
        assert_eq!(cli.config, PathBuf::from("blog.toml"));
        assert!(matches!(
            cli.command,
            Some(Commands::Build { output: Some(ref o) }) if o == &PathBuf::from("dist")
        ));
    }

    #[test]
    fn test_serve_port() {
        let cli = Cli::parse_from(["sitemux", "serve", "--port", "3000"]);
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(3000) })));
    }
}
