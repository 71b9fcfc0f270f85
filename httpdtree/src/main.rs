//! httpdtree - inspect and edit Apache virtual hosts
//!
//! This is the main entry point for the httpdtree CLI.

mod report;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use httpdtree_config::{load_files, FileStore, LoadError};
use httpdtree_core::vhost::find_vhosts_named;
use httpdtree_core::{ConfigLoader, ParserConfig, Tree, VirtualHost};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// httpdtree - Apache configuration tree inspector
#[derive(Parser)]
#[command(name = "httpdtree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Parser settings file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Treat a module as loaded for <IfModule> (repeatable)
    #[arg(long = "module", global = true)]
    modules: Vec<String>,

    /// Define a parameter for <IfDefine> (repeatable)
    #[arg(short = 'D', long = "define", global = true)]
    defines: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the virtual hosts defined in configuration files
    Vhosts {
        /// Configuration files, loaded in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration files
    Validate {
        /// Configuration files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Set a directive inside a virtual host and save the file
    Set {
        /// Configuration file holding the virtual host
        file: PathBuf,

        /// ServerName or ServerAlias of the virtual host to edit
        #[arg(long)]
        vhost: String,

        /// Directive name, e.g. SSLEngine
        directive: String,

        /// New directive arguments, e.g. -Indexes
        #[arg(allow_hyphen_values = true)]
        values: Vec<String>,
    },

    /// Show version information
    Version,
}

impl Cli {
    /// Settings file merged with command line overrides
    fn parser_config(&self) -> anyhow::Result<ParserConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => ParserConfig::default(),
        };
        config.modules.extend(self.modules.iter().cloned());
        config.defines.extend(self.defines.iter().cloned());
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let config = cli.parser_config()?;

    match cli.command {
        Commands::Vhosts { files, json } => {
            let tree = load(&files, &config)?;
            let vhosts = find_vhosts_named(&tree, tree.root(), &config.vhost_block)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&vhosts)?);
            } else {
                for (i, vhost) in vhosts.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    println!("{}", vhost);
                }
            }
        }

        Commands::Validate { files } => {
            let mut failed = 0;
            for file in &files {
                match load_files([file], &config) {
                    Ok(_) => println!("✅ Configuration '{}' is valid!", file.display()),
                    Err(LoadError::Parse { path, text, error }) => {
                        report::report_parse_error(&error, &path, &text, &mut std::io::stderr())?;
                        failed += 1;
                    }
                    Err(e) => {
                        eprintln!("❌ Configuration Error: {}", e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                std::process::exit(1);
            }
        }

        Commands::Set {
            file,
            vhost,
            directive,
            values,
        } => {
            let mut tree = load(std::slice::from_ref(&file), &config)?;
            let target = select_vhost(&tree, &config, &vhost)?;
            let node = target.node;

            // Only the vhost's own directive; nested sections keep theirs
            let existing = tree
                .find_directives(node, &directive, true)?
                .into_iter()
                .find(|&id| matches!(tree.ancestor(id), Ok(Some(parent)) if parent == node));
            match existing {
                Some(id) => tree.set_parameters(id, &values)?,
                None => {
                    tree.add_child_directive(node, directive.as_str(), &values, None)?;
                }
            }

            let message = format!("Set {} {} in {}", directive, values.join(" "), vhost);
            let root = tree.root();
            let mut store = FileStore::new();
            tree.save(root, &message, &mut store)?;
            println!("✅ {}", message);
        }

        Commands::Version => {
            println!("httpdtree v{}", httpdtree_core::VERSION);
        }
    }

    Ok(())
}

fn load(files: &[PathBuf], config: &ParserConfig) -> anyhow::Result<Tree> {
    match load_files(files, config) {
        Ok(tree) => Ok(tree),
        Err(LoadError::Parse { path, text, error }) => {
            report::report_parse_error(&error, &path, &text, &mut std::io::stderr())?;
            bail!("could not parse {}", path.display())
        }
        Err(e) => Err(e.into()),
    }
}

/// Find the enabled virtual host answering for `name`
fn select_vhost(tree: &Tree, config: &ParserConfig, name: &str) -> anyhow::Result<VirtualHost> {
    let vhosts = find_vhosts_named(tree, tree.root(), &config.vhost_block)?;
    if let Some(found) = vhosts
        .iter()
        .find(|v| v.names().iter().any(|n| n.eq_ignore_ascii_case(name)))
    {
        return Ok(found.clone());
    }
    if vhosts.iter().any(|v| v.modmacro) {
        bail!(
            "no virtual host named {} (hosts defined through mod_macro cannot be matched by name)",
            name
        );
    }
    bail!("no virtual host named {}", name)
}
