use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the site into the output directory.
    Build(BuildArgs),
    /// Print the content tree of a directory.
    Tree(TreeArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Site config file (default: `site.yaml` when present).
    #[arg(long)]
    pub config: Option<String>,

    /// Content root. The blog is read from `<content>/blog`.
    #[arg(long)]
    pub content: Option<String>,

    /// Output directory for generated HTML.
    #[arg(long)]
    pub output: Option<String>,

    /// Page template with `{{TITLE}}`, `{{CONTENT}}`, `{{TOC}}`, `{{CSS_PATH}}` and `{{NAV}}`.
    #[arg(long)]
    pub template: Option<String>,

    /// Incremental build cache file.
    #[arg(long)]
    pub cache_file: Option<String>,
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Directory to scan.
    pub dir: String,
}
