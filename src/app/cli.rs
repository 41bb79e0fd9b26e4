use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Preview which module files a plugin loader would discover"
)]
pub struct Cli {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub path: String,

    /// Use a predefined set of options from presets.toml
    #[arg(long)]
    pub preset: Option<String>,

    /// Extension suffix to match and strip (e.g. '.so')
    #[arg(long)]
    pub ext: Option<String>,

    /// Maximum traversal depth; 0 scans only the root, negative means unbounded
    #[arg(long, allow_negative_numbers = true)]
    pub depth: Option<i64>,

    /// Patterns for files to include (e.g. 'handlers/**')
    #[arg(long, num_args = 1..)]
    pub include: Option<Vec<String>>,

    /// Patterns for files or directories to exclude
    #[arg(long, num_args = 1..)]
    pub exclude: Option<Vec<String>>,

    /// Display the matches as an indented tree instead of a flat list
    #[arg(long)]
    pub tree: bool,
}
