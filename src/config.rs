use clap::Parser;

/// Shell command line arguments
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "shrimp")]
#[command(version, about = "A small shell with pipes, redirections and background jobs", long_about = None)]
pub struct ShellConfig {
    /// Name shown in the prompt, before the working directory
    #[arg(long, default_value = "shrimp")]
    pub prompt: String,

    /// Print the parsed structure of every accepted line to stderr
    #[arg(long)]
    pub show_line: bool,

    /// Do not report how foreground processes terminated
    #[arg(short, long)]
    pub quiet: bool,

    /// Log filter directive, e.g. "shrimp=debug" (falls back to RUST_LOG)
    #[arg(long, env = "SHRIMP_LOG")]
    pub log: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "shrimp".to_string(),
            show_line: false,
            quiet: false,
            log: None,
        }
    }
}
