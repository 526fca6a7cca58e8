//! create-alore - Project scaffolding for the alore stack

mod logging;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use scaffolder_core::stack::{self, choice, field};
use scaffolder_core::tui::CreateArgs;
use scaffolder_core::{Blueprint, ProductConfig, ScaffoldResult, ValidatedAnswers, VersionTable};
use std::path::{Path, PathBuf};

/// alore product configuration
#[derive(Clone)]
pub struct AloreConfig;

impl ProductConfig for AloreConfig {
    fn name(&self) -> &'static str {
        "create-alore"
    }

    fn display_name(&self) -> &'static str {
        "Alore"
    }

    fn default_template(&self) -> &'static str {
        stack::DEFAULT_TEMPLATE
    }

    fn template_env(&self) -> &'static str {
        "ALORE_TEMPLATE"
    }

    fn archive_url_env(&self) -> &'static str {
        "ALORE_ARCHIVE_URL"
    }

    fn local_template_name(&self) -> &'static str {
        stack::LOCAL_TEMPLATE_NAME
    }

    fn blueprint(&self) -> Blueprint {
        stack::blueprint()
    }

    fn versions(&self) -> ScaffoldResult<VersionTable> {
        stack::default_versions()
    }

    fn cli_description(&self) -> &'static str {
        "CLI for scaffolding Rakkas + UnoCSS + Prisma projects"
    }

    fn next_steps(&self, dir: &Path, answers: &ValidatedAnswers) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        if current.as_deref() != Some(dir) {
            let shown = current
                .as_deref()
                .and_then(|cwd| dir.strip_prefix(cwd).ok())
                .unwrap_or(dir);
            steps.push(format!("cd {}", shown.display()));
        }

        steps.push("npm install".to_string());

        if answers.selected(field::SCHEMA_MIGRATOR, choice::PRISMA) {
            steps.push("Fill in DATABASE_URL in .env (see .env.example)".to_string());
            steps.push("npx prisma migrate dev".to_string());
        }

        steps.push("npm run dev".to_string());
        steps
    }
}

#[derive(Parser, Debug)]
#[command(name = "create-alore")]
#[command(about = "CLI for scaffolding Rakkas + UnoCSS + Prisma projects")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub create: CliCreateArgs,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the pinned dependency versions as YAML
    Versions(VersionsArgs),
}

#[derive(Parser, Debug)]
pub struct CliCreateArgs {
    /// Project name (also the directory to create)
    pub name: Option<String>,

    /// Directory to create instead of ./<name>
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Template reference, e.g. github:owner/repo/sub-path#ref
    #[arg(short, long)]
    pub template: Option<String>,

    /// Local directory to use for templates instead of fetching from remote (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// JSON file with answers (non-interactive)
    #[arg(long = "answers")]
    pub answers: Option<PathBuf>,

    /// YAML file overriding pinned dependency versions
    #[arg(long = "versions")]
    pub versions: Option<PathBuf>,

    /// Replace the destination directory if it exists
    #[arg(short, long)]
    pub force: bool,

    /// Accept every default (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            name: args.name,
            directory: args.directory,
            template: args.template,
            template_dir: args.template_dir,
            answers_file: args.answers,
            versions_file: args.versions,
            force: args.force,
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct VersionsArgs {
    /// YAML file whose entries override the built-in pins
    #[arg(long = "versions")]
    pub versions: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    logging::init_logging(args.verbose, args.quiet)?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting create-alore");
    let config = AloreConfig;

    match args.command {
        Some(Command::Versions(versions_args)) => {
            let table =
                scaffolder_core::tui::load_versions(&config, versions_args.versions.as_deref())?;
            print!("{}", table.to_yaml_string()?);
            Ok(())
        }
        None => {
            let result = scaffolder_core::run(&config, args.create.into()).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use scaffolder_core::RawAnswers;

    fn answers() -> ValidatedAnswers {
        let mut raw = RawAnswers::new();
        raw.insert("project_name", "demo");
        raw.insert("framework", "Rakkas");
        raw.insert("styling", "UnoCSS");
        raw.insert("unocss_presets", Vec::<String>::new());
        raw.insert("database", "SQLite");
        raw.insert("schema_migrator", "Prisma");
        raw.insert("orm", "Kysely");
        raw.insert("auth", "next-auth");
        raw.insert("rpc", "tRPC");
        stack::answer_schema().validate(&raw).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_name_and_flags() {
        let args = Args::parse_from([
            "create-alore",
            "demo",
            "--yes",
            "-vv",
            "--template-dir",
            "templates",
        ]);
        assert!(args.command.is_none());
        assert_eq!(args.create.name.as_deref(), Some("demo"));
        assert!(args.create.yes);
        assert_eq!(args.verbose, 2);
        let create: CreateArgs = args.create.into();
        assert_eq!(create.template_dir, Some(PathBuf::from("templates")));
    }

    #[test]
    fn test_parses_versions_subcommand() {
        let args = Args::parse_from(["create-alore", "versions"]);
        assert!(matches!(args.command, Some(Command::Versions(_))));
    }

    #[test]
    fn test_next_steps_mention_prisma_migration() {
        let dir = std::env::temp_dir().join("alore-next-steps");
        let steps = AloreConfig.next_steps(&dir, &answers());
        assert!(steps[0].starts_with("cd "));
        assert!(steps.iter().any(|s| s == "npx prisma migrate dev"));
        assert_eq!(steps.last().map(String::as_str), Some("npm run dev"));
    }
}
