//! Charm-style CLI prompts using cliclack

use crate::answers::{AnswerSchema, AnswerValue, Answers, FieldSpec, RawAnswers, ValueDomain};
use crate::manifest::VersionTable;
use crate::pipeline::{Pipeline, ScaffoldReport, ScaffoldRequest, Stage};
use crate::product::ProductConfig;
use crate::templates::{TemplateFetcher, TemplateRef};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Project name; also the destination unless `directory` is set
    pub name: Option<String>,

    /// Project directory to create
    pub directory: Option<PathBuf>,

    /// Template reference (`github:owner/repo/sub#ref` or `local:<dir>`)
    pub template: Option<String>,

    /// Local templates root to use instead of fetching from remote
    pub template_dir: Option<PathBuf>,

    /// JSON file with raw answers (skips prompting)
    pub answers_file: Option<PathBuf>,

    /// YAML file with version overrides
    pub versions_file: Option<PathBuf>,

    /// Replace an existing destination directory
    pub force: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Run the CLI with interactive prompts
pub async fn run<C: ProductConfig>(config: &C, args: CreateArgs) -> Result<()> {
    cliclack::intro(config.display_name())?;

    // Step 1: Versions and template, so configuration errors surface before prompting
    let versions = load_versions(config, args.versions_file.as_deref())?;
    let template = resolve_template(config, &args, std::env::var(config.template_env()).ok())?;
    cliclack::log::info(format!("Using template {template}"))?;

    // Step 2: Answers
    let blueprint = config.blueprint();
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let raw = collect_answers(&blueprint.schema, blueprint.name_field, &args, &current_dir)?;

    // Step 3: Destination
    let project_name = raw
        .get(blueprint.name_field)
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let destination = resolve_destination(
        &current_dir,
        args.directory.as_deref(),
        project_name.as_deref(),
    );
    debug!(destination = %destination.display(), "Resolved destination");

    // Step 4: Create project
    let fetcher = TemplateFetcher::from_config(config)?;
    let report = create_project(
        &blueprint,
        &fetcher,
        &versions,
        ScaffoldRequest {
            answers: raw,
            template,
            destination,
            overwrite: args.force,
        },
    )
    .await?;

    // Step 5: Show warnings and next steps
    for warning in &report.warnings {
        cliclack::log::warning(warning.to_string())?;
    }
    print_next_steps(config, &report)?;

    Ok(())
}

/// Built-in pins, overlaid with a YAML overrides file when given
pub fn load_versions<C: ProductConfig>(
    config: &C,
    overrides: Option<&Path>,
) -> Result<VersionTable> {
    let builtin = config.versions()?;
    match overrides {
        Some(path) => Ok(builtin.merged_with(VersionTable::load_yaml(path)?)),
        None => Ok(builtin),
    }
}

/// `--template-dir` beats `--template`, which beats the environment
pub fn resolve_template<C: ProductConfig>(
    config: &C,
    args: &CreateArgs,
    env_value: Option<String>,
) -> Result<TemplateRef> {
    if let Some(dir) = &args.template_dir {
        return Ok(TemplateRef::local(dir, config.local_template_name()));
    }
    let input = args
        .template
        .clone()
        .or(env_value)
        .unwrap_or_else(|| config.default_template().to_string());
    Ok(input.parse()?)
}

/// Destination directory: `--directory`, else the project name, below `current_dir`
pub fn resolve_destination(
    current_dir: &Path,
    directory: Option<&Path>,
    name: Option<&str>,
) -> PathBuf {
    let path = match (directory, name) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(name)) => PathBuf::from(name),
        (None, None) => PathBuf::from("."),
    };
    if path.is_absolute() {
        path
    } else {
        current_dir.join(path)
    }
}

fn collect_answers(
    schema: &AnswerSchema,
    name_field: &str,
    args: &CreateArgs,
    current_dir: &Path,
) -> Result<RawAnswers> {
    if let Some(path) = &args.answers_file {
        cliclack::log::info(format!("Reading answers from {}", path.display()))?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut raw = RawAnswers::from_json_str(&content)
            .with_context(|| format!("Invalid answers file {}", path.display()))?;
        if let Some(name) = &args.name {
            raw.insert(name_field, name.as_str());
        }
        return Ok(raw);
    }

    if args.yes {
        return Ok(default_answers(schema, name_field, args.name.as_deref())?.to_raw());
    }

    if !console::Term::stdout().is_term() {
        anyhow::bail!("Not running in a terminal; pass --yes or --answers <file>");
    }
    Ok(prompt_answers(schema, name_field, args, current_dir)?.to_raw())
}

/// Every visible field at its default, the name taken from the CLI when given
pub fn default_answers(
    schema: &AnswerSchema,
    name_field: &str,
    name: Option<&str>,
) -> Result<Answers> {
    let mut answers = Answers::new();
    for field in schema.fields() {
        if !field.is_visible(&answers) {
            continue;
        }
        let value = match (field.name == name_field, name) {
            (true, Some(name)) => AnswerValue::Text(name.to_string()),
            _ => field
                .default
                .clone()
                .with_context(|| format!("--yes needs a value for '{}'", field.name))?,
        };
        answers.insert(field.name, value);
    }
    Ok(answers)
}

fn prompt_answers(
    schema: &AnswerSchema,
    name_field: &str,
    args: &CreateArgs,
    current_dir: &Path,
) -> Result<Answers> {
    let mut answers = Answers::new();
    for field in schema.fields() {
        if !field.is_visible(&answers) {
            continue;
        }
        let value = if field.name == name_field {
            match &args.name {
                Some(name) => {
                    cliclack::log::info(format!("Project name: {name}"))?;
                    AnswerValue::Text(name.clone())
                }
                None => prompt_project_name(field, current_dir, args.force)?,
            }
        } else {
            prompt_field(field)?
        };
        answers.insert(field.name, value);
    }
    Ok(answers)
}

fn prompt_project_name(field: &FieldSpec, current_dir: &Path, force: bool) -> Result<AnswerValue> {
    let accepts = match field.domain {
        ValueDomain::Text { accepts } => accepts,
        _ => return prompt_field(field),
    };
    let current_dir = current_dir.to_path_buf();
    let mut input = cliclack::input(field.message).validate(move |name: &String| {
        if !accepts(name) {
            Err("Use lower-case letters, digits, '-', '_' or '.'")
        } else if !force && current_dir.join(name).exists() {
            Err("A directory with this name already exists")
        } else {
            Ok(())
        }
    });
    if let Some(default) = field.default.as_ref().and_then(AnswerValue::as_text) {
        input = input.placeholder(default).default_input(default);
    }
    let name: String = input.interact()?;
    Ok(AnswerValue::Text(name))
}

fn prompt_field(field: &FieldSpec) -> Result<AnswerValue> {
    match &field.domain {
        ValueDomain::Text { accepts } => {
            let accepts = *accepts;
            let mut input = cliclack::input(field.message).validate(move |value: &String| {
                if accepts(value) {
                    Ok(())
                } else {
                    Err("Invalid value")
                }
            });
            if let Some(default) = field.default.as_ref().and_then(AnswerValue::as_text) {
                input = input.default_input(default);
            }
            let value: String = input.interact()?;
            Ok(AnswerValue::Text(value))
        }
        ValueDomain::Choice(choices) => {
            // A single choice needs no question
            if let [only] = choices {
                cliclack::log::info(format!("{} {only}", field.message))?;
                return Ok(AnswerValue::Text(only.to_string()));
            }
            let mut select = cliclack::select(field.message);
            for choice in choices.iter() {
                select = select.item(*choice, *choice, "");
            }
            let default = field.default.as_ref().and_then(AnswerValue::as_text);
            if let Some(initial) = choices.iter().find(|c| Some(**c) == default) {
                select = select.initial_value(*initial);
            }
            let picked: &str = select.interact()?;
            Ok(AnswerValue::Text(picked.to_string()))
        }
        ValueDomain::MultiSelect(choices) => {
            let mut multi = cliclack::multiselect(field.message);
            for choice in choices.iter() {
                multi = multi.item(*choice, *choice, "");
            }
            let defaults = field.default.as_ref().and_then(AnswerValue::as_list).unwrap_or(&[]);
            let initial: Vec<&'static str> = choices
                .iter()
                .copied()
                .filter(|c| defaults.iter().any(|d| d == c))
                .collect();
            let picked: Vec<&str> = multi.initial_values(initial).required(false).interact()?;
            Ok(AnswerValue::List(picked.into_iter().map(str::to_string).collect()))
        }
    }
}

async fn create_project(
    blueprint: &crate::blueprint::Blueprint,
    fetcher: &TemplateFetcher,
    versions: &VersionTable,
    request: ScaffoldRequest,
) -> Result<ScaffoldReport> {
    let spinner = cliclack::spinner();
    spinner.start(Stage::Validating.describe());

    let result = Pipeline::new(blueprint, fetcher, versions)
        .with_observer(|stage| spinner.set_message(stage.describe()))
        .run(request)
        .await;

    match result {
        Ok(report) => {
            spinner.stop(format!(
                "Created {} in {}",
                report.answers.text(blueprint.name_field).unwrap_or("project"),
                report.destination.display()
            ));
            Ok(report)
        }
        Err(e) => {
            spinner.stop("Project creation failed");
            Err(e.into())
        }
    }
}

fn print_next_steps<C: ProductConfig>(config: &C, report: &ScaffoldReport) -> Result<()> {
    let steps = config.next_steps(&report.destination, &report.answers);

    println!();
    println!("  {}", "Next steps".bold());
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step.cyan());
    }

    cliclack::outro("Happy coding!")?;

    Ok(())
}
