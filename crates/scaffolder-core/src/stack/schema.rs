//! Prompt fields for the alore stack

use super::{choice, field};
use crate::answers::{AnswerSchema, FieldSpec};

pub const FRAMEWORKS: &[&str] = &[choice::RAKKAS];
pub const STYLINGS: &[&str] = &[choice::UNOCSS, choice::TAILWIND];
pub const UNOCSS_PRESETS: &[&str] = &[
    choice::UNOCSS_RESET,
    "@unocss/preset-wind",
    "@unocss/preset-icons",
    "@unocss/preset-web-fonts",
    "@unocss/preset-typography",
];
pub const TAILWIND_PLUGINS: &[&str] = &[
    "@tailwindcss/typography",
    "@tailwindcss/forms",
    "@tailwindcss/line-clamp",
    "@tailwindcss/aspect-ratio",
];
pub const DATABASES: &[&str] = &[choice::POSTGRESQL, choice::MYSQL, choice::SQLITE];
pub const SCHEMA_MIGRATORS: &[&str] = &[choice::PRISMA];
pub const ORMS: &[&str] = &[choice::KYSELY, choice::PRISMA];
pub const AUTHS: &[&str] = &[choice::NEXT_AUTH];
pub const RPCS: &[&str] = &[choice::TRPC];

/// npm-style package name: lower-case letters, digits, `-`, `_`, `.`;
/// may not start with `.` or `_`
pub fn is_valid_project_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 214
        && !name.starts_with(['.', '_'])
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
}

pub fn answer_schema() -> AnswerSchema {
    AnswerSchema::new(vec![
        FieldSpec::text(field::PROJECT_NAME, "Project name:", is_valid_project_name)
            .with_default("hello-world"),
        FieldSpec::choice(field::FRAMEWORK, "Framework:", FRAMEWORKS).with_default(choice::RAKKAS),
        FieldSpec::choice(field::STYLING, "Styling solution:", STYLINGS)
            .with_default(choice::UNOCSS),
        FieldSpec::multi_select(field::UNOCSS_PRESETS, "Select UnoCSS presets:", UNOCSS_PRESETS)
            .visible_when(|a| a.selected(field::STYLING, choice::UNOCSS))
            .with_all_selected(),
        FieldSpec::multi_select(
            field::TAILWIND_PLUGINS,
            "Select Tailwind plugins:",
            TAILWIND_PLUGINS,
        )
        .visible_when(|a| a.selected(field::STYLING, choice::TAILWIND))
        .with_all_selected(),
        FieldSpec::choice(field::DATABASE, "Database:", DATABASES)
            .with_default(choice::POSTGRESQL),
        FieldSpec::choice(field::SCHEMA_MIGRATOR, "Schema migrator:", SCHEMA_MIGRATORS)
            .with_default(choice::PRISMA),
        FieldSpec::choice(field::ORM, "SQL interface:", ORMS).with_default(choice::KYSELY),
        FieldSpec::choice(field::AUTH, "Auth:", AUTHS).with_default(choice::NEXT_AUTH),
        FieldSpec::choice(field::RPC, "RPC:", RPCS).with_default(choice::TRPC),
    ])
}
