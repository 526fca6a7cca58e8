//! Packages each selection needs, and the versions they are pinned to

use super::{choice, field};
use crate::answers::ValidatedAnswers;
use crate::error::ScaffoldResult;
use crate::manifest::{AddedDependencies, VersionTable};

/// Built-in pins for every package [`plan_dependencies`] can produce
const DEFAULT_VERSIONS: &[(&str, &str)] = &[
    ("unocss", "^0.51.4"),
    ("@unocss/reset", "^0.51.4"),
    ("@unocss/preset-wind", "^0.51.4"),
    ("@unocss/preset-icons", "^0.51.4"),
    ("@unocss/preset-web-fonts", "^0.51.4"),
    ("@unocss/preset-typography", "^0.51.4"),
    ("kysely", "^0.24.2"),
    ("pg", "^8.10.0"),
    ("@types/pg", "^8.6.6"),
    ("mysql2", "^3.2.0"),
    ("better-sqlite3", "^8.3.0"),
    ("@types/better-sqlite3", "^7.6.4"),
    ("prisma", "^4.12.0"),
    ("@prisma/client", "^4.12.0"),
    ("prisma-kysely", "^1.1.0"),
    ("next-auth", "^4.22.0"),
    ("@trpc/server", "^10.20.0"),
    ("@trpc/client", "^10.20.0"),
    ("zod", "^3.21.4"),
];

pub fn default_versions() -> ScaffoldResult<VersionTable> {
    VersionTable::from_entries(DEFAULT_VERSIONS.iter().copied())
}

pub fn plan_dependencies(answers: &ValidatedAnswers) -> AddedDependencies {
    let mut added = AddedDependencies::new();

    if answers.selected(field::STYLING, choice::UNOCSS) {
        added.dev_dependency("unocss");
        for preset in answers.list(field::UNOCSS_PRESETS) {
            added.dev_dependency(preset.as_str());
        }
    }

    if answers.selected(field::ORM, choice::KYSELY) {
        added.dependency("kysely");
        if answers.selected(field::SCHEMA_MIGRATOR, choice::PRISMA) {
            added.dev_dependency("prisma-kysely");
        }
        match answers.text(field::DATABASE) {
            Some(choice::POSTGRESQL) => {
                added.dependency("pg").dev_dependency("@types/pg");
            }
            Some(choice::MYSQL) => {
                added.dependency("mysql2");
            }
            Some(choice::SQLITE) => {
                added
                    .dependency("better-sqlite3")
                    .dev_dependency("@types/better-sqlite3");
            }
            _ => {}
        }
    }

    if answers.selected(field::ORM, choice::PRISMA) {
        added.dependency("@prisma/client");
    }
    if answers.selected(field::SCHEMA_MIGRATOR, choice::PRISMA) {
        added.dev_dependency("prisma");
    }
    if answers.selected(field::AUTH, choice::NEXT_AUTH) {
        added.dependency("next-auth");
    }
    if answers.selected(field::RPC, choice::TRPC) {
        added
            .dependency("@trpc/server")
            .dependency("@trpc/client")
            .dependency("zod");
    }

    added
}
