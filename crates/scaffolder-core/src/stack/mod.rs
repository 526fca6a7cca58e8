//! The alore stack: Rakkas + UnoCSS + Prisma/Kysely + next-auth + tRPC
//!
//! Field names, choice lists, transformations and pinned versions for the
//! alore template.

pub mod dependencies;
pub mod patches;
pub mod schema;

pub use dependencies::{default_versions, plan_dependencies};
pub use patches::patch_set;
pub use schema::answer_schema;

use crate::blueprint::Blueprint;

/// Template used when neither a flag nor the environment names one
pub const DEFAULT_TEMPLATE: &str = "github:alore-dev/alore/alore#main";

/// Directory name of the template below a local templates root
pub const LOCAL_TEMPLATE_NAME: &str = "alore";

pub mod field {
    pub const PROJECT_NAME: &str = "project_name";
    pub const FRAMEWORK: &str = "framework";
    pub const STYLING: &str = "styling";
    pub const UNOCSS_PRESETS: &str = "unocss_presets";
    pub const TAILWIND_PLUGINS: &str = "tailwind_plugins";
    pub const DATABASE: &str = "database";
    pub const SCHEMA_MIGRATOR: &str = "schema_migrator";
    pub const ORM: &str = "orm";
    pub const AUTH: &str = "auth";
    pub const RPC: &str = "rpc";
}

pub mod choice {
    pub const RAKKAS: &str = "Rakkas";
    pub const UNOCSS: &str = "UnoCSS";
    pub const TAILWIND: &str = "Tailwind";
    pub const POSTGRESQL: &str = "PostgreSQL";
    pub const MYSQL: &str = "MySQL";
    pub const SQLITE: &str = "SQLite";
    pub const PRISMA: &str = "Prisma";
    pub const KYSELY: &str = "Kysely";
    pub const NEXT_AUTH: &str = "next-auth";
    pub const TRPC: &str = "tRPC";

    pub const UNOCSS_RESET: &str = "@unocss/reset";
}

pub fn blueprint() -> Blueprint {
    Blueprint::new(answer_schema(), patch_set(), plan_dependencies)
        .with_name_field(field::PROJECT_NAME)
}
