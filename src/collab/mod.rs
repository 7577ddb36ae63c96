//! External collaborators the session backend consumes: auth token
//! resolution and quiz lookup. Both are seeded from a JSON catalog file so
//! the binary runs end-to-end without the authoring/auth subsystems.

pub mod auth;
pub mod quiz;

use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

pub use self::auth::{AuthProvider, StaticTokens};
pub use self::quiz::{Answer, Question, Quiz, QuizCatalog, QuizId, StaticCatalog, UserId};

/// One seeded user token.
#[derive(Debug, Deserialize)]
struct SeedUser {
    token: String,
    user_id: UserId,
}

/// On-disk shape of the collaborator seed file.
#[derive(Debug, Deserialize)]
struct CatalogSeed {
    #[serde(default)]
    users: Vec<SeedUser>,
    #[serde(default)]
    quizzes: Vec<Quiz>,
}

/// Load the collaborator seed file into in-memory providers.
pub fn load_seed(path: &Path) -> anyhow::Result<(StaticTokens, StaticCatalog)> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading catalog seed `{}`", path.display()))?;
    let seed: CatalogSeed = serde_json::from_str(&contents)
        .with_context(|| format!("parsing catalog seed `{}`", path.display()))?;

    let tokens = StaticTokens::new();
    for user in seed.users {
        tokens.insert(user.token, user.user_id);
    }

    let catalog = StaticCatalog::new();
    for quiz in seed.quizzes {
        catalog.insert(quiz);
    }

    Ok((tokens, catalog))
}
