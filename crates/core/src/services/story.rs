//! Story service.

use chrono::Utc;
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use storyhub_common::{AppError, AppResult, IdGenerator};
use storyhub_db::{
    entities::story,
    repositories::{StoryRepository, UserRepository},
};
use validator::Validate;

#[allow(clippy::unwrap_used)]
static NON_SLUG_CHARS: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

const MAX_SLUG_LEN: usize = 80;

/// Input for creating a story.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
}

/// Story service for business logic.
#[derive(Clone)]
pub struct StoryService {
    story_repo: StoryRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl StoryService {
    /// Create a new story service.
    #[must_use]
    pub const fn new(story_repo: StoryRepository, user_repo: UserRepository) -> Self {
        Self {
            story_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a story authored by `author_id`.
    pub async fn create(&self, author_id: &str, input: CreateStoryInput) -> AppResult<story::Model> {
        input.validate()?;
        self.user_repo.get_by_id(author_id).await?;

        let base = slugify(&input.title);
        let slug = if self.story_repo.find_by_slug(&base).await?.is_some() {
            format!("{base}-{}", self.id_gen.generate_suffix())
        } else {
            base.clone()
        };

        let mut model = story::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            title: Set(input.title),
            slug: Set(slug),
            body: Set(input.body),
            upvote_count: Set(0),
            downvote_count: Set(0),
            vote_count: Set(0),
            vote_score: Set(0.0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        // Another insert can claim the slug between the lookup and ours.
        let created = match self.story_repo.create(model.clone()).await {
            Err(AppError::Conflict(_)) => {
                let slug = format!("{base}-{}", self.id_gen.generate_suffix());
                tracing::debug!(slug = %slug, "Slug taken concurrently, retrying");
                model.slug = Set(slug);
                self.story_repo.create(model).await?
            }
            other => other?,
        };
        tracing::info!(story_id = %created.id, author_id = %author_id, "Story created");
        Ok(created)
    }

    /// Get a story by ID.
    pub async fn get(&self, id: &str) -> AppResult<story::Model> {
        self.story_repo.get_by_id(id).await
    }

    /// Get a story by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<story::Model> {
        self.story_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(slug.to_string()))
    }

    /// Newest stories.
    pub async fn list(&self, limit: u64, until_id: Option<&str>) -> AppResult<Vec<story::Model>> {
        self.story_repo.find_recent(limit, until_id).await
    }

    /// Highest scored stories.
    pub async fn top(&self, limit: u64) -> AppResult<Vec<story::Model>> {
        self.story_repo.find_top(limit).await
    }
}

/// Turn a title into a URL slug.
fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lower, "-");
    let mut slug = slug.trim_matches('-').to_string();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        "story".to_string()
    } else {
        slug
    }
}
