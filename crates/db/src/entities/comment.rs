//! Comment entity (nested replies on a story).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::votable::VotableStats;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Story this comment belongs to
    #[sea_orm(indexed)]
    pub story_id: String,

    /// Parent comment for replies; `None` for top-level comments
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<String>,

    #[sea_orm(indexed)]
    pub author_id: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Nesting level, 0 for top-level
    #[sea_orm(default_value = 0)]
    pub depth: i32,

    #[sea_orm(default_value = 0)]
    pub upvote_count: i64,
    #[sea_orm(default_value = 0)]
    pub downvote_count: i64,
    #[sea_orm(default_value = 0)]
    pub vote_count: i64,
    #[sea_orm(column_type = "Double")]
    pub vote_score: f64,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Current vote stats of this comment.
    #[must_use]
    pub const fn stats(&self) -> VotableStats {
        VotableStats {
            upvote_count: self.upvote_count,
            downvote_count: self.downvote_count,
            vote_count: self.vote_count,
            vote_score: self.vote_score,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::story::Entity",
        from = "Column::StoryId",
        to = "super::story::Column::Id",
        on_delete = "Cascade"
    )]
    Story,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl Related<super::story::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Story.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
