//! Story entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::votable::VotableStats;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "story")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub author_id: String,

    pub title: String,

    /// URL slug derived from the title
    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Vote stats (denormalized, written only by the vote aggregator)
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
    /// Current vote stats of this story.
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
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
