//! Comment database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::Comment;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Comment {
    fn from(model: Model) -> Self {
        Comment {
            id: model.id,
            post_id: model.post_id,
            author_id: model.author_id,
            content: model.content,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
