//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Credential, Password, User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity, dropping the hash
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            name: model.name,
            email: model.email,
            role: UserRole::from(model.role.as_str()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Model> for Credential {
    fn from(mut model: Model) -> Self {
        let password = Password::from_hash(std::mem::take(&mut model.password_hash));
        Credential {
            user: User::from(model),
            password,
        }
    }
}
