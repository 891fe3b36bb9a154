use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "films")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: Option<String>,
    pub tmdb_id: Option<i32>,
    pub release_date: Option<String>,
    pub rating: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub synopsis: Option<String>,
    pub genres: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub carousel_image: Option<String>,
    pub is_hidden_gem: bool,
    pub is_hunted_by_moviehunt: bool,
    pub trailer_key: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub why_watch: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub what_we_didnt_like: Option<String>,
    pub added_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::remarkable_staff::Entity")]
    RemarkableStaff,
    #[sea_orm(has_many = "super::film_translation::Entity")]
    FilmTranslation,
}

impl Related<super::remarkable_staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RemarkableStaff.def()
    }
}

impl Related<super::film_translation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmTranslation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
