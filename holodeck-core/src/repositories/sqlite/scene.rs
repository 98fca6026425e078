// holodeck-core/src/repositories/sqlite/scene.rs
//
// SQLite-backed SceneRepository. One row per scene keyed by name; the
// upsert makes the last writer win on overwrite. The in-memory mirror in
// front of this lives in repositories/scene_store.rs.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use holodeck_common::error::Error;
use holodeck_common::models::Scene;
use holodeck_common::traits::repository_traits::SceneRepository;

#[derive(Clone)]
pub struct SqliteSceneRepository {
    pool: Pool<Sqlite>,
}

impl SqliteSceneRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn row_to_scene(r: &SqliteRow) -> Result<Scene, Error> {
    Ok(Scene {
        name: r.try_get("scene_name")?,
        creator_user_id: r.try_get("creator_user_id")?,
        audio_url: r.try_get("audio_url")?,
        audio_path: r.try_get("audio_path")?,
        start_time_millis: r.try_get("start_time_millis")?,
        runtime_millis: r.try_get("runtime_millis")?,
        image_url: r.try_get("image_url")?,
        created_at: r.try_get("created_at")?,
    })
}

#[async_trait]
impl SceneRepository for SqliteSceneRepository {
    async fn upsert_scene(&self, scene: &Scene) -> Result<(), Error> {
        let q = r#"
            INSERT INTO scenes (scene_name, creator_user_id, audio_url, audio_path,
                                start_time_millis, runtime_millis, image_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (scene_name)
            DO UPDATE SET creator_user_id   = excluded.creator_user_id,
                          audio_url         = excluded.audio_url,
                          audio_path        = excluded.audio_path,
                          start_time_millis = excluded.start_time_millis,
                          runtime_millis    = excluded.runtime_millis,
                          image_url         = excluded.image_url,
                          created_at        = excluded.created_at
        "#;
        sqlx::query(q)
            .bind(&scene.name)
            .bind(&scene.creator_user_id)
            .bind(&scene.audio_url)
            .bind(&scene.audio_path)
            .bind(scene.start_time_millis)
            .bind(scene.runtime_millis)
            .bind(&scene.image_url)
            .bind(scene.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_scene(&self, name: &str) -> Result<Option<Scene>, Error> {
        let q = r#"
            SELECT scene_name, creator_user_id, audio_url, audio_path,
                   start_time_millis, runtime_millis, image_url, created_at
            FROM scenes
            WHERE scene_name = ?1
        "#;
        let row_opt = sqlx::query(q)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row_opt {
            Some(r) => Ok(Some(row_to_scene(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_scenes(&self) -> Result<Vec<Scene>, Error> {
        let q = r#"
            SELECT scene_name, creator_user_id, audio_url, audio_path,
                   start_time_millis, runtime_millis, image_url, created_at
            FROM scenes
            ORDER BY scene_name
        "#;
        let rows = sqlx::query(q).fetch_all(&self.pool).await?;

        let mut out = Vec::new();
        for r in rows {
            out.push(row_to_scene(&r)?);
        }
        Ok(out)
    }
}
