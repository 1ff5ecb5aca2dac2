use lazy_static::lazy_static;
use rusqlite_migration::{Migrations, M};

lazy_static! {
    pub static ref MIGRATIONS: Migrations<'static> = Migrations::new(vec![
        M::up(
            r#"
            CREATE TABLE users (
                id BLOB PRIMARY KEY CHECK(length(id) = 16) NOT NULL UNIQUE DEFAULT (uuid7_now()),
                email TEXT UNIQUE,
                is_anonymous INTEGER NOT NULL DEFAULT 0,

                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE sessions (
                token TEXT PRIMARY KEY NOT NULL,
                user_id BLOB NOT NULL CHECK(length(user_id) = 16),

                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,

                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE INDEX sessions_by_user ON sessions (user_id);
        "#
        ),
        M::up(
            r#"
            CREATE TABLE notes (
                id BLOB PRIMARY KEY CHECK(length(id) = 16) NOT NULL UNIQUE DEFAULT (uuid7_now()),

                title TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]', -- json array of tag names
                image_ids TEXT, -- json array of blob ids
                image_id BLOB CHECK(image_id IS NULL OR length(image_id) = 16), -- legacy single image
                ai_generated_images TEXT, -- json array of ai images

                user_id BLOB NOT NULL CHECK(length(user_id) = 16),
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME,

                FOREIGN KEY (user_id) REFERENCES users (id)
            );

            CREATE INDEX notes_by_user ON notes (user_id, created_at);

            CREATE VIRTUAL TABLE notes_fts USING fts5(content, content = 'notes');

            CREATE TRIGGER notes_fts_insert AFTER INSERT ON notes BEGIN
                INSERT INTO notes_fts (rowid, content) VALUES (new.rowid, new.content);
            END;

            CREATE TRIGGER notes_fts_delete AFTER DELETE ON notes BEGIN
                INSERT INTO notes_fts (notes_fts, rowid, content) VALUES ('delete', old.rowid, old.content);
            END;

            CREATE TRIGGER notes_fts_update AFTER UPDATE OF content ON notes BEGIN
                INSERT INTO notes_fts (notes_fts, rowid, content) VALUES ('delete', old.rowid, old.content);
                INSERT INTO notes_fts (rowid, content) VALUES (new.rowid, new.content);
            END;
        "#
        ),
        M::up(
            r#"
            CREATE TABLE tags (
                id BLOB PRIMARY KEY CHECK(length(id) = 16) NOT NULL UNIQUE DEFAULT (uuid7_now()),

                name TEXT NOT NULL,
                color TEXT NOT NULL,

                user_id BLOB NOT NULL CHECK(length(user_id) = 16),
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,

                FOREIGN KEY (user_id) REFERENCES users (id)
            );

            CREATE UNIQUE INDEX tags_by_user_and_name ON tags (user_id, name);
        "#
        ),
        M::up(
            r#"
            CREATE TABLE blobs (
                id BLOB PRIMARY KEY CHECK(length(id) = 16) NOT NULL UNIQUE DEFAULT (uuid7_now()),

                content_type TEXT NOT NULL,
                size INTEGER NOT NULL,
                data BLOB NOT NULL,

                uploaded_by BLOB CHECK(length(uploaded_by) = 16),
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,

                FOREIGN KEY (uploaded_by) REFERENCES users (id)
            );

            CREATE TABLE upload_targets (
                token TEXT PRIMARY KEY NOT NULL,
                user_id BLOB NOT NULL CHECK(length(user_id) = 16),
                expires_at DATETIME NOT NULL,

                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
        "#
        ),
    ]);
}

