//! Search API demo over a seeded in-memory store
//!
//! ```sh
//! cargo run --example search_api                 # built-in users/files config
//! cargo run --example search_api -- search.yaml  # your own config
//!
//! curl -X POST 'http://127.0.0.1:3000/users/search?perPage=5' \
//!      -H 'content-type: application/json' \
//!      -d '{"where": [["name", "like", "ali"]], "whereNull": ["deleted_at"]}'
//! ```

use anyhow::Result;
use filterdoc::prelude::*;
use tracing_subscriber::EnvFilter;

const NAMES: &[&str] = &[
    "Alice Martin",
    "Bob Dupont",
    "Carla Rossi",
    "David Chen",
    "Elena Petrova",
    "Farid Haddad",
    "Grace Okafor",
    "Hugo Lefebvre",
    "Ines Alves",
    "Jonas Berg",
    "Kalinda Ali",
    "Liam Walsh",
];

fn seed(store: &InMemoryStore) -> Result<()> {
    for (i, name) in NAMES.iter().enumerate() {
        let id = i as i64 + 1;
        let login = name.to_lowercase().replace(' ', ".");
        store.insert(
            "users",
            json!({
                "id": id,
                "name": name,
                "email": format!("{}@example.com", login),
                "document": format!("{:011}", 52_998_224_725_i64 + id * 7),
                "password": "$2y$10$hashedpasswordplaceholder",
                "remember_token": null,
                "created_at": format!("2024-03-{:02} 09:{:02}:00", id, id * 3),
                "updated_at": format!("2024-03-{:02} 09:{:02}:00", id, id * 3),
                "deleted_at": if id % 6 == 0 { json!("2024-04-01 12:00:00") } else { Value::Null },
            }),
        )?;

        for n in 0..3 {
            let file_id = id * 10 + n;
            store.insert(
                "files",
                json!({
                    "id": file_id,
                    "user_id": id,
                    "original": format!("scan-{}.pdf", file_id),
                    "name": format!("{}.pdf", file_id),
                    "size": 40_000 + file_id * 1_250,
                    "mimeType": if n == 2 { "image/png" } else { "application/pdf" },
                    "created_at": format!("2024-03-{:02} 1{}:00:00", id, n),
                    "updated_at": format!("2024-03-{:02} 1{}:00:00", id, n),
                    "deleted_at": null,
                }),
            )?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,filterdoc=debug,tower_http=debug")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SearchConfig::from_yaml_file(&path)?,
        None => SearchConfig::default_config(),
    };
    let bind = config.server.bind.clone();

    let store = InMemoryStore::new();
    seed(&store)?;
    tracing::info!(
        users = store.len("users")?,
        files = store.len("files")?,
        "Seeded in-memory store"
    );

    ServerBuilder::new()
        .with_config(config)
        .with_backend(store)
        .serve(&bind)
        .await
}
