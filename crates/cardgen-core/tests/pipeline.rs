use std::collections::HashMap;
use std::fs;
use std::path::Path;

use cardgen_core::catalog::{self, CatalogEntry};
use cardgen_core::config::StorageType;
use cardgen_core::{Application, CardType, CardgenError};
use tempfile::tempdir;

const CREATURES: &str = "\
Name,Cost,Effect,Attack,Defense,Trait
Demon Pup,1,Each time you OFFER; gain +1/1.,1,1,Demon
Storm Hawk,3,FLYING. ON ATTACK: deal 1 DAMAGE,2,1,Bird
";

fn write_config(dir: &Path, env: &str, body: &str) {
    fs::write(dir.join(format!("config.{}.toml", env)), body).expect("write config");
}

fn app_for(config_dir: &Path, env: &str) -> Application {
    let vars: HashMap<String, String> = [(
        "CONFIG_DIR".to_string(),
        config_dir.display().to_string(),
    )]
    .into_iter()
    .collect();
    Application::with_env(Some(env), vars).expect("bootstrap should succeed")
}

#[test]
fn test_pipeline_writes_catalog_and_images() {
    let dir = tempdir().unwrap();
    write_config(
        dir.path(),
        "test",
        r#"
[storage]
type = "memory"

[generator]
image_width = 60
image_height = 84
"#,
    );
    let app = app_for(dir.path(), "test");
    assert_eq!(app.config().storage.storage_type, StorageType::Memory);

    let images = dir.path().join("out/cards");
    let entries = catalog::process_cards(&app, CREATURES.as_bytes(), "creature", &images)
        .expect("pipeline should succeed");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "creature-Demon Pup");
    assert_eq!(entries[0].card.card_type, CardType::Creature);
    assert_eq!(entries[0].card.r#trait.as_deref(), Some("Demon"));
    assert!(entries[0].card.keywords.is_empty());
    assert!(images.join("creature-Demon Pup.png").is_file());
    assert!(images.join("creature-Storm Hawk.png").is_file());

    let catalog_path = dir.path().join("out/cards.json");
    catalog::write_catalog(&catalog_path, &entries).unwrap();
    let written: Vec<CatalogEntry> =
        serde_json::from_str(&fs::read_to_string(&catalog_path).unwrap()).unwrap();
    assert_eq!(written, entries);

    let stored = app.card_store().unwrap().list().unwrap();
    assert_eq!(stored.len(), 2);

    app.shutdown().unwrap();
    assert!(app.registry().list_registered().is_empty());
}

#[test]
fn test_pipeline_stops_at_first_bad_row() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path(), "missing");
    let input = "\
Name,Cost,Effect,Attack,Defense
Wolf,1,Howls,2,2
Bear,2,Mauls,big,3
";
    let images = dir.path().join("images");

    let err = catalog::process_cards(&app, input.as_bytes(), "creature", &images).unwrap_err();

    assert_eq!(err.line(), Some(3));
    assert!(!images.exists(), "no images before materialization succeeds");
    assert!(app.card_store().unwrap().list().unwrap().is_empty());
}

#[test]
fn test_invalid_card_is_a_downstream_failure() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path(), "missing");
    let input = "Name,Cost,Effect,Attack,Defense\nGhost,-5,Haunts,1,1\n";

    let err = catalog::process_cards(&app, input.as_bytes(), "creature", dir.path()).unwrap_err();

    assert_eq!(err.to_string(), "Failed to save card Ghost");
    assert!(matches!(
        err.root_cause(),
        CardgenError::Validation { field, .. } if field == "cost"
    ));
}

#[test]
fn test_card_name_cannot_leave_image_dir() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path(), "missing");
    let images = dir.path().join("a/b/images");
    let input = "Name,Cost,Effect\n../../../escaped,1,Zap\n";

    let err = catalog::process_cards(&app, input.as_bytes(), "spell", &images).unwrap_err();

    assert!(matches!(
        err.root_cause(),
        CardgenError::Validation { field, .. } if field == "name"
    ));
    assert!(!dir.path().join("a/b/escaped.png").exists());
    assert!(!dir.path().join("a").exists());
}

#[test]
fn test_bad_config_file_fails_bootstrap() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), "broken", "[server\nport = ");
    let config_dir = dir.path().display().to_string();
    let vars: HashMap<&str, &str> = HashMap::from([("CONFIG_DIR", config_dir.as_str())]);

    let err = Application::with_env(Some("broken"), vars).unwrap_err();
    assert_eq!(err.to_string(), "Failed to load configuration");
    assert!(matches!(err.root_cause(), CardgenError::ConfigFileInvalid { .. }));
}
