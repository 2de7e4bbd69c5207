//! Config-to-sync-map flow against the in-memory provider.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use planpilot::config::Config;
use planpilot::mapfile::read_sync_map;
use planpilot::run::{run_sync, RunOptions};
use planpilot_api::ItemType;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const PLAN: &str = r#"{
  "items": [
    {"id": "E1", "type": "EPIC", "title": "Ship the importer", "goal": "Importer works",
     "requirements": ["reads the feed"], "acceptance_criteria": ["feed imported"],
     "sub_item_ids": ["S1"]},
    {"id": "S1", "type": "STORY", "title": "Parse the feed", "goal": "Feed parsed",
     "requirements": ["handle all entry kinds"], "acceptance_criteria": ["entries parsed"],
     "parent_id": "E1"},
    {"id": "T1", "type": "TASK", "title": "Tokenize entries", "goal": "Entries tokenized",
     "requirements": ["tokenizer covers escapes"], "acceptance_criteria": ["escapes pass"],
     "parent_id": "S1", "estimate": {"tshirt": "M"}}
  ]
}"#;

fn config_json() -> String {
    r#"{
        "provider": "dry-run",
        "target": "acme/widgets",
        "auth": "gh-cli",
        "board_url": "https://github.com/orgs/acme/projects/7",
        "plan_paths": {"unified": "plan.json"},
        "sync_path": "out/sync-map.json"
    }"#
    .to_string()
}

#[tokio::test]
async fn sync_writes_a_sync_map_next_to_the_config() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plan.json", PLAN);
    let config_path = write(&dir, "planpilot.json", &config_json());

    let config = Config::load(&config_path).unwrap();
    let result = run_sync(&config, RunOptions::default()).await.unwrap();

    assert_eq!(result.total_created(), 3);
    assert_eq!(result.items_created[&ItemType::Epic], 1);

    let map = read_sync_map(&dir.path().join("out/sync-map.json"))
        .unwrap()
        .expect("sync map written");
    assert_eq!(map.entries.len(), 3);
    assert_eq!(map.target, "acme/widgets");
    assert_eq!(map.plan_id.len(), 12);
}

#[tokio::test]
async fn dry_run_leaves_no_sync_map_behind() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plan.json", PLAN);
    let config_path = write(&dir, "planpilot.json", &config_json());

    let config = Config::load(&config_path).unwrap();
    let result = run_sync(
        &config,
        RunOptions {
            dry_run: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(result.dry_run);
    assert_eq!(result.total_created(), 3);
    assert!(!dir.path().join("out/sync-map.json").exists());
}

#[tokio::test]
async fn recorded_plan_id_survives_content_edits() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plan.json", PLAN);
    let config_path = write(&dir, "planpilot.json", &config_json());
    let config = Config::load(&config_path).unwrap();

    let first = run_sync(&config, RunOptions::default()).await.unwrap();

    // Retitle an item: the content hash moves, the recorded id does not.
    write(&dir, "plan.json", &PLAN.replace("Tokenize entries", "Tokenize feed entries"));
    let plan = planpilot::load_plan(&config).unwrap();
    assert_eq!(plan.plan_id, first.sync_map.plan_id);
}
