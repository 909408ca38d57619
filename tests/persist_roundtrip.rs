use std::fs;

use tempfile::TempDir;

use cinelog::{
    core::store::{CatalogSnapshot, CatalogStore},
    movie::MovieDraft,
    performer::PerformerDraft,
    persist::{PersistError, dir::CatalogDir},
};

fn movie(title: &str, rating: u32) -> MovieDraft {
    MovieDraft {
        title: title.to_string(),
        rating,
        ..MovieDraft::default()
    }
}

fn performer(first: &str, last: &str) -> PerformerDraft {
    PerformerDraft {
        first_name: first.to_string(),
        last_name: last.to_string(),
        ..PerformerDraft::default()
    }
}

/// Performer movie lists are rebuilt from movie order at load; compare
/// them as sets so link-call order does not matter.
fn normalized(mut snapshot: CatalogSnapshot) -> CatalogSnapshot {
    for p in &mut snapshot.performers {
        p.movies.sort_unstable();
    }
    snapshot
}

fn populated_store() -> CatalogStore {
    let mut store = CatalogStore::new();
    let m1 = store.add_movie(MovieDraft {
        title: "Heat".to_string(),
        rating: 50,
        country: "USA".to_string(),
        filming_locations: vec!["Los Angeles".to_string()],
        alternative_titles: vec!["Heat 2".to_string()],
        external_id: Some("tt0113277".to_string()),
        ..MovieDraft::default()
    });
    let m2 = store.add_movie(movie("Ronin", 60));
    let m3 = store.add_movie(movie("The Irishman", 70));

    let p1 = store.add_performer(performer("Al", "Pacino"));
    let p2 = store.add_performer(performer("Robert", "De Niro"));
    let p3 = store.add_performer(performer("Val", "Kilmer"));

    store.link(m1, p1).expect("link");
    store.link(m3, p1).expect("link");
    store.link(m2, p2).expect("link");
    store.link(m1, p2).expect("link");
    store.link(m1, p3).expect("link");
    store
}

#[test]
fn empty_store_round_trips() {
    let tmp = TempDir::new().expect("tmp");
    let dir = CatalogDir::open(tmp.path().join("catalog"));

    let store = CatalogStore::new();
    dir.save(&store.export_snapshot()).expect("save");

    let (loaded, report) = dir.load_store().expect("load");
    assert_eq!(loaded.export_snapshot(), CatalogSnapshot::empty());
    assert_eq!(report.dangling_links, 0);
    assert_eq!(report.skipped_files, 0);
    assert!(!loaded.is_dirty());
}

#[test]
fn populated_graph_round_trips_isomorphic() {
    let tmp = TempDir::new().expect("tmp");
    let dir = CatalogDir::open(tmp.path().join("catalog"));

    let store = populated_store();
    dir.save(&store.export_snapshot()).expect("save");

    let (loaded, report) = dir.load_store().expect("load");
    assert_eq!(report.dangling_links, 0);
    assert_eq!(report.skipped_files, 0);
    assert_eq!(
        normalized(loaded.export_snapshot()),
        normalized(store.export_snapshot())
    );

    // Fresh ids continue past the loaded ones.
    let mut loaded = loaded;
    let next = loaded.add_movie(movie("New", 1));
    assert!(store.movie_ids().iter().all(|id| *id != next));
}

#[test]
fn missing_directory_loads_as_empty_catalog() {
    let tmp = TempDir::new().expect("tmp");
    let dir = CatalogDir::open(tmp.path().join("nowhere"));

    let (loaded, report) = dir.load_store().expect("load");
    assert!(loaded.movie_ids().is_empty());
    assert!(loaded.performer_ids().is_empty());
    assert!(!report.recovered_from_backup);
}

#[test]
fn dangling_performer_reference_is_skipped_and_counted() {
    let tmp = TempDir::new().expect("tmp");
    let dir = CatalogDir::open(tmp.path().join("catalog"));

    let store = populated_store();
    dir.save(&store.export_snapshot()).expect("save");

    // Corrupt one movie record with a reference to a performer that does
    // not exist on disk.
    let movie_file = tmp.path().join("catalog/records/movie-2.json");
    let mut value: serde_json::Value =
        serde_json::from_slice(&fs::read(&movie_file).expect("read")).expect("parse");
    value["performers"]
        .as_array_mut()
        .expect("performers")
        .push(serde_json::json!(999));
    fs::write(&movie_file, serde_json::to_vec_pretty(&value).expect("encode")).expect("write");

    let (loaded, report) = dir.load_store().expect("load");
    assert_eq!(report.dangling_links, 1);
    assert_eq!(loaded.get_movie(2).expect("movie").performers, vec![2]);
}

#[test]
fn unreadable_record_file_is_skipped_and_counted() {
    let tmp = TempDir::new().expect("tmp");
    let dir = CatalogDir::open(tmp.path().join("catalog"));

    let store = populated_store();
    dir.save(&store.export_snapshot()).expect("save");

    fs::write(tmp.path().join("catalog/records/movie-2.json"), b"not json").expect("write");

    let (loaded, report) = dir.load_store().expect("load");
    assert_eq!(report.skipped_files, 1);
    assert!(loaded.get_movie(2).is_none());
    assert!(loaded.get_movie(1).is_some());
    assert!(loaded.get_movie(3).is_some());
    // The skipped movie also disappears from the display order.
    assert_eq!(loaded.movie_ids(), &[1, 3]);
}

#[test]
fn interrupted_save_leaves_prior_state_loadable() {
    let tmp = TempDir::new().expect("tmp");
    let dir = CatalogDir::open(tmp.path().join("catalog"));

    let store = populated_store();
    dir.save(&store.export_snapshot()).expect("save");

    // Simulate a crash mid-staging: a half-written staging directory next
    // to the intact live one.
    let staging = tmp.path().join("catalog/records.new");
    fs::create_dir(&staging).expect("staging");
    fs::write(staging.join("movie-1.json"), b"{ partial").expect("partial");

    let (loaded, report) = dir.load_store().expect("load");
    assert_eq!(report.skipped_files, 0);
    assert_eq!(
        normalized(loaded.export_snapshot()),
        normalized(store.export_snapshot())
    );

    // The next save discards the stale staging directory and succeeds.
    dir.save(&store.export_snapshot()).expect("resave");
    assert!(!staging.exists());
}

#[test]
fn crash_between_final_renames_recovers_from_backup() {
    let tmp = TempDir::new().expect("tmp");
    let dir = CatalogDir::open(tmp.path().join("catalog"));

    let store = populated_store();
    dir.save(&store.export_snapshot()).expect("save");

    // Simulate a crash after the live directory was renamed aside but
    // before the staging directory took its place.
    fs::rename(
        tmp.path().join("catalog/records"),
        tmp.path().join("catalog/records.old"),
    )
    .expect("rename");

    let (loaded, report) = dir.load_store().expect("load");
    assert!(report.recovered_from_backup);
    assert_eq!(
        normalized(loaded.export_snapshot()),
        normalized(store.export_snapshot())
    );
}

#[test]
fn unknown_format_version_fails_the_load() {
    let tmp = TempDir::new().expect("tmp");
    let dir = CatalogDir::open(tmp.path().join("catalog"));

    dir.save(&CatalogStore::new().export_snapshot()).expect("save");

    let manifest_file = tmp.path().join("catalog/records/catalog.json");
    let mut value: serde_json::Value =
        serde_json::from_slice(&fs::read(&manifest_file).expect("read")).expect("parse");
    value["format_version"] = serde_json::json!(99);
    fs::write(&manifest_file, serde_json::to_vec(&value).expect("encode")).expect("write");

    let err = dir.load().expect_err("load");
    assert!(matches!(err, PersistError::Message(_)));
}

#[test]
fn image_paths_derive_from_entity_ids() {
    let dir = CatalogDir::open("/tmp/catalog");
    assert!(dir.movie_image_path(7).ends_with("images/movie-7"));
    assert!(dir.performer_image_path(3).ends_with("images/performer-3"));
}
