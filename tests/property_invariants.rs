use proptest::prelude::*;

use cinelog::{
    core::store::CatalogStore,
    movie::MovieDraft,
    performer::{PerformerDraft, PerformerPatch},
    types::PerformerId,
};

#[derive(Debug, Clone)]
enum Action {
    AddMovie { rating: u8 },
    AddPerformer { name_idx: u8, rating: u8 },
    Link { movie: u8, performer: u8 },
    Unlink { movie: u8, performer: u8 },
    RemoveMovie { movie: u8 },
    RemovePerformer { performer: u8 },
    Rename { performer: u8, name_idx: u8 },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..=100).prop_map(|rating| Action::AddMovie { rating }),
        (0u8..16, 0u8..=100).prop_map(|(name_idx, rating)| Action::AddPerformer {
            name_idx,
            rating
        }),
        (0u8..24, 0u8..24).prop_map(|(movie, performer)| Action::Link { movie, performer }),
        (0u8..24, 0u8..24).prop_map(|(movie, performer)| Action::Unlink { movie, performer }),
        (0u8..24).prop_map(|movie| Action::RemoveMovie { movie }),
        (0u8..24).prop_map(|performer| Action::RemovePerformer { performer }),
        (0u8..24, 0u8..16).prop_map(|(performer, name_idx)| Action::Rename {
            performer,
            name_idx
        }),
    ]
}

fn performer_name(idx: u8) -> (String, String) {
    (format!("First{idx}"), format!("Last{idx}"))
}

fn pick(ids: &[u64], raw: u8) -> Option<u64> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[usize::from(raw) % ids.len()])
    }
}

fn assert_symmetry(store: &CatalogStore) {
    for mid in store.movie_ids().to_vec() {
        let movie = store.get_movie(mid).expect("movie in order list");
        for pid in &movie.performers {
            let performer = store.get_performer(*pid).expect("linked performer exists");
            assert!(
                performer.movies.contains(&mid),
                "movie {mid} lists performer {pid} but not vice versa"
            );
        }
    }
    for pid in store.performer_ids().to_vec() {
        let performer = store.get_performer(pid).expect("performer in order list");
        for mid in &performer.movies {
            let movie = store.get_movie(*mid).expect("linked movie exists");
            assert!(
                movie.performers.contains(&pid),
                "performer {pid} lists movie {mid} but not vice versa"
            );
        }
    }
}

fn assert_name_index(store: &CatalogStore) {
    for pid in store.performer_ids().to_vec() {
        let name = store
            .get_performer(pid)
            .expect("performer in order list")
            .full_name();
        let found = store
            .find_performer_by_name(&name)
            .expect("every performer is findable by its own name");
        assert_eq!(found.full_name(), name);
    }
}

proptest! {
    #[test]
    fn random_sequences_preserve_symmetry_and_cascade_rules(
        actions in prop::collection::vec(action_strategy(), 1..200)
    ) {
        let mut store = CatalogStore::new();

        for action in actions {
            match action {
                Action::AddMovie { rating } => {
                    let _ = store.add_movie(MovieDraft {
                        title: "M".to_string(),
                        rating: u32::from(rating),
                        ..MovieDraft::default()
                    });
                }
                Action::AddPerformer { name_idx, rating } => {
                    let (first_name, last_name) = performer_name(name_idx);
                    let _ = store.add_performer(PerformerDraft {
                        first_name,
                        last_name,
                        rating: u32::from(rating),
                        ..PerformerDraft::default()
                    });
                }
                Action::Link { movie, performer } => {
                    let (Some(m), Some(p)) = (
                        pick(store.movie_ids(), movie),
                        pick(store.performer_ids(), performer),
                    ) else {
                        continue;
                    };
                    store.link(m, p).expect("link between existing entities");
                }
                Action::Unlink { movie, performer } => {
                    let (Some(m), Some(p)) = (
                        pick(store.movie_ids(), movie),
                        pick(store.performer_ids(), performer),
                    ) else {
                        continue;
                    };
                    let outcome = store.unlink(m, p).expect("unlink between existing entities");
                    if outcome.orphaned {
                        prop_assert!(store.get_performer(p).expect("kept").movies.is_empty());
                    }
                }
                Action::RemoveMovie { movie } => {
                    let Some(m) = pick(store.movie_ids(), movie) else {
                        continue;
                    };
                    let expected: Vec<PerformerId> =
                        store.orphans_after_removal(m).expect("preview");
                    let removed = store.remove_movie(m).expect("remove movie");
                    prop_assert_eq!(&removed, &expected);
                    for pid in removed {
                        prop_assert!(store.get_performer(pid).is_none());
                    }
                    prop_assert!(store.get_movie(m).is_none());
                }
                Action::RemovePerformer { performer } => {
                    let Some(p) = pick(store.performer_ids(), performer) else {
                        continue;
                    };
                    store.remove_performer(p).expect("remove performer");
                    prop_assert!(store.get_performer(p).is_none());
                }
                Action::Rename { performer, name_idx } => {
                    let Some(p) = pick(store.performer_ids(), performer) else {
                        continue;
                    };
                    let (first_name, last_name) = performer_name(name_idx);
                    store
                        .update_performer(p, PerformerPatch {
                            first_name: Some(first_name),
                            last_name: Some(last_name),
                            ..PerformerPatch::default()
                        })
                        .expect("rename existing performer");
                }
            }

            assert_symmetry(&store);
            assert_name_index(&store);

            // No stale ids survive in either order list.
            for mid in store.movie_ids() {
                prop_assert!(store.get_movie(*mid).is_some());
            }
            for pid in store.performer_ids() {
                prop_assert!(store.get_performer(*pid).is_some());
            }
        }
    }

    #[test]
    fn link_then_unlink_restores_relationship_state(
        performers in 1u8..6,
        extra_links in prop::collection::vec((0u8..6, 0u8..6), 0..12)
    ) {
        let mut store = CatalogStore::new();
        let m1 = store.add_movie(MovieDraft { title: "A".to_string(), ..MovieDraft::default() });
        let m2 = store.add_movie(MovieDraft { title: "B".to_string(), ..MovieDraft::default() });

        for i in 0..performers {
            let (first_name, last_name) = performer_name(i);
            let _ = store.add_performer(PerformerDraft {
                first_name,
                last_name,
                ..PerformerDraft::default()
            });
        }
        for (movie, performer) in extra_links {
            let m = if movie % 2 == 0 { m1 } else { m2 };
            if let Some(p) = pick(store.performer_ids(), performer) {
                store.link(m, p).expect("link");
            }
        }

        let target = pick(store.performer_ids(), 0).expect("performer");
        let before_movie = store.get_movie_cloned(m1).expect("movie");
        let before_performer = store.get_performer_cloned(target).expect("performer");
        let was_linked = before_movie.performers.contains(&target);

        if !was_linked {
            store.link(m1, target).expect("link");
            let outcome = store.unlink(m1, target).expect("unlink");
            prop_assert!(outcome.was_linked);
            prop_assert_eq!(store.get_movie_cloned(m1).expect("movie"), before_movie);
            prop_assert_eq!(
                store.get_performer_cloned(target).expect("performer"),
                before_performer
            );
        }
    }
}
