use itemstore_core::{
    InMemoryItemRepository, Item, ItemRepository, ItemService, ItemValidationError, RepoError,
    SharedItemRepository, SqliteItemRepository,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn backends() -> Vec<(&'static str, SharedItemRepository)> {
    let memory: SharedItemRepository = Arc::new(InMemoryItemRepository::new());
    let sqlite: SharedItemRepository = Arc::new(SqliteItemRepository::open_in_memory().unwrap());
    vec![("memory", memory), ("sqlite", sqlite)]
}

#[test]
fn first_insert_gets_id_one_and_is_listed() {
    for (backend, repo) in backends() {
        let created = repo.insert_item("Alice").unwrap();
        assert_eq!(created, Item::new(1, "Alice"), "{backend}");
        assert_eq!(
            repo.list_items().unwrap(),
            vec![Item::new(1, "Alice")],
            "{backend}"
        );
    }
}

#[test]
fn inserted_ids_are_unique_and_findable() {
    for (backend, repo) in backends() {
        let mut seen = HashSet::new();
        for index in 0..20 {
            let name = format!("item-{index}");
            let created = repo.insert_item(&name).unwrap();
            assert!(seen.insert(created.id), "{backend}: duplicate id {}", created.id);

            let found = repo.get_item(created.id).unwrap().unwrap();
            assert_eq!(found.name, name, "{backend}");
        }
    }
}

#[test]
fn list_returns_insertion_order() {
    for (backend, repo) in backends() {
        let names = ["zeta", "alpha", "mid"];
        for name in names {
            repo.insert_item(name).unwrap();
        }

        let listed: Vec<String> = repo
            .list_items()
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(listed, names, "{backend}");
    }
}

#[test]
fn update_replaces_name_and_keeps_id() {
    for (backend, repo) in backends() {
        let created = repo.insert_item("Alice").unwrap();

        let updated = repo.update_item(created.id, "Bob").unwrap();
        assert_eq!(updated, Item::new(created.id, "Bob"), "{backend}");
        assert_eq!(
            repo.get_item(created.id).unwrap(),
            Some(Item::new(created.id, "Bob")),
            "{backend}"
        );
    }
}

#[test]
fn update_unknown_id_returns_not_found() {
    for (backend, repo) in backends() {
        repo.insert_item("Alice").unwrap();
        let err = repo.update_item(99, "X").unwrap_err();
        assert!(matches!(err, RepoError::NotFound(99)), "{backend}: {err}");
    }
}

#[test]
fn update_validates_before_checking_existence() {
    for (backend, repo) in backends() {
        let err = repo.update_item(99, "   ").unwrap_err();
        assert!(
            matches!(err, RepoError::Validation(ItemValidationError::EmptyName)),
            "{backend}: {err}"
        );
    }
}

#[test]
fn delete_returns_record_and_hides_it() {
    for (backend, repo) in backends() {
        let created = repo.insert_item("Alice").unwrap();

        let deleted = repo.delete_item(created.id).unwrap();
        assert_eq!(deleted, created, "{backend}");
        assert_eq!(repo.get_item(created.id).unwrap(), None, "{backend}");

        let err = repo.delete_item(created.id).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(id) if id == created.id), "{backend}");
    }
}

#[test]
fn ids_are_not_reused_after_delete() {
    for (backend, repo) in backends() {
        let first = repo.insert_item("first").unwrap();
        let second = repo.insert_item("second").unwrap();
        repo.delete_item(second.id).unwrap();

        let third = repo.insert_item("third").unwrap();
        assert!(third.id > second.id, "{backend}: id {} reused", third.id);
        assert_ne!(third.id, first.id, "{backend}");
    }
}

#[test]
fn empty_name_is_rejected_without_adding_a_row() {
    for (backend, repo) in backends() {
        repo.insert_item("keep").unwrap();

        for bad in ["", "   ", "\n\t"] {
            let err = repo.insert_item(bad).unwrap_err();
            assert!(
                matches!(err, RepoError::Validation(ItemValidationError::EmptyName)),
                "{backend}: {err}"
            );
        }
        assert_eq!(repo.count_items().unwrap(), 1, "{backend}");
    }
}

#[test]
fn names_are_stored_trimmed() {
    for (backend, repo) in backends() {
        let created = repo.insert_item("  padded  ").unwrap();
        assert_eq!(created.name, "padded", "{backend}");

        let updated = repo.update_item(created.id, "\tagain\n").unwrap();
        assert_eq!(updated.name, "again", "{backend}");
    }
}

#[test]
fn service_reports_not_found_for_unknown_id() {
    for (backend, repo) in backends() {
        let service = ItemService::new(repo);
        let err = service.get_item(7).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(7)), "{backend}");
    }
}

#[test]
fn service_wraps_full_lifecycle() {
    let service = ItemService::new(InMemoryItemRepository::new());

    let created = service.create_item("Alice").unwrap();
    assert_eq!(service.get_item(created.id).unwrap().name, "Alice");

    service.update_item(created.id, "Bob").unwrap();
    assert_eq!(service.list_items().unwrap(), vec![Item::new(1, "Bob")]);

    service.delete_item(created.id).unwrap();
    assert!(matches!(
        service.get_item(created.id),
        Err(RepoError::NotFound(1))
    ));
}

#[test]
fn seed_if_empty_only_applies_to_empty_store() {
    let service = ItemService::new(InMemoryItemRepository::new());

    assert_eq!(service.seed_if_empty(&["Alice", "Bob"]).unwrap(), 2);
    assert_eq!(service.count_items().unwrap(), 2);

    assert_eq!(service.seed_if_empty(&["Carol"]).unwrap(), 0);
    assert_eq!(service.count_items().unwrap(), 2);
}

#[test]
fn seed_with_invalid_name_inserts_nothing() {
    let service = ItemService::new(InMemoryItemRepository::new());

    let err = service.seed_if_empty(&["Alice", " "]).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(service.count_items().unwrap(), 0);
}

#[test]
fn concurrent_inserts_get_distinct_ids() {
    for (backend, repo) in backends() {
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    (0..25)
                        .map(|index| repo.insert_item(&format!("w{worker}-{index}")).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<_> = workers
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 100, "{backend}");
        assert_eq!(repo.count_items().unwrap(), 100, "{backend}");
    }
}
