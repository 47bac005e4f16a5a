use porttrack_core::db::open_db_in_memory;
use porttrack_core::{
    Container, ContainerDraft, ContainerId, ContainerPatch, ContainerRepository,
    ContainerService, ContainerValidationError, InMemoryContainerRepository, NewContainer,
    RepoError, RepoResult, ServiceError, SqliteContainerRepository,
};
use std::collections::HashSet;

fn seeded(repo: &InMemoryContainerRepository) -> Container {
    ContainerService::new(repo)
        .create(NewContainer::new("A", "UNLOADING"))
        .unwrap()
}

#[test]
fn create_assigns_id_and_keeps_fields() {
    let repo = InMemoryContainerRepository::new();
    let service = ContainerService::new(&repo);

    let created = service
        .create(NewContainer::new("MSCU1234567", "CUSTOMS_CLEARANCE"))
        .unwrap();
    assert!(created.id > 0);
    assert_eq!(created.code, "MSCU1234567");
    assert_eq!(created.status, "CUSTOMS_CLEARANCE");

    let fetched = service.get(created.id).unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn create_rejects_missing_fields_without_writing() {
    let repo = InMemoryContainerRepository::new();
    let service = ContainerService::new(&repo);

    let cases = [
        (
            NewContainer {
                code: None,
                status: Some("UNLOADING".to_string()),
            },
            ContainerValidationError::MissingCode,
        ),
        (
            NewContainer {
                code: Some("CNT1".to_string()),
                status: None,
            },
            ContainerValidationError::MissingStatus,
        ),
        (NewContainer::default(), ContainerValidationError::MissingCode),
        (
            NewContainer::new("CNT1", "  "),
            ContainerValidationError::EmptyStatus,
        ),
    ];

    for (input, expected) in cases {
        let err = service.create(input).unwrap_err();
        assert!(
            matches!(err, ServiceError::Validation(actual) if actual == expected),
            "unexpected error: {err}"
        );
    }
    assert!(repo.is_empty());
}

#[test]
fn get_on_missing_id_is_absent_not_error() {
    let repo = InMemoryContainerRepository::new();
    let service = ContainerService::new(&repo);

    for id in [-1, 0, 1, 1_000_000] {
        assert!(service.get(id).unwrap().is_none());
    }
}

#[test]
fn list_all_is_empty_then_returns_every_container() {
    let repo = InMemoryContainerRepository::new();
    let service = ContainerService::new(&repo);
    assert!(service.list_all().unwrap().is_empty());

    let created: HashSet<(ContainerId, String, String)> = ["C1", "C2", "C3"]
        .into_iter()
        .map(|code| service.create(NewContainer::new(code, "UNLOADING")).unwrap())
        .map(|c| (c.id, c.code, c.status))
        .collect();

    let listed: HashSet<(ContainerId, String, String)> = service
        .list_all()
        .unwrap()
        .into_iter()
        .map(|c| (c.id, c.code, c.status))
        .collect();
    assert_eq!(listed, created);
}

#[test]
fn update_merges_only_present_fields() {
    let repo = InMemoryContainerRepository::new();
    let stored = seeded(&repo);
    let service = ContainerService::new(&repo);

    let patch = ContainerPatch {
        code: None,
        status: Some("PICKED_UP".to_string()),
    };
    let updated = service.update(stored.id, &patch).unwrap();
    assert_eq!(updated.code, "A");
    assert_eq!(updated.status, "PICKED_UP");
    assert_eq!(service.get(stored.id).unwrap().unwrap(), updated);

    let renamed = service
        .update(stored.id, &ContainerPatch::code("B"))
        .unwrap();
    assert_eq!(renamed.code, "B");
    assert_eq!(renamed.status, "PICKED_UP");
}

#[test]
fn empty_patch_is_a_noop_that_still_saves() {
    let repo = CountingRepository::default();
    let service = ContainerService::new(&repo);
    let stored = service.create(NewContainer::new("A", "UNLOADING")).unwrap();

    let updated = service.update(stored.id, &ContainerPatch::default()).unwrap();
    assert_eq!(updated, stored);
    assert_eq!(repo.saves.get(), 1);
}

#[test]
fn update_missing_id_is_not_found_for_any_patch() {
    let repo = InMemoryContainerRepository::new();
    let service = ContainerService::new(&repo);

    let patches = [
        ContainerPatch::default(),
        ContainerPatch::status("PICKED_UP"),
        ContainerPatch {
            code: Some(String::new()),
            status: None,
        },
    ];
    for patch in patches {
        let err = service.update(5, &patch).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(5)));
    }
}

#[test]
fn update_rejects_blank_values_and_keeps_stored_record() {
    let repo = InMemoryContainerRepository::new();
    let stored = seeded(&repo);
    let service = ContainerService::new(&repo);

    let err = service
        .update(stored.id, &ContainerPatch::code(""))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ContainerValidationError::EmptyCode)
    ));
    assert_eq!(service.get(stored.id).unwrap().unwrap(), stored);
}

#[test]
fn update_save_failure_is_persistence_error_with_cause() {
    let repo = FaultyRepository::with(Fault::SaveFails);
    let service = ContainerService::new(&repo);
    let stored = service.create(NewContainer::new("A", "UNLOADING")).unwrap();

    let err = service
        .update(stored.id, &ContainerPatch::status("PICKED_UP"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(RepoError::InvalidData(_))));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn read_failures_are_persistence_errors_not_absence() {
    let repo = FaultyRepository::with(Fault::ReadFails);
    let service = ContainerService::new(&repo);
    service.create(NewContainer::new("A", "UNLOADING")).unwrap();

    let get = service.get(1).unwrap_err();
    assert!(matches!(get, ServiceError::Persistence(RepoError::InvalidData(_))));

    let list = service.list_all().unwrap_err();
    assert!(matches!(list, ServiceError::Persistence(RepoError::InvalidData(_))));

    // Update and delete look the record up first, so they fail the same way.
    let update = service
        .update(1, &ContainerPatch::status("PICKED_UP"))
        .unwrap_err();
    assert!(matches!(update, ServiceError::Persistence(_)));
    assert!(matches!(service.delete(1), Err(ServiceError::Persistence(_))));
}

#[test]
fn delete_storage_failure_is_persistence_error_and_keeps_record() {
    let repo = FaultyRepository::with(Fault::DeleteFails);
    let service = ContainerService::new(&repo);
    let stored = service.create(NewContainer::new("A", "UNLOADING")).unwrap();

    let err = service.delete(stored.id).unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(RepoError::InvalidData(_))));
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(service.get(stored.id).unwrap(), Some(stored));
}

#[test]
fn row_removed_between_lookup_and_write_is_not_found() {
    let repo = FaultyRepository::with(Fault::RowVanishes);
    let service = ContainerService::new(&repo);
    let stored = service.create(NewContainer::new("A", "UNLOADING")).unwrap();

    let update = service
        .update(stored.id, &ContainerPatch::status("PICKED_UP"))
        .unwrap_err();
    assert!(matches!(update, ServiceError::NotFound(id) if id == stored.id));

    let second = service.create(NewContainer::new("B", "UNLOADING")).unwrap();
    let delete = service.delete(second.id).unwrap_err();
    assert!(matches!(delete, ServiceError::NotFound(id) if id == second.id));
}

#[test]
fn delete_missing_id_is_not_found_and_leaves_store_intact() {
    let repo = InMemoryContainerRepository::new();
    seeded(&repo);
    let service = ContainerService::new(&repo);

    let err = service.delete(42).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(42)));
    assert_eq!(repo.len(), 1);
}

#[test]
fn delete_removes_exactly_one_record() {
    let repo = InMemoryContainerRepository::new();
    let service = ContainerService::new(&repo);
    let keep = service.create(NewContainer::new("KEEP", "UNLOADING")).unwrap();
    let removed = service.create(NewContainer::new("DROP", "UNLOADING")).unwrap();

    service.delete(removed.id).unwrap();
    assert!(service.get(removed.id).unwrap().is_none());
    assert_eq!(service.list_all().unwrap(), vec![keep]);
}

#[test]
fn status_outside_known_set_is_accepted() {
    let repo = InMemoryContainerRepository::new();
    let service = ContainerService::new(&repo);

    let created = service
        .create(NewContainer::new("CNT9", "LOST_AT_SEA"))
        .unwrap();
    assert_eq!(created.status, "LOST_AT_SEA");

    let updated = service
        .update(created.id, &ContainerPatch::status("unloading"))
        .unwrap();
    assert_eq!(updated.status, "unloading");
    assert_eq!(updated.known_status(), None);
}

#[test]
fn lifecycle_scenario_over_sqlite() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContainerRepository::try_new(&conn).unwrap();
    let service = ContainerService::new(repo);

    let created = service.create(NewContainer::new("CNT1", "UNLOADING")).unwrap();
    assert_eq!(created.id, 1);

    let updated = service
        .update(1, &ContainerPatch::status("PICKED_UP"))
        .unwrap();
    assert_eq!(updated, Container::new(1, "CNT1", "PICKED_UP").unwrap());

    service.delete(1).unwrap();
    assert!(service.get(1).unwrap().is_none());
    assert!(matches!(service.delete(1), Err(ServiceError::NotFound(1))));
}

/// Counts saves on top of the in-memory store.
#[derive(Default)]
struct CountingRepository {
    inner: InMemoryContainerRepository,
    saves: std::cell::Cell<usize>,
}

impl ContainerRepository for CountingRepository {
    fn insert_container(&self, draft: &ContainerDraft) -> RepoResult<Container> {
        self.inner.insert_container(draft)
    }

    fn save_container(&self, container: &Container) -> RepoResult<Container> {
        self.saves.set(self.saves.get() + 1);
        self.inner.save_container(container)
    }

    fn find_container(&self, id: ContainerId) -> RepoResult<Option<Container>> {
        self.inner.find_container(id)
    }

    fn list_containers(&self) -> RepoResult<Vec<Container>> {
        self.inner.list_containers()
    }

    fn delete_container(&self, id: ContainerId) -> RepoResult<()> {
        self.inner.delete_container(id)
    }
}

/// Storage fault injected into an otherwise working in-memory store.
#[derive(Clone, Copy)]
enum Fault {
    SaveFails,
    ReadFails,
    DeleteFails,
    /// The row is removed just before a save or delete reaches storage.
    RowVanishes,
}

struct FaultyRepository {
    inner: InMemoryContainerRepository,
    fault: Fault,
}

impl FaultyRepository {
    fn with(fault: Fault) -> Self {
        Self {
            inner: InMemoryContainerRepository::new(),
            fault,
        }
    }

    fn storage_fault() -> RepoError {
        RepoError::InvalidData("disk full".to_string())
    }
}

impl ContainerRepository for FaultyRepository {
    fn insert_container(&self, draft: &ContainerDraft) -> RepoResult<Container> {
        self.inner.insert_container(draft)
    }

    fn save_container(&self, container: &Container) -> RepoResult<Container> {
        match self.fault {
            Fault::SaveFails => Err(Self::storage_fault()),
            Fault::RowVanishes => {
                let _ = self.inner.delete_container(container.id);
                self.inner.save_container(container)
            }
            _ => self.inner.save_container(container),
        }
    }

    fn find_container(&self, id: ContainerId) -> RepoResult<Option<Container>> {
        match self.fault {
            Fault::ReadFails => Err(Self::storage_fault()),
            _ => self.inner.find_container(id),
        }
    }

    fn list_containers(&self) -> RepoResult<Vec<Container>> {
        match self.fault {
            Fault::ReadFails => Err(Self::storage_fault()),
            _ => self.inner.list_containers(),
        }
    }

    fn delete_container(&self, id: ContainerId) -> RepoResult<()> {
        match self.fault {
            Fault::DeleteFails => Err(Self::storage_fault()),
            Fault::RowVanishes => {
                let _ = self.inner.delete_container(id);
                self.inner.delete_container(id)
            }
            _ => self.inner.delete_container(id),
        }
    }
}
