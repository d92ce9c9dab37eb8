use taskboard_core::{BoardService, LocalStore, StoreError, TaskPatch};

fn service() -> BoardService {
    BoardService::new(Box::new(
        LocalStore::open_in_memory().expect("store should open"),
    ))
}

#[test]
fn create_update_read_back_keeps_untouched_fields() {
    let service = service();
    let project_id = service.create_project("inbox").expect("create project");
    let task_id = service.create_task(&project_id, "write notes").expect("create task");

    let before = service.tasks_of(&project_id).remove(0);
    assert_eq!(before.comment, "");

    service
        .update_task(&task_id, &TaskPatch::comment("needs review"))
        .expect("update comment");

    let after = service.tasks_of(&project_id).remove(0);
    assert_eq!(after.comment, "needs review");
    // Everything the patch did not name is unchanged.
    assert_eq!(after.id, before.id);
    assert_eq!(after.title, before.title);
    assert_eq!(after.order, before.order);
    assert_eq!(after.created_at, before.created_at);
}

#[test]
fn patch_with_both_fields_replaces_both() {
    let service = service();
    let project_id = service.create_project("inbox").expect("create project");
    let task_id = service.create_task(&project_id, "draft").expect("create task");

    let patch = TaskPatch {
        title: Some("final".to_string()),
        comment: Some("shipped".to_string()),
    };
    service.update_task(&task_id, &patch).expect("update task");

    let task = service.tasks_of(&project_id).remove(0);
    assert_eq!(task.title, "final");
    assert_eq!(task.comment, "shipped");
}

#[test]
fn empty_patch_is_a_no_op_even_for_missing_ids() {
    let service = service();
    service
        .update_task("missing", &TaskPatch::default())
        .expect("empty patch should not touch the backend");
}

#[test]
fn rename_project_changes_only_the_title() {
    let service = service();
    let id = service.create_project("drafty").expect("create project");
    let before = service.snapshot_projects().remove(0);

    service.rename_project(&id, "final name").expect("rename");

    let after = service.snapshot_projects().remove(0);
    assert_eq!(after.title, "final name");
    assert_eq!(after.order, before.order);
    assert_eq!(after.created_at, before.created_at);
}

#[test]
fn empty_titles_are_valid_at_the_data_layer() {
    // Input guards live in the view layer; the store accepts empty text.
    let service = service();
    let id = service.create_project("").expect("create project");
    service.rename_project(&id, "").expect("rename to empty");
    assert_eq!(service.snapshot_projects()[0].title, "");
}

#[test]
fn missing_targets_surface_not_found() {
    let service = service();

    let err = service.rename_project("nope", "x").expect_err("rename");
    assert!(matches!(err, StoreError::NotFound(id) if id == "nope"));

    let err = service.delete_project("nope").expect_err("delete project");
    assert!(matches!(err, StoreError::NotFound(_)));

    let err = service
        .update_task("nope", &TaskPatch::title("x"))
        .expect_err("update task");
    assert!(matches!(err, StoreError::NotFound(_)));

    let err = service.delete_task("nope").expect_err("delete task");
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn task_creation_requires_an_existing_project() {
    let service = service();
    let err = service
        .create_task("ghost-project", "orphan")
        .expect_err("create task should fail");
    assert!(matches!(err, StoreError::UnknownProject(id) if id == "ghost-project"));
}

#[test]
fn deleting_a_task_leaves_its_siblings() {
    let service = service();
    let project_id = service.create_project("inbox").expect("create project");
    let keep = service.create_task(&project_id, "keep").expect("task");
    let drop = service.create_task(&project_id, "drop").expect("task");

    service.delete_task(&drop).expect("delete task");

    let ids: Vec<String> = service.tasks_of(&project_id).into_iter().map(|t| t.id).collect();
    assert_eq!(ids, [keep]);
}
