use std::collections::HashSet;
use taskboard_core::{BoardService, BoardStore, LocalStore};

fn service() -> BoardService {
    BoardService::new(Box::new(
        LocalStore::open_in_memory().expect("store should open"),
    ))
}

#[test]
fn created_projects_get_strictly_increasing_unique_orders() {
    let service = service();
    for title in ["a", "b", "c", "d"] {
        service.create_project(title).expect("create project");
    }

    let orders: Vec<i64> = service.snapshot_projects().iter().map(|p| p.order).collect();
    assert_eq!(orders, [1000, 2000, 3000, 4000]);

    let unique: HashSet<i64> = orders.iter().copied().collect();
    assert_eq!(unique.len(), orders.len());
}

#[test]
fn task_orders_are_scoped_per_project() {
    let service = service();
    let p1 = service.create_project("one").expect("create p1");
    let p2 = service.create_project("two").expect("create p2");

    service.create_task(&p1, "a").expect("task");
    service.create_task(&p1, "b").expect("task");
    service.create_task(&p2, "c").expect("task");

    let p1_orders: Vec<i64> = service.tasks_of(&p1).iter().map(|t| t.order).collect();
    let p2_orders: Vec<i64> = service.tasks_of(&p2).iter().map(|t| t.order).collect();
    assert_eq!(p1_orders, [1000, 2000]);
    // The second project starts its own sequence.
    assert_eq!(p2_orders, [1000]);
}

#[test]
fn reorder_snapshot_matches_the_requested_id_order() {
    let service = service();
    let a = service.create_project("A").expect("create");
    let b = service.create_project("B").expect("create");
    let c = service.create_project("C").expect("create");

    service
        .reorder_projects(&[c.clone(), a.clone(), b.clone()])
        .expect("reorder");

    let snapshot = service.snapshot_projects();
    let ids: Vec<&str> = snapshot.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, [c.as_str(), a.as_str(), b.as_str()]);

    // Orders are renumbered to (position + 1) * 1000.
    let orders: Vec<i64> = snapshot.iter().map(|p| p.order).collect();
    assert_eq!(orders, [1000, 2000, 3000]);
}

#[test]
fn reorder_tasks_only_touches_the_given_project() {
    let service = service();
    let p1 = service.create_project("one").expect("create p1");
    let p2 = service.create_project("two").expect("create p2");
    let t1 = service.create_task(&p1, "a").expect("task");
    let t2 = service.create_task(&p1, "b").expect("task");
    let other = service.create_task(&p2, "c").expect("task");

    service
        .reorder_tasks(&p1, &[t2.clone(), t1.clone()])
        .expect("reorder");

    let ids: Vec<String> = service.tasks_of(&p1).into_iter().map(|t| t.id).collect();
    assert_eq!(ids, [t2, t1]);

    let untouched = service.tasks_of(&p2);
    assert_eq!(untouched[0].id, other);
    assert_eq!(untouched[0].order, 1000);
}

#[test]
fn reorder_ignores_ids_outside_the_collection() {
    let store = LocalStore::open_in_memory().expect("store should open");
    let a = store.create_project("A").expect("create");
    let b = store.create_project("B").expect("create");

    store
        .reorder_projects(&["ghost".to_string(), b.clone(), a.clone()])
        .expect("reorder should succeed");

    let service = BoardService::new(Box::new(store));
    let ids: Vec<String> = service.snapshot_projects().into_iter().map(|p| p.id).collect();
    // "ghost" claimed position 0, so b and a land on 2000 and 3000.
    assert_eq!(ids, [b, a]);
}

#[test]
fn creating_after_reorder_appends_past_the_new_maximum() {
    let service = service();
    let a = service.create_project("A").expect("create");
    let b = service.create_project("B").expect("create");

    service
        .reorder_projects(&[b.clone(), a.clone()])
        .expect("reorder");
    let c = service.create_project("C").expect("create");

    let snapshot = service.snapshot_projects();
    let ids: Vec<String> = snapshot.iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, [b, a, c]);
    assert_eq!(snapshot[2].order, 3000);
}
