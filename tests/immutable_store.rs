use spark_pubsub::{
    Field, FieldName, FreezeState, ImmutabilityError, Immutable, ImmutableOptions, Notifiable,
    Notifies, PubSub, freezable, immutable, pubsub_mixin,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
struct Meta {
    color: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Todo {
    label: String,
    completed: bool,
    meta: Option<Meta>,
}

freezable!(Meta, Todo);

fn todo(label: &str) -> Todo {
    Todo {
        label: label.into(),
        completed: false,
        meta: None,
    }
}

// =============================================================================
// Store with an embedded hub
// =============================================================================

#[derive(Default)]
struct TodoStore {
    pubsub: PubSub,
    todos: Field<Vec<Todo>>,
}

impl Notifiable for TodoStore {
    fn pubsub(&self) -> &PubSub {
        &self.pubsub
    }
}

freezable!(TodoStore { todos });

impl TodoStore {
    const TODOS: Notifies = Notifies::new(&["todos"]);

    fn new(options: ImmutableOptions) -> Immutable<Self> {
        immutable(Self::default(), options)
    }

    fn wrong_add(&self, item: Todo) -> Result<(), ImmutabilityError> {
        Self::TODOS.try_call(self, |s| s.todos.mutate(|todos| todos.push(item)))
    }

    fn wrong_toggle(&self, index: usize) -> Result<(), ImmutabilityError> {
        Self::TODOS.try_call(self, |s| {
            s.todos
                .mutate(|todos| todos[index].completed = !todos[index].completed)
        })
    }

    fn wrong_set_color(&self, index: usize, color: &str) -> Result<(), ImmutabilityError> {
        Self::TODOS.try_call(self, |s| {
            s.todos.mutate(|todos| {
                todos[index].meta = Some(Meta {
                    color: color.into(),
                })
            })
        })
    }

    fn add(&self, item: Todo) -> Result<(), ImmutabilityError> {
        Self::TODOS.try_call(self, |s| {
            s.todos
                .update(|todos| todos.iter().cloned().chain([item]).collect())
        })
    }

    fn toggle(&self, index: usize) -> Result<(), ImmutabilityError> {
        Self::TODOS.try_call(self, |s| {
            s.todos.update(|todos| {
                todos
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Todo {
                        completed: if i == index { !t.completed } else { t.completed },
                        ..t.clone()
                    })
                    .collect()
            })
        })
    }

    fn set_color(&self, index: usize, color: &str) -> Result<(), ImmutabilityError> {
        Self::TODOS.try_call(self, |s| {
            s.todos.update(|todos| {
                let mut next = todos.clone();
                next[index].meta = Some(Meta {
                    color: color.into(),
                });
                next
            })
        })
    }
}

fn record(target: &impl Notifiable) -> Rc<RefCell<Vec<Vec<FieldName>>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    target.pubsub().subscribe({
        let log = log.clone();
        move |fields| log.borrow_mut().push(fields.to_vec())
    });
    log
}

#[test]
fn direct_mutation_of_frozen_store_fails() {
    let store = TodoStore::new(ImmutableOptions::default());
    store.add(todo("a")).unwrap();
    let log = record(&store);

    assert!(matches!(
        store.wrong_add(todo("b")),
        Err(ImmutabilityError::Frozen { .. })
    ));
    assert!(store.wrong_toggle(0).is_err());
    assert!(store.wrong_set_color(0, "red").is_err());

    // Failed writes change nothing and notify nobody
    assert_eq!(store.todos.get(), vec![todo("a")]);
    assert!(log.borrow().is_empty());
}

#[test]
fn copy_on_write_updates_succeed() {
    let store = TodoStore::new(ImmutableOptions::default());
    let log = record(&store);

    store.add(todo("a")).unwrap();
    store.add(todo("b")).unwrap();
    store.toggle(1).unwrap();
    store.set_color(0, "red").unwrap();

    let todos = store.todos.get();
    assert_eq!(todos.len(), 2);
    assert!(todos[1].completed);
    assert_eq!(todos[0].meta.as_ref().map(|m| m.color.as_str()), Some("red"));
    assert_eq!(log.borrow().len(), 4);
    assert_eq!(store.todos.state(), FreezeState::Frozen);
}

#[test]
fn disabled_store_allows_direct_mutation() {
    let store = TodoStore::new(ImmutableOptions::disabled());

    store.wrong_add(todo("a")).unwrap();
    store.wrong_toggle(0).unwrap();
    store.wrong_set_color(0, "blue").unwrap();

    let todos = store.todos.get();
    assert!(todos[0].completed);
    assert_eq!(todos[0].meta.as_ref().map(|m| m.color.as_str()), Some("blue"));
    assert_eq!(store.todos.state(), FreezeState::Mutable);
}

#[test]
fn subscriber_reads_new_value_during_notify() {
    let store = Rc::new(TodoStore::new(ImmutableOptions::default()));
    let seen = Rc::new(RefCell::new(Vec::new()));

    store.subscribe({
        let store = Rc::downgrade(&store);
        let seen = seen.clone();
        move |_| {
            if let Some(store) = store.upgrade() {
                seen.borrow_mut().push(store.todos.get().len());
            }
        }
    });

    store.add(todo("a")).unwrap();
    store.add(todo("b")).unwrap();
    assert_eq!(*seen.borrow(), vec![1, 2]);
}

// =============================================================================
// Third-party list composed with a hub, then frozen
// =============================================================================

#[derive(Default)]
struct TodoList {
    todos: Field<Vec<Todo>>,
}

freezable!(TodoList { todos });

pubsub_mixin! {
    #[derive(Default)]
    struct ReactiveTodoList(TodoList);
}

freezable!(ReactiveTodoList { mixin });

impl ReactiveTodoList {
    const TODOS: Notifies = Notifies::new(&["todos"]);

    fn wrong_add(&self, item: Todo) -> Result<(), ImmutabilityError> {
        Self::TODOS.try_call(self, |s| s.with(|list| list.todos.mutate(|t| t.push(item))))
    }

    fn add(&self, item: Todo) -> Result<(), ImmutabilityError> {
        Self::TODOS.try_call(self, |s| {
            s.with(|list| {
                list.todos
                    .update(|t| t.iter().cloned().chain([item]).collect())
            })
        })
    }
}

#[test]
fn mixin_and_immutable_compose() {
    let list = immutable(ReactiveTodoList::default(), ImmutableOptions::default());
    let log = record(&list);

    assert!(list.wrong_add(todo("a")).is_err());
    list.add(todo("a")).unwrap();

    assert_eq!(list.with(|l| l.todos.get()), vec![todo("a")]);
    assert_eq!(*log.borrow(), vec![vec!["todos"]]);
}

#[test]
fn composed_type_keeps_its_name() {
    let list = immutable(ReactiveTodoList::default(), ImmutableOptions::default());
    assert!(std::any::type_name_of_val(&*list).ends_with("ReactiveTodoList"));
    assert!(list.type_name().ends_with("ReactiveTodoList"));

    let store = TodoStore::new(ImmutableOptions::default());
    assert!(std::any::type_name_of_val(&*store).ends_with("TodoStore"));
}
