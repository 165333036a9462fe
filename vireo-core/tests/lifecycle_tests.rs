use std::cell::RefCell;
use std::rc::Rc;

use vireo_core::{Hooks, Object, Value};

#[test]
fn hooks_default_to_noops() {
    let hooks = Hooks::new();
    let state = Object::new();
    hooks.run_mounted(&state);
    hooks.run_changed(&state);
}

#[test]
fn hooks_receive_controller_state() {
    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(vec![]));
    let hooks = {
        let m = seen.clone();
        let c = seen.clone();
        Hooks::new()
            .on_mounted(move |s| m.borrow_mut().push(format!("mounted:{}", s.get("name"))))
            .on_changed(move |s| c.borrow_mut().push(format!("changed:{}", s.get("name"))))
    };

    let state = Object::new().with("name", Value::from("app"));
    hooks.run_changed(&state);
    hooks.run_mounted(&state);

    assert_eq!(&*seen.borrow(), &vec!["changed:app".to_string(), "mounted:app".to_string()]);
}
