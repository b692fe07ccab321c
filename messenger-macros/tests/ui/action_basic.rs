use messenger_core::{Action, Messenger, MessageBus};
use messenger_macros::action;

#[action(action_type = "Accounts:getSelected", output = Option<String>)]
struct GetSelected;

#[action(action_type = "Accounts:rename")]
struct Rename {
    id: u32,
    name: String,
}

fn main() {
    assert_eq!(GetSelected::TYPE, "Accounts:getSelected");
    assert_eq!(Rename::TYPE, "Accounts:rename");

    let root = Messenger::root();
    root.register_action_handler::<GetSelected, _>(|_: GetSelected| Some("0xabc".to_string()))
        .unwrap();
    root.register_action_handler::<Rename, _>(|r: Rename| {
        let _ = (r.id, r.name);
    })
    .unwrap();

    assert_eq!(root.call(GetSelected).unwrap().as_deref(), Some("0xabc"));
    let unit: () = root
        .call(Rename {
            id: 1,
            name: "main".into(),
        })
        .unwrap();
    let _ = unit;
}
