use messenger_core::{MessageBus, Messenger, MessengerError, RestrictedMessenger, RestrictedOptions};
use messenger_macros::{action, event};

#[action(action_type = "Accounts:getSelected", output = Option<String>)]
struct GetSelected;

#[event(event_type = "Accounts:selectedChanged")]
#[derive(Debug)]
struct SelectedChanged {
    address: String,
}

// 账户模块：只拿到自己的受限视图
struct AccountsModule {
    bus: RestrictedMessenger,
}

impl AccountsModule {
    fn new(bus: RestrictedMessenger) -> Result<Self, MessengerError> {
        bus.register_action_handler::<GetSelected, _>(|_: GetSelected| Some("0xabc".to_string()))?;
        Ok(Self { bus })
    }

    fn select(&self, address: &str) -> Result<(), MessengerError> {
        self.bus.publish(SelectedChanged {
            address: address.to_string(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    let root = Messenger::root();

    let accounts = AccountsModule::new(
        root.get_restricted(RestrictedOptions::builder().name("Accounts").build())?,
    )?;

    let transactions = root.get_restricted(
        RestrictedOptions::builder()
            .name("Transactions")
            .allowed_actions(vec!["Accounts:getSelected".into()])
            .allowed_events(vec!["Accounts:selectedChanged".into()])
            .build(),
    )?;
    let snaps = root.get_restricted(RestrictedOptions::builder().name("Snaps").build())?;

    println!("selected: {:?}", transactions.call(GetSelected)?);
    transactions.subscribe::<SelectedChanged, _>(|e| {
        println!("transactions saw {e:?}");
        Ok(())
    })?;

    accounts.select("0xdef")?;

    match snaps.call(GetSelected) {
        Err(e) => println!("snaps rejected: {e}"),
        Ok(v) => println!("unexpected access: {v:?}"),
    }
    Ok(())
}
