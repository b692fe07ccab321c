use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use messenger_controller::{BaseController, GetState, StateChange};
use messenger_core::{
    DelegateOptions, MessageBus, Messenger, MessengerConfig, RestrictedMessenger,
    RestrictedOptions, Selector,
};
use messenger_macros::{action, controller};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// ---- Network ----

#[derive(Debug, Clone, PartialEq)]
struct NetworkState {
    chain_id: u64,
    status: &'static str,
}

#[controller(name = "Network", state = NetworkState)]
struct Network;

#[action(action_type = "Network:fetchBlockNumber", output = BoxFuture<'static, anyhow::Result<u64>>)]
struct FetchBlockNumber;

struct NetworkController {
    base: BaseController<Network, RestrictedMessenger>,
}

impl NetworkController {
    fn new(bus: RestrictedMessenger) -> anyhow::Result<Self> {
        bus.register_action_handler::<FetchBlockNumber, _>(|_: FetchBlockNumber| {
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, anyhow::Error>(19_000_000u64)
            }
            .boxed()
        })?;

        let base = BaseController::new(
            bus,
            NetworkState {
                chain_id: 1,
                status: "available",
            },
        )?;
        Ok(Self { base })
    }

    fn switch(&self, chain_id: u64) -> anyhow::Result<()> {
        self.base.update(|s| s.chain_id = chain_id)?;
        Ok(())
    }

    fn set_status(&self, status: &'static str) -> anyhow::Result<()> {
        self.base.update(|s| s.status = status)?;
        Ok(())
    }
}

// ---- Accounts（以子总线运行）----

#[derive(Debug, Clone, Default, PartialEq)]
struct AccountsState {
    selected: Option<String>,
    accounts: Vec<String>,
}

#[controller(name = "Accounts", state = AccountsState)]
struct Accounts;

// ---- Token detection：只拿到受限视图 ----

struct TokenDetector {
    bus: RestrictedMessenger,
}

impl TokenDetector {
    fn new(bus: RestrictedMessenger) -> anyhow::Result<Self> {
        bus.subscribe_with_selector(
            Selector::new(|e: &StateChange<Network>| e.state.chain_id),
            |chain_id, previous| {
                info!(chain_id, ?previous, "token detector: chain switched");
                Ok(())
            },
        )?;
        Ok(Self { bus })
    }

    async fn poll(&self) -> anyhow::Result<()> {
        let network = self.bus.call(GetState::<Network>::new())?;
        let block = self.bus.call(FetchBlockNumber)?.await?;
        info!(chain_id = network.chain_id, block, "token detector: polled");
        Ok(())
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("demo=info,messenger_core=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

// MESSENGER_CONFIG='{"listener_error_policy":"report"}'
fn load_config() -> anyhow::Result<MessengerConfig> {
    match std::env::var("MESSENGER_CONFIG") {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(_) => Ok(MessengerConfig::default()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let root = Messenger::with_config(load_config()?);

    let network = NetworkController::new(
        root.get_restricted(RestrictedOptions::builder().name("Network").build())?,
    )?;

    let detector = TokenDetector::new(
        root.get_restricted(
            RestrictedOptions::builder()
                .name("TokenDetector")
                .allowed_actions(vec![
                    "Network:getState".into(),
                    "Network:fetchBlockNumber".into(),
                ])
                .allowed_events(vec!["Network:stateChange".into()])
                .build(),
        )?,
    )?;

    // Accounts 与 Preferences 是根下的两个子总线
    let accounts_bus = root.child("Accounts")?;
    let accounts = BaseController::<Accounts, _>::new(
        accounts_bus,
        AccountsState {
            selected: Some("0x01".into()),
            accounts: vec!["0x01".into(), "0x02".into()],
        },
    )?;

    let preferences = root.child("Preferences")?;
    if let Err(e) = preferences.call(GetState::<Accounts>::new()) {
        warn!(error = %e, "preferences: accounts not delegated yet");
    }
    root.delegate(
        DelegateOptions::builder()
            .messenger(preferences.clone())
            .actions(vec!["Accounts:getState".into()])
            .events(vec!["Accounts:stateChange".into()])
            .build(),
    )?;
    preferences.subscribe_with_selector(
        Selector::new(|e: &StateChange<Accounts>| e.state.selected.clone()),
        |selected, previous| {
            info!(?selected, ?previous, "preferences: selected account changed");
            Ok(())
        },
    )?;
    let current = preferences.call(GetState::<Accounts>::new())?;
    info!(accounts = current.accounts.len(), "preferences: read accounts state");

    detector.poll().await?;

    network.set_status("degraded")?;
    network.switch(10)?;
    network.switch(10)?;
    detector.poll().await?;

    accounts.update(|s| s.accounts.push("0x03".into()))?;
    accounts.update(|s| s.selected = Some("0x02".into()))?;

    accounts.destroy()?;
    Ok(())
}
