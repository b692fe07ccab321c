use messenger_core::{DelegateOptions, MessageBus, Messenger};
use messenger_macros::{action, event};

#[action(action_type = "Network:getChainId", output = u64)]
struct GetChainId;

#[event(event_type = "Network:chainChanged")]
#[derive(Debug)]
struct ChainChanged {
    chain_id: u64,
}

#[action(action_type = "Tokens:detect", output = Vec<String>)]
struct Detect {
    chain_id: u64,
}

fn main() -> anyhow::Result<()> {
    let root = Messenger::root();
    let network = root.child("Network")?;
    let assets = root.child("Assets")?;
    let tokens = assets.child("Tokens")?;

    network.register_action_handler::<GetChainId, _>(|_: GetChainId| 1u64)?;
    tokens.register_action_handler::<Detect, _>(|d: Detect| {
        vec![format!("USDC@{}", d.chain_id)]
    })?;

    // 根节点把网络能力交给 Assets，Assets 再转交给 Tokens
    root.delegate(
        DelegateOptions::builder()
            .messenger(assets.clone())
            .actions(vec!["Network:getChainId".into()])
            .events(vec!["Network:chainChanged".into()])
            .build(),
    )?;
    assets.delegate(
        DelegateOptions::builder()
            .messenger(tokens.clone())
            .events(vec!["Network:chainChanged".into()])
            .build(),
    )?;

    let bus = tokens.clone();
    tokens.subscribe::<ChainChanged, _>(move |e| {
        let found = bus.call(Detect {
            chain_id: e.chain_id,
        })?;
        println!("chain {} -> {found:?}", e.chain_id);
        Ok(())
    })?;

    // Tokens 注册的动作对祖先可见
    let chain_id = assets.call(GetChainId)?;
    println!("assets sees chain {chain_id}: {:?}", assets.call(Detect { chain_id })?);

    network.publish(ChainChanged { chain_id: 10 })?;

    root.revoke(
        DelegateOptions::builder()
            .messenger(assets.clone())
            .events(vec!["Network:chainChanged".into()])
            .build(),
    )?;
    // 撤销后 Tokens 的订阅已被移除
    network.publish(ChainChanged { chain_id: 137 })?;
    Ok(())
}
