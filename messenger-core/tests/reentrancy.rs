use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use messenger_core::{MessageBus, Messenger, SubscriptionId};
use messenger_macros::{action, event};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

#[action(action_type = "A:getValue", output = u64)]
struct GetValue;

#[action(action_type = "A:bump")]
struct Bump;

#[event(event_type = "A:valueChanged")]
struct ValueChanged {
    v: u64,
}

#[action(action_type = "Net:fetch", output = BoxFuture<'static, anyhow::Result<String>>)]
struct Fetch {
    url: String,
}

#[test]
fn handler_may_call_and_publish_on_the_same_bus() {
    let root = Messenger::root();
    let value = Arc::new(Mutex::new(0u64));

    {
        let value = value.clone();
        root.register_action_handler::<GetValue, _>(move |_: GetValue| *value.lock().unwrap())
            .unwrap();
    }
    {
        let bus = root.clone();
        let value = value.clone();
        root.register_action_handler::<Bump, _>(move |_: Bump| {
            *value.lock().unwrap() += 1;
            let v = bus.call(GetValue).unwrap();
            bus.publish(ValueChanged { v }).unwrap();
        })
        .unwrap();
    }

    let seen: Arc<Mutex<Vec<u64>>> = Arc::default();
    let sink = seen.clone();
    let bus = root.clone();
    root.subscribe::<ValueChanged, _>(move |e| {
        // 监听器中再次调用动作
        let current = bus.call(GetValue)?;
        sink.lock().unwrap().push(e.v + current);
        Ok(())
    })
    .unwrap();

    root.call(Bump).unwrap();
    root.call(Bump).unwrap();
    assert_eq!(*seen.lock().unwrap(), [2, 4]);
}

#[test]
fn listener_may_unsubscribe_itself_during_publish() {
    let root = Messenger::root();
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    let own_id: Arc<OnceLock<SubscriptionId>> = Arc::default();

    {
        let log = log.clone();
        let bus = root.clone();
        let own_id_cb = own_id.clone();
        let id = root
            .subscribe::<ValueChanged, _>(move |_| {
                log.lock().unwrap().push("once");
                if let Some(id) = own_id_cb.get() {
                    bus.unsubscribe("A:valueChanged", *id)?;
                }
                Ok(())
            })
            .unwrap();
        own_id.set(id).unwrap();
    }
    {
        let log = log.clone();
        root.subscribe::<ValueChanged, _>(move |_| {
            log.lock().unwrap().push("always");
            Ok(())
        })
        .unwrap();
    }

    root.publish(ValueChanged { v: 1 }).unwrap();
    root.publish(ValueChanged { v: 2 }).unwrap();
    assert_eq!(*log.lock().unwrap(), ["once", "always", "always"]);
}

#[test]
fn listener_added_during_publish_waits_for_the_next_one() {
    let root = Messenger::root();
    let hits: Arc<Mutex<Vec<u64>>> = Arc::default();

    let bus = root.clone();
    let sink = hits.clone();
    root.subscribe::<ValueChanged, _>(move |e| {
        if e.v == 1 {
            let sink = sink.clone();
            bus.subscribe::<ValueChanged, _>(move |e| {
                sink.lock().unwrap().push(e.v);
                Ok(())
            })?;
        }
        Ok(())
    })
    .unwrap();

    root.publish(ValueChanged { v: 1 }).unwrap();
    assert!(hits.lock().unwrap().is_empty());
    root.publish(ValueChanged { v: 2 }).unwrap();
    assert_eq!(*hits.lock().unwrap(), [2]);
}

#[tokio::test]
async fn async_handler_output_is_returned_unawaited() {
    let root = Messenger::root();
    root.register_action_handler::<Fetch, _>(|f: Fetch| {
        async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if f.url.is_empty() {
                anyhow::bail!("empty url");
            }
            Ok(format!("body of {}", f.url))
        }
        .boxed()
    })
    .unwrap();

    let pending = root
        .call(Fetch {
            url: "https://example.test".into(),
        })
        .unwrap();
    assert_eq!(pending.await.unwrap(), "body of https://example.test");

    // 异步失败经由 future 传递，总线本身不报错
    let pending = root.call(Fetch { url: String::new() }).unwrap();
    assert_eq!(pending.await.unwrap_err().to_string(), "empty url");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bus_is_shared_across_tasks() {
    let root = Messenger::root();
    root.register_action_handler::<GetValue, _>(|_: GetValue| 9u64)
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let bus = root.clone();
        tasks.push(tokio::spawn(async move { bus.call(GetValue).unwrap() }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), 9);
    }
}
