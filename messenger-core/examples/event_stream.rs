use futures_util::StreamExt;
use messenger_core::{MessageBus, Messenger, SubscribeStreamExt};
use messenger_macros::event;
use std::time::Duration;

#[event(event_type = "Blocks:newHead")]
#[derive(Debug)]
struct NewHead {
    number: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let root = Messenger::root();
    let (subscription, mut heads) = root.subscribe_stream::<NewHead>()?;

    let consumer = tokio::spawn(async move {
        while let Some(head) = heads.next().await {
            println!("head #{}", head.number);
        }
        println!("stream closed");
    });

    let producer = root.child("Blocks")?;
    for number in 100..103 {
        producer.publish(NewHead { number })?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    root.unsubscribe("Blocks:newHead", subscription)?;
    consumer.await?;
    Ok(())
}
