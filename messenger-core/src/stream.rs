//! 异步事件流适配
//!
//! 把事件订阅转换为 `Stream`，便于在 tokio 任务中 `while let Some(..) = stream.next().await`。
//! 派发仍是同步的：监听器只负责把载荷投递到无界通道。
//! 取消订阅（或清除该事件的订阅）后发送端随监听器一起释放，流随之结束。
//!
use crate::bus::MessageBus;
use crate::error::MessengerResult;
use crate::message::Event;
use crate::registry::SubscriptionId;
use futures_core::stream::BoxStream;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub trait SubscribeStreamExt: MessageBus {
    /// 订阅事件并返回 (订阅标识, 事件流)
    fn subscribe_stream<E: Event>(
        &self,
    ) -> MessengerResult<(SubscriptionId, BoxStream<'static, Arc<E>>)> {
        let (tx, rx) = mpsc::unbounded_channel::<Arc<E>>();
        let subscription = self.subscribe::<E, _>(move |payload: &Arc<E>| {
            // 接收端已丢弃时忽略
            let _ = tx.send(payload.clone());
            Ok(())
        })?;
        Ok((subscription, Box::pin(UnboundedReceiverStream::new(rx))))
    }
}

impl<B: MessageBus> SubscribeStreamExt for B {}
