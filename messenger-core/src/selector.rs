//! 选择器（Selector）与变更检测
//!
//! 对 `subscribe` 的一层包装：从事件载荷中派生一个切片（例如整份状态中的某个字段），
//! 仅当切片相对上一次发生变化时才通知监听器。
//! - 每个监听器各自缓存上一次的选择结果，重复的相同更新不会重复触发回调；
//! - 每次发布后无论是否触发都会更新缓存；
//! - 若该事件注册了初始载荷（`register_initial_event_payload`），订阅时即以其初始化缓存，
//!   因此订阅本身永远不会“补发”通知。
//!
use parking_lot::Mutex;
use std::sync::Arc;

type SelectFn<E, S> = Box<dyn Fn(&E) -> S + Send + Sync>;
type EqualsFn<S> = Box<dyn Fn(&S, &S) -> bool + Send + Sync>;

/// 选择器：投影函数 + 相等性比较
pub struct Selector<E, S> {
    select: SelectFn<E, S>,
    equals: EqualsFn<S>,
}

impl<E: 'static, S: PartialEq + 'static> Selector<E, S> {
    /// 以 `PartialEq` 比较选择结果
    ///
    /// 需要按 `Arc` 指针身份比较时改用 [`Selector::by_reference`]。
    pub fn new<F>(select: F) -> Self
    where
        F: Fn(&E) -> S + Send + Sync + 'static,
    {
        Self {
            select: Box::new(select),
            equals: Box::new(|a: &S, b: &S| a == b),
        }
    }
}

impl<E: 'static, S: 'static> Selector<E, S> {
    /// 自定义比较函数，返回 `true` 表示“未变化”
    pub fn with_equality<F, Q>(select: F, equals: Q) -> Self
    where
        F: Fn(&E) -> S + Send + Sync + 'static,
        Q: Fn(&S, &S) -> bool + Send + Sync + 'static,
    {
        Self {
            select: Box::new(select),
            equals: Box::new(equals),
        }
    }

    pub(crate) fn into_listener<F>(
        self,
        initial: Option<S>,
        listener: F,
    ) -> impl Fn(&Arc<E>) -> anyhow::Result<()> + Send + Sync + 'static
    where
        S: Clone + Send,
        F: Fn(S, Option<S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let Selector { select, equals } = self;
        let last = Mutex::new(initial);

        move |payload: &Arc<E>| {
            let next = select(&**payload);
            // 锁只覆盖比较与更新缓存，回调在锁外执行以允许重入
            let previous = {
                let mut last = last.lock();
                let unchanged = last.as_ref().is_some_and(|prev| equals(prev, &next));
                let previous = last.replace(next.clone());
                if unchanged {
                    return Ok(());
                }
                previous
            };
            listener(next, previous)
        }
    }

    pub(crate) fn select(&self, payload: &E) -> S {
        (self.select)(payload)
    }
}

impl<E: 'static, T: 'static> Selector<E, Arc<T>> {
    /// 按 `Arc` 指针身份比较（生产者在变化时总是构造新对象的场景）
    pub fn by_reference<F>(select: F) -> Self
    where
        F: Fn(&E) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            select: Box::new(select),
            equals: Box::new(|a: &Arc<T>, b: &Arc<T>| Arc::ptr_eq(a, b)),
        }
    }
}
