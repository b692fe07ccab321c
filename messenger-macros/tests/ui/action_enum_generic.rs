use messenger_core::Action;
use messenger_macros::action;
use std::marker::PhantomData;

#[action(action_type = "Network:lookup", output = Vec<u8>)]
enum Lookup {
    ById(u64),
    ByName(String),
}

#[action(action_type = "Cache:get", output = Option<T>)]
struct CacheGet<T: Send + 'static> {
    key: String,
    _marker: PhantomData<fn() -> T>,
}

fn main() {
    assert_eq!(Lookup::TYPE, "Network:lookup");
    assert_eq!(<CacheGet<u32> as Action>::TYPE, "Cache:get");
    let _ = Lookup::ById(1);
    let _ = Lookup::ByName(String::new());
    let _ = CacheGet::<u32> {
        key: String::new(),
        _marker: PhantomData,
    }
    .key;
}
