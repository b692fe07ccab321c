//! 消息描述类型的声明宏
//!
//! - `#[action(action_type = "A:getValue", output = u64)]`：实现 `messenger_core::Action`；
//! - `#[event(event_type = "A:valueChanged")]`：实现 `messenger_core::Event`；
//! - `#[controller(name = "Counter", state = CounterState)]`：实现
//!   `messenger_controller::Controller`，并按约定拼出 `Counter:getState` / `Counter:stateChange`。
//!
//! 类型字符串在编译期校验格式。
//!
use proc_macro::TokenStream;
use quote::quote;
use syn::{Item, parse_macro_input, spanned::Spanned};

mod attr;

use attr::{ActionAttr, ControllerAttr, EventAttr};

/// 动作描述宏
/// - 可用于 struct / enum，类型本身承载调用参数
/// - `output` 缺省为 `()`
#[proc_macro_attribute]
pub fn action(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ActionAttr);
    let input = parse_macro_input!(item as Item);

    let (ident, generics) = match message_target(&input, "#[action]") {
        Ok(target) => target,
        Err(e) => return e.to_compile_error().into(),
    };
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let ActionAttr {
        action_type,
        output,
    } = cfg;

    let expanded = quote! {
        #input

        impl #impl_generics ::messenger_core::Action for #ident #ty_generics #where_clause {
            const TYPE: &'static str = #action_type;
            type Output = #output;
        }
    };

    TokenStream::from(expanded)
}

/// 事件描述宏，类型本身即为事件载荷
#[proc_macro_attribute]
pub fn event(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttr);
    let input = parse_macro_input!(item as Item);

    let (ident, generics) = match message_target(&input, "#[event]") {
        Ok(target) => target,
        Err(e) => return e.to_compile_error().into(),
    };
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let event_type = cfg.event_type;

    let expanded = quote! {
        #input

        impl #impl_generics ::messenger_core::Event for #ident #ty_generics #where_clause {
            const TYPE: &'static str = #event_type;
        }
    };

    TokenStream::from(expanded)
}

/// 控制器描述宏
/// - 通常用于单元结构体，例如 `struct Counter;`
/// - 动作/事件类型字符串由 `name` 拼接而成
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ControllerAttr);
    let input = parse_macro_input!(item as Item);

    let st = match &input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[controller] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();
    let ControllerAttr { name, state } = cfg;
    let get_state = format!("{}:getState", name.value());
    let state_change = format!("{}:stateChange", name.value());

    let expanded = quote! {
        #input

        impl #impl_generics ::messenger_controller::Controller for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
            const GET_STATE: &'static str = #get_state;
            const STATE_CHANGE: &'static str = #state_change;
            type State = #state;
        }
    };

    TokenStream::from(expanded)
}

fn message_target<'a>(
    input: &'a Item,
    macro_name: &str,
) -> syn::Result<(&'a syn::Ident, &'a syn::Generics)> {
    match input {
        Item::Struct(s) => Ok((&s.ident, &s.generics)),
        Item::Enum(e) => Ok((&e.ident, &e.generics)),
        other => Err(syn::Error::new(
            other.span(),
            format!("{macro_name} only on struct or enum"),
        )),
    }
}
