use proc_macro2::Span;
use syn::{Ident, LitStr, Result as SynResult, Token, Type, parse::Parse, parse::ParseStream};

// 逐个解析 `key = value` 对；value 的解析交给调用方按 key 决定
pub(crate) fn parse_pairs<F>(input: ParseStream, mut on_pair: F) -> SynResult<()>
where
    F: FnMut(&Ident, ParseStream) -> SynResult<()>,
{
    while !input.is_empty() {
        let key: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        on_pair(&key, input)?;
        if input.is_empty() {
            break;
        }
        input.parse::<Token![,]>()?;
    }
    Ok(())
}

pub(crate) fn set_once<T>(slot: &mut Option<T>, key: &Ident, value: T) -> SynResult<()> {
    if slot.is_some() {
        return Err(syn::Error::new(
            key.span(),
            format!("duplicate key '{key}' in attribute"),
        ));
    }
    *slot = Some(value);
    Ok(())
}

pub(crate) fn required<T>(slot: Option<T>, key: &str) -> SynResult<T> {
    slot.ok_or_else(|| {
        syn::Error::new(
            Span::call_site(),
            format!("missing key '{key}' in attribute"),
        )
    })
}

/// 类型字符串必须形如 `<Namespace>:<Verb>`
pub(crate) fn validate_message_type(lit: &LitStr) -> SynResult<()> {
    let value = lit.value();
    match value.split_once(':') {
        Some((namespace, verb)) if !namespace.is_empty() && !verb.is_empty() => Ok(()),
        _ => Err(syn::Error::new(
            lit.span(),
            "message type must look like \"<Namespace>:<Verb>\"",
        )),
    }
}

/// 命名空间必须非空且不含 ':'
pub(crate) fn validate_namespace(lit: &LitStr) -> SynResult<()> {
    let value = lit.value();
    if value.is_empty() || value.contains(':') {
        return Err(syn::Error::new(
            lit.span(),
            "namespace must be non-empty and must not contain ':'",
        ));
    }
    Ok(())
}

// #[action(action_type = "...", output = Type)]
pub(crate) struct ActionAttr {
    pub(crate) action_type: LitStr,
    pub(crate) output: Type,
}

impl Parse for ActionAttr {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let mut action_type: Option<LitStr> = None;
        let mut output: Option<Type> = None;

        parse_pairs(input, |key, input| match key.to_string().as_str() {
            "action_type" => set_once(&mut action_type, key, input.parse()?),
            "output" => set_once(&mut output, key, input.parse()?),
            _ => Err(syn::Error::new(
                key.span(),
                "unknown key; expected 'action_type' | 'output'",
            )),
        })?;

        let action_type = required(action_type, "action_type")?;
        validate_message_type(&action_type)?;

        Ok(Self {
            action_type,
            output: output.unwrap_or_else(|| syn::parse_quote! { () }),
        })
    }
}

// #[event(event_type = "...")]
pub(crate) struct EventAttr {
    pub(crate) event_type: LitStr,
}

impl Parse for EventAttr {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let mut event_type: Option<LitStr> = None;

        parse_pairs(input, |key, input| match key.to_string().as_str() {
            "event_type" => set_once(&mut event_type, key, input.parse()?),
            _ => Err(syn::Error::new(
                key.span(),
                "unknown key; expected 'event_type'",
            )),
        })?;

        let event_type = required(event_type, "event_type")?;
        validate_message_type(&event_type)?;

        Ok(Self { event_type })
    }
}

// #[controller(name = "...", state = Type)]
pub(crate) struct ControllerAttr {
    pub(crate) name: LitStr,
    pub(crate) state: Type,
}

impl Parse for ControllerAttr {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let mut name: Option<LitStr> = None;
        let mut state: Option<Type> = None;

        parse_pairs(input, |key, input| match key.to_string().as_str() {
            "name" => set_once(&mut name, key, input.parse()?),
            "state" => set_once(&mut state, key, input.parse()?),
            _ => Err(syn::Error::new(
                key.span(),
                "unknown key; expected 'name' | 'state'",
            )),
        })?;

        let name = required(name, "name")?;
        validate_namespace(&name)?;

        Ok(Self {
            name,
            state: required(state, "state")?,
        })
    }
}
