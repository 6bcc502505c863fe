//! 宏工具函数

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, FnArg, GenericArgument, Meta, Pat, PathArguments, Result, Signature, Type};

/// 注入标记属性名
pub const INJECT: &str = "inject";

/// 从包装类型中提取唯一的泛型参数，例如 `Arc<T>` 中的 `T`
pub fn extract_wrapped_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first() {
        Some(GenericArgument::Type(inner)) => Some(inner),
        _ => None,
    }
}

/// `Arc<T>` → `T`
pub fn arc_inner(ty: &Type) -> Option<&Type> {
    extract_wrapped_type(ty, "Arc")
}

/// `Option<Arc<T>>` → `T`
pub fn optional_arc_inner(ty: &Type) -> Option<&Type> {
    extract_wrapped_type(ty, "Option").and_then(arc_inner)
}

/// 检查类型是否为 `Self` 或指定名称的类型
pub fn is_self_type(ty: &Type, self_name: &str) -> bool {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident == "Self" || segment.ident == self_name)
            .unwrap_or(false),
        _ => false,
    }
}

/// 解析注入标记，返回 `None` 表示没有标记，`Some(required)` 表示带标记
pub fn inject_marker(attrs: &[Attribute], allow_required: bool) -> Result<Option<bool>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident(INJECT)) else {
        return Ok(None);
    };
    let mut required = false;
    if let Meta::List(_) = &attr.meta {
        attr.parse_nested_meta(|meta| {
            if allow_required && meta.path.is_ident("required") {
                required = true;
                Ok(())
            } else {
                Err(meta.error("inject 标记不支持该参数"))
            }
        })?;
    }
    Ok(Some(required))
}

/// 移除注入标记
pub fn strip_inject(attrs: &mut Vec<Attribute>) {
    attrs.retain(|attr| !attr.path().is_ident(INJECT));
}

/// 生成成员可见性
pub fn visibility_tokens(vis: &syn::Visibility) -> TokenStream {
    match vis {
        syn::Visibility::Public(_) => quote! { ::di_abstractions::Visibility::Public },
        _ => quote! { ::di_abstractions::Visibility::Restricted },
    }
}

/// 参数名称，非标识符模式时使用位置名称
pub fn parameter_name(pat: &Pat, index: usize) -> String {
    match pat {
        Pat::Ident(pat_ident) => pat_ident.ident.to_string(),
        _ => format!("arg{index}"),
    }
}

/// 签名中所有非接收者参数：名称与 `Arc<T>` 中的 `T`
///
/// 任意参数不是 `Arc<T>` 时返回出错的参数类型。
pub fn arc_parameters(sig: &Signature) -> std::result::Result<Vec<(String, Type)>, Type> {
    sig.inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(pat_type) => Some(pat_type),
            FnArg::Receiver(_) => None,
        })
        .enumerate()
        .map(|(index, pat_type)| match arc_inner(&pat_type.ty) {
            Some(inner) => Ok((parameter_name(&pat_type.pat, index), inner.clone())),
            None => Err((*pat_type.ty).clone()),
        })
        .collect()
}
