//! `#[injectable]` impl 块属性实现
//!
//! 收集 impl 块中的构造函数与注入方法，生成 `InjectableMembers` 实现。

use crate::utils::{arc_parameters, inject_marker, is_self_type, strip_inject, visibility_tokens};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{parse_macro_input, Error, ImplItem, ImplItemFn, ItemImpl, Result, ReturnType, Type};

pub fn injectable_impl(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item = parse_macro_input!(input as ItemImpl);
    let members = if args.is_empty() {
        expand(&mut item)
    } else {
        Err(Error::new(
            proc_macro2::TokenStream::from(args)
                .into_iter()
                .next()
                .map(|token| token.span())
                .unwrap_or_else(proc_macro2::Span::call_site),
            "injectable 属性不接受参数",
        ))
    };
    let members = members.unwrap_or_else(Error::into_compile_error);
    quote! {
        #item
        #members
    }
    .into()
}

/// 收集成员并移除 `#[inject]` 标记，出错时也保证标记已被移除
fn expand(item: &mut ItemImpl) -> Result<TokenStream2> {
    let self_name = type_name(&item.self_ty);
    let mut collected = Vec::new();
    let mut errors: Option<Error> = None;
    for member in item.items.iter_mut() {
        let ImplItem::Fn(function) = member else {
            continue;
        };
        let marker = inject_marker(&function.attrs, false);
        strip_inject(&mut function.attrs);
        let result =
            marker.and_then(|marked| describe_member(function, &self_name, marked.is_some()));
        match result {
            Ok(Some(tokens)) => collected.push(tokens),
            Ok(None) => {}
            Err(error) => match errors.as_mut() {
                Some(existing) => existing.combine(error),
                None => errors = Some(error),
            },
        }
    }
    if let Some(error) = errors {
        return Err(error);
    }

    if item.trait_.is_some() {
        return Err(Error::new_spanned(
            &item.self_ty,
            "injectable 只能用于固有 impl 块",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &item.generics,
            "injectable 不支持泛型 impl 块",
        ));
    }
    let self_ty = &item.self_ty;

    Ok(quote! {
        impl ::di_abstractions::InjectableMembers for #self_ty {
            fn describe_members(
                builder: ::di_abstractions::TypeDescriptorBuilder<Self>,
            ) -> ::di_abstractions::TypeDescriptorBuilder<Self> {
                builder
                    #(#collected)*
            }
        }
    })
}

/// 类型名称（最后一个路径段）
fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn describe_member(
    function: &ImplItemFn,
    self_name: &str,
    marked: bool,
) -> Result<Option<TokenStream2>> {
    let sig = &function.sig;
    let unsupported = sig.asyncness.is_some() || !sig.generics.params.is_empty();
    if unsupported {
        return if marked {
            Err(Error::new_spanned(sig, "注入成员不能是 async 或泛型函数"))
        } else {
            Ok(None)
        };
    }

    match sig.receiver() {
        None if returns_self(&sig.output, self_name) => constructor(function, marked),
        None if marked => associated(function).map(Some),
        None => Ok(None),
        Some(receiver) if marked => {
            if receiver.reference.is_some() && receiver.mutability.is_some() {
                method(function).map(Some)
            } else {
                Err(Error::new_spanned(receiver, "注入方法必须接收 &mut self"))
            }
        }
        Some(_) => Ok(None),
    }
}

fn returns_self(output: &ReturnType, self_name: &str) -> bool {
    match output {
        ReturnType::Type(_, ty) => is_self_type(ty, self_name),
        ReturnType::Default => false,
    }
}

fn parameters(function: &ImplItemFn, marked: bool) -> Result<Option<Vec<(String, Type)>>> {
    match arc_parameters(&function.sig) {
        Ok(parameters) => Ok(Some(parameters)),
        Err(ty) if marked => Err(Error::new_spanned(
            ty.to_token_stream(),
            "注入参数的类型必须是 Arc<T>",
        )),
        Err(_) => Ok(None),
    }
}

fn parameter_list(parameters: &[(String, Type)]) -> TokenStream2 {
    let entries = parameters.iter().map(|(name, ty)| {
        quote! { ::di_abstractions::Parameter::of::<#ty>(#name) }
    });
    quote! { ::std::vec![#(#entries),*] }
}

fn constructor(function: &ImplItemFn, marked: bool) -> Result<Option<TokenStream2>> {
    let Some(parameters) = parameters(function, marked)? else {
        return Ok(None);
    };
    let ident = &function.sig.ident;
    let name = ident.to_string();
    let visibility = visibility_tokens(&function.vis);
    let list = parameter_list(&parameters);
    let construct = if parameters.is_empty() {
        quote! {
            |_: ::di_abstractions::Arguments| ::std::result::Result::Ok(Self::#ident())
        }
    } else {
        let takes = parameters.iter().map(|(_, ty)| quote! { __args.take::<#ty>()? });
        quote! {
            |__args: ::di_abstractions::Arguments| {
                let mut __args = __args;
                ::std::result::Result::Ok(Self::#ident(#(#takes),*))
            }
        }
    };
    Ok(Some(quote! {
        .constructor(
            ::di_abstractions::ConstructorDescriptor::new::<Self, _>(#name, #list, #construct)
                .with_visibility(#visibility)
                .with_marker(#marked)
        )
    }))
}

/// 注入方法的返回值须实现 `MethodOutcome`，其他返回类型在编译期报错
fn method(function: &ImplItemFn) -> Result<TokenStream2> {
    let parameters = parameters(function, true)?.unwrap_or_default();
    let ident = &function.sig.ident;
    let name = ident.to_string();
    let visibility = visibility_tokens(&function.vis);
    let list = parameter_list(&parameters);
    let takes = parameters.iter().map(|(_, ty)| quote! { __args.take::<#ty>()? });
    Ok(quote! {
        .method(
            ::di_abstractions::MethodDescriptor::new::<Self, _>(
                #name,
                #list,
                |this: &mut Self, __args: ::di_abstractions::Arguments| {
                    #[allow(unused_mut, unused_variables)]
                    let mut __args = __args;
                    ::di_abstractions::MethodOutcome::into_method_result(
                        this.#ident(#(#takes),*),
                        &::di_abstractions::ServiceKey::of::<Self>(),
                        #name,
                    )
                },
            )
            .with_visibility(#visibility)
            .with_marker(true)
        )
    })
}

/// 标记的关联函数只记录在描述中，扫描时不会被选为注入方法
fn associated(function: &ImplItemFn) -> Result<TokenStream2> {
    let parameters = parameters(function, true)?.unwrap_or_default();
    let name = function.sig.ident.to_string();
    let visibility = visibility_tokens(&function.vis);
    let list = parameter_list(&parameters);
    Ok(quote! {
        .method(
            ::di_abstractions::MethodDescriptor::associated(#name, #list)
                .with_visibility(#visibility)
                .with_marker(true)
        )
    })
}
