//! `#[derive(Injectable)]` 实现

use crate::utils::{inject_marker, optional_arc_inner, visibility_tokens};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Parse, parse_macro_input, Data, DeriveInput, Error, Fields, Result, Token, Type,
};

/// 结构体级参数
#[derive(Default)]
struct InjectionArgs {
    /// 实现的服务类型
    provides: Vec<Type>,
    /// 构造函数与方法由 `#[injectable]` impl 块提供
    members: bool,
}

impl InjectionArgs {
    fn from_attributes(input: &DeriveInput) -> Result<Self> {
        let mut args = InjectionArgs::default();
        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("injection")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("provides") {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    let types = content.parse_terminated(Type::parse, Token![,])?;
                    args.provides.extend(types);
                    Ok(())
                } else if meta.path.is_ident("members") {
                    args.members = true;
                    Ok(())
                } else {
                    Err(meta.error("不支持的 injection 参数，可用参数: provides(...), members"))
                }
            })?;
        }
        Ok(args)
    }
}

pub fn derive_injectable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Injectable 不支持泛型类型，请为具体类型实现",
        ));
    }
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(&input.ident, "Injectable 只能用于结构体"));
    };

    let args = InjectionArgs::from_attributes(input)?;
    let properties = properties(&data.fields)?;
    let name = &input.ident;

    let provides = args.provides.iter().map(|service| {
        quote! {
            .provides::<#service>(|this: ::std::sync::Arc<Self>| -> ::std::sync::Arc<#service> { this })
        }
    });

    let members = if args.members {
        quote! {
            let builder = <Self as ::di_abstractions::InjectableMembers>::describe_members(builder);
        }
    } else {
        quote! {
            let builder = builder.constructor(::di_abstractions::ConstructorDescriptor::new::<Self, _>(
                "default",
                ::std::vec::Vec::new(),
                |_| ::std::result::Result::Ok(<Self as ::std::default::Default>::default()),
            ));
        }
    };

    Ok(quote! {
        impl ::di_abstractions::Injectable for #name {
            fn describe() -> ::di_abstractions::TypeDescriptor {
                let builder = ::di_abstractions::TypeDescriptor::builder::<Self>()
                    #(#provides)*;
                #members
                builder
                    #(#properties)*
                    .build()
            }
        }
    })
}

/// 标记为 `#[inject]` 的字段生成属性描述，字段类型必须是 `Option<Arc<T>>`
fn properties(fields: &Fields) -> Result<Vec<TokenStream2>> {
    let mut properties = Vec::new();
    for field in fields {
        let Some(required) = inject_marker(&field.attrs, true)? else {
            continue;
        };
        let Some(ident) = &field.ident else {
            return Err(Error::new_spanned(field, "注入属性必须是具名字段"));
        };
        let Some(service) = optional_arc_inner(&field.ty) else {
            return Err(Error::new_spanned(
                &field.ty,
                "注入属性的类型必须是 Option<Arc<T>>",
            ));
        };
        let property_name = ident.to_string();
        let visibility = visibility_tokens(&field.vis);
        properties.push(quote! {
            .property(
                ::di_abstractions::PropertyDescriptor::new::<Self, #service, _>(
                    #property_name,
                    |this: &mut Self, value: ::std::sync::Arc<#service>| {
                        this.#ident = ::std::option::Option::Some(value);
                    },
                )
                .with_visibility(#visibility)
                .with_marker(true)
                .with_required(#required)
            )
        });
    }
    Ok(properties)
}
