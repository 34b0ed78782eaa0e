// Copyright 2023-2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, Fields, Type};

/// Renders a newtype wrapper over a serializable message as a JSON response with status 200.
#[proc_macro_derive(IntoResponse)]
pub fn into_response_derive(input: TokenStream) -> TokenStream {
    // Construct a representation of Rust code as a syntax tree
    // that we can manipulate
    let ast = syn::parse(input).unwrap();

    // Build the trait implementation
    impl_into_response(&ast)
}

fn impl_into_response(ast: &syn::DeriveInput) -> TokenStream {
    let name = &ast.ident;
    let gen = quote! {
        impl axum::response::IntoResponse for #name {
            fn into_response(self) -> axum::response::Response {
                use axum_extra::headers::HeaderMapExt;

                let body = match serde_json::to_string(&self.0) {
                    Ok(body) => body,
                    Err(err) => {
                        return (
                            hyper::StatusCode::INTERNAL_SERVER_ERROR,
                            format!("{{\"detail\": \"Failed to serialize response: {}\"}}", err),
                        )
                            .into_response();
                    }
                };

                let mut headers = axum_extra::headers::HeaderMap::new();
                headers.typed_insert(axum_extra::headers::ContentType::json());
                (hyper::StatusCode::OK, headers, body).into_response()
            }
        }
    };
    gen.into()
}

/// Generates `From` conversions in both directions between a newtype and its inner type.
#[proc_macro_derive(Twin)]
pub fn twin_derive(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).unwrap();
    impl_twin(&ast)
}

fn impl_twin(ast: &syn::DeriveInput) -> TokenStream {
    let name = &ast.ident;
    let Data::Struct(str) = &ast.data else {
        panic!("Twin derive only works on structs")
    };
    let Fields::Unnamed(field) = str.fields.clone() else {
        panic!("Twin derive only works for unnamed fields")
    };
    let Type::Path(path) = field.unnamed.first().unwrap().ty.clone() else {
        panic!("No type found")
    };

    let derive = &path;
    let gen = quote! {
        impl From<#derive> for #name {
            fn from(st: #derive) -> Self {
                Self(st)
            }
        }

        impl From<#name> for #derive {
            fn from(wrapper: #name) -> Self {
                wrapper.0
            }
        }
    };
    gen.into()
}
