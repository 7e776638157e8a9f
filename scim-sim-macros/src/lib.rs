//! Procedural macros for scim-sim
//!
//! Provides `#[scim_tool]`, which turns an argument struct into an MCP tool
//! definition.

use darling::{FromMeta, ast::NestedMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

#[derive(Debug, FromMeta)]
struct ScimToolArgs {
    /// Tool name (e.g. "list_scim_users")
    name: String,
    /// Tool description shown to MCP clients
    description: String,
    /// "read", "write" or "delete"
    operation: String,
}

/// Define a SCIM MCP tool.
///
/// Adds `#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]`
/// and implements `ToolInfo` and `AccessControlled`. The struct still needs
/// a `ToolExecutor` impl.
///
/// ```ignore
/// #[scim_tool(
///     name = "get_scim_user_by_id",
///     description = "Get a user by id",
///     operation = "read"
/// )]
/// pub struct GetScimUserById {
///     /// User id
///     pub id: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn scim_tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(v) => v,
        Err(e) => return TokenStream::from(e.to_compile_error()),
    };

    let args = match ScimToolArgs::from_list(&attr_args) {
        Ok(v) => v,
        Err(e) => return TokenStream::from(e.write_errors()),
    };

    let input = parse_macro_input!(item as DeriveInput);
    TokenStream::from(expand(&args, &input))
}

fn expand(args: &ScimToolArgs, input: &DeriveInput) -> TokenStream2 {
    let struct_name = &input.ident;
    let tool_name = &args.name;
    let description = &args.description;

    let operation = match args.operation.as_str() {
        "read" => quote! { crate::access_control::OperationType::Read },
        "write" => quote! { crate::access_control::OperationType::Write },
        "delete" => quote! { crate::access_control::OperationType::Delete },
        other => {
            return syn::Error::new_spanned(
                input,
                format!("Unknown operation: {}. Use: read, write or delete", other),
            )
            .to_compile_error();
        }
    };

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    input,
                    "scim_tool only supports structs with named fields",
                )
                .to_compile_error();
            }
        },
        _ => {
            return syn::Error::new_spanned(input, "scim_tool only supports structs")
                .to_compile_error();
        }
    };

    let vis = &input.vis;
    let attrs = &input.attrs;
    let generics = &input.generics;

    quote! {
        #(#attrs)*
        #[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
        #vis struct #struct_name #generics {
            #fields
        }

        impl crate::tools::ToolInfo for #struct_name {
            fn name() -> &'static str {
                #tool_name
            }

            fn description() -> &'static str {
                #description
            }

            fn operation_type() -> crate::access_control::OperationType {
                #operation
            }
        }

        impl crate::access_control::AccessControlled for #struct_name {
            fn tool_name(&self) -> &'static str {
                #tool_name
            }

            fn operation_type(&self) -> crate::access_control::OperationType {
                #operation
            }
        }
    }
}
