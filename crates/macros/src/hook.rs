//! Hook attribute macro implementation
//!
//! Provides the `#[hook]` attribute for declaring hook functions.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ItemFn;

use hackkit_sdk::Phase;

use crate::parse::HookArgs;

/// Generate the hook implementation
pub fn generate_hook(args: HookArgs, func: ItemFn) -> TokenStream {
    let fn_name = &func.sig.ident;
    let fn_vis = &func.vis;
    let register_fn_name = format_ident!("{}_register", fn_name);

    let target = &args.target;
    let phase = match args.phase {
        Phase::Before => quote! { ::hackkit_core::sdk::Phase::Before },
        Phase::After => quote! { ::hackkit_core::sdk::Phase::After },
    };
    let hack = match &args.hack {
        Some(hack) => quote! { ::std::option::Option::Some(#hack) },
        None => quote! { ::std::option::Option::None },
    };

    // async fns may suspend the pipeline, everything else runs to completion
    let hook = if func.sig.asyncness.is_some() {
        quote! { ::hackkit_core::Hook::async_fn(#fn_name) }
    } else {
        quote! { ::hackkit_core::Hook::sync(#fn_name) }
    };

    quote! {
        #func

        /// Register this hook with a registry
        #fn_vis fn #register_fn_name(
            registry: &::hackkit_core::HookRegistry,
        ) -> ::std::result::Result<(), ::hackkit_core::HookError> {
            registry.register(#target, #phase, #hook, #hack)
        }
    }
}
