//! Dialog tag attribute macro implementation

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ItemFn;

use hackkit_sdk::TagTiming;

use crate::parse::DialogTagArgs;

/// Generate the dialog_tag implementation
pub fn generate_dialog_tag(args: DialogTagArgs, func: ItemFn) -> TokenStream {
    let fn_name = &func.sig.ident;
    let fn_vis = &func.vis;
    let register_fn_name = format_ident!("{}_register", fn_name);
    let tag = &args.name;

    let hook = if func.sig.asyncness.is_some() {
        quote! { ::hackkit_core::Hook::async_fn(#fn_name) }
    } else {
        quote! { ::hackkit_core::Hook::sync(#fn_name) }
    };

    let add = match args.timing {
        Some(TagTiming::Immediate) => quote! { add_dialog_tag },
        Some(TagTiming::Deferred) => quote! { add_deferred_dialog_tag },
        None => quote! { add_dual_dialog_tag },
    };

    quote! {
        #func

        /// Register this dialog tag with a registry
        #fn_vis fn #register_fn_name(
            registry: &::hackkit_core::HookRegistry,
        ) -> ::std::result::Result<(), ::hackkit_core::HookError> {
            registry.#add(#tag, #hook)
        }
    }
}
