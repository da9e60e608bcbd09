//! Attribute argument parsing

use darling::{ast::NestedMeta, FromMeta};
use proc_macro2::{Span, TokenStream};
use syn::{parse::Parse, parse::ParseStream, Ident, LitStr, Token};

use hackkit_sdk::{Phase, TagTiming, TargetPath};

/// Raw `#[hook(...)]` arguments
#[derive(Debug, FromMeta)]
struct RawHookArgs {
    /// Target to run before
    #[darling(default)]
    before: Option<String>,

    /// Target to run after
    #[darling(default)]
    after: Option<String>,

    /// Hack name the hook is registered under
    #[darling(default)]
    hack: Option<String>,
}

/// Validated `#[hook(...)]` arguments
///
/// Usage:
/// - `#[hook(before = "player.move")]`
/// - `#[hook(after = "onExitDialog", hack = "exit-from-dialog")]`
pub struct HookArgs {
    pub phase: Phase,
    pub target: String,
    pub hack: Option<String>,
}

pub fn parse_hook_args(attr: TokenStream) -> syn::Result<HookArgs> {
    let items = NestedMeta::parse_meta_list(attr)?;
    let raw = RawHookArgs::from_list(&items).map_err(|e| syn::Error::new(Span::call_site(), e))?;

    let (phase, target) = match (raw.before, raw.after) {
        (Some(target), None) => (Phase::Before, target),
        (None, Some(target)) => (Phase::After, target),
        (Some(_), Some(_)) => {
            return Err(syn::Error::new(
                Span::call_site(),
                "expected only one of `before` or `after`",
            ))
        }
        (None, None) => {
            return Err(syn::Error::new(
                Span::call_site(),
                "expected `before = \"target\"` or `after = \"target\"`",
            ))
        }
    };

    TargetPath::parse(&target).map_err(|e| syn::Error::new(Span::call_site(), e.to_string()))?;

    Ok(HookArgs {
        phase,
        target,
        hack: raw.hack,
    })
}

/// Arguments to the dialog_tag attribute
///
/// Usage:
/// - `#[dialog_tag("palette")]`
/// - `#[dialog_tag("exit", deferred)]`
/// - `#[dialog_tag("sound", dual)]`
pub struct DialogTagArgs {
    /// Tag name as written in dialog
    pub name: LitStr,
    /// `None` for dual tags
    pub timing: Option<TagTiming>,
}

impl Parse for DialogTagArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name: LitStr = input.parse()?;

        let tag = name.value();
        if tag.is_empty() || tag.contains('.') || tag.chars().any(char::is_whitespace) {
            return Err(syn::Error::new(
                name.span(),
                "dialog tag names must be non-empty and contain no '.' or whitespace",
            ));
        }

        // Check for optional timing
        let timing = if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            let ident: Ident = input.parse()?;
            if ident == "deferred" {
                Some(TagTiming::Deferred)
            } else if ident == "immediate" {
                Some(TagTiming::Immediate)
            } else if ident == "dual" {
                None
            } else {
                return Err(syn::Error::new(
                    ident.span(),
                    "expected `immediate`, `deferred` or `dual`",
                ));
            }
        } else {
            Some(TagTiming::Immediate)
        };

        Ok(Self { name, timing })
    }
}
