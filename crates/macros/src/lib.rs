//! hackkit Proc Macros
//!
//! This crate provides proc macros for the hackkit toolkit:
//!
//! - `#[hook(before = "...")]` / `#[hook(after = "...")]` - Declare a hook function
//! - `#[dialog_tag("name")]` - Declare a dialog tag handler
//!
//! # Hook Example
//!
//! ```ignore
//! use hackkit_core::{hook, Args, ProgramError, Value};
//!
//! #[hook(before = "player.move", hack = "double-speed")]
//! fn double_steps(args: Args) -> Result<Value, ProgramError> {
//!     let steps = args.first().and_then(Value::as_i64).unwrap_or(1);
//!     Ok(serde_json::json!([steps * 2]))
//! }
//!
//! // An async fn becomes an async hook; later stages wait for it.
//! #[hook(after = "onExitDialog")]
//! async fn fade_out(_args: Args) -> Result<Value, ProgramError> {
//!     Ok(Value::Null)
//! }
//!
//! // Generated:
//! // - double_steps_register(&registry) - Register the hook
//! // - fade_out_register(&registry)
//! ```
//!
//! # Dialog Tag Example
//!
//! ```ignore
//! use hackkit_core::{dialog_tag, Args, ProgramError, Value};
//!
//! #[dialog_tag("exit", deferred)]
//! fn exit_tag(params: Args) -> Result<Value, ProgramError> {
//!     // params: ["room2", "3", "4"] for (exit room2, 3, 4)
//!     Ok(Value::Null)
//! }
//!
//! exit_tag_register(&registry)?;
//! ```

mod dialog_tag;
mod hook;
mod parse;

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn};

/// Attribute macro for hook functions
///
/// Leaves the function untouched and generates `{name}_register`, which adds
/// it to a `HookRegistry`. The target path is validated at compile time.
///
/// # Arguments
///
/// - `before = "target.path"` or `after = "target.path"` - **Required**, exactly one.
/// - `hack = "name"` - Optional. Hack the hook is registered under.
///
/// # Generated Code
///
/// ```ignore
/// fn double_steps_register(registry: &HookRegistry) -> Result<(), HookError>
/// ```
#[proc_macro_attribute]
pub fn hook(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);
    match parse::parse_hook_args(attr.into()) {
        Ok(args) => hook::generate_hook(args, func).into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Attribute macro for dialog tag handlers
///
/// # Arguments
///
/// - First argument: Tag name (e.g., `"exit"`)
/// - Optional: `immediate` (default), `deferred` or `dual`
///
/// The handler receives the tag's parameters as strings.
#[proc_macro_attribute]
pub fn dialog_tag(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as parse::DialogTagArgs);
    let func = parse_macro_input!(item as ItemFn);
    dialog_tag::generate_dialog_tag(args, func).into()
}
