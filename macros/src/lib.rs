//! Derive macros for Doorlist action enums.
//!
//! Action enums unify commands (requests to change state) and events (facts
//! about what happened). `#[derive(Action)]` generates the classification
//! helpers the runtime and observers rely on:
//!
//! ```ignore
//! use doorlist_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum RegistrationAction {
//!     #[command]
//!     SubmitRegistration { attendee_id: AttendeeId },
//!
//!     #[event]
//!     RegistrationAdmitted { attendee_id: AttendeeId },
//! }
//!
//! assert!(RegistrationAction::SubmitRegistration { .. }.is_command());
//! assert_eq!(event.event_type(), "registration_admitted");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident};

/// Marks a variant's role within an action enum.
#[derive(Clone, Copy, PartialEq)]
enum VariantRole {
    Command,
    Event,
    Unmarked,
}

/// Derive macro for action enums.
///
/// # Attributes
///
/// - `#[command]` - the variant expresses intent and may be rejected
/// - `#[event]` - the variant records a fact and is applied unconditionally
///
/// # Generated methods
///
/// - `is_command()` / `is_event()` - variant classification
/// - `event_type()` - stable snake_case label for events, used as the
///   broadcast/log tag; commands return `"command"`
///
/// Using both attributes on one variant is a compile error.
#[proc_macro_derive(Action, attributes(command, event))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut command_arms = Vec::new();
    let mut event_arms = Vec::new();
    let mut event_type_arms = Vec::new();

    for variant in &data_enum.variants {
        let role = match variant_role(&variant.attrs) {
            Ok(role) => role,
            Err(error) => return error.to_compile_error().into(),
        };

        let ident = &variant.ident;
        let pattern = variant_pattern(ident, &variant.fields);

        match role {
            VariantRole::Command => command_arms.push(quote! { #pattern => true, }),
            VariantRole::Event => {
                let label = snake_case(&ident.to_string());
                event_arms.push(quote! { #pattern => true, });
                event_type_arms.push(quote! { #pattern => #label, });
            },
            VariantRole::Unmarked => {},
        }
    }

    let expanded = quote! {
        impl #name {
            /// Returns true if this action is a command
            #[must_use]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#command_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is an event
            #[must_use]
            pub const fn is_event(&self) -> bool {
                match self {
                    #(#event_arms)*
                    _ => false,
                }
            }

            /// Returns the stable snake_case label for events.
            ///
            /// Commands and unmarked variants return `"command"`.
            #[must_use]
            pub const fn event_type(&self) -> &'static str {
                match self {
                    #(#event_type_arms)*
                    _ => "command",
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Classify a variant from its attributes; both markers at once is an error.
fn variant_role(attrs: &[Attribute]) -> syn::Result<VariantRole> {
    let is_command = attrs.iter().any(|attr| attr.path().is_ident("command"));
    let is_event = attrs.iter().any(|attr| attr.path().is_ident("event"));

    match (is_command, is_event) {
        (true, true) => Err(syn::Error::new(
            attrs.first().map_or_else(proc_macro2::Span::call_site, Spanned::span),
            "Variant cannot be both #[command] and #[event]",
        )),
        (true, false) => Ok(VariantRole::Command),
        (false, true) => Ok(VariantRole::Event),
        (false, false) => Ok(VariantRole::Unmarked),
    }
}

/// Build the match pattern for a variant regardless of its field shape.
fn variant_pattern(ident: &Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// CamelCase → snake_case for event labels.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        } else {
            out.push(ch);
        }
    }
    out
}
