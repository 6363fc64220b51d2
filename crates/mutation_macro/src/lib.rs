extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, PatType, Receiver};

/// Runs an async service method as one optimistic mutation.
///
/// The method must take `session: &mut Session`. The expansion calls
/// `session.begin()`, runs the body, then `session.commit()` on `Ok` or
/// `session.rollback()` on `Err`, so every patch the body handed to
/// `session.hold` is either discarded or undone.
#[proc_macro_attribute]
pub fn mutation(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(input as ItemFn);
    let vis = &input_fn.vis;
    let attrs = &input_fn.attrs;
    let block = &input_fn.block;
    let fn_name = &input_fn.sig.ident;
    let fn_args = &input_fn.sig.inputs;
    let fn_return = &input_fn.sig.output;

    let has_session = fn_args.iter().any(|arg| match arg {
        FnArg::Typed(PatType { pat, .. }) => quote!(#pat).to_string() == "session",
        FnArg::Receiver(_) => false,
    });
    if !has_session {
        return syn::Error::new_spanned(
            &input_fn.sig,
            "#[mutation] requires a `session: &mut Session` argument",
        )
        .to_compile_error()
        .into();
    }

    let arg_list: Vec<_> = fn_args
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(PatType { pat, .. }) => quote! { #pat },
            FnArg::Receiver(Receiver { .. }) => quote!(self),
        })
        .collect();

    let wrapped_fn_name = quote::format_ident!("{}_optimistic", fn_name);
    let gen = quote! {
        #[doc(hidden)]
        async fn #wrapped_fn_name(#fn_args) #fn_return {
            #block
        }

        #(#attrs)*
        #vis async fn #fn_name(#fn_args) #fn_return {
            session.begin()?;
            match Self::#wrapped_fn_name(#(#arg_list),*).await {
                Ok(result) => {
                    session.commit();
                    Ok(result)
                }
                Err(e) => {
                    session.rollback();
                    Err(e)
                }
            }
        }
    };

    TokenStream::from(gen)
}
