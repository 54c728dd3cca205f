use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

/// Test attribute used across rxflow.
///
/// - sync fns become plain `#[test]` functions.
/// - async fns run on a current-thread tokio runtime inside a `LocalSet`, so
///   `LocalScheduler` can spawn its timers. Time starts paused; pass `realtime`
///   to keep the wall clock.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let mut input = parse_macro_input!(item as ItemFn);

  let is_async = input.sig.asyncness.is_some();
  let raw_args = proc_macro2::TokenStream::from(attr);

  let paused = if raw_args.is_empty() {
    true
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxflow_macro::test args are only supported for async tests. Use \
           #[rxflow_macro::test] for sync tests, or make the function async.",
        )
        .to_compile_error(),
      );
    }

    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      Some((ident.to_string(), ident.span()))
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      Some((lit.value(), lit.span()))
    } else {
      None
    };

    match flavor {
      Some((name, _)) if name == "paused" => true,
      Some((name, _)) if name == "realtime" => false,
      Some((_, span)) => {
        return TokenStream::from(
          syn::Error::new(
            span,
            "rxflow_macro::test only accepts: #[rxflow_macro::test], \
             #[rxflow_macro::test(paused)] or #[rxflow_macro::test(realtime)]",
          )
          .to_compile_error(),
        );
      }
      None => {
        return TokenStream::from(
          syn::Error::new(
            raw_args.span(),
            "rxflow_macro::test only accepts: #[rxflow_macro::test], \
             #[rxflow_macro::test(paused)] or #[rxflow_macro::test(realtime)]",
          )
          .to_compile_error(),
        );
      }
    }
  };

  if !is_async {
    return TokenStream::from(quote! {
      #[test]
      #input
    });
  }

  let body = &input.block;
  let local_body: syn::Block = syn::parse_quote! {{
    ::tokio::task::LocalSet::new().run_until(async move #body).await
  }};
  input.block = Box::new(local_body);

  let runtime_attr = if paused {
    quote!(#[::tokio::test(flavor = "current_thread", start_paused = true)])
  } else {
    quote!(#[::tokio::test(flavor = "current_thread")])
  };

  TokenStream::from(quote! {
    #runtime_attr
    #input
  })
}
