use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Type};

struct RecordArgs {
    collection: Option<String>,
    order_by: Option<String>,
    owner_field: Option<String>,
    draft: Option<Type>,
}

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let args = parse_struct_args(input)?;

    let collection = args
        .collection
        .unwrap_or_else(|| format!("{}s", to_snake_case(&name.to_string())));
    let owner_field = args.owner_field.unwrap_or_else(|| "userId".to_string());
    let order_by = match args.order_by {
        Some(field) => quote! { ::core::option::Option::Some(#field) },
        None => quote! { ::core::option::Option::None },
    };
    let draft = args.draft.ok_or_else(|| {
        syn::Error::new(
            name.span(),
            "Record derive: missing #[record(draft = Type)] on the struct",
        )
    })?;

    let id_field = marked_field(input, "id", "document_id")?;
    let owner_ident = marked_field(input, "owner", "owner_id")?;

    Ok(quote! {
        impl tareas::Record for #name {
            const COLLECTION: &'static str = #collection;
            const OWNER_FIELD: &'static str = #owner_field;
            const ORDER_BY: ::core::option::Option<&'static str> = #order_by;

            type Draft = #draft;

            fn document_id(&self) -> &str {
                &self.#id_field
            }

            fn owner_id(&self) -> &str {
                &self.#owner_ident
            }
        }
    })
}

fn parse_struct_args(input: &DeriveInput) -> syn::Result<RecordArgs> {
    let mut args = RecordArgs {
        collection: None,
        order_by: None,
        owner_field: None,
        draft: None,
    };

    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                args.collection = Some(value.value());
            } else if meta.path.is_ident("order_by") {
                let value: LitStr = meta.value()?.parse()?;
                args.order_by = Some(value.value());
            } else if meta.path.is_ident("owner_field") {
                let value: LitStr = meta.value()?.parse()?;
                args.owner_field = Some(value.value());
            } else if meta.path.is_ident("draft") {
                args.draft = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unsupported record attribute"));
            }
            Ok(())
        })?;
    }

    Ok(args)
}

/// Finds the field tagged `#[record(<marker>)]`, falling back to a field
/// called `default`.
fn marked_field(input: &DeriveInput, marker: &str, default: &str) -> syn::Result<Ident> {
    let Data::Struct(data_struct) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "Record derive: only structs are supported",
        ));
    };
    let Fields::Named(fields) = &data_struct.fields else {
        return Err(syn::Error::new(
            input.ident.span(),
            "Record derive: the struct must have named fields",
        ));
    };

    for field in &fields.named {
        for attr in &field.attrs {
            if !attr.path().is_ident("record") {
                continue;
            }
            let mut tagged = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(marker) {
                    tagged = true;
                }
                Ok(())
            })?;
            if tagged {
                if let Some(ident) = &field.ident {
                    return Ok(ident.clone());
                }
            }
        }
    }

    fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .find(|ident| *ident == default)
        .cloned()
        .ok_or_else(|| {
            syn::Error::new(
                Span::call_site(),
                format!(
                    "Record derive: no field marked with #[record({marker})] and no field named `{default}`"
                ),
            )
        })
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
