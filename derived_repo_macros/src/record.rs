use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr, PathArguments, Type,
};

const SCALARS: &[&str] = &[
    "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32", "f64", "bool",
    "String",
];

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct FieldAttrs {
    id: bool,
    field: bool,
    skip: bool,
}

struct QueryField<'a> {
    ident: &'a Ident,
    name: String,
    ty: &'a Type,
    identifier: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record derive only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Record derive only supports structs",
            ))
        }
    };

    let collection = extract_collection(input)?;

    let mut parsed = Vec::new();
    for field in fields {
        parsed.push((field, field_attrs(field)?));
    }

    let id_field = find_id_field(name, &parsed)?;
    let id_ty = option_inner(&id_field.ty).ok_or_else(|| {
        syn::Error::new_spanned(&id_field.ty, "the identifier field must be an Option<T>")
    })?;
    let id_ident = id_field.ident.as_ref().ok_or_else(|| {
        syn::Error::new_spanned(id_field, "the identifier field must be named")
    })?;

    let mut query_fields = Vec::new();
    for (field, attrs) in &parsed {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let identifier = ident == id_ident;
        if attrs.skip {
            if identifier {
                return Err(syn::Error::new_spanned(
                    field,
                    "the identifier field cannot be skipped",
                ));
            }
            continue;
        }
        if !(identifier || attrs.field || is_scalar(&field.ty)) {
            continue;
        }
        query_fields.push(QueryField {
            ident,
            name: ident.to_string().trim_start_matches("r#").to_string(),
            ty: &field.ty,
            identifier,
        });
    }

    let field_defs = query_fields.iter().map(|f| {
        let field_name = &f.name;
        let ty = f.ty;
        let identifier = f.identifier;
        quote! {
            derived_repo::FieldDef {
                name: #field_name,
                kind: <#ty as derived_repo::FieldValue>::KIND,
                nullable: <#ty as derived_repo::FieldValue>::NULLABLE,
                identifier: #identifier,
            }
        }
    });

    let getters = query_fields.iter().map(|f| {
        let field_name = &f.name;
        let ident = f.ident;
        quote! {
            #field_name => Some(derived_repo::FieldValue::to_value(&self.#ident)),
        }
    });

    let setters = query_fields.iter().map(|f| {
        let field_name = &f.name;
        let ident = f.ident;
        let ty = f.ty;
        if f.identifier {
            quote! {
                #field_name => Err(derived_repo::FieldError::Immutable {
                    field: #field_name.to_string(),
                }),
            }
        } else {
            quote! {
                #field_name => {
                    let found = value.kind();
                    match <#ty as derived_repo::FieldValue>::from_value(value) {
                        Some(v) => {
                            self.#ident = v;
                            Ok(())
                        }
                        None => Err(derived_repo::FieldError::TypeMismatch {
                            field: #field_name.to_string(),
                            expected: <#ty as derived_repo::FieldValue>::KIND,
                            found,
                        }),
                    }
                }
            }
        }
    });

    Ok(quote! {
        impl derived_repo::Record for #name {
            const COLLECTION: &'static str = #collection;

            const FIELDS: &'static [derived_repo::FieldDef] = &[
                #(#field_defs),*
            ];

            type Id = #id_ty;

            fn id(&self) -> Option<Self::Id> {
                self.#id_ident.clone()
            }

            fn set_id(&mut self, id: Self::Id) {
                self.#id_ident = Some(id);
            }

            fn get_field(&self, name: &str) -> Option<derived_repo::Value> {
                match name {
                    #(#getters)*
                    _ => None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: derived_repo::Value,
            ) -> Result<(), derived_repo::FieldError> {
                match name {
                    #(#setters)*
                    _ => Err(derived_repo::FieldError::Unknown {
                        collection: <Self as derived_repo::Record>::COLLECTION.to_string(),
                        field: name.to_string(),
                    }),
                }
            }
        }
    })
}

fn extract_collection(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        let mut collection = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unknown record attribute; expected `collection`"))
            }
        })?;

        if let Some(c) = collection {
            return Ok(c);
        }
    }

    // Default: snake_case struct name + "s"
    let name = input.ident.to_string();
    Ok(format!("{}s", to_snake_case(&name)))
}

fn field_attrs(field: &Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                attrs.id = true;
            } else if meta.path.is_ident("field") {
                attrs.field = true;
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else {
                return Err(meta.error("unknown record attribute; expected `id`, `field` or `skip`"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn find_id_field<'a>(name: &Ident, fields: &[(&'a Field, FieldAttrs)]) -> syn::Result<&'a Field> {
    let marked: Vec<&Field> = fields
        .iter()
        .filter(|(_, attrs)| attrs.id)
        .map(|(field, _)| *field)
        .collect();

    match marked.as_slice() {
        [field] => return Ok(*field),
        [_, second, ..] => {
            return Err(syn::Error::new_spanned(
                second,
                "only one field can be marked #[record(id)]",
            ))
        }
        [] => {}
    }

    // Default: look for a field named "id"
    fields
        .iter()
        .map(|(field, _)| *field)
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == "id"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                name,
                "Record derive: no field marked with #[record(id)] and no field named `id`",
            )
        })
}

/// `T` for a type spelled `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn is_scalar(ty: &Type) -> bool {
    let ty = option_inner(ty).unwrap_or(ty);
    match ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .is_some_and(|segment| {
                segment.arguments.is_empty() && SCALARS.iter().any(|s| segment.ident == s)
            }),
        _ => false,
    }
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
