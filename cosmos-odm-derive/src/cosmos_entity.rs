use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{DataStruct, DeriveInput, Field, Fields, GenericArgument, LitBool, LitInt, LitStr, PathArguments, Result, Token, Type};

const NUMERIC_TYPES: [&str; 12] = [
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];
const COLLECTION_TYPES: [&str; 5] = ["Vec", "VecDeque", "HashSet", "BTreeSet", "LinkedList"];

struct MappedField {
    logical: String,
    storage: String,
    collection: bool,
    numeric: bool,
    marked_id: bool,
}

pub(crate) fn generate_entity_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "generic entities are not supported",
        ));
    }

    let named = match &data.fields {
        Fields::Named(named) => named,
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "only structs with named fields are supported",
            ))
        }
    };

    let type_name = name.unraw().to_string();
    let mut container: Option<String> = None;
    let mut partition_key: Option<String> = None;
    let mut request_units: Option<u32> = None;
    let mut auto_create_container = true;
    let mut rename_all: Option<String> = None;

    for attr in &ast.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("container") {
                    let s: LitStr = meta.value()?.parse()?;
                    container = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("partition_key") {
                    let s: LitStr = meta.value()?.parse()?;
                    partition_key = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("ru") {
                    let n: LitInt = meta.value()?.parse()?;
                    request_units = Some(n.base10_parse()?);
                    Ok(())
                } else if meta.path.is_ident("auto_create_container") {
                    let b: LitBool = meta.value()?.parse()?;
                    auto_create_container = b.value;
                    Ok(())
                } else {
                    Err(meta.error("Unknown entity attribute"))
                }
            })?;
        } else if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    rename_all = Some(serialize_name(&meta)?);
                    Ok(())
                } else {
                    skip_meta(&meta)
                }
            })?;
        }
    }

    let mut fields = Vec::with_capacity(named.named.len());
    for field in &named.named {
        if let Some(mapped) = map_field(field, rename_all.as_deref())? {
            fields.push(mapped);
        }
    }

    let marked: Vec<&MappedField> = fields.iter().filter(|f| f.marked_id).collect();
    let id_field = match marked.as_slice() {
        [single] => *single,
        [] => match fields.iter().find(|f| f.logical == "id") {
            Some(field) => field,
            None => {
                return Err(syn::Error::new_spanned(
                    name,
                    "no id field, mark one with #[entity(id)] or name it `id`",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Multiple id attributes are not allowed")),
    };

    if let Some(ref partition_key) = partition_key {
        if !fields.iter().any(|f| &f.logical == partition_key) {
            return Err(syn::Error::new_spanned(
                name,
                format!("Partition key field {} not found in struct", partition_key),
            ));
        }
    }

    let id_logical = &id_field.logical;
    let numeric_id = id_field.numeric;
    let container_code = container.map(|c| quote! { .container(#c) });
    let partition_code = partition_key.map(|p| quote! { .partition_key(#p) });
    let request_units_code = request_units.map(|ru| quote! { .request_units(#ru) });
    let properties_code = fields.iter().map(|f| {
        let (logical, storage, collection) = (&f.logical, &f.storage, f.collection);
        quote! { .property(#logical, #storage, #collection) }
    });

    let gen = quote! {
        impl cosmos_odm::mapping::CosmosEntity for #name {
            fn entity_information() -> &'static cosmos_odm::mapping::EntityInformation {
                static INFO: ::std::sync::OnceLock<cosmos_odm::mapping::EntityInformation> =
                    ::std::sync::OnceLock::new();
                INFO.get_or_init(|| {
                    cosmos_odm::mapping::EntityInformation::builder(#type_name)
                        #container_code
                        .id_field(#id_logical)
                        .numeric_id(#numeric_id)
                        #partition_code
                        #request_units_code
                        .auto_create_container(#auto_create_container)
                        #(#properties_code)*
                        .build()
                })
            }
        }
    };

    Ok(TokenStream::from(gen))
}

/// Mapping of one field, or `None` when serde skips it.
fn map_field(field: &Field, rename_all: Option<&str>) -> Result<Option<MappedField>> {
    let ident = match &field.ident {
        Some(ident) => ident,
        None => return Err(syn::Error::new_spanned(field, "unnamed field")),
    };
    let logical = ident.unraw().to_string();

    let mut rename: Option<String> = None;
    let mut skipped = false;
    let mut marked_id = false;

    for attr in &field.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    marked_id = true;
                    Ok(())
                } else {
                    Err(meta.error("Unknown entity field attribute"))
                }
            })?;
        } else if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    rename = Some(serialize_name(&meta)?);
                    Ok(())
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    skipped = true;
                    Ok(())
                } else {
                    skip_meta(&meta)
                }
            })?;
        }
    }

    if skipped {
        if marked_id {
            return Err(syn::Error::new_spanned(field, "the id field cannot be skipped"));
        }
        return Ok(None);
    }

    let storage = match (rename, rename_all) {
        (Some(rename), _) => rename,
        (None, Some(rule)) => apply_rename_rule(&logical, rule, field)?,
        (None, None) => logical.clone(),
    };

    let inner = strip_option(&field.ty);
    Ok(Some(MappedField {
        logical,
        storage,
        collection: is_collection(inner),
        numeric: last_segment(inner).is_some_and(|s| NUMERIC_TYPES.contains(&s.as_str())),
        marked_id,
    }))
}

fn apply_rename_rule(name: &str, rule: &str, field: &Field) -> Result<String> {
    Ok(match rule {
        "lowercase" => name.to_lowercase(),
        "UPPERCASE" => name.to_uppercase(),
        "PascalCase" => name.to_case(Case::Pascal),
        "camelCase" => name.to_case(Case::Camel),
        "snake_case" => name.to_string(),
        "SCREAMING_SNAKE_CASE" => name.to_uppercase(),
        "kebab-case" => name.to_case(Case::Kebab),
        "SCREAMING-KEBAB-CASE" => name.to_case(Case::Kebab).to_uppercase(),
        other => {
            return Err(syn::Error::new_spanned(
                field,
                format!("unsupported serde rename_all rule {}", other),
            ))
        }
    })
}

/// Reads `key = "..."` or `key(serialize = "...")`.
fn serialize_name(meta: &ParseNestedMeta) -> Result<String> {
    if meta.input.peek(Token![=]) {
        let s: LitStr = meta.value()?.parse()?;
        return Ok(s.value());
    }

    let mut name = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            let s: LitStr = inner.value()?.parse()?;
            name = Some(s.value());
            Ok(())
        } else {
            skip_meta(&inner)
        }
    })?;
    name.ok_or_else(|| meta.error("missing serialize name"))
}

/// Consumes a serde option this macro does not care about.
fn skip_meta(meta: &ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let _content;
        syn::parenthesized!(_content in meta.input);
    }
    Ok(())
}

fn strip_option(ty: &Type) -> &Type {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return inner;
                    }
                }
            }
        }
    }
    ty
}

fn last_segment(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

fn is_collection(ty: &Type) -> bool {
    match ty {
        Type::Array(_) | Type::Slice(_) => true,
        Type::Reference(reference) => is_collection(&reference.elem),
        _ => last_segment(ty).is_some_and(|s| COLLECTION_TYPES.contains(&s.as_str())),
    }
}
