use std::collections::HashSet;

use super::context::TransformerContext;
use crate::ir::{ApiData, ApiSchemaKind, SchemaId};

/// Link a completed schema into the discriminator graph.
///
/// Explicit mapping entries of `id` gain `id` as an inherited schema. A named
/// `combined` schema whose `allOf` reaches a discriminated schema through
/// `$ref`s is registered in that schema's mapping under its own name, unless
/// the mapping already targets it explicitly.
pub(crate) fn resolve_discriminator_mapping(ctx: &mut TransformerContext<'_>, id: SchemaId) {
    let schema = ctx.data.schema(id);
    if let Some(ref discriminator) = schema.discriminator {
        let variants: Vec<SchemaId> = discriminator.mapping.values().copied().collect();
        for variant in variants {
            link(&mut ctx.data, variant, id);
        }
    }

    let schema = ctx.data.schema(id);
    if schema.is_name_generated {
        return;
    }
    let ApiSchemaKind::Combined(ref combined) = schema.kind else {
        return;
    };
    let name = schema.name.clone();
    let source_key = schema.src.key();
    let members = combined.all_of.clone();

    for member in members {
        let Some(base) = discriminated_ancestor(&ctx.data, member) else {
            continue;
        };
        if base == id || ctx.maps_explicitly(base, &source_key) {
            continue;
        }
        let Some(discriminator) = ctx.data.schema_mut(base).discriminator.as_mut() else {
            continue;
        };
        let mapped = *discriminator.mapping.entry(name.clone()).or_insert(id);
        if mapped == id {
            link(&mut ctx.data, id, base);
        }
    }
}

/// Follow `$ref` links from `start` to the first schema with a discriminator.
fn discriminated_ancestor(data: &ApiData, start: SchemaId) -> Option<SchemaId> {
    let mut seen = HashSet::new();
    let mut current = Some(start);
    while let Some(id) = current {
        if !seen.insert(id) {
            return None;
        }
        let schema = data.schema(id);
        if schema.discriminator.is_some() {
            return Some(id);
        }
        current = schema.ref_schema;
    }
    None
}

fn link(data: &mut ApiData, variant: SchemaId, base: SchemaId) {
    let inherited = &mut data.schema_mut(variant).inherited_schemas;
    if !inherited.contains(&base) {
        inherited.push(base);
    }
}
