// src/core/config_resolver.rs

//! # Config Resolver
//!
//! Folds the manifest's layers into the parameters and templates of a single
//! (context, tag) pair. Precedence, lowest first:
//!
//! 1. the `context` parameter (the context name),
//! 2. `defaults` from the manifest root,
//! 3. the context's own `parameters` and `templates`,
//! 4. the tag keys, each set to the tag name (plus `tag` itself),
//! 5. the tag's declared overrides.
//!
//! Each step only replaces individual keys, never a whole section.

use crate::constants::{CONTEXT_PARAMETER, TAG_PARAMETER};
use crate::models::{ContextMeta, Layer, Manifest, ResolvedTagMeta, Scalar};
use std::collections::BTreeMap;

/// Overlays `child` onto `parent`, section by section. The child wins on conflict.
pub fn merge_layer(parent: &Layer, child: &Layer) -> Layer {
    let mut merged = parent.clone();
    merged
        .parameters
        .extend(child.parameters.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
        .templates
        .extend(child.templates.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Returns the manifest's root defaults (empty sections when absent).
pub fn get_global_defaults(manifest: &Manifest) -> Layer {
    manifest.defaults.clone()
}

/// Looks up a context's metadata.
///
/// An undeclared context is not an error: commands may target a directory that
/// has no metadata of its own, so it resolves to a `ContextMeta` holding only
/// its name.
pub fn get_context_meta(context: &str, manifest: &Manifest) -> ContextMeta {
    match manifest.contexts.get(context) {
        Some(meta) => {
            let mut meta = meta.clone();
            meta.context = context.to_string();
            meta
        }
        None => {
            log::debug!("Context '{}' is not declared in the manifest.", context);
            ContextMeta::named(context)
        }
    }
}

/// Returns the declared tag keys in declaration order, without duplicates.
/// The implicit `tag` key is not included.
pub fn get_tag_keys(context_meta: &ContextMeta) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in context_meta.declared_tag_keys().unwrap_or_default() {
        if !keys.contains(key) {
            keys.push(key.clone());
        }
    }
    keys
}

/// Builds the parameters that alias the tag name: one per tag key, plus `tag`.
pub fn get_tag_key_meta(context_meta: &ContextMeta, tag: &str) -> BTreeMap<String, Scalar> {
    get_tag_keys(context_meta)
        .into_iter()
        .chain(std::iter::once(TAG_PARAMETER.to_string()))
        .map(|key| (key, Scalar::from(tag)))
        .collect()
}

/// Resolves the final parameters and templates for `tag` within a context.
pub fn get_tag_meta(tag: &str, context_meta: &ContextMeta, global_defaults: &Layer) -> ResolvedTagMeta {
    let mut base = Layer::default();
    if !context_meta.context.is_empty() {
        base.parameters.insert(
            CONTEXT_PARAMETER.to_string(),
            Scalar::from(context_meta.context.as_str()),
        );
    }

    let context_defaults = merge_layer(global_defaults, &context_meta.layer());
    let mut resolved = merge_layer(&base, &context_defaults);

    resolved.parameters.extend(get_tag_key_meta(context_meta, tag));
    if let Some(overrides) = context_meta.tag(tag) {
        resolved.parameters.extend(
            overrides
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    log::trace!(
        "Resolved tag '{}' of context '{}': {:?}",
        tag,
        context_meta.context,
        resolved.parameters
    );
    resolved
}
