// src/core/command_resolver.rs

//! # Command Resolver
//!
//! Turns a manifest and a selection (command types, optional context, optional
//! tags) into the flat, ordered list of commands to run.
//!
//! The list is grouped by command type first: every `build` command comes
//! before any `test` command, and every `test` command before any `push`.
//! Within a phase, contexts are visited in lexicographic order and, unless an
//! explicit tag list is given, so are their tags.

use crate::core::{config_resolver, interpolator};
use crate::models::{CommandType, ContextMeta, Escaping, Manifest, ResolvedTagMeta};
use std::collections::BTreeMap;

/// One resolved command together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    /// The phase this command belongs to.
    pub kind: CommandType,
    /// The context it was resolved in.
    pub context: String,
    /// The tag it was resolved for.
    pub tag: String,
    /// The rendered command line.
    pub command: String,
}

/// All declared context names, sorted.
pub fn get_contexts(manifest: &Manifest) -> Vec<String> {
    manifest.contexts.keys().cloned().collect()
}

/// All declared tag names of a context, sorted.
pub fn get_tags(context_meta: &ContextMeta) -> Vec<String> {
    context_meta.tag_names()
}

/// Renders the requested command types for one resolved tag.
///
/// An empty `types` slice means every type. Types without a template are
/// left out of the result.
pub fn get_tag_commands(
    tag_meta: &ResolvedTagMeta,
    types: &[CommandType],
    escaping: Escaping,
) -> BTreeMap<CommandType, String> {
    requested_or_all(types)
        .iter()
        .filter_map(|&kind| {
            tag_meta.templates.get(kind.as_str()).map(|template| {
                (
                    kind,
                    interpolator::render(template, &tag_meta.parameters, escaping),
                )
            })
        })
        .collect()
}

/// Resolves the selection into planned commands, in execution order.
pub fn plan_commands(
    manifest: &Manifest,
    types: &[CommandType],
    context: Option<&str>,
    tags: Option<&[String]>,
) -> Vec<PlannedCommand> {
    let types = requested_or_all(types);
    let contexts = match context {
        Some(name) => vec![name.to_string()],
        None => get_contexts(manifest),
    };
    let global_defaults = config_resolver::get_global_defaults(manifest);

    // One bucket per requested type, in the requested order.
    let mut phases: Vec<Vec<PlannedCommand>> = vec![Vec::new(); types.len()];

    for context_name in &contexts {
        let context_meta = config_resolver::get_context_meta(context_name, manifest);
        // A context without a `tags` entry has nothing to run, whatever the tag filter.
        if !context_meta.declares_tags() {
            log::debug!("Context '{}' declares no tags; skipping it.", context_name);
            continue;
        }
        let tag_names = match tags {
            Some(selected) if !selected.is_empty() => selected.to_vec(),
            _ => get_tags(&context_meta),
        };
        log::debug!("Context '{}': tags {:?}", context_name, tag_names);

        for tag in &tag_names {
            let tag_meta = config_resolver::get_tag_meta(tag, &context_meta, &global_defaults);
            let mut rendered = get_tag_commands(&tag_meta, types, manifest.escape);

            for (phase, kind) in phases.iter_mut().zip(types) {
                if let Some(command) = rendered.remove(kind) {
                    log::trace!("[{}] {}:{} -> {}", kind, context_name, tag, command);
                    phase.push(PlannedCommand {
                        kind: *kind,
                        context: context_name.clone(),
                        tag: tag.clone(),
                        command,
                    });
                }
            }
        }
    }

    phases.into_iter().flatten().collect()
}

/// Resolves the selection into the ordered list of command lines.
pub fn get_commands(
    manifest: &Manifest,
    types: &[CommandType],
    context: Option<&str>,
    tags: Option<&[String]>,
) -> Vec<String> {
    plan_commands(manifest, types, context, tags)
        .into_iter()
        .map(|planned| planned.command)
        .collect()
}

fn requested_or_all(types: &[CommandType]) -> &[CommandType] {
    if types.is_empty() {
        &CommandType::ALL
    } else {
        types
    }
}
